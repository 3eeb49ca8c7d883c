use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chatprep::config::{CorpusConfig, CorpusOrder, VocabConfig, DEFAULT_MAX_VOCAB_SIZE};
use chatprep::corpus::{collect_inputs, parse_input_list, write_corpus_file};
use chatprep::{Dictionary, TokenIndex, VocabularyBuilder};
use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde_json::json;

const DEFAULT_LOGS: &str = "./log.jsonl";
const DEFAULT_CORPUS: &str = "./dataset.txt";
const DEFAULT_DICTIONARY: &str = "./out.txt";

#[derive(Parser, Debug)]
#[command(author, version, about = "Chat-log corpus and vocabulary toolkit", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode JSONL chat logs into a plain-text corpus
    Corpus(CorpusArgs),
    /// Build a frequency-ranked dictionary from a corpus
    Vocab(VocabArgs),
    /// Map corpus lines to dictionary indices
    Encode(EncodeArgs),
    /// Inspect a dictionary
    Info(InfoArgs),
}

#[derive(Args, Debug)]
struct CorpusArgs {
    /// Comma-separated list of JSONL log files or directories
    #[arg(long = "in", value_name = "PATHS", default_value = DEFAULT_LOGS)]
    inputs: String,

    /// Corpus output path
    #[arg(short, long = "out", visible_alias = "output", value_name = "PATH", default_value = DEFAULT_CORPUS)]
    output: PathBuf,

    /// Write files in the order they were listed instead of as they finish
    #[arg(long)]
    ordered: bool,

    /// Only pick up files with this extension when expanding directories
    #[arg(long, value_name = "EXT")]
    extension: Option<String>,

    /// Disable recursive directory traversal
    #[arg(long)]
    no_recursive: bool,

    /// Follow symlinks during traversal
    #[arg(long)]
    follow_symlinks: bool,

    /// Limit Rayon worker threads
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct VocabArgs {
    /// Plain-text corpus to read
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CORPUS)]
    dataset: PathBuf,

    /// Dictionary output path
    #[arg(short, long = "out", visible_alias = "output", value_name = "PATH", default_value = DEFAULT_DICTIONARY)]
    output: PathBuf,

    /// Maximum ranked tokens kept after the unknown token
    #[arg(long = "max", value_name = "COUNT", default_value_t = DEFAULT_MAX_VOCAB_SIZE)]
    max_vocab_size: usize,

    /// Token reserved for index zero
    #[arg(long, value_name = "TOKEN")]
    unknown_token: Option<String>,

    /// Keep the corpus casing instead of lower-casing it
    #[arg(long)]
    keep_case: bool,

    /// Limit Rayon worker threads
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Dictionary to load
    #[arg(short = 'd', long, value_name = "PATH")]
    dictionary: PathBuf,

    /// Corpus to encode
    corpus: PathBuf,

    /// Truncate each encoded line to this many indices
    #[arg(long, value_name = "LEN")]
    max_len: Option<usize>,

    /// Match tokens without lower-casing the corpus
    #[arg(long)]
    keep_case: bool,

    /// Output path (stdout when omitted)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Dictionary to inspect
    #[arg(short = 'd', long, value_name = "PATH")]
    dictionary: PathBuf,

    /// Number of leading entries to list
    #[arg(long, value_name = "COUNT", default_value_t = 10)]
    top: usize,

    /// Emit JSON instead of human-readable output
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Corpus(args) => run_corpus(args),
        Commands::Vocab(args) => run_vocab(args),
        Commands::Encode(args) => run_encode(args),
        Commands::Info(args) => run_info(args),
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    use log::LevelFilter;

    // Without -v/-q the RUST_LOG filter (default `info`) stands.
    let level = match (verbose, quiet) {
        (0, 0) => None,
        (_, 1) => Some(LevelFilter::Warn),
        (_, q) if q > 1 => Some(LevelFilter::Error),
        (1, _) => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    if let Some(level) = level {
        builder.filter_level(level);
    }
    let _ = builder.try_init();
}

fn configure_threads(threads: Option<usize>) -> Result<()> {
    if let Some(threads) = threads {
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("unable to configure Rayon thread pool")?;
    }
    Ok(())
}

fn spinner(enabled: bool, message: &'static str) -> Result<Option<ProgressBar>> {
    if !enabled {
        return Ok(None);
    }
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner} {msg} {elapsed}")
        .context("invalid progress template")?
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    pb.set_style(style);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(Some(pb))
}

fn run_corpus(args: CorpusArgs) -> Result<()> {
    configure_threads(args.threads)?;

    let order = if args.ordered {
        CorpusOrder::Declared
    } else {
        CorpusOrder::Arrival
    };
    let cfg = CorpusConfig::builder()
        .order(order)
        .recursive(!args.no_recursive)
        .follow_symlinks(args.follow_symlinks)
        .extension(args.extension.clone())
        .build()?;

    let declared = parse_input_list(&args.inputs);
    let inputs = collect_inputs(&declared, &cfg).context("failed to resolve log inputs")?;
    info!("decoding {} log files into {}", inputs.len(), args.output.display());

    let progress = spinner(!args.no_progress, "decoding logs...")?;
    let metrics = write_corpus_file(&inputs, &cfg, &args.output)
        .with_context(|| format!("failed to build corpus at {}", args.output.display()))?;
    if let Some(pb) = progress {
        pb.finish_with_message("logs decoded");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        println!(
            "wrote {} messages from {}/{} files to {}",
            metrics.messages,
            metrics.files_written,
            metrics.files_total,
            args.output.display()
        );
        println!(
            "   empty {} | failed {} | {} bytes | duration {:.2?}",
            metrics.files_empty, metrics.files_failed, metrics.bytes_written, metrics.total_duration
        );
    }

    if !metrics.output_complete() {
        bail!(
            "{} writes to {} failed; the corpus is incomplete",
            metrics.write_failures,
            args.output.display()
        );
    }
    if metrics.files_written == 0 {
        warn!("no input file produced any messages");
    }
    Ok(())
}

fn run_vocab(args: VocabArgs) -> Result<()> {
    configure_threads(args.threads)?;

    let mut cfg = VocabConfig::builder()
        .max_vocab_size(args.max_vocab_size)
        .lowercase(!args.keep_case);
    if let Some(token) = &args.unknown_token {
        cfg = cfg.unknown_token(token.clone());
    }
    let cfg = cfg.build()?;

    let progress = spinner(!args.no_progress, "ranking tokens...")?;
    let start = Instant::now();
    let artifacts = VocabularyBuilder::new(cfg)
        .build_from_path(&args.dataset)
        .with_context(|| format!("failed to build vocabulary from {}", args.dataset.display()))?;
    if let Some(pb) = progress {
        pb.finish_with_message("vocabulary ranked");
    }

    artifacts
        .dictionary
        .save(&args.output)
        .with_context(|| format!("failed to save dictionary to {}", args.output.display()))?;
    let elapsed = start.elapsed();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&artifacts.metrics)?);
    } else {
        println!(
            "wrote dictionary with {} entries to {}",
            artifacts.dictionary.len(),
            args.output.display()
        );
        println!(
            "   {} distinct tokens | {} occurrences | duration {:.2?}",
            artifacts.metrics.distinct_tokens, artifacts.metrics.total_tokens, elapsed
        );
    }
    Ok(())
}

fn run_encode(args: EncodeArgs) -> Result<()> {
    let dictionary = Dictionary::load(&args.dictionary)
        .with_context(|| format!("failed to load dictionary from {}", args.dictionary.display()))?;
    let raw = fs::read(&args.corpus)
        .with_context(|| format!("failed to read {}", args.corpus.display()))?;
    let text = String::from_utf8_lossy(&raw);
    let body = text.strip_suffix('\n').unwrap_or(&text);
    if body.is_empty() {
        warn!("{} is empty; nothing to encode", args.corpus.display());
        return Ok(());
    }

    let lowercase = !args.keep_case;
    let encoded: Vec<Vec<TokenIndex>> = body
        .par_split('\n')
        .map(|line| {
            let mut ids = dictionary.encode_line(line, lowercase);
            if let Some(max_len) = args.max_len {
                ids.truncate(max_len);
            }
            ids
        })
        .collect();

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_sequences(BufWriter::new(file), &encoded)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("encoded {} lines to {}", encoded.len(), path.display());
        }
        None => write_sequences(io::stdout().lock(), &encoded)?,
    }
    Ok(())
}

fn run_info(args: InfoArgs) -> Result<()> {
    let dictionary = Dictionary::load(&args.dictionary)
        .with_context(|| format!("failed to load dictionary from {}", args.dictionary.display()))?;
    let top: Vec<(TokenIndex, &str)> = dictionary.iter().skip(1).take(args.top).collect();

    if args.json {
        let summary = json!({
            "path": args.dictionary.display().to_string(),
            "size": dictionary.len(),
            "unknown_token": dictionary.unknown_token(),
            "top": top
                .iter()
                .map(|(idx, token)| json!({ "index": idx, "token": token }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Dictionary: {}", args.dictionary.display());
    println!("Vocab size: {}", dictionary.len());
    println!("Unknown token: {}", dictionary.unknown_token());
    if !top.is_empty() {
        println!("Top tokens:");
        for (idx, token) in top {
            println!("  {idx:>6} {token}");
        }
    }
    Ok(())
}

fn write_sequences<W: Write>(mut writer: W, sequences: &[Vec<TokenIndex>]) -> Result<()> {
    for ids in sequences {
        write_token_sequence(&mut writer, ids)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_token_sequence<W: Write>(writer: &mut W, tokens: &[TokenIndex]) -> Result<()> {
    for (idx, token) in tokens.iter().enumerate() {
        if idx > 0 {
            writer.write_all(b" ")?;
        }
        write!(writer, "{token}")?;
    }
    writer.write_all(b"\n")?;
    Ok(())
}

