//! Input discovery and corpus aggregation across log files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, SyncSender};
use std::thread;
use std::time::Instant;

use log::{info, warn};
use walkdir::WalkDir;

use crate::config::{CorpusConfig, CorpusOrder};
use crate::error::{ChatprepError, Result};
use crate::metrics::CorpusMetrics;
use crate::pipeline::{decode_file, FileOutcome, FileReport};

/// Splits a comma-separated list of paths, dropping blank entries.
#[must_use]
pub fn parse_input_list(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Resolves the provided inputs to a list of files.
///
/// Explicit files keep their declared order and are passed through even when
/// missing, so that an unreadable file fails on its own during decoding.
/// Directories expand in place to the files beneath them, sorted by path,
/// filtered by [`CorpusConfig::extension`] when set.
pub fn collect_inputs<P: AsRef<Path>>(inputs: &[P], cfg: &CorpusConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let path = input.as_ref();
        if !path.is_dir() {
            files.push(path.to_path_buf());
            continue;
        }
        let mut walker = WalkDir::new(path).follow_links(cfg.follow_symlinks);
        if !cfg.recursive {
            walker = walker.max_depth(1);
        }
        let mut discovered = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|err| {
                let path = err.path().map(Path::to_path_buf);
                match err.into_io_error() {
                    Some(source) => ChatprepError::io(source, path),
                    None => ChatprepError::Internal("directory traversal loop detected".into()),
                }
            })?;
            if entry.file_type().is_file() && matches_extension(entry.path(), cfg) {
                discovered.push(entry.into_path());
            }
        }
        if discovered.is_empty() {
            warn!("directory {} holds no matching log files", path.display());
        }
        discovered.sort();
        files.extend(discovered);
    }
    if files.is_empty() {
        return Err(ChatprepError::InvalidConfig(
            "no log files discovered in provided inputs".into(),
        ));
    }
    Ok(files)
}

fn matches_extension(path: &Path, cfg: &CorpusConfig) -> bool {
    match &cfg.extension {
        Some(ext) => path
            .extension()
            .is_some_and(|found| found.to_string_lossy() == ext.as_str()),
        None => true,
    }
}

/// Decodes every input concurrently and appends successful files to `writer`.
///
/// Files are decoded by a bounded set of worker threads that pull inputs from a
/// shared queue and report back through a channel sized to the number of
/// inputs; exactly one report is consumed per file. Failed or empty files are
/// logged and skipped. Write failures are logged and counted in
/// [`CorpusMetrics::write_failures`] without stopping the run.
pub fn build_corpus<P, W>(inputs: &[P], cfg: &CorpusConfig, writer: W) -> Result<CorpusMetrics>
where
    P: AsRef<Path> + Sync,
    W: Write,
{
    let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
    build_corpus_with_workers(inputs, cfg, writer, workers)
}

fn build_corpus_with_workers<P, W>(
    inputs: &[P],
    cfg: &CorpusConfig,
    writer: W,
    workers: usize,
) -> Result<CorpusMetrics>
where
    P: AsRef<Path> + Sync,
    W: Write,
{
    if inputs.is_empty() {
        return Err(ChatprepError::InvalidConfig(
            "corpus extraction requires at least one input file".into(),
        ));
    }
    cfg.validate()?;

    let start = Instant::now();
    let total = inputs.len();
    let (tx, rx) = mpsc::sync_channel::<(usize, FileReport)>(total);
    let queue = AtomicUsize::new(0);

    let mut metrics = thread::scope(|scope| {
        let mut spawned = 0usize;
        for worker in 0..workers.min(total) {
            let tx = tx.clone();
            let queue = &queue;
            let spawn = thread::Builder::new()
                .name(format!("chatprep-decode-{worker}"))
                .spawn_scoped(scope, move || drain_queue(inputs, queue, &tx));
            match spawn {
                Ok(_) => spawned += 1,
                Err(err) => {
                    warn!("unable to start decoder thread {worker}: {err}");
                    break;
                }
            }
        }
        if spawned == 0 {
            // The channel holds every report, so decoding inline cannot block.
            warn!("no decoder threads available; decoding {total} files sequentially");
            drain_queue(inputs, &queue, &tx);
        }
        drop(tx);

        let mut sink = CorpusSink::new(writer, cfg.order, total);
        for _ in 0..total {
            let (idx, report) = rx.recv().map_err(|_| {
                ChatprepError::Internal("decoder worker exited without reporting".into())
            })?;
            sink.accept(idx, report);
        }
        Ok::<_, ChatprepError>(sink.finish())
    })?;

    metrics.total_duration = start.elapsed();
    info!(
        "finished converting logs: {}/{} files written, {} messages, {} bytes",
        metrics.files_written, metrics.files_total, metrics.messages, metrics.bytes_written
    );
    Ok(metrics)
}

/// Decodes queued inputs until the queue is exhausted, reporting each one.
fn drain_queue<P: AsRef<Path>>(
    inputs: &[P],
    queue: &AtomicUsize,
    tx: &SyncSender<(usize, FileReport)>,
) {
    loop {
        let idx = queue.fetch_add(1, Ordering::Relaxed);
        let Some(input) = inputs.get(idx) else {
            break;
        };
        let report = decode_file(input.as_ref());
        if tx.send((idx, report)).is_err() {
            warn!("corpus aggregator stopped before {idx} reported");
            break;
        }
    }
}

/// Creates `output` and writes the corpus into it.
///
/// Failure to create the output file aborts the run before any decoding starts.
pub fn write_corpus_file<P>(inputs: &[P], cfg: &CorpusConfig, output: &Path) -> Result<CorpusMetrics>
where
    P: AsRef<Path> + Sync,
{
    let file =
        File::create(output).map_err(|err| ChatprepError::io(err, Some(output.to_path_buf())))?;
    build_corpus(inputs, cfg, BufWriter::new(file))
}

/// Single writer that receives per-file reports and appends them to the corpus.
struct CorpusSink<W: Write> {
    writer: W,
    order: CorpusOrder,
    pending: Vec<Option<FileReport>>,
    next: usize,
    metrics: CorpusMetrics,
}

impl<W: Write> CorpusSink<W> {
    fn new(writer: W, order: CorpusOrder, total: usize) -> Self {
        let pending = match order {
            CorpusOrder::Arrival => Vec::new(),
            CorpusOrder::Declared => (0..total).map(|_| None).collect(),
        };
        Self {
            writer,
            order,
            pending,
            next: 0,
            metrics: CorpusMetrics::new(total),
        }
    }

    fn accept(&mut self, idx: usize, report: FileReport) {
        match self.order {
            CorpusOrder::Arrival => self.emit(report),
            CorpusOrder::Declared => {
                if let Some(slot) = self.pending.get_mut(idx) {
                    *slot = Some(report);
                }
                while let Some(report) = self.pending.get_mut(self.next).and_then(Option::take) {
                    self.next += 1;
                    self.emit(report);
                }
            }
        }
    }

    fn emit(&mut self, report: FileReport) {
        match report.outcome {
            FileOutcome::Decoded { text, messages } => {
                info!("writing {} to corpus", report.path.display());
                let written = self
                    .writer
                    .write_all(text.as_bytes())
                    .and_then(|()| self.writer.write_all(b"\n"));
                match written {
                    Ok(()) => {
                        self.metrics.files_written += 1;
                        self.metrics.messages += messages;
                        self.metrics.bytes_written += text.len() + 1;
                        info!("wrote {} to corpus", report.path.display());
                    }
                    Err(err) => {
                        self.metrics.write_failures += 1;
                        warn!("failed to write {} to corpus: {err}", report.path.display());
                    }
                }
            }
            FileOutcome::Empty => {
                self.metrics.files_empty += 1;
                warn!(
                    "{} contained no text messages; skipping",
                    report.path.display()
                );
            }
            FileOutcome::Failed(err) => {
                self.metrics.files_failed += 1;
                warn!("result for {} was not a success: {err}", report.path.display());
            }
        }
    }

    fn finish(mut self) -> CorpusMetrics {
        if let Err(err) = self.writer.flush() {
            self.metrics.write_failures += 1;
            warn!("failed to flush corpus output: {err}");
        }
        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io;
    use tempfile::tempdir;

    fn write_log(dir: &Path, name: &str, texts_newest_first: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let body = texts_newest_first
            .iter()
            .map(|text| format!(r#"{{"event":"message","text":"{text}"}}"#))
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(&path, body).expect("write log");
        path
    }

    #[test]
    fn parse_input_list_splits_on_commas() {
        assert_eq!(
            parse_input_list("a.jsonl, b.jsonl,,c.jsonl "),
            vec![
                PathBuf::from("a.jsonl"),
                PathBuf::from("b.jsonl"),
                PathBuf::from("c.jsonl")
            ]
        );
    }

    #[test]
    fn collect_inputs_expands_directories_in_sorted_order() {
        let dir = tempdir().expect("tempdir");
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).expect("create nested directory");
        let b = write_log(dir.path(), "b.jsonl", &["x"]);
        let a = write_log(&nested, "a.jsonl", &["y"]);
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write notes");

        let cfg = CorpusConfig::builder()
            .extension(Some("jsonl"))
            .build()
            .expect("config");
        let files = collect_inputs(&[dir.path()], &cfg).expect("collect inputs");
        assert_eq!(files, vec![b, a]);
    }

    #[test]
    fn collect_inputs_keeps_missing_files_for_decoding() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("absent.jsonl");
        let files = collect_inputs(&[&missing], &CorpusConfig::default()).expect("collect");
        assert_eq!(files, vec![missing]);
    }

    #[test]
    fn collect_inputs_rejects_empty_selection() {
        let dir = tempdir().expect("tempdir");
        let err = collect_inputs(&[dir.path()], &CorpusConfig::default())
            .expect_err("empty directory");
        assert!(matches!(err, ChatprepError::InvalidConfig(_)));
    }

    #[test]
    fn empty_and_missing_files_do_not_block_others() {
        let dir = tempdir().expect("tempdir");
        let good = write_log(dir.path(), "good.jsonl", &["newest", "oldest"]);
        let empty = dir.path().join("empty.jsonl");
        fs::write(&empty, "{\"event\":\"service\",\"service\":true}\n").expect("write empty");
        let missing = dir.path().join("missing.jsonl");

        let mut out = Vec::new();
        let metrics = build_corpus(&[&empty, &missing, &good], &CorpusConfig::default(), &mut out)
            .expect("corpus");
        assert_eq!(String::from_utf8(out).unwrap(), "oldest\nnewest\n");
        assert_eq!(metrics.files_total, 3);
        assert_eq!(metrics.files_written, 1);
        assert_eq!(metrics.files_empty, 1);
        assert_eq!(metrics.files_failed, 1);
        assert_eq!(metrics.messages, 2);
        assert!(metrics.output_complete());
    }

    #[test]
    fn declared_order_is_honoured_when_requested() {
        let dir = tempdir().expect("tempdir");
        let paths: Vec<PathBuf> = (0..8)
            .map(|idx| {
                let text = format!("file{idx}");
                write_log(dir.path(), &format!("{idx}.jsonl"), &[text.as_str()])
            })
            .collect();
        let cfg = CorpusConfig::builder()
            .order(CorpusOrder::Declared)
            .build()
            .expect("config");

        let mut out = Vec::new();
        build_corpus(&paths, &cfg, &mut out).expect("corpus");
        let expected: String = (0..8).map(|idx| format!("file{idx}\n")).collect();
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn arrival_order_contains_every_file() {
        let dir = tempdir().expect("tempdir");
        let paths: Vec<PathBuf> = (0..8)
            .map(|idx| {
                let text = format!("file{idx}");
                write_log(dir.path(), &format!("{idx}.jsonl"), &[text.as_str()])
            })
            .collect();
        let mut out = Vec::new();
        build_corpus(&paths, &CorpusConfig::default(), &mut out).expect("corpus");
        let mut lines: Vec<String> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect();
        lines.sort();
        let mut expected: Vec<String> = (0..8).map(|idx| format!("file{idx}")).collect();
        expected.sort();
        assert_eq!(lines, expected);
    }

    #[test]
    fn decodes_inline_when_no_worker_threads_start() {
        let dir = tempdir().expect("tempdir");
        let a = write_log(dir.path(), "a.jsonl", &["one"]);
        let missing = dir.path().join("missing.jsonl");
        let b = write_log(dir.path(), "b.jsonl", &["three", "two"]);
        let cfg = CorpusConfig::builder()
            .order(CorpusOrder::Declared)
            .build()
            .expect("config");

        let mut out = Vec::new();
        let metrics =
            build_corpus_with_workers(&[a, missing, b], &cfg, &mut out, 0).expect("corpus");
        assert_eq!(String::from_utf8(out).unwrap(), "one\ntwo\nthree\n");
        assert_eq!(metrics.files_written, 2);
        assert_eq!(metrics.files_failed, 1);
        assert!(metrics.output_complete());
    }

    #[test]
    fn more_files_than_workers_are_all_decoded() {
        let dir = tempdir().expect("tempdir");
        let paths: Vec<PathBuf> = (0..32)
            .map(|idx| {
                let text = format!("file{idx}");
                write_log(dir.path(), &format!("{idx}.jsonl"), &[text.as_str()])
            })
            .collect();
        let cfg = CorpusConfig::builder()
            .order(CorpusOrder::Declared)
            .build()
            .expect("config");

        let mut out = Vec::new();
        let metrics = build_corpus_with_workers(&paths, &cfg, &mut out, 3).expect("corpus");
        let expected: String = (0..32).map(|idx| format!("file{idx}\n")).collect();
        assert_eq!(String::from_utf8(out).unwrap(), expected);
        assert_eq!(metrics.files_written, 32);
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failures_are_counted_not_fatal() {
        let dir = tempdir().expect("tempdir");
        let a = write_log(dir.path(), "a.jsonl", &["one"]);
        let b = write_log(dir.path(), "b.jsonl", &["two"]);
        let metrics =
            build_corpus(&[a, b], &CorpusConfig::default(), FailingWriter).expect("corpus");
        assert_eq!(metrics.write_failures, 2);
        assert_eq!(metrics.files_written, 0);
        assert!(!metrics.output_complete());
    }

    #[test]
    fn unwritable_output_is_fatal() {
        let dir = tempdir().expect("tempdir");
        let input = write_log(dir.path(), "a.jsonl", &["one"]);
        let output = dir.path().join("no-such-dir").join("dataset.txt");
        let err = write_corpus_file(&[input], &CorpusConfig::default(), &output)
            .expect_err("output cannot be created");
        assert!(matches!(err, ChatprepError::Io { .. }));
    }
}
