use std::hint::black_box;
use std::path::Path;

use chatprep::pipeline::decode_messages;
use chatprep::{VocabConfig, VocabularyBuilder};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode, Throughput};

const WORDS: [&str; 12] = [
    "hello", "there", "how", "are", "you", "doing", "today", "fine", "thanks", "see", "later",
    "bye",
];

fn build_corpus() -> String {
    let mut corpus = String::with_capacity(1 << 20);
    for line in 0..16_384usize {
        for offset in 0..8 {
            corpus.push_str(WORDS[(line * 7 + offset * 3) % WORDS.len()]);
            corpus.push(if offset % 3 == 2 { ',' } else { ' ' });
        }
        corpus.push_str(&format!("word{}.\n", line % 2_048));
    }
    corpus
}

fn build_log() -> Vec<u8> {
    let mut log = String::with_capacity(1 << 20);
    for idx in 0..8_192usize {
        if idx % 10 == 0 {
            log.push_str(r#"{"event":"service","service":true}"#);
        } else {
            log.push_str(&format!(
                r#"{{"event":"message","id":"{idx}","text":"{} and {}\nsecond line"}}"#,
                WORDS[idx % WORDS.len()],
                WORDS[(idx / 3) % WORDS.len()]
            ));
        }
        log.push('\n');
    }
    log.into_bytes()
}

fn bench_vocabulary(c: &mut Criterion) {
    let corpus = build_corpus();
    let cfg = VocabConfig::builder()
        .max_vocab_size(1_000)
        .build()
        .expect("configuration");

    let mut group = c.benchmark_group("build_dictionary");
    group.throughput(Throughput::Bytes(corpus.len() as u64));
    group.sampling_mode(SamplingMode::Flat);
    group.bench_function(BenchmarkId::from_parameter("lines_16k"), |b| {
        b.iter(|| {
            let builder = VocabularyBuilder::new(cfg.clone());
            let artifacts = builder.build_from_corpus(&corpus).expect("vocabulary");
            let _ = black_box(artifacts);
        });
    });
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let log = build_log();
    let mut group = c.benchmark_group("decode_log");
    group.throughput(Throughput::Bytes(log.len() as u64));
    group.bench_function(BenchmarkId::from_parameter("records_8k"), |b| {
        b.iter(|| black_box(decode_messages(&log, Path::new("bench.jsonl"))));
    });
    group.finish();
}

criterion_group!(benches, bench_vocabulary, bench_decode);
criterion_main!(benches);
