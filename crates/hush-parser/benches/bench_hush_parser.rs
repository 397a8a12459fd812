use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hush_core::SegmenterKind;
use hush_parser::{SentenceSegmenter, TextChunker};
use rand::seq::SliceRandom;
use rand::SeedableRng;

fn generate_text(size_kb: usize) -> String {
    let sentences = [
        "I love cooking pasta on the weekend. ",
        "The weather is nice today!\n",
        "Did the team win the match last night? ",
        "Prices rose again, according to the quarterly report. ",
        "She walked   the dog\tbefore breakfast. ",
    ];
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let mut text = String::with_capacity(size_kb * 1024);
    while text.len() < size_kb * 1024 {
        text.push_str(sentences.choose(&mut rng).unwrap());
    }
    text
}

fn bench_segment(c: &mut Criterion) {
    let text_10k = generate_text(10);
    for (name, kind) in [("unicode", SegmenterKind::Unicode), ("regex", SegmenterKind::Regex)] {
        let seg = SentenceSegmenter::new(kind, 1);
        c.bench_function(&format!("segment_{name}_10kb"), |b| {
            b.iter(|| black_box(seg.segment(black_box(&text_10k))))
        });
        c.bench_function(&format!("segment_raw_{name}_10kb"), |b| {
            b.iter(|| black_box(seg.segment_raw(black_box(&text_10k))))
        });
    }
}

fn bench_chunk(c: &mut Criterion) {
    let text_100k = generate_text(100);
    let chunker = TextChunker::default();
    c.bench_function("chunk_100kb", |b| {
        b.iter(|| black_box(chunker.chunk(black_box(&text_100k))))
    });
}

criterion_group!(benches, bench_segment, bench_chunk);
criterion_main!(benches);
