use criterion::{criterion_group, criterion_main, Criterion};
use finder_core::persist::IndexPaths;
use finder_core::tokenizer::tokenize;
use finder_core::{Bm25Params, CorpusIndex, IndexBuilder, RankingEngine};

const TEXT: &str = "The TCP congestion control algorithms are slow start, congestion avoidance, \
fast retransmit and fast recovery. A TCP sender MUST NOT send more data than the minimum of the \
congestion window and the receiver's advertised window allows.";

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize_paragraph", |b| b.iter(|| tokenize(TEXT)));
}

fn bench_rank(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = IndexPaths::new(dir.path());
    let mut builder = IndexBuilder::new();
    for n in 0..500 {
        let text = format!("{TEXT} document {n} window {}", "segment ".repeat(n % 7));
        builder.add_document(format!("rfcs/rfc{n}.txt"), &text);
    }
    builder.write(&paths, String::new()).expect("write index");
    let index = CorpusIndex::open(paths).expect("open index");
    let params = Bm25Params::default();
    c.bench_function("rank_two_terms", |b| b.iter(|| index.rank("congestion window", &params, 10)));
}

criterion_group!(benches, bench_tokenize, bench_rank);
criterion_main!(benches);
