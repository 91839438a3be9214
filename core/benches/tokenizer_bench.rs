use criterion::{criterion_group, criterion_main, Criterion};
use search_core::tokenizer::normalize;

const TEXT: &str = "Universitas Negeri Semarang is a public university in Semarang, Central Java. \
It was founded in 1965 and offers programs in engineering, education, economics and the arts. \
The Faculty of Engineering (Fakultas Teknik) runs departments of civil, electrical and mechanical engineering.";

fn bench_normalize(c: &mut Criterion) {
    let text = TEXT.repeat(50);
    c.bench_function("normalize_paragraphs", |b| b.iter(|| normalize(&text)));
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
