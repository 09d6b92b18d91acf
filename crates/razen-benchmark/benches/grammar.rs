use codspeed_criterion_compat::{Criterion, black_box, criterion_group, criterion_main};

fn benchmark_grammar(c: &mut Criterion) {
    c.bench_function("build_razen_tables", |b| {
        b.iter(|| black_box(razen::language().expect("grammar compiles")));
    });
}

criterion_group!(benches, benchmark_grammar);
criterion_main!(benches);
