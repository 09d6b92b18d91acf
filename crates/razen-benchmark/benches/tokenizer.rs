use codspeed_criterion_compat::{
    Criterion, Throughput, black_box, criterion_group, criterion_main,
};
use razen_yellow::{KindId, LexMode, TextSize};

static SOURCE: &str = "
var total = count * 2 + offset; // trailing comment
fun tick(self, delta: float) -> bool { return delta >= 0.5e-3 && !paused; }
/* block comment */ use from net use socket, stream as s;
";

fn benchmark_tokenizer(c: &mut Criterion) {
    let language = razen::registry::lookup("razen").expect("built-in language");
    let text = SOURCE.repeat(64);

    let mut group = c.benchmark_group("Tokenizer Benchmark");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("error_mode", |b| {
        b.iter(|| {
            let mut position = TextSize::new(0);
            let mut count = 0usize;
            loop {
                let token = language.lexer().next_token(text.as_bytes(), position, LexMode::ERROR);
                if token.kind == KindId::END {
                    break;
                }
                position = token.range.end();
                count += 1;
            }
            black_box(count)
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_tokenizer);
criterion_main!(benches);
