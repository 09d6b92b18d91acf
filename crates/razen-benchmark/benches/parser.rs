use std::hint::black_box;

use codspeed_criterion_compat::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};
use razen::{InputEdit, Parser, registry};

const FUNCTION: &str = r#"
pub fun area(shape: Shape, scale: float) -> float {
    var total: float = 0.0;
    for i in 0..10 {
        if i % 2 == 0 {
            total += shape.width * scale ** 2;
        } elif i > 7 {
            break;
        } else {
            total = total - f"{i}".len() / 3;
        }
    }
    match shape.kind {
        0 => "circle",
        _ => { log("other"); },
    }
    return total;
}
"#;

fn source(functions: usize) -> String {
    FUNCTION.repeat(functions)
}

fn benchmark_parser(c: &mut Criterion) {
    let language = registry::lookup("razen").expect("built-in language");
    let parser = Parser::new(language);

    let mut group = c.benchmark_group("Parser Benchmark");
    for functions in [1, 16, 128] {
        let text = source(functions);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse", functions), &text, |b, text| {
            b.iter(|| black_box(parser.parse(text)));
        });
    }
    group.finish();
}

fn benchmark_reparse(c: &mut Criterion) {
    let language = registry::lookup("razen").expect("built-in language");
    let parser = Parser::new(language);

    let mut group = c.benchmark_group("Reparse Benchmark");
    for functions in [16, 128] {
        let text = source(functions);
        let old = parser.parse(&text);
        let middle = text.len() / 2;
        let start = middle + text[middle..].find("0.0").expect("literal to edit");
        let (edit, new_text) = InputEdit::replace(text.as_bytes(), start, start + 3, b"1.25")
            .expect("edit inside the text");

        group.throughput(Throughput::Bytes(new_text.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("reparse_one_literal", functions),
            &(old, edit, new_text),
            |b, (old, edit, new_text)| {
                b.iter(|| black_box(parser.reparse(old, edit, new_text).expect("valid edit")));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, benchmark_parser, benchmark_reparse);
criterion_main!(benches);
