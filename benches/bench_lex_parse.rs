use criterion::{Criterion, black_box, criterion_group, criterion_main};
use oplex::parse_source;

/// A module-sized source with a mix of imports, functions, classes, and
/// control flow so indentation tracking, bracket matching, and most of the
/// operator table all get exercised.
fn make_source(index: usize) -> String {
    format!(
        r#"
import os
import sys

CONSTANT_{i} = {i}

def compute_{i}(x, y):
    result = x + y
    if result > 0 and x is not None:
        return result
    elif result < 0 or y in (1, 2, 3):
        return -result
    else:
        return 0

class Widget_{i}:
    def __init__(self, value):
        self.value = value

    def scaled(self, factor=1):
        return self.value * factor

items_{i} = [compute_{i}(a, a * 2) for a in range(10) if a % 2 == 0]
callback_{i} = lambda a, b: a + b if a > b else b - a
"#,
        i = index
    )
}

fn bench_lex_parse(c: &mut Criterion) {
    let source = make_source(0);
    c.bench_function("parse_source_one_module", |b| {
        b.iter(|| {
            let tree = parse_source(black_box(&source));
            black_box(tree);
        });
    });

    let big_source: String = (0..200).map(make_source).collect::<Vec<_>>().join("\n");
    c.bench_function("parse_source_200_modules", |b| {
        b.iter(|| {
            let tree = parse_source(black_box(&big_source));
            black_box(tree);
        });
    });
}

criterion_group!(benches, bench_lex_parse);
criterion_main!(benches);
