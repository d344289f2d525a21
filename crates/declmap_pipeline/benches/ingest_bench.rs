//! End-to-end ingestion benchmark over a synthetic SDK-shaped corpus.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use declmap_pipeline::{ingest, SourceInput};

/// Build a corpus that looks like a component SDK surface: versioned doc
/// blocks, enums, interfaces with overloads, and cross-file references.
fn synthetic_corpus(files: usize, symbols_per_file: usize) -> Vec<SourceInput> {
    let mut sources = Vec::with_capacity(files + 1);
    sources.push(SourceInput::new(
        "component/units.d.ts",
        "declare type Length = string | number;\ndeclare type ResourceColor = number | string;",
    ));
    for file_index in 0..files {
        let mut text = String::new();
        for symbol_index in 0..symbols_per_file {
            text.push_str(&format!(
                r#"
/**
 * @enum {{ number }}
 * @since {since}
 */
declare enum Mode{f}_{s} {{
    /**
     * @since {since}
     */
    Original,
    Template = {s},
}}
declare interface Style{f}_{s} {{
    width?: Length;
    color: ResourceColor;
    apply(value: Length): Style{f}_{s};
    apply(value: ResourceColor): Style{f}_{s};
}}
"#,
                f = file_index,
                s = symbol_index,
                since = 7 + (symbol_index % 5),
            ));
        }
        sources.push(SourceInput::new(
            format!("component/widget{}.d.ts", file_index),
            text,
        ));
    }
    sources
}

fn bench_ingest(c: &mut Criterion) {
    let small = synthetic_corpus(10, 20);
    let large = synthetic_corpus(50, 40);

    c.bench_function("ingest_small_corpus", |b| {
        b.iter(|| ingest(black_box(small.clone())).unwrap())
    });
    c.bench_function("ingest_large_corpus", |b| {
        b.iter(|| ingest(black_box(large.clone())).unwrap())
    });
}

criterion_group!(benches, bench_ingest);
criterion_main!(benches);
