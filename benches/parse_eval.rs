//! Parsing, evaluation and rendering throughput.
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qualex::json::JsonObjectModel;
use qualex::translate::{ParameterizedRenderer, RenderOptions};
use qualex::{Evaluator, Value, parse};
use serde_json::json;

const EXPRESSIONS: [&str; 4] = [
    "artistName = 'Picasso'",
    "artistName like 'P%' and paintingArray.estimatedPrice > 3000",
    "paintingArray#p.toGallery+.galleryName in ('Louvre', 'Prado') or not (p.estimatedPrice between 10 and 100)",
    "(artistId & 3) << 2 = 4 and upper(substring(artistName, 1, 3)) = 'PIC'",
];

fn artists(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            let name = if i % 2 == 0 { "Picasso" } else { "Dali" };
            let paintings: Vec<_> = (0..5)
                .map(|j| {
                    let gallery = if j % 2 == 0 {
                        json!({"id": 1, "galleryName": "Louvre"})
                    } else {
                        json!(null)
                    };
                    json!({"id": i * 10 + j, "estimatedPrice": j * 1000, "toGallery": gallery})
                })
                .collect();
            JsonObjectModel::object(json!({
                "id": i,
                "artistId": i,
                "artistName": name,
                "paintingArray": paintings
            }))
        })
        .collect()
}

// ============================================================================
// Parsing
// ============================================================================

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (i, text) in EXPRESSIONS.iter().enumerate() {
        group.bench_with_input(BenchmarkId::from_parameter(i), text, |b, text| {
            b.iter(|| parse(black_box(text)).unwrap())
        });
    }
    group.finish();
}

// ============================================================================
// Evaluation
// ============================================================================

fn bench_filter(c: &mut Criterion) {
    let model = JsonObjectModel::new();
    let evaluator = Evaluator::new(&model);
    let expr = parse(EXPRESSIONS[2]).unwrap();

    let mut group = c.benchmark_group("filter");
    for size in [10, 100, 1000] {
        let subjects = artists(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &subjects, |b, subjects| {
            b.iter(|| evaluator.filter(black_box(&expr), subjects).unwrap().len())
        });
    }
    group.finish();
}

// ============================================================================
// Rendering
// ============================================================================

fn bench_render(c: &mut Criterion) {
    let expr = parse(EXPRESSIONS[2]).unwrap();
    let renderer = ParameterizedRenderer::new(RenderOptions::default().with_root_alias("a"));

    c.bench_function("canonical", |b| b.iter(|| black_box(&expr).to_string()));
    c.bench_function("parameterized", |b| {
        b.iter(|| renderer.render(black_box(&expr)).unwrap())
    });
}

criterion_group!(benches, bench_parse, bench_filter, bench_render);
criterion_main!(benches);
