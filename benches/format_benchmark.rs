//! Benchmarks for brlpage translation and pagination performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks run the pipeline on synthetic tagged documents.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use brlpage::translate::{BrailleTable, UebGrade1};
use brlpage::{parse_str, Engine, EngineConfig};

/// Creates a synthetic document with the given number of sections.
fn create_test_document(sections: usize) -> String {
    let mut xml = String::from("<document><head><meta name=\"title\" content=\"Benchmark\"/></head>");

    for i in 0..sections {
        xml.push_str("<section>");
        xml.push_str(&format!("<block type=\"heading\">Chapter {}</block>", i + 1));
        xml.push_str(&format!("<pageIndicator number=\"{}\"/>", i + 1));
        for p in 0..8 {
            xml.push_str(&format!(
                "<block type=\"paragraph\">Paragraph {} of chapter {} has <inline type=\"emphasis\" \
                 emphasis=\"italic\">some emphasis</inline> and ordinary text for the braille \
                 translation and pagination benchmark.</block>",
                p + 1,
                i + 1
            ));
        }
        xml.push_str(
            "<container type=\"table\">\
             <container type=\"tableRow\" header=\"true\">\
             <block type=\"tableCell\">Item</block><block type=\"tableCell\">Count</block></container>\
             <container type=\"tableRow\">\
             <block type=\"tableCell\">Apples</block><block type=\"tableCell\">12</block></container>\
             </container>",
        );
        xml.push_str("</section>");
    }

    xml.push_str("</document>");
    xml
}

/// Benchmark the braille table alone.
fn bench_table(c: &mut Criterion) {
    let table = UebGrade1;
    let text = "The Quick Brown Fox jumped over 23 lazy dogs, twice.";

    c.bench_function("ueb_grade1_sentence", |b| {
        b.iter(|| table.translate(black_box(text)).unwrap());
    });
}

/// Benchmark the full pipeline at various sizes.
fn bench_pipeline(c: &mut Criterion) {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let mut group = c.benchmark_group("pipeline");

    for sections in [1, 5, 20].iter() {
        let xml = create_test_document(*sections);

        group.bench_function(format!("{}_sections", sections), |b| {
            b.iter(|| {
                let mut doc = parse_str(black_box(&xml)).unwrap();
                engine.process(&mut doc).unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmark formatting of an already translated document.
fn bench_format_only(c: &mut Criterion) {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let mut doc = parse_str(&create_test_document(5)).unwrap();
    engine.translate(&mut doc).unwrap();

    c.bench_function("format_5_sections", |b| {
        b.iter(|| engine.format(black_box(&doc)).unwrap());
    });
}

criterion_group!(benches, bench_table, bench_pipeline, bench_format_only);
criterion_main!(benches);
