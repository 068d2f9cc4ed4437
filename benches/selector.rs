//! Selector engine benchmark suite.
//!
//! Measures selector computation on documents of growing size:
//! - Flat lists: 10, 100, 1000 items
//! - Deep nesting: 8, 32, 128 levels
//!
//! Run with: cargo bench --bench selector
//! Results saved to: target/criterion/

use std::fmt::Write as _;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use visual_editor::FrameDocument;
use visual_editor::frame::{compute_selector, describe};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const LIST_SIZES: &[usize] = &[10, 100, 1000];
const DEPTHS: &[usize] = &[8, 32, 128];

// ============================================================================
// Fixtures
// ============================================================================

fn flat_list(items: usize) -> String {
    let mut html = String::from("<!DOCTYPE html><html><head></head><body><ul>");
    for i in 0..items {
        let _ = write!(html, "<li>item {i}</li>");
    }
    html.push_str("</ul></body></html>");
    html
}

fn nested(depth: usize) -> String {
    let mut html = String::from("<!DOCTYPE html><html><head></head><body>");
    for _ in 0..depth {
        html.push_str("<div><span>x</span>");
    }
    html.push_str("<b>leaf</b>");
    for _ in 0..depth {
        html.push_str("</div>");
    }
    html.push_str("</body></html>");
    html
}

// ============================================================================
// Benchmark: Flat Lists
// ============================================================================

fn bench_flat_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("selector_flat_list");

    for &size in LIST_SIZES {
        let doc = FrameDocument::parse(&flat_list(size));
        let items = doc.query_all("li").expect("valid selector");
        let last = items[items.len() - 1];

        group.bench_with_input(BenchmarkId::new("last_item", size), &last, |b, &node| {
            b.iter(|| compute_selector(black_box(node)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Deep Nesting
// ============================================================================

fn bench_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("selector_nested");

    for &depth in DEPTHS {
        let doc = FrameDocument::parse(&nested(depth));
        let leaf = doc
            .query("b")
            .expect("valid selector")
            .expect("leaf exists");

        group.bench_with_input(BenchmarkId::new("leaf", depth), &leaf, |b, &node| {
            b.iter(|| describe(black_box(node)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Id Fast Path
// ============================================================================

fn bench_id(c: &mut Criterion) {
    let doc = FrameDocument::parse(&flat_list(200).replace(
        "</ul>",
        "</ul><button id=\"save\">Save</button>",
    ));
    let button = doc
        .query("#save")
        .expect("valid selector")
        .expect("button exists");

    c.bench_function("selector_unique_id", |b| {
        b.iter(|| compute_selector(black_box(button)));
    });
}

criterion_group!(benches, bench_flat_list, bench_nested, bench_id);
criterion_main!(benches);
