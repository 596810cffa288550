//! Criterion benchmarks for taskline critical paths
//!
//! Benchmarks the operations every run goes through:
//! - Discovery: glob expansion over a source tree
//! - Pipeline: a six-stage run with no-op stubs
//! - HTML: template minification
//! - CSS: stylesheet minification

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs;
use std::path::Path;
use taskline::build::{
    expand_patterns, ArtifactStore, PipelineRegistry, PipelineRunner, StoreError, StoreLayout,
    TaskDescriptor, TaskExecutor, TaskRef, TaskRegistry,
};
use taskline::tasks::css::minify_css;
use taskline::tasks::html::minify_html;
use taskline::tasks::{HtmlMinifyOptions, Invocation, TaskOutcome};
use tempfile::TempDir;

// =============================================================================
// Test Data Generators
// =============================================================================

/// Create `dirs` directories of `files` scripts each under `src/`.
fn make_source_tree(root: &Path, dirs: usize, files: usize) {
    for d in 0..dirs {
        let dir = root.join(format!("src/module{:03}", d));
        fs::create_dir_all(&dir).unwrap();
        for f in 0..files {
            fs::write(dir.join(format!("file{:03}.js", f)), "var x;").unwrap();
            fs::write(dir.join(format!("view{:03}.html", f)), "<div></div>").unwrap();
        }
    }
}

/// Generate a template with `n` list items.
fn make_template(n: usize) -> String {
    let items: String = (0..n)
        .map(|i| {
            format!(
                "  <!-- item {i} -->\n  <li class=\"item\" ng-repeat=\"m in movies\">\n    <input type=\"checkbox\" checked=\"checked\"> {{{{m.title}}}}\n  </li>\n"
            )
        })
        .collect();
    format!("<ul class=\"list\">\n{}</ul>\n", items)
}

/// Generate a stylesheet with `n` rules.
fn make_stylesheet(n: usize) -> String {
    (0..n).map(|i| format!(".rule-{i} {{\n  color: #ff0000;\n  margin: 0px 0px 0px 0px;\n}}\n")).collect()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_discovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("discovery");
    let temp = TempDir::new().unwrap();
    make_source_tree(temp.path(), 20, 25);

    let patterns = vec!["src/**/*.js".to_string()];
    group.throughput(Throughput::Elements(500));
    group.bench_function("recursive_glob", |b| {
        b.iter(|| expand_patterns(black_box(temp.path()), black_box(&patterns)).unwrap())
    });

    let mixed = vec![
        "src/module000/*.js".to_string(),
        "src/**/*.js".to_string(),
        "!src/module01*/**".to_string(),
    ];
    group.bench_function("ordered_with_exclusion", |b| {
        b.iter(|| expand_patterns(black_box(temp.path()), black_box(&mixed)).unwrap())
    });

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let stages = ["lint", "styleCompile", "styleMinify", "templates", "bundle", "scriptMinify"];
    let temp = TempDir::new().unwrap();

    let mut registry = TaskRegistry::new();
    for stage in stages {
        registry.insert(TaskDescriptor::new(stage, "main", "stub"));
    }
    let mut executor =
        TaskExecutor::new(registry, ArtifactStore::new(temp.path().to_path_buf(), StoreLayout::default()));
    for stage in stages {
        executor.register_implementation(stage, |_: &Invocation<'_>, _: &ArtifactStore| {
            Ok::<_, StoreError>(TaskOutcome::Success)
        });
    }
    let mut pipelines = PipelineRegistry::new();
    pipelines.define_pipeline("build", stages.iter().map(|s| TaskRef::new(*s)).collect());
    let runner = PipelineRunner::new(executor, pipelines);

    c.bench_function("pipeline/six_stage_stubs", |b| b.iter(|| runner.run(black_box("build")).unwrap()));
}

fn bench_html(c: &mut Criterion) {
    let mut group = c.benchmark_group("html");
    let options = HtmlMinifyOptions {
        remove_comments: true,
        collapse_whitespace: true,
        collapse_boolean_attributes: true,
        remove_attribute_quotes: true,
        remove_redundant_attributes: true,
    };

    for size in [10, 100, 1000].iter() {
        let template = make_template(*size);
        group.throughput(Throughput::Bytes(template.len() as u64));
        group.bench_with_input(BenchmarkId::new("minify", size), &template, |b, template| {
            b.iter(|| minify_html(black_box(template), &options))
        });
    }

    group.finish();
}

fn bench_css(c: &mut Criterion) {
    let mut group = c.benchmark_group("css");

    for size in [10, 100, 1000].iter() {
        let sheet = make_stylesheet(*size);
        group.throughput(Throughput::Bytes(sheet.len() as u64));
        group.bench_with_input(BenchmarkId::new("minify", size), &sheet, |b, sheet| {
            b.iter(|| minify_css(black_box(sheet), "bench.css").unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_discovery, bench_pipeline, bench_html, bench_css);

criterion_main!(benches);
