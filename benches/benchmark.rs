//! Performance benchmarks for rs-fulltext.
//!
//! Run with: `cargo bench`
//!
//! Benchmarks include:
//! - A small synthetic article processed with and without a rule set
//! - Encoding resolution on a legacy-encoded page
//! - Path expression compilation

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rs_fulltext::extractor::NoFallback;
use rs_fulltext::{encoding, path, ExtractionRuleSet, Extractor, Options, PageInput};

const SAMPLE_HTML: &str = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Sample Article</title>
    <meta property="og:title" content="Sample Article Title">
    <meta property="og:image" content="/images/lead.jpg">
    <script type="application/ld+json">
    {"@type": "NewsArticle", "headline": "Sample Article Title", "datePublished": "2024-05-01T08:00:00+02:00", "author": {"name": "John Doe"}}
    </script>
</head>
<body>
    <nav>
        <a href="/">Home</a>
        <a href="/about">About</a>
    </nav>
    <div id="story">
        <h1 class="headline">Sample Article Title</h1>
        <p>This is the first paragraph of the article. It contains some meaningful
        content that should be extracted by the rules.</p>
        <div class="share">Share this</div>
        <p>Here is a second paragraph with more content and a <a href="related">link</a>.</p>
        <img src="/img/blank.gif" data-src="/img/photo.jpg" alt="Photo">
        <p>A third paragraph ensures we have enough content for meaningful
        benchmarking of the extraction performance.</p>
    </div>
    <a rel="next" href="?page=2">Next</a>
    <footer>
        <p>Copyright 2024</p>
    </footer>
</body>
</html>
"#;

fn sample_rules() -> ExtractionRuleSet {
    ExtractionRuleSet {
        title: vec!["//h1[@class='headline']".to_string()],
        body: vec!["//div[@id='story']".to_string()],
        strip: vec!["//div[@class='share']".to_string()],
        next_page_link: vec!["//a[@rel='next']".to_string()],
        ..ExtractionRuleSet::default()
    }
}

fn bench_process_with_rules(c: &mut Criterion) {
    let extractor = Extractor::new(Options::default());
    let rules = sample_rules();

    let mut group = c.benchmark_group("process");
    group.throughput(Throughput::Bytes(SAMPLE_HTML.len() as u64));
    group.bench_function("with_rules", |b| {
        b.iter(|| {
            extractor.process_text(
                black_box(SAMPLE_HTML),
                Some("https://example.com/story"),
                Some(black_box(&rules)),
            )
        });
    });
    group.bench_function("metadata_only", |b| {
        let extractor = Extractor::new(Options::default()).with_fallback(NoFallback);
        b.iter(|| extractor.process_text(black_box(SAMPLE_HTML), None, None));
    });
    group.finish();
}

fn bench_process_bytes(c: &mut Criterion) {
    let extractor = Extractor::new(Options::default());
    let rules = sample_rules();
    let bytes = SAMPLE_HTML.replace("UTF-8", "windows-1252").into_bytes();

    c.bench_function("process_bytes", |b| {
        b.iter(|| {
            let input = PageInput {
                bytes: black_box(&bytes),
                content_type: None,
                url: Some("https://example.com/story"),
            };
            extractor.process(&input, Some(&rules))
        });
    });
}

fn bench_encoding_resolve(c: &mut Criterion) {
    let mut bytes = b"<html><head><meta charset=\"iso-8859-1\"></head><body>".to_vec();
    for _ in 0..500 {
        bytes.extend_from_slice(b"<p>Caf\xE9 \x93quoted\x94 text</p>");
    }
    bytes.extend_from_slice(b"</body></html>");
    let options = Options::default();

    c.bench_function("encoding_resolve", |b| {
        b.iter(|| encoding::resolve(black_box(&bytes), None, &options));
    });
}

fn bench_path_compile(c: &mut Criterion) {
    let expressions = [
        "//div[@id='story']",
        "//div[contains(concat(' ',normalize-space(@class),' '),' entry-content ')]//p",
        "//a[@rel='next']/@href | //link[@rel='next']/@href",
        "article.post > div.body::text",
    ];

    c.bench_function("path_compile", |b| {
        b.iter(|| {
            for expr in &expressions {
                let _ = path::compile(black_box(expr));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_process_with_rules,
    bench_process_bytes,
    bench_encoding_resolve,
    bench_path_compile
);
criterion_main!(benches);
