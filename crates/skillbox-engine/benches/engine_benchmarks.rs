#![allow(missing_docs)]
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use skillbox_engine::manifest::{parse_manifest, split_front_matter};
use std::path::Path;

const MANIFEST: &str = r#"---
name: Api Development
description: Guides the design and review of HTTP APIs
triggers: [api, rest, endpoint, openapi]
version: 1.4.2
author: platform-team
---

# API Development

## Protocol
1. Sketch the resource model
2. Review error envelopes
3. Validate pagination and filtering
"#;

fn bench_parse_manifest(c: &mut Criterion) {
    c.bench_function("parse_manifest", |b| {
        b.iter(|| {
            parse_manifest(
                black_box("api-development"),
                Path::new("/skills/api-development"),
                black_box(MANIFEST),
            )
        });
    });
}

fn bench_split_front_matter(c: &mut Criterion) {
    c.bench_function("split_front_matter", |b| {
        b.iter(|| split_front_matter(black_box(MANIFEST)));
    });
}

fn bench_search_match(c: &mut Criterion) {
    let meta = parse_manifest("api-development", Path::new("/s/api-development"), MANIFEST);
    c.bench_function("metadata_matches", |b| {
        b.iter(|| meta.matches(black_box("openapi")));
    });
}

criterion_group!(
    benches,
    bench_parse_manifest,
    bench_split_front_matter,
    bench_search_match
);
criterion_main!(benches);
