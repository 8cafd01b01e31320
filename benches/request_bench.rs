// Copyright (c) 2026 Bountyy Oy. All rights reserved.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use unihttp::adapter::build_url;
use unihttp::{Params, RequestCache, RequestConfig, ResponseData};

fn sample_params() -> Params {
    json!({
        "page": 2,
        "size": 50,
        "tags": ["rust", "http", "cache"],
        "q": "hello world & more",
        "skip": null
    })
    .as_object()
    .cloned()
    .unwrap_or_default()
}

fn url_building_benchmark(c: &mut Criterion) {
    let config = RequestConfig::new("/users/search")
        .base_url("https://api.example.com/v1/")
        .params(sample_params());

    c.bench_function("build_url", |b| b.iter(|| black_box(build_url(black_box(&config)))));
}

fn cache_key_benchmark(c: &mut Criterion) {
    let params = sample_params();

    c.bench_function("generate_cache_key", |b| {
        b.iter(|| {
            black_box(RequestCache::<ResponseData>::generate_key(
                black_box("https://api.example.com/v1/users/search"),
                Some(black_box(&params)),
            ))
        })
    });
}

criterion_group!(benches, url_building_benchmark, cache_key_benchmark);
criterion_main!(benches);
