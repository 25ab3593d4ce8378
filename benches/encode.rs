//! Form encoding benchmark suite.
//!
//! The poll body is re-encoded on every tick, so encoding cost scales
//! with the number of subscribed channels and listened events.
//!
//! Run with: cargo bench --bench encode
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use pollcast::util::{FormMap, FormValue, url_encode_object};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const CHANNEL_COUNTS: &[usize] = &[1, 16, 128];
const EVENTS_PER_CHANNEL: usize = 4;

// ============================================================================
// Body Construction
// ============================================================================

fn poll_body(channels: usize) -> FormMap {
    let mut channel_map = FormMap::new();
    for c in 0..channels {
        let events = (0..EVENTS_PER_CHANNEL)
            .map(|e| FormValue::text(format!("App\\Events\\Event{e}")))
            .collect();
        channel_map.insert(format!("presence-room-{c}"), FormValue::List(events));
    }

    let mut body = FormMap::new();
    body.insert("time".to_string(), FormValue::text("2021-06-22 00:00:00"));
    body.insert("channels".to_string(), FormValue::Map(channel_map));

    body
}

fn publish_body() -> FormMap {
    let data = serde_json::json!({
        "message": "a moderately sized chat message body",
        "sender": {"id": 42, "name": "jo"},
        "tags": ["one", "two", "three"],
    });

    let mut body = FormMap::new();
    body.insert("channel_name".to_string(), FormValue::text("private-chat"));
    body.insert("event".to_string(), FormValue::text("client-message"));
    body.insert("data".to_string(), FormValue::from_json(&data));

    body
}

// ============================================================================
// Benchmark: Poll Body Encoding
// ============================================================================

fn bench_poll_body(c: &mut Criterion) {
    let mut group = c.benchmark_group("poll_body");

    for &count in CHANNEL_COUNTS {
        let body = poll_body(count);
        group.bench_with_input(BenchmarkId::new("channels", count), &body, |b, body| {
            b.iter(|| url_encode_object(black_box(body)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Publish Body Encoding
// ============================================================================

fn bench_publish_body(c: &mut Criterion) {
    let body = publish_body();

    c.bench_function("publish_body", |b| {
        b.iter(|| url_encode_object(black_box(&body)));
    });
}

criterion_group!(benches, bench_poll_body, bench_publish_body);
criterion_main!(benches);
