//! Benchmarks for keyword matching.
//!
//! Benchmark targets:
//! - Pattern compilation: plain-word and Hangul keywords
//! - Single pattern scan over short and long messages
//! - Full engine pass over 10, 100 and 1,000 subscriptions

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;

use keyword_notifier::matching::{KeywordPattern, MatchContext, MatchEngine};
use keyword_notifier::models::{ChannelId, Subscription, UserId};

// ============================================================================
// Helper Functions
// ============================================================================

/// Keywords mixed across scripts, reused round-robin.
const SAMPLE_KEYWORDS: &[&str] = &[
    "sale", "사과", "raid", "세일", "giveaway", "할인", "release v1.2", "공지", "meetup",
    "이벤트",
];

const SHORT_MESSAGE: &str = "오늘 사과는 반값이에요, big sale today!";

/// Builds a long message by repeating filler around one hit.
fn long_message() -> String {
    let filler = "채팅방에서 아무 이야기나 하는 중입니다 just chatting about nothing ";
    format!("{}마지막으로 이벤트에서부터 시작", filler.repeat(40))
}

/// Builds `count` subscriptions over distinct owners; every third is scoped to channel 1.
fn subscriptions(count: usize) -> Vec<Subscription> {
    (0..count)
        .map(|i| {
            let keyword = SAMPLE_KEYWORDS[i % SAMPLE_KEYWORDS.len()];
            if i % 3 == 0 {
                Subscription::in_channel(UserId::new(i as u64 + 10), keyword, ChannelId::new(1))
            } else {
                Subscription::global(UserId::new(i as u64 + 10), keyword)
            }
        })
        .collect()
}

// ============================================================================
// Pattern Benchmarks
// ============================================================================

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    group.bench_function("plain_word", |b| {
        b.iter(|| KeywordPattern::compile(black_box("giveaway")));
    });
    group.bench_function("agglutinative", |b| {
        b.iter(|| KeywordPattern::compile(black_box("사과")));
    });

    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let long = long_message();
    let mut group = c.benchmark_group("find");

    for keyword in ["sale", "사과", "이벤트"] {
        let pattern = KeywordPattern::compile(keyword);
        group.bench_with_input(BenchmarkId::new("short", keyword), &pattern, |b, p| {
            b.iter(|| p.find(black_box(SHORT_MESSAGE)));
        });
        group.bench_with_input(BenchmarkId::new("long", keyword), &pattern, |b, p| {
            b.iter(|| p.find(black_box(&long)));
        });
    }

    group.finish();
}

// ============================================================================
// Engine Benchmarks
// ============================================================================

fn bench_engine(c: &mut Criterion) {
    let engine = MatchEngine::new();
    let mut group = c.benchmark_group("engine");
    group.measurement_time(Duration::from_secs(10));

    for count in [10usize, 100, 1_000] {
        let subs = subscriptions(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &subs, |b, subs| {
            let ctx = MatchContext {
                author: UserId::new(1),
                channel: ChannelId::new(1),
                text: SHORT_MESSAGE,
            };
            assert!(!engine.evaluate(&ctx, subs).is_empty());
            b.iter(|| engine.evaluate(black_box(&ctx), subs));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compile, bench_find, bench_engine);
criterion_main!(benches);
