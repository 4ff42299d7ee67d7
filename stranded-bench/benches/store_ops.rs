//! Store and prompt hot-path benchmarks.
//!
//! Everything here runs on the game thread every time the player pokes an
//! NPC, so the targets are tight:
//!   fact_upsert ............ < 10μs
//!   fact_insert_with_prune . < 10μs
//!   prompt_snippet ......... < 20μs
//!   build_user_prompt ...... < 50μs

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use stranded_core::config::StoreConfig;
use stranded_core::store::MemoryStore;
use stranded_core::types::MemoryFact;
use stranded_llm::prompt::{PromptContext, build_user_prompt};

fn populated_store() -> MemoryStore {
    let mut store = MemoryStore::new(StoreConfig::default());
    store.get_or_create_with(
        "merchant_01",
        "A tired merchant who has seen too many roads.",
        "Owns the broken carriage.",
    );
    store.set_goal("merchant_01", "get the cart moving before dawn");
    for i in 0..6 {
        store.add_fact(
            "merchant_01",
            MemoryFact::new(format!("fact_{i}"), format!("something happened {i}"), 5),
        );
    }
    store
}

/// Benchmark: upserting an existing fact key.
fn bench_fact_upsert(c: &mut Criterion) {
    let mut store = populated_store();
    c.bench_function("fact_upsert", |b| {
        b.iter(|| {
            store.add_fact(
                black_box("merchant_01"),
                MemoryFact::new("fact_3", "updated value", 7),
            );
        });
    });
}

/// Benchmark: inserting a fresh key into a full fact list (forces the
/// rank-and-prune path).
fn bench_fact_insert_with_prune(c: &mut Criterion) {
    let mut store = populated_store();
    let mut n = 0u32;
    c.bench_function("fact_insert_with_prune", |b| {
        b.iter(|| {
            n += 1;
            store.add_fact(
                black_box("merchant_01"),
                MemoryFact::new(format!("new_{n}"), "fresh", 6),
            );
        });
    });
}

/// Benchmark: rendering the prompt snippet.
fn bench_prompt_snippet(c: &mut Criterion) {
    let store = populated_store();
    c.bench_function("prompt_snippet", |b| {
        b.iter(|| {
            let snippet = store.prompt_snippet(black_box("merchant_01"));
            black_box(snippet);
        });
    });
}

/// Benchmark: assembling the full user prompt.
fn bench_build_user_prompt(c: &mut Criterion) {
    let store = populated_store();
    let ctx = PromptContext {
        npc_id: "merchant_01".to_string(),
        persona: "A tired merchant who has seen too many roads.".to_string(),
        role: "Owns the broken carriage.".to_string(),
        memory_snippet: store.prompt_snippet("merchant_01"),
        player_action: "asked about the carriage".to_string(),
        times_talked: 4,
        carriage_repaired: false,
        gave_axle_pin: true,
        saw_bandit: true,
    };
    c.bench_function("build_user_prompt", |b| {
        b.iter(|| {
            let prompt = build_user_prompt(black_box(&ctx));
            black_box(prompt);
        });
    });
}

criterion_group!(
    benches,
    bench_fact_upsert,
    bench_fact_insert_with_prune,
    bench_prompt_snippet,
    bench_build_user_prompt
);
criterion_main!(benches);
