//! End-to-end flows over the store and persistence layer:
//! mutate → snapshot → restore → verify.

use stranded_core::config::{PersistenceConfig, StoreConfig};
use stranded_core::persistence::{Autosaver, MemoryArchive, bootstrap};
use stranded_core::store::MemoryStore;
use stranded_core::types::MemoryFact;

#[test]
fn bandit_witness_scenario() {
    let mut store = MemoryStore::new(StoreConfig::default());

    // bandit_01 starts with no facts.
    assert!(store.get("bandit_01").is_none());

    store.add_fact(
        "bandit_01",
        MemoryFact::new("saw_bandit", "player_defeated_bandit", 9),
    );
    store.adjust_relationship("bandit_01", 1);

    let mem = store.get("bandit_01").expect("record created lazily");
    assert_eq!(mem.relationship, 1);
    assert_eq!(mem.known_facts.len(), 1);
    assert_eq!(mem.known_facts[0].key, "saw_bandit");
    assert_eq!(mem.known_facts[0].value, "player_defeated_bandit");
}

#[test]
fn full_session_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = MemoryArchive::new(dir.path().join("npc_memories.json"));

    // A short play session.
    let mut store = MemoryStore::new(StoreConfig::default());
    store.get_or_create_with("merchant_01", "worried about his cargo", "merchant");
    store.get_or_create_with("mercenary_01", "laconic sellsword", "guard");
    store.add_fact("merchant_01", MemoryFact::new("gave_axle_pin", "player_gave_axle_pin", 9));
    store.adjust_relationship("merchant_01", 2);
    store.set_role_state("merchant_01", "grateful");
    store.set_goal("merchant_01", "get the cart moving before dawn");
    store.add_convo_line("merchant_01", "NPC: Thanks for the pin.");
    store.record_interaction("merchant_01");

    let saver = Autosaver::new(&PersistenceConfig::default());
    saver.save_now(&store, &archive);

    // Next session, no reset.
    let config = PersistenceConfig {
        reset_on_start: false,
        ..PersistenceConfig::default()
    };
    let mut restored = MemoryStore::new(StoreConfig::default());
    bootstrap(&mut restored, &archive, &config);

    assert_eq!(restored.len(), 2);
    let merchant = restored.get("merchant_01").expect("merchant");
    assert_eq!(merchant.persona_line, "worried about his cargo");
    assert_eq!(merchant.role_line, "merchant");
    assert_eq!(merchant.relationship, 2);
    assert_eq!(merchant.role_state, "grateful");
    assert_eq!(merchant.goal, "get the cart moving before dawn");
    assert_eq!(merchant.consecutive_interactions, 1);
    assert!(merchant.has_fact("gave_axle_pin"));
    assert!(!merchant.short_summary.is_empty());

    // Derived views survive the trip.
    let snippet = restored.prompt_snippet("merchant_01");
    assert!(snippet.contains("NPC:merchant_01"));
    assert!(snippet.contains("TopFact: player_gave_axle_pin"));
}

#[test]
fn relationship_sequence_clamps_at_boundary() {
    let mut store = MemoryStore::new(StoreConfig::default());
    store.adjust_relationship("npc", 4);
    store.adjust_relationship("npc", 5);
    store.adjust_relationship("npc", -1);
    // 4 → clamp(9)=5 → 4, never 8 → 7.
    assert_eq!(store.get("npc").expect("record").relationship, 4);
}

#[test]
fn broadcast_style_fanout_reaches_every_npc() {
    let mut store = MemoryStore::new(StoreConfig::default());
    store.get_or_create("merchant_01");
    store.get_or_create("mercenary_01");
    store.get_or_create("bandit_01");

    for id in store.npc_ids() {
        store.add_fact(&id, MemoryFact::new("weather", "rain", 1));
    }

    for id in store.npc_ids() {
        assert!(store.get(&id).expect("record").has_fact("weather"));
    }
}
