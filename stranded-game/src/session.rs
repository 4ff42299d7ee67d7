//! The interaction session — the one façade the engine code talks to.
//!
//! Owns the memory store, the generation client, the dialogue player, and
//! the event recorder, and exposes the gameplay entry points: discrete
//! events in (`interact`, `bandit_sighted`, `combat_resolved`, repair
//! flow) and dialogue out. The engine drives [`Session::advance`] once per
//! frame; everything long-running is either tick-driven (dialogue, repair,
//! autosave) or a single awaited generation request.
//!
//! Shared state sits behind `parking_lot` mutexes so a host that moves
//! generation onto a runtime thread pool stays sound; locks are never held
//! across an await.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use stranded_core::config::{LlmConfig, StrandedConfig};
use stranded_core::persistence::{Autosaver, MemoryArchive, bootstrap};
use stranded_core::{MemoryFact, MemoryStore, NpcMemory};
use stranded_llm::{GenerationClient, GenerationConfig, PromptContext};

use crate::dialogue::{Dialogue, DialogueDisplay, DialoguePlayer};
use crate::events::EventRecorder;
use crate::fallback;
use crate::world::{RepairJob, WorldState};

/// Seconds an AI-generated line stays on screen.
const AI_LINE_SECS: f32 = 4.0;
/// Seconds a fallback line stays on screen.
const FALLBACK_LINE_SECS: f32 = 3.0;
/// Seconds the bandit's defeat line stays on screen.
const DEFEAT_LINE_SECS: f32 = 3.0;

/// Static description of one scene NPC, registered at scene load.
#[derive(Debug, Clone)]
pub struct NpcProfile {
    /// Stable id, e.g. `"bandit_01"`.
    pub npc_id: String,
    /// Name shown as the dialogue speaker.
    pub display_name: String,
    /// Persona flavor handed to the memory record (first write wins).
    pub persona_line: String,
    /// Role flavor handed to the memory record (first write wins).
    pub role_line: String,
    /// Whether this NPC starts out holding the axle pin.
    pub has_axle_pin: bool,
}

/// One resolved NPC reply.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Display name of the speaker.
    pub speaker: String,
    /// The spoken line.
    pub text: String,
    /// Whether it came from the model (`false` = rule-based fallback).
    pub generated: bool,
}

/// The running game session.
pub struct Session {
    store: Mutex<MemoryStore>,
    archive: MemoryArchive,
    autosaver: Mutex<Autosaver>,
    player: Mutex<DialoguePlayer>,
    display: Mutex<Box<dyn DialogueDisplay + Send>>,
    client: GenerationClient,
    recorder: Mutex<EventRecorder>,
    world: Mutex<WorldState>,
    profiles: Mutex<HashMap<String, NpcProfile>>,
    intent_seq: AtomicU64,
    current_intent: Mutex<Option<(String, u64)>>,
}

fn generation_config(llm: &LlmConfig) -> GenerationConfig {
    GenerationConfig {
        model: llm.model.clone(),
        api_key: llm.api_key.clone(),
        base_url: llm.base_url.clone(),
        temperature: llm.temperature,
        max_tokens: llm.max_tokens,
        timeout: Duration::from_secs(llm.timeout_secs),
        chat_payload: llm.chat_payload,
    }
}

impl Session {
    /// Build a session: open the save blob under `data_dir`, bootstrap the
    /// store (honoring `reset_on_start`), and wire up the client.
    #[must_use]
    pub fn new(
        config: StrandedConfig,
        data_dir: &Path,
        display: Box<dyn DialogueDisplay + Send>,
    ) -> Self {
        let archive = MemoryArchive::new(data_dir.join(&config.persistence.save_file));
        let mut store = MemoryStore::new(config.store);
        bootstrap(&mut store, &archive, &config.persistence);

        Self {
            store: Mutex::new(store),
            autosaver: Mutex::new(Autosaver::new(&config.persistence)),
            archive,
            player: Mutex::new(DialoguePlayer::new()),
            display: Mutex::new(display),
            client: GenerationClient::new(generation_config(&config.llm)),
            recorder: Mutex::new(EventRecorder::new()),
            world: Mutex::new(WorldState::new()),
            profiles: Mutex::new(HashMap::new()),
            intent_seq: AtomicU64::new(0),
            current_intent: Mutex::new(None),
        }
    }

    /// Whether the generation client has an API key.
    #[must_use]
    pub fn is_generation_configured(&self) -> bool {
        self.client.is_configured()
    }

    // ------------------------------------------------------------------
    // Scene setup
    // ------------------------------------------------------------------

    /// Register a scene NPC; creates its memory record with persona/role.
    pub fn register_npc(&self, profile: NpcProfile) {
        let mut store = self.store.lock();
        store.get_or_create_with(&profile.npc_id, &profile.persona_line, &profile.role_line);
        self.profiles
            .lock()
            .insert(profile.npc_id.clone(), profile);
    }

    /// Persona-entry screen path: overwrite an NPC's persona line.
    pub fn set_persona_line(&self, npc_id: &str, persona: &str) {
        self.store.lock().set_persona_line(npc_id, persona);
        if let Some(profile) = self.profiles.lock().get_mut(npc_id) {
            profile.persona_line = persona.to_string();
        }
    }

    // ------------------------------------------------------------------
    // Memory surface
    // ------------------------------------------------------------------

    /// Record a fact on an NPC.
    pub fn record_fact(&self, npc_id: &str, fact: MemoryFact) {
        self.store.lock().add_fact(npc_id, fact);
    }

    /// Clamped relationship adjustment.
    pub fn adjust_relationship(&self, npc_id: &str, delta: i32) {
        self.store.lock().adjust_relationship(npc_id, delta);
    }

    /// Zero every NPC's consecutive-interaction counter.
    pub fn reset_interaction_counters(&self) {
        self.store.lock().reset_all_interaction_counters();
    }

    /// Cloned view of one NPC's memory record.
    #[must_use]
    pub fn memory_of(&self, npc_id: &str) -> Option<NpcMemory> {
        self.store.lock().get(npc_id).cloned()
    }

    /// Cloned view of the scenario state.
    #[must_use]
    pub fn world_snapshot(&self) -> WorldState {
        self.world.lock().clone()
    }

    // ------------------------------------------------------------------
    // Interaction
    // ------------------------------------------------------------------

    /// The player talked to an NPC.
    ///
    /// Counts the interaction, asks the generation client for a reply
    /// (falling back to the rule-based line on any failure), sequences the
    /// reply for display, and returns it. A reply that arrives after a
    /// newer interaction intent (or after the NPC left range) is returned
    /// but not played — last response wins.
    pub async fn interact(&self, npc_id: &str, player_action: &str) -> Utterance {
        let seq = self.intent_seq.fetch_add(1, Ordering::SeqCst) + 1;
        *self.current_intent.lock() = Some((npc_id.to_string(), seq));

        let profile = self.profiles.lock().get(npc_id).cloned();
        let display_name = profile
            .as_ref()
            .map_or_else(|| npc_id.to_string(), |p| p.display_name.clone());

        {
            let mut store = self.store.lock();
            if let Some(p) = &profile {
                store.get_or_create_with(npc_id, &p.persona_line, &p.role_line);
            }
            let times = store.record_interaction(npc_id);
            store.add_convo_line(npc_id, "Player: interacted (greeting)");
            if profile.as_ref().is_some_and(|p| p.has_axle_pin) {
                store.add_fact(npc_id, MemoryFact::new("has_axle_pin", "true", 8));
            }
            debug!(npc = %npc_id, times, "player interaction");
        }

        let ctx = self.prompt_context(npc_id, player_action);
        let (text, generated, secs) = match self.client.generate_reply(&ctx).await {
            Ok(reply) => (reply, true, AI_LINE_SECS),
            Err(e) => {
                warn!(npc = %npc_id, error = %e, "generation unavailable, using fallback line");
                let store = self.store.lock();
                let text = store
                    .get(npc_id)
                    .map_or_else(|| "They nod.".to_string(), |m| {
                        fallback::reply_from_memory(m, player_action)
                    });
                (text, false, FALLBACK_LINE_SECS)
            }
        };

        self.store
            .lock()
            .add_convo_line(npc_id, &format!("NPC: {text}"));

        let still_current = {
            let intent = self.current_intent.lock();
            matches!(intent.as_ref(), Some((id, s)) if id == npc_id && *s == seq)
        };
        if still_current {
            self.play_dialogue(npc_id, Dialogue::single(&display_name, &text, secs));
        } else {
            debug!(npc = %npc_id, "stale generation result discarded");
        }

        Utterance {
            speaker: display_name,
            text,
            generated,
        }
    }

    /// Play an arbitrary dialogue attributed to an NPC.
    pub fn play_dialogue(&self, npc_id: &str, dialogue: Dialogue) {
        let mut player = self.player.lock();
        let mut display = self.display.lock();
        player.play(npc_id, dialogue, display.as_mut());
    }

    /// Cancel any in-flight dialogue.
    pub fn stop_dialogue(&self) {
        let mut player = self.player.lock();
        let mut display = self.display.lock();
        player.stop(display.as_mut());
        *self.current_intent.lock() = None;
    }

    /// The player walked away from an NPC: stop its dialogue if it is the
    /// current speaker, and drop any pending reply intent for it.
    pub fn npc_out_of_range(&self, npc_id: &str) {
        {
            let mut player = self.player.lock();
            let mut display = self.display.lock();
            player.stop_if_current_speaker(npc_id, display.as_mut());
        }
        let mut intent = self.current_intent.lock();
        if matches!(intent.as_ref(), Some((id, _)) if id == npc_id) {
            *intent = None;
        }
    }

    /// The NPC currently speaking, if any.
    #[must_use]
    pub fn current_speaker(&self) -> Option<String> {
        self.player.lock().current_speaker().map(str::to_string)
    }

    // ------------------------------------------------------------------
    // Story beats
    // ------------------------------------------------------------------

    /// The bandit was spotted: broadcast witness facts (latched to once
    /// per encounter). Returns whether anything was recorded.
    pub fn bandit_sighted(&self) -> bool {
        let mut store = self.store.lock();
        self.recorder.lock().record_bandit_witnesses(&mut store)
    }

    /// Combat against the bandit resolved. On success the axle pin
    /// transfers to the player, every counter resets, and the bandit gets
    /// a defeat line (AI-generated, with a canned fallback).
    pub async fn combat_resolved(&self, bandit_id: &str, success: bool) -> Option<Utterance> {
        if !success {
            debug!(npc = %bandit_id, "attack failed, the bandit escapes");
            return None;
        }

        {
            let mut store = self.store.lock();
            let recorder = self.recorder.lock();
            recorder.record_axle_pin_taken(&mut store, bandit_id);
            store.reset_all_interaction_counters();
        }
        self.world.lock().player_has_axle_pin = true;
        if let Some(p) = self.profiles.lock().get_mut(bandit_id) {
            p.has_axle_pin = false;
        }

        let display_name = self
            .profiles
            .lock()
            .get(bandit_id)
            .map_or_else(|| bandit_id.to_string(), |p| p.display_name.clone());

        let action = "You just lost a combat against the player, who takes the axle pin.";
        let ctx = self.prompt_context(bandit_id, action);
        let (text, generated) = match self.client.generate_reply(&ctx).await {
            Ok(reply) => (reply, true),
            Err(e) => {
                warn!(npc = %bandit_id, error = %e, "defeat line generation failed");
                ("Tch... you got lucky this time!".to_string(), false)
            }
        };

        self.play_dialogue(
            bandit_id,
            Dialogue::single(&display_name, &text, DEFEAT_LINE_SECS),
        );
        Some(Utterance {
            speaker: display_name,
            text,
            generated,
        })
    }

    /// Hand the axle pin to an NPC. Returns `false` if the player doesn't
    /// hold it.
    pub fn give_pin_to(&self, npc_id: &str) -> bool {
        let mut store = self.store.lock();
        let mut world = self.world.lock();
        if !world.player_has_axle_pin {
            return false;
        }
        world.player_has_axle_pin = false;
        self.recorder.lock().record_axle_pin_given(&mut store, npc_id);
        true
    }

    /// Try to begin the carriage repair (requires and consumes the pin).
    /// The host drives the returned job and calls
    /// [`Session::complete_repair`] when it finishes.
    #[must_use]
    pub fn start_repair(&self, duration: Duration) -> Option<RepairJob> {
        self.world.lock().start_repair(duration)
    }

    /// The repair finished: record the story beat for every NPC.
    pub fn complete_repair(&self) {
        let mut store = self.store.lock();
        let mut world = self.world.lock();
        let recorder = self.recorder.lock();
        world.finish_repair(&mut store, &recorder);
    }

    /// Advance the repair stage counter and broadcast it to the camp.
    pub fn update_repair_progress(&self, progress: u32) {
        let mut store = self.store.lock();
        self.world.lock().update_repair_progress(&mut store, progress);
    }

    /// Change the weather and broadcast it to the camp.
    pub fn set_weather(&self, weather: &str) {
        let mut store = self.store.lock();
        self.world.lock().set_weather(&mut store, weather);
    }

    // ------------------------------------------------------------------
    // Frame tick & persistence
    // ------------------------------------------------------------------

    /// Per-frame tick: advances dialogue playback and the autosave timer.
    pub fn advance(&self, dt: Duration) {
        {
            let mut player = self.player.lock();
            let mut display = self.display.lock();
            player.advance(dt, display.as_mut());
        }
        let store = self.store.lock();
        self.autosaver.lock().tick(dt, &store, &self.archive);
    }

    /// Save the store immediately (shutdown path).
    pub fn save_now(&self) {
        let store = self.store.lock();
        self.autosaver.lock().save_now(&store, &self.archive);
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Extract everything the prompt builder needs for one NPC.
    fn prompt_context(&self, npc_id: &str, player_action: &str) -> PromptContext {
        let store = self.store.lock();
        let snippet = store.prompt_snippet(npc_id);
        store.get(npc_id).map_or_else(
            || PromptContext {
                npc_id: npc_id.to_string(),
                player_action: player_action.to_string(),
                ..PromptContext::default()
            },
            |mem| PromptContext {
                npc_id: npc_id.to_string(),
                persona: mem.persona_line.clone(),
                role: mem.role_line.clone(),
                memory_snippet: snippet.clone(),
                player_action: player_action.to_string(),
                times_talked: mem.consecutive_interactions,
                carriage_repaired: mem.has_fact("carriage_repaired"),
                gave_axle_pin: mem.has_fact("gave_axle_pin"),
                saw_bandit: mem.has_fact("saw_bandit"),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::NullDisplay;

    fn test_session(dir: &Path) -> Session {
        // Default config: no API key, so every interaction takes the
        // fallback path without touching the network.
        let session = Session::new(StrandedConfig::default(), dir, Box::new(NullDisplay));
        session.register_npc(NpcProfile {
            npc_id: "merchant_01".to_string(),
            display_name: "Merchant".to_string(),
            persona_line: "A tired merchant who has seen too many roads.".to_string(),
            role_line: "merchant".to_string(),
            has_axle_pin: false,
        });
        session.register_npc(NpcProfile {
            npc_id: "mercenary_01".to_string(),
            display_name: "Mercenary".to_string(),
            persona_line: "Laconic sellsword.".to_string(),
            role_line: "guard".to_string(),
            has_axle_pin: false,
        });
        session.register_npc(NpcProfile {
            npc_id: "bandit_01".to_string(),
            display_name: "Bandit".to_string(),
            persona_line: "Twitchy and defensive.".to_string(),
            role_line: "bandit".to_string(),
            has_axle_pin: true,
        });
        session
    }

    #[tokio::test]
    async fn interact_without_key_falls_back_and_plays() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = test_session(dir.path());
        assert!(!session.is_generation_configured());

        let utterance = session.interact("merchant_01", "").await;

        assert!(!utterance.generated);
        assert_eq!(utterance.speaker, "Merchant");
        assert_eq!(utterance.text, "A tired merchant who has seen too many roads.");

        let mem = session.memory_of("merchant_01").expect("record");
        assert_eq!(mem.consecutive_interactions, 1);
        assert_eq!(mem.convo_log.len(), 2, "player line + npc line");
        assert_eq!(session.current_speaker().as_deref(), Some("merchant_01"));
    }

    #[tokio::test]
    async fn repeated_interactions_accumulate_annoyance() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = test_session(dir.path());

        session.interact("merchant_01", "").await;
        session.interact("merchant_01", "").await;
        session.interact("merchant_01", "").await;

        let mem = session.memory_of("merchant_01").expect("record");
        assert_eq!(mem.consecutive_interactions, 3);
    }

    #[tokio::test]
    async fn interacting_with_pin_holder_records_the_fact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = test_session(dir.path());

        session.interact("bandit_01", "").await;

        let mem = session.memory_of("bandit_01").expect("record");
        let pin = mem
            .known_facts
            .iter()
            .find(|f| f.key == "has_axle_pin")
            .expect("fact");
        assert_eq!(pin.value, "true");
        assert_eq!(pin.importance, 8);
    }

    #[tokio::test]
    async fn bandit_defeat_transfers_pin_and_resets_counters() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = test_session(dir.path());

        session.interact("merchant_01", "").await;
        session.interact("merchant_01", "").await;

        let utterance = session
            .combat_resolved("bandit_01", true)
            .await
            .expect("defeat line");
        assert!(!utterance.generated);
        assert_eq!(utterance.text, "Tch... you got lucky this time!");

        assert!(session.world_snapshot().player_has_axle_pin);
        let bandit = session.memory_of("bandit_01").expect("record");
        assert_eq!(bandit.relationship, -1);
        assert!(bandit.has_fact("gave_axle_pin"));
        let merchant = session.memory_of("merchant_01").expect("record");
        assert_eq!(merchant.consecutive_interactions, 0, "story beat resets annoyance");
    }

    #[tokio::test]
    async fn failed_attack_changes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = test_session(dir.path());

        assert!(session.combat_resolved("bandit_01", false).await.is_none());
        assert!(!session.world_snapshot().player_has_axle_pin);
    }

    #[tokio::test]
    async fn repair_flow_records_beat_for_everyone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = test_session(dir.path());

        session.combat_resolved("bandit_01", true).await;
        let mut job = session
            .start_repair(Duration::from_secs_f32(1.5))
            .expect("pin in hand");
        assert!(job.advance(Duration::from_secs(2)));
        session.complete_repair();

        assert!(session.world_snapshot().carriage_repaired);
        let merchant = session.memory_of("merchant_01").expect("record");
        assert!(merchant.has_fact("carriage_repaired"));

        // A follow-up chat now takes the "repair" fallback branch.
        let utterance = session.interact("merchant_01", "finished the repair").await;
        assert!(
            utterance.text == "Good work. We're one step closer."
                || utterance.text == "You're fixing it? Well, do it proper."
        );
    }

    #[tokio::test]
    async fn bandit_sighting_is_latched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = test_session(dir.path());

        assert!(session.bandit_sighted());
        assert!(!session.bandit_sighted());

        let merchant = session.memory_of("merchant_01").expect("record");
        assert!(merchant.has_fact("saw_bandit"));
        assert_eq!(merchant.relationship, 1);

        // The sighting now dominates fallback replies.
        let utterance = session.interact("merchant_01", "").await;
        assert_eq!(utterance.text, "Stay by the fire. I saw someone in the trees.");
    }

    #[tokio::test]
    async fn walking_away_stops_dialogue_and_drops_intent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = test_session(dir.path());

        session.interact("merchant_01", "").await;
        assert_eq!(session.current_speaker().as_deref(), Some("merchant_01"));

        session.npc_out_of_range("merchant_01");
        assert!(session.current_speaker().is_none());
    }

    #[tokio::test]
    async fn session_state_survives_restart_without_reset() {
        let dir = tempfile::tempdir().expect("tempdir");

        let config = StrandedConfig {
            persistence: stranded_core::config::PersistenceConfig {
                reset_on_start: false,
                ..Default::default()
            },
            ..Default::default()
        };

        {
            let session = Session::new(config.clone(), dir.path(), Box::new(NullDisplay));
            session.register_npc(NpcProfile {
                npc_id: "merchant_01".to_string(),
                display_name: "Merchant".to_string(),
                persona_line: "persona".to_string(),
                role_line: "merchant".to_string(),
                has_axle_pin: false,
            });
            session.record_fact("merchant_01", MemoryFact::new("gave_axle_pin", "player_gave_axle_pin", 9));
            session.adjust_relationship("merchant_01", 2);
            session.save_now();
        }

        let restored = Session::new(config, dir.path(), Box::new(NullDisplay));
        let mem = restored.memory_of("merchant_01").expect("restored record");
        assert_eq!(mem.relationship, 2);
        assert!(mem.has_fact("gave_axle_pin"));
    }
}
