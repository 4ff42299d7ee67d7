//! Headless demo: one night at the camp.
//!
//! Drives the full interaction loop without an engine — console display,
//! no API key (set `STRANDED_API_KEY` to hear generated lines instead of
//! the rule-based fallback), scripted beats: talk, spot the bandit, win
//! the fight, repair the carriage, talk again.
//!
//! ```sh
//! RUST_LOG=stranded=debug cargo run --bin campfire
//! ```

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use stranded_core::config::StrandedConfig;
use stranded_game::dialogue::DialogueDisplay;
use stranded_game::session::{NpcProfile, Session};

/// Prints the dialogue panel to stdout.
struct ConsoleDisplay;

impl DialogueDisplay for ConsoleDisplay {
    fn show(&mut self, speaker: &str, text: &str) {
        println!("  [{speaker}] {text}");
    }
    fn hide(&mut self) {}
}

fn profiles() -> Vec<NpcProfile> {
    vec![
        NpcProfile {
            npc_id: "merchant_01".to_string(),
            display_name: "Merchant".to_string(),
            persona_line: "A tired merchant who has seen too many roads.".to_string(),
            role_line: "Owns the broken carriage and everything strapped to it.".to_string(),
            has_axle_pin: false,
        },
        NpcProfile {
            npc_id: "mercenary_01".to_string(),
            display_name: "Mercenary".to_string(),
            persona_line: "Laconic sellsword, paid through to the next town.".to_string(),
            role_line: "Guards the camp.".to_string(),
            has_axle_pin: false,
        },
        NpcProfile {
            npc_id: "bandit_01".to_string(),
            display_name: "Bandit".to_string(),
            persona_line: "Twitchy, defensive, hungrier than he admits.".to_string(),
            role_line: "Took the axle pin off the carriage in the night.".to_string(),
            has_axle_pin: true,
        },
    ]
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut config = StrandedConfig::default();
    if let Ok(key) = std::env::var("STRANDED_API_KEY") {
        config.llm.api_key = key;
    }

    let data_dir = std::env::temp_dir().join("stranded-campfire");
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("cannot create data dir: {e}");
        return;
    }

    let session = Session::new(config, &data_dir, Box::new(ConsoleDisplay));
    for profile in profiles() {
        session.register_npc(profile);
    }
    println!(
        "generation: {}",
        if session.is_generation_configured() {
            "remote model"
        } else {
            "rule-based fallback (no API key)"
        }
    );

    println!("\n-- the player talks to the merchant, twice --");
    session.interact("merchant_01", "").await;
    tick(&session, 4.5);
    session.interact("merchant_01", "asked about the carriage again").await;
    tick(&session, 4.5);

    println!("\n-- a bandit is spotted at the treeline --");
    session.bandit_sighted();
    session.interact("mercenary_01", "").await;
    tick(&session, 4.5);

    println!("\n-- the fight goes the player's way --");
    session.combat_resolved("bandit_01", true).await;
    tick(&session, 3.5);

    println!("\n-- repairing the carriage --");
    if let Some(mut job) = session.start_repair(Duration::from_secs_f32(1.5)) {
        let step = Duration::from_millis(100);
        loop {
            let finished = job.advance(step);
            print!("\r  progress: {:>3.0}%", job.progress() * 100.0);
            if finished {
                println!();
                session.complete_repair();
                break;
            }
        }
    }

    println!("\n-- the camp settles down --");
    session.interact("merchant_01", "finished the repair").await;
    tick(&session, 4.5);

    session.save_now();
    println!("\nsaved to {}", data_dir.display());
}

/// Run the frame loop for `secs` so the current line plays out.
fn tick(session: &Session, secs: f32) {
    let step = Duration::from_millis(50);
    let mut elapsed = Duration::ZERO;
    let total = Duration::from_secs_f32(secs);
    while elapsed < total {
        session.advance(step);
        elapsed += step;
    }
}
