//! Prompt construction for NPC replies.
//!
//! The user prompt is assembled in a fixed section order — world state,
//! identity, memory, player action, annoyance shaping, closing
//! instructions — and the exact wording of each section is contractual:
//! the fallback tests and the tone of the whole scenario depend on it.

/// Fixed system instruction framing every request.
pub const SYSTEM_PROMPT: &str = "You are an NPC in a small survival scenario. \
A merchant's cart is broken; the player and mercenary are \
stranded until the axle pin is recovered from a nearby bandit. \
Always reply in natural dialogue as if you were the character. \
No quotation marks. No narration. No book-style writing.";

/// Everything the prompt builder needs about one NPC, pre-extracted from
/// the memory store by the game layer.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    /// Stable NPC id, e.g. `"merchant_01"`.
    pub npc_id: String,
    /// Persona flavor line; empty to omit.
    pub persona: String,
    /// Role flavor line; empty to omit.
    pub role: String,
    /// Multi-line memory snippet from the store; empty to omit.
    pub memory_snippet: String,
    /// Free-text description of the player's latest action; empty to omit.
    pub player_action: String,
    /// Consecutive interactions without an intervening story beat.
    pub times_talked: u32,
    /// The carriage has been repaired.
    pub carriage_repaired: bool,
    /// The axle pin changed hands (the `gave_axle_pin` fact exists).
    pub gave_axle_pin: bool,
    /// Someone spotted the bandit.
    pub saw_bandit: bool,
}

/// Mood descriptor for the annoyance section, keyed on the consecutive
/// interaction count. Only meaningful for counts >= 2.
#[must_use]
pub fn mood_descriptor(times_talked: u32) -> &'static str {
    match times_talked {
        2 => "slightly puzzled the player already came back.",
        3 => "a bit impatient from repeated questions.",
        4 => "visibly annoyed by the repeated interruptions.",
        _ => "very irritated after being spoken to so many times in a row.",
    }
}

/// Build the user prompt for one interaction.
#[must_use]
pub fn build_user_prompt(ctx: &PromptContext) -> String {
    let mut out = String::new();

    // World state derived from fact presence. Repaired/broken are mutually
    // exclusive and exhaustive; the other two lines appear when known.
    out.push_str("World State:\n");
    if ctx.carriage_repaired {
        out.push_str("- The carriage has already been repaired.\n");
    } else {
        out.push_str("- The carriage is still broken.\n");
    }
    if ctx.gave_axle_pin {
        out.push_str("- The player holds the axle pin needed to repair the carriage.\n");
    }
    if ctx.saw_bandit {
        out.push_str("- Someone spotted a bandit earlier.\n");
    }

    // Identity.
    out.push_str(&format!("You are an NPC (id:{}).\n", ctx.npc_id));
    if !ctx.persona.is_empty() {
        out.push_str(&format!("Personality: {}\n", ctx.persona));
    }
    if !ctx.role.is_empty() {
        out.push_str(&format!("Role: {}\n", ctx.role));
    }

    // Memory.
    if !ctx.memory_snippet.is_empty() {
        out.push_str(&format!("Memory: {}\n", ctx.memory_snippet));
    }

    // Player action.
    if !ctx.player_action.is_empty() {
        out.push_str(&format!("Recent player action: {}\n", ctx.player_action));
    }

    // Annoyance shaping.
    if ctx.times_talked >= 2 {
        out.push_str(&format!(
            "The player has spoken to you {} time(s) in a row.\n",
            ctx.times_talked
        ));
        out.push_str(&format!(
            "Your tone should reflect that you are {} \
             But you still respond based on the current situation and world events.\n",
            mood_descriptor(ctx.times_talked)
        ));
    }

    out.push_str(
        "Your answer MUST strongly reflect your personality, your role, and the exact \
         current world situation, even if it feels exaggerated or caricatural.\n",
    );
    out.push_str(
        "Respond in 1\u{2013}2 short sentences. No narration, no quotation marks\u{2014}just \
         what the NPC says.\n",
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_ctx() -> PromptContext {
        PromptContext {
            npc_id: "merchant_01".to_string(),
            persona: "gruff but fair".to_string(),
            role: "merchant".to_string(),
            memory_snippet: "NPC:merchant_01 | gruff but fair".to_string(),
            player_action: "asked about the cart".to_string(),
            times_talked: 1,
            carriage_repaired: false,
            gave_axle_pin: false,
            saw_bandit: false,
        }
    }

    #[test]
    fn sections_appear_in_contractual_order() {
        let mut ctx = base_ctx();
        ctx.saw_bandit = true;
        ctx.times_talked = 2;
        let prompt = build_user_prompt(&ctx);

        let world = prompt.find("World State:").expect("world");
        let identity = prompt.find("You are an NPC").expect("identity");
        let memory = prompt.find("Memory:").expect("memory");
        let action = prompt.find("Recent player action:").expect("action");
        let annoyance = prompt.find("time(s) in a row").expect("annoyance");
        let closing = prompt.find("Your answer MUST").expect("closing");

        assert!(world < identity);
        assert!(identity < memory);
        assert!(memory < action);
        assert!(action < annoyance);
        assert!(annoyance < closing);
    }

    #[test]
    fn repaired_and_broken_are_mutually_exclusive() {
        let mut ctx = base_ctx();
        let broken = build_user_prompt(&ctx);
        assert!(broken.contains("- The carriage is still broken."));
        assert!(!broken.contains("already been repaired"));

        ctx.carriage_repaired = true;
        let repaired = build_user_prompt(&ctx);
        assert!(repaired.contains("- The carriage has already been repaired."));
        assert!(!repaired.contains("still broken"));
    }

    #[test]
    fn world_lines_follow_fact_flags() {
        let mut ctx = base_ctx();
        ctx.gave_axle_pin = true;
        ctx.saw_bandit = true;
        let prompt = build_user_prompt(&ctx);
        assert!(prompt.contains("- The player holds the axle pin needed to repair the carriage."));
        assert!(prompt.contains("- Someone spotted a bandit earlier."));
    }

    #[test]
    fn annoyance_omitted_below_two_interactions() {
        let prompt = build_user_prompt(&base_ctx());
        assert!(!prompt.contains("time(s) in a row"));
    }

    #[test]
    fn fourth_interaction_uses_exact_mood_phrase() {
        let mut ctx = base_ctx();
        ctx.times_talked = 4;
        let prompt = build_user_prompt(&ctx);
        assert!(prompt.contains("The player has spoken to you 4 time(s) in a row."));
        assert!(prompt.contains("visibly annoyed by the repeated interruptions."));
    }

    #[test]
    fn mood_table_is_fixed() {
        assert_eq!(mood_descriptor(2), "slightly puzzled the player already came back.");
        assert_eq!(mood_descriptor(3), "a bit impatient from repeated questions.");
        assert_eq!(mood_descriptor(4), "visibly annoyed by the repeated interruptions.");
        assert_eq!(
            mood_descriptor(5),
            "very irritated after being spoken to so many times in a row."
        );
        assert_eq!(mood_descriptor(9), mood_descriptor(5));
    }

    #[test]
    fn empty_optional_sections_are_omitted() {
        let ctx = PromptContext {
            npc_id: "bandit_01".to_string(),
            ..PromptContext::default()
        };
        let prompt = build_user_prompt(&ctx);
        assert!(!prompt.contains("Personality:"));
        assert!(!prompt.contains("Role:"));
        assert!(!prompt.contains("Memory:"));
        assert!(!prompt.contains("Recent player action:"));
        assert!(prompt.contains("You are an NPC (id:bandit_01)."));
    }
}
