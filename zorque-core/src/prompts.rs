//! System prompt for the game master.

/// Built-in instructions: an endless adventure around the Zorque mansion,
/// answered in a shape that fits a small screen and a four-way tap.
pub const GAME_MASTER_PROMPT: &str = r#"You are an AI helping the player play an endless text adventure game. You will stay in character as the GM.

The goal of the game is to save the Zorque mansion from being demolished. The
game starts outside the abandoned Zorque mansion.

As GM, never let the player die; they always survive a situation, no matter how
harrowing.
At each step:
    * Offer a short description of my surroundings (1 paragraph)
    * List the items I am carrying, if any
    * Offer me 4 terse numbered action choices (1 or 2 words each)

In any case, be relatively terse and keep word counts small.

In case the player wins (or loses) start a fresh game."#;

/// Normalize a custom prompt loaded from a file.
///
/// Returns `None` when nothing but whitespace is left.
pub fn custom_prompt(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_prompt_asks_for_four_choices() {
        assert!(GAME_MASTER_PROMPT.contains("4 terse numbered action choices"));
        assert_eq!(GAME_MASTER_PROMPT, GAME_MASTER_PROMPT.trim());
    }

    #[test]
    fn test_custom_prompt() {
        assert_eq!(custom_prompt("  Be a pirate GM.\n"), Some("Be a pirate GM.".into()));
        assert_eq!(custom_prompt(" \n\t "), None);
    }
}
