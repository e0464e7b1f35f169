use crate::engine::types::{Color, Difficulty, RuleSet};

/// Application configuration parsed from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// AI level for new games.
    pub difficulty: Difficulty,
    /// Rule variant for new games.
    pub rules: RuleSet,
    /// Seed for the AI's random source; `None` seeds from the OS.
    pub ai_seed: Option<u64>,
    /// Pause before the AI's move is applied, in milliseconds.
    pub ai_delay_ms: u64,
    /// Color the human plays.
    pub player_color: Color,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        AppConfig {
            difficulty: lookup("CHESS_AI_DIFFICULTY")
                .and_then(|v| Difficulty::from_str_loose(&v))
                .unwrap_or(defaults.difficulty),
            rules: lookup("CHESS_RULES")
                .and_then(|v| RuleSet::from_str_loose(v.trim()))
                .unwrap_or(defaults.rules),
            ai_seed: lookup("CHESS_AI_SEED").and_then(|v| v.trim().parse().ok()),
            ai_delay_ms: lookup("CHESS_AI_DELAY_MS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.ai_delay_ms),
            player_color: lookup("CHESS_PLAYER_COLOR")
                .and_then(|v| Color::from_str_loose(v.trim()))
                .unwrap_or(defaults.player_color),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            difficulty: Difficulty::Intermediate,
            rules: RuleSet::Minimal,
            ai_seed: None,
            ai_delay_ms: 1000,
            player_color: Color::White,
        }
    }
}
