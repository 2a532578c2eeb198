use crate::coords::{Duration, PlayerNumber};
use serde::{Deserialize, Serialize};

/// Simulation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Game time advanced by one tick, in milliseconds.
    pub tick_ms: Duration,

    /// Compute checksum every N ticks (0 = disabled).
    pub checksum_frequency: u32,

    /// Flush ware counters into the statistics series every N ticks
    /// (0 = never).
    pub statistics_interval: u32,

    /// Samples kept per ware. `None` keeps the whole history.
    pub statistics_retention: Option<usize>,

    /// Radius searched for own military sites when attacking.
    pub attack_search_radius: u32,

    /// Game time an attacker needs per step of distance.
    pub attack_step_ms: Duration,

    /// Interval between construction follow-ups.
    pub construction_step_ms: Duration,

    /// Progress made per construction follow-up, in percent.
    pub construction_step_percent: u8,

    /// Length of one work cycle of a production site.
    pub production_cycle_ms: Duration,

    /// Play a sound when a message arrives for the interactive player.
    pub sound_at_message: bool,

    /// Player watching the game locally (0 = nobody).
    pub interactive_player: PlayerNumber,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            checksum_frequency: 30,
            statistics_interval: 30,
            statistics_retention: None,
            attack_search_radius: 25,
            attack_step_ms: 1800,
            construction_step_ms: 5000,
            construction_step_percent: 20,
            production_cycle_ms: 30000,
            sound_at_message: true,
            interactive_player: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.checksum_frequency, 30);
        assert_eq!(config.attack_search_radius, 25);
        assert_eq!(config.statistics_retention, None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SimConfig =
            serde_json::from_str(r#"{ "statistics_retention": 12, "sound_at_message": false }"#)
                .unwrap();
        assert_eq!(config.statistics_retention, Some(12));
        assert!(!config.sound_at_message);
        assert_eq!(config.tick_ms, 1000);
    }
}
