//! Game Modes and Session Configuration
//!
//! Every tunable the engine reads is collected here, denominated in ticks.
//! Configuration is a read-only input: the engine clamps out-of-range
//! values instead of rejecting them, because a bad config from the host
//! must never take down a live session.

use serde::{Serialize, Deserialize};

use crate::core::fixed::seconds_to_ticks;

/// Game mode tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Fixed-duration solo run.
    Classic,
    /// Untimed solo run, elapsed time accumulates.
    Endless,
    /// Untimed solo run with lives; penalties cost a life.
    Survival,
    /// Competitive last-standing elimination.
    BattleRoyale,
    /// Competitive team scoring with territory capture.
    TeamBattle,
}

impl GameMode {
    /// Whether this mode runs the competitive layers.
    pub fn is_competitive(self) -> bool {
        matches!(self, GameMode::BattleRoyale | GameMode::TeamBattle)
    }

    /// Whether penalty collections consume lives in this mode.
    pub fn uses_lives(self) -> bool {
        matches!(self, GameMode::Survival)
    }

    /// Parse a mode tag from external data.
    ///
    /// Unknown tags fall back to `Classic` - a malformed tag from the sync
    /// boundary must never propagate a failure.
    pub fn parse_tag(tag: &str) -> GameMode {
        match tag {
            "classic" => GameMode::Classic,
            "endless" => GameMode::Endless,
            "survival" => GameMode::Survival,
            "battle_royale" => GameMode::BattleRoyale,
            "team_battle" => GameMode::TeamBattle,
            _ => GameMode::Classic,
        }
    }

    /// Stable tag string for this mode.
    pub fn tag(self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::Endless => "endless",
            GameMode::Survival => "survival",
            GameMode::BattleRoyale => "battle_royale",
            GameMode::TeamBattle => "team_battle",
        }
    }
}

/// Configuration for one session.
///
/// All intervals and lifetimes are tick counts at [`crate::TICK_RATE`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModeConfig {
    /// Game mode.
    pub mode: GameMode,
    /// Session duration in ticks. `None` = untimed (endless/survival).
    pub duration_ticks: Option<u32>,
    /// Starting lives. `None` = mode without lives.
    pub starting_lives: Option<u32>,
    /// Visible-entity cap (collectibles of all categories).
    pub max_entities: usize,
    /// Minimum beneficial collectibles kept on the field.
    pub min_beneficial: usize,
    /// Minimum penalty collectibles kept on the field.
    pub min_penalty: usize,
    /// Elapsed tick after which spawn placement shifts to the far band.
    pub late_band_tick: u32,
    /// Weight (0-100) of the near band before `late_band_tick`.
    pub near_band_weight_early: u32,
    /// Weight (0-100) of the near band after `late_band_tick`.
    pub near_band_weight_late: u32,
    /// Whether the periodic difficulty scale-down runs.
    pub difficulty_scaling: bool,
    /// Combo window in ticks.
    pub combo_window_ticks: u32,
    /// Ticks between power-up spawn attempts.
    pub powerup_spawn_interval_ticks: u32,
    /// Maximum power-ups on the field at once.
    pub max_powerups: usize,
    /// Field lifetime of an uncollected power-up, in ticks.
    pub powerup_field_lifetime_ticks: u32,
    /// Ticks between maintenance (top-up) passes.
    pub maintenance_interval_ticks: u32,
    /// Ticks between expiry-cleanup passes.
    pub cleanup_interval_ticks: u32,
}

impl ModeConfig {
    /// Classic: 60 seconds, no lives.
    pub fn classic() -> Self {
        Self {
            mode: GameMode::Classic,
            duration_ticks: Some(seconds_to_ticks(60)),
            starting_lives: None,
            ..Self::base()
        }
    }

    /// Endless: untimed, no lives.
    pub fn endless() -> Self {
        Self {
            mode: GameMode::Endless,
            duration_ticks: None,
            starting_lives: None,
            ..Self::base()
        }
    }

    /// Survival: untimed, three lives.
    pub fn survival() -> Self {
        Self {
            mode: GameMode::Survival,
            duration_ticks: None,
            starting_lives: Some(3),
            ..Self::base()
        }
    }

    /// Battle Royale: 3 minutes, competitive.
    pub fn battle_royale() -> Self {
        Self {
            mode: GameMode::BattleRoyale,
            duration_ticks: Some(seconds_to_ticks(180)),
            starting_lives: None,
            ..Self::base()
        }
    }

    /// Team Battle: 2 minutes, competitive.
    pub fn team_battle() -> Self {
        Self {
            mode: GameMode::TeamBattle,
            duration_ticks: Some(seconds_to_ticks(120)),
            starting_lives: None,
            ..Self::base()
        }
    }

    /// Shared tuning across modes.
    fn base() -> Self {
        Self {
            mode: GameMode::Classic,
            duration_ticks: Some(seconds_to_ticks(60)),
            starting_lives: None,
            max_entities: 24,
            min_beneficial: 4,
            min_penalty: 3,
            late_band_tick: seconds_to_ticks(30),
            near_band_weight_early: 70,
            near_band_weight_late: 35,
            difficulty_scaling: true,
            combo_window_ticks: seconds_to_ticks(4),
            powerup_spawn_interval_ticks: seconds_to_ticks(8),
            max_powerups: 2,
            powerup_field_lifetime_ticks: seconds_to_ticks(15),
            maintenance_interval_ticks: seconds_to_ticks(1) / 2,
            cleanup_interval_ticks: seconds_to_ticks(1),
        }
    }

    /// Clamp out-of-range values to workable ones.
    ///
    /// Category minimums are capped so their sum never exceeds the entity
    /// cap; zero intervals become one tick. Never fails.
    pub fn sanitized(mut self) -> Self {
        if self.max_entities == 0 {
            self.max_entities = 1;
        }
        self.min_beneficial = self.min_beneficial.min(self.max_entities);
        self.min_penalty = self
            .min_penalty
            .min(self.max_entities - self.min_beneficial);

        if self.combo_window_ticks == 0 {
            self.combo_window_ticks = 1;
        }
        if self.powerup_spawn_interval_ticks == 0 {
            self.powerup_spawn_interval_ticks = 1;
        }
        if self.maintenance_interval_ticks == 0 {
            self.maintenance_interval_ticks = 1;
        }
        if self.cleanup_interval_ticks == 0 {
            self.cleanup_interval_ticks = 1;
        }
        self.near_band_weight_early = self.near_band_weight_early.min(100);
        self.near_band_weight_late = self.near_band_weight_late.min(100);

        if let Some(0) = self.duration_ticks {
            // A zero-length timed session would finish before it starts.
            self.duration_ticks = Some(1);
        }

        self
    }
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self::classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_tags_round_trip() {
        for mode in [
            GameMode::Classic,
            GameMode::Endless,
            GameMode::Survival,
            GameMode::BattleRoyale,
            GameMode::TeamBattle,
        ] {
            assert_eq!(GameMode::parse_tag(mode.tag()), mode);
        }
    }

    #[test]
    fn test_unknown_tag_falls_back() {
        assert_eq!(GameMode::parse_tag("speedrun"), GameMode::Classic);
        assert_eq!(GameMode::parse_tag(""), GameMode::Classic);
    }

    #[test]
    fn test_presets() {
        let classic = ModeConfig::classic();
        assert_eq!(classic.duration_ticks, Some(seconds_to_ticks(60)));
        assert_eq!(classic.min_beneficial, 4);
        assert_eq!(classic.min_penalty, 3);
        assert!(classic.starting_lives.is_none());

        let survival = ModeConfig::survival();
        assert!(survival.duration_ticks.is_none());
        assert_eq!(survival.starting_lives, Some(3));
        assert!(survival.mode.uses_lives());

        assert!(ModeConfig::battle_royale().mode.is_competitive());
        assert!(ModeConfig::team_battle().mode.is_competitive());
        assert!(!classic.mode.is_competitive());
    }

    #[test]
    fn test_sanitize_clamps_minimums() {
        let cfg = ModeConfig {
            max_entities: 5,
            min_beneficial: 10,
            min_penalty: 10,
            ..ModeConfig::classic()
        }
        .sanitized();

        assert_eq!(cfg.min_beneficial, 5);
        assert_eq!(cfg.min_penalty, 0);
        assert!(cfg.min_beneficial + cfg.min_penalty <= cfg.max_entities);
    }

    #[test]
    fn test_sanitize_fixes_zero_intervals() {
        let cfg = ModeConfig {
            combo_window_ticks: 0,
            powerup_spawn_interval_ticks: 0,
            maintenance_interval_ticks: 0,
            cleanup_interval_ticks: 0,
            duration_ticks: Some(0),
            ..ModeConfig::classic()
        }
        .sanitized();

        assert_eq!(cfg.combo_window_ticks, 1);
        assert_eq!(cfg.powerup_spawn_interval_ticks, 1);
        assert_eq!(cfg.maintenance_interval_ticks, 1);
        assert_eq!(cfg.cleanup_interval_ticks, 1);
        assert_eq!(cfg.duration_ticks, Some(1));
    }
}
