//! Session State
//!
//! The canonical state of one session, as a tagged union whose variants
//! are mutually exclusive: `Ready`, `Running` (with the live payload),
//! `Finished` (with the terminal summary). Entity arenas use BTreeMap
//! so iteration order is deterministic.

use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::core::fixed::{
    Fixed, SCALE_INITIAL,
    BAND_NEAR_MIN, BAND_NEAR_MAX, BAND_FAR_MIN, BAND_FAR_MAX,
};
use crate::core::rng::DeterministicRng;
use crate::core::vec3::FixedVec3;
use crate::game::collectible::{Collectible, CollectibleKind};
use crate::game::combo::ComboState;
use crate::game::config::{GameMode, ModeConfig};
use crate::game::events::GameEvent;
use crate::game::powerup::{EffectRegistry, PowerUp, PowerUpKind};

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique player identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

/// Unique session identifier.
pub type SessionId = [u8; 16];

// =============================================================================
// TERMINAL SUMMARY
// =============================================================================

/// Why a session reached `Finished`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndCause {
    /// Fixed-duration timer reached zero.
    TimeUp,
    /// Survival lives reached zero.
    LivesExhausted,
}

/// Terminal session summary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Final clamped score.
    pub final_score: u32,
    /// Final score beat the host-supplied prior best.
    pub new_high_score: bool,
    /// Zero penalty collections over the run.
    pub perfect_run: bool,
    /// Beneficial collections made.
    pub collected_count: u32,
    /// Penalty collections made.
    pub penalty_count: u32,
    /// Highest combo streak reached.
    pub peak_combo: u32,
    /// Session length in ticks.
    pub duration_ticks: u32,
    /// Why the session ended.
    pub cause: EndCause,
    /// Wall-clock end time, stamped by the engine layer.
    pub ended_at: DateTime<Utc>,
}

// =============================================================================
// RUNNING STATE
// =============================================================================

/// Live payload of a running session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunningState {
    /// Session identifier.
    pub session_id: SessionId,

    /// Game mode.
    pub mode: GameMode,

    /// Engine ticks elapsed since start.
    pub tick: u32,

    /// Ticks remaining. `None` for untimed modes.
    pub remaining_ticks: Option<u32>,

    /// Current clamped score.
    pub score: u32,

    /// Lives remaining. `None` for modes without lives.
    pub lives: Option<u32>,

    /// Field collectibles, keyed by id (BTreeMap for deterministic order).
    pub collectibles: BTreeMap<u32, Collectible>,

    /// Field power-ups, keyed by id.
    pub power_ups: BTreeMap<u32, PowerUp>,

    /// Effects running on the player.
    pub effects: EffectRegistry,

    /// Combo streak state.
    pub combo: ComboState,

    /// Beneficial collections made.
    pub collected_count: u32,

    /// Penalty collections made.
    pub penalty_count: u32,

    /// Next entity id (monotonic, shared across entity types).
    pub next_entity_id: u32,

    /// Tick the next power-up spawn attempt is due.
    pub next_powerup_spawn_tick: u32,

    /// Uniform entity scale, shrunk by difficulty steps.
    pub difficulty_scale: Fixed,

    /// Anchor position spawns are placed around (the player).
    pub anchor: FixedVec3,

    /// RNG seed (for replay verification).
    pub rng_seed: u64,

    /// Deterministic RNG state.
    #[serde(skip)]
    pub rng: DeterministicRng,

    /// Events generated since the last drain.
    #[serde(skip)]
    pub pending_events: Vec<GameEvent>,
}

impl RunningState {
    /// Fresh running state for a session about to start.
    pub fn new(session_id: SessionId, rng_seed: u64, config: &ModeConfig) -> Self {
        Self {
            session_id,
            mode: config.mode,
            tick: 0,
            remaining_ticks: config.duration_ticks,
            score: 0,
            lives: config.starting_lives,
            collectibles: BTreeMap::new(),
            power_ups: BTreeMap::new(),
            effects: EffectRegistry::new(),
            combo: ComboState::new(config.combo_window_ticks),
            collected_count: 0,
            penalty_count: 0,
            next_entity_id: 0,
            next_powerup_spawn_tick: config.powerup_spawn_interval_ticks,
            difficulty_scale: SCALE_INITIAL,
            anchor: FixedVec3::ZERO,
            rng_seed,
            rng: DeterministicRng::new(rng_seed),
            pending_events: Vec::new(),
        }
    }

    /// Pick a spawn position from the weighted distance bands.
    ///
    /// Early in the session the near band dominates; after the late-band
    /// threshold the weights shift toward the far band.
    pub fn spawn_position(&mut self, config: &ModeConfig) -> FixedVec3 {
        let near_weight = if self.tick < config.late_band_tick {
            config.near_band_weight_early
        } else {
            config.near_band_weight_late
        };

        let anchor = self.anchor;
        if self.rng.next_int(100) < near_weight {
            self.rng.position_in_band(anchor, BAND_NEAR_MIN, BAND_NEAR_MAX)
        } else {
            self.rng.position_in_band(anchor, BAND_FAR_MIN, BAND_FAR_MAX)
        }
    }

    /// Insert a new collectible, stamped with the current difficulty scale.
    pub fn spawn_collectible(&mut self, kind: CollectibleKind, position: FixedVec3) -> u32 {
        let id = self.next_entity_id;
        self.next_entity_id += 1;

        let collectible = Collectible {
            id,
            position,
            kind,
            scale: self.difficulty_scale,
            spawned_tick: self.tick,
            lifetime_ticks: kind.lifetime_ticks(),
        };
        self.collectibles.insert(id, collectible);
        id
    }

    /// Insert a new power-up with a field expiry.
    pub fn spawn_power_up(
        &mut self,
        kind: PowerUpKind,
        position: FixedVec3,
        field_lifetime_ticks: u32,
    ) -> u32 {
        let id = self.next_entity_id;
        self.next_entity_id += 1;

        let power_up = PowerUp {
            id,
            kind,
            position,
            spawned_tick: self.tick,
            expires_tick: self.tick + field_lifetime_ticks,
        };
        self.power_ups.insert(id, power_up);
        id
    }

    /// Whether the run is still perfect (no penalty collections).
    pub fn is_perfect(&self) -> bool {
        self.penalty_count == 0
    }

    /// Push an event for the engine to publish.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Build the terminal summary for this run.
    ///
    /// `ended_at` is supplied by the engine layer; this module never
    /// reads system time.
    pub fn summarize(
        &self,
        new_high_score: bool,
        cause: EndCause,
        ended_at: DateTime<Utc>,
    ) -> SessionSummary {
        SessionSummary {
            final_score: self.score,
            new_high_score,
            perfect_run: self.is_perfect(),
            collected_count: self.collected_count,
            penalty_count: self.penalty_count,
            peak_combo: self.combo.peak(),
            duration_ticks: self.tick,
            cause,
            ended_at,
        }
    }
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// The canonical session state.
///
/// Transitions are one-directional: Ready -> Running -> Finished.
/// Running -> Ready happens only via explicit reset.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[allow(clippy::large_enum_variant)]
pub enum SessionState {
    /// No session in flight.
    Ready,
    /// Live session.
    Running(RunningState),
    /// Terminal until explicit reset.
    Finished(SessionSummary),
}

impl SessionState {
    /// Stable tag string for the current variant.
    pub fn phase_tag(&self) -> &'static str {
        match self {
            SessionState::Ready => "ready",
            SessionState::Running(_) => "running",
            SessionState::Finished(_) => "finished",
        }
    }

    /// Whether a session is live.
    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running(_))
    }

    /// Running payload, if live.
    pub fn as_running(&self) -> Option<&RunningState> {
        match self {
            SessionState::Running(run) => Some(run),
            _ => None,
        }
    }

    /// Mutable running payload, if live.
    pub fn as_running_mut(&mut self) -> Option<&mut RunningState> {
        match self {
            SessionState::Running(run) => Some(run),
            _ => None,
        }
    }

    /// Terminal summary, if finished.
    pub fn as_finished(&self) -> Option<&SessionSummary> {
        match self {
            SessionState::Finished(summary) => Some(summary),
            _ => None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_ordering() {
        let id1 = PlayerId::new([0; 16]);
        let id2 = PlayerId::new([1; 16]);
        let id3 = PlayerId::new([0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

        assert!(id1 < id2);
        assert!(id1 < id3);
        assert!(id3 < id2);
    }

    #[test]
    fn test_phase_tags() {
        let config = ModeConfig::classic();
        assert_eq!(SessionState::Ready.phase_tag(), "ready");

        let running = SessionState::Running(RunningState::new([0; 16], 1, &config));
        assert_eq!(running.phase_tag(), "running");
        assert!(running.is_running());
        assert!(running.as_running().is_some());

        let run = RunningState::new([0; 16], 1, &config);
        let finished = SessionState::Finished(run.summarize(false, EndCause::TimeUp, Utc::now()));
        assert_eq!(finished.phase_tag(), "finished");
        assert!(finished.as_finished().is_some());
        assert!(!finished.is_running());
    }

    #[test]
    fn test_entity_ids_are_monotonic() {
        let config = ModeConfig::classic();
        let mut run = RunningState::new([0; 16], 42, &config);

        let a = run.spawn_collectible(CollectibleKind::Coin, FixedVec3::ZERO);
        let b = run.spawn_power_up(PowerUpKind::Shield, FixedVec3::ZERO, 100);
        let c = run.spawn_collectible(CollectibleKind::Bomb, FixedVec3::ZERO);

        assert!(a < b && b < c);
        assert!(run.collectibles.contains_key(&a));
        assert!(run.power_ups.contains_key(&b));
        assert!(run.collectibles.contains_key(&c));
    }

    #[test]
    fn test_spawn_position_determinism() {
        let config = ModeConfig::classic();
        let mut run1 = RunningState::new([0; 16], 5150, &config);
        let mut run2 = RunningState::new([0; 16], 5150, &config);

        for _ in 0..50 {
            assert_eq!(run1.spawn_position(&config), run2.spawn_position(&config));
        }
    }

    #[test]
    fn test_summarize_flags() {
        let config = ModeConfig::classic();
        let mut run = RunningState::new([0; 16], 1, &config);
        run.score = 500;
        run.collected_count = 12;
        run.tick = 300;

        let summary = run.summarize(true, EndCause::TimeUp, Utc::now());
        assert_eq!(summary.final_score, 500);
        assert!(summary.new_high_score);
        assert!(summary.perfect_run);
        assert_eq!(summary.duration_ticks, 300);

        run.penalty_count = 1;
        let summary = run.summarize(false, EndCause::LivesExhausted, Utc::now());
        assert!(!summary.perfect_run);
        assert_eq!(summary.cause, EndCause::LivesExhausted);
    }

    #[test]
    fn test_btreemap_iteration_order() {
        let config = ModeConfig::classic();
        let mut run = RunningState::new([0; 16], 12345, &config);

        for _ in 0..8 {
            run.spawn_collectible(CollectibleKind::Coin, FixedVec3::ZERO);
        }

        let iterated: Vec<u32> = run.collectibles.keys().copied().collect();
        let mut sorted = iterated.clone();
        sorted.sort_unstable();
        assert_eq!(iterated, sorted);
    }
}
