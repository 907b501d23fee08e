//! Collectible Lifecycle
//!
//! Spawning, minimum-count maintenance, penalty age-out, and difficulty
//! scaling for field collectibles. All functions are deterministic over
//! the session state and push their events into the state's pending
//! queue for the engine to publish.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{
    Fixed, fixed_max, fixed_mul, seconds_to_ticks,
    SCALE_FLOOR, SCALE_STEP_FACTOR,
};
use crate::core::vec3::FixedVec3;
use crate::game::config::ModeConfig;
use crate::game::events::GameEvent;
use crate::game::state::RunningState;

/// Collectible category.
///
/// `Coin` is the single beneficial category; the rest are penalties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CollectibleKind {
    /// Beneficial: awards points.
    Coin = 0,
    /// Penalty: large score loss.
    Bomb = 1,
    /// Penalty: moderate score loss.
    Trap = 2,
    /// Penalty: small score loss, spawns often.
    Decoy = 3,
}

impl CollectibleKind {
    /// Penalty kinds, in spawn-table order.
    pub const PENALTY_KINDS: [CollectibleKind; 3] = [
        CollectibleKind::Bomb,
        CollectibleKind::Trap,
        CollectibleKind::Decoy,
    ];

    /// Base point value. Negative for penalties.
    pub fn base_value(self) -> i32 {
        match self {
            CollectibleKind::Coin => 10,
            CollectibleKind::Bomb => -25,
            CollectibleKind::Trap => -15,
            CollectibleKind::Decoy => -5,
        }
    }

    /// Whether this kind is a penalty category.
    pub fn is_penalty(self) -> bool {
        !matches!(self, CollectibleKind::Coin)
    }

    /// Field lifetime. Beneficial entities never age out.
    pub fn lifetime_ticks(self) -> Option<u32> {
        match self {
            CollectibleKind::Coin => None,
            CollectibleKind::Bomb => Some(seconds_to_ticks(8)),
            CollectibleKind::Trap => Some(seconds_to_ticks(12)),
            CollectibleKind::Decoy => Some(seconds_to_ticks(10)),
        }
    }

    /// Relative spawn weight among penalty kinds.
    pub fn penalty_spawn_weight(self) -> u32 {
        match self {
            CollectibleKind::Coin => 0,
            CollectibleKind::Bomb => 30,
            CollectibleKind::Trap => 30,
            CollectibleKind::Decoy => 40,
        }
    }

    /// Stable tag string.
    pub fn tag(self) -> &'static str {
        match self {
            CollectibleKind::Coin => "coin",
            CollectibleKind::Bomb => "bomb",
            CollectibleKind::Trap => "trap",
            CollectibleKind::Decoy => "decoy",
        }
    }

    /// Parse a kind tag from external data. Unknown tags fall back to
    /// `Coin`.
    pub fn parse_tag(tag: &str) -> CollectibleKind {
        match tag {
            "bomb" => CollectibleKind::Bomb,
            "trap" => CollectibleKind::Trap,
            "decoy" => CollectibleKind::Decoy,
            _ => CollectibleKind::Coin,
        }
    }
}

/// A collectible entity on the field.
///
/// Immutable once spawned except for `scale` (difficulty scaling) and
/// removal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Collectible {
    /// Unique id (monotonic counter).
    pub id: u32,
    /// Position in the world.
    pub position: FixedVec3,
    /// Category.
    pub kind: CollectibleKind,
    /// Visual/collision scale, shrunk by difficulty steps.
    pub scale: Fixed,
    /// Tick the entity appeared.
    pub spawned_tick: u32,
    /// Age-out lifetime. `None` for beneficial entities.
    pub lifetime_ticks: Option<u32>,
}

impl Collectible {
    /// Whether the entity aged out at `now`.
    pub fn is_expired(&self, now: u32) -> bool {
        match self.lifetime_ticks {
            Some(lifetime) => now.saturating_sub(self.spawned_tick) >= lifetime,
            None => false,
        }
    }
}

// =============================================================================
// LIFECYCLE OPERATIONS
// =============================================================================

/// Spawn the initial field: category minimums, nothing more.
pub fn spawn_initial(run: &mut RunningState, config: &ModeConfig) {
    for _ in 0..config.min_beneficial {
        spawn_one(run, config, CollectibleKind::Coin);
    }
    for _ in 0..config.min_penalty {
        let kind = roll_penalty_kind(run);
        spawn_one(run, config, kind);
    }
}

/// Top up both categories to their minimums.
///
/// Synchronous: a category below minimum is refilled in this pass, capped
/// by the visible-entity limit. Returns the number spawned.
pub fn maintain(run: &mut RunningState, config: &ModeConfig) -> usize {
    let beneficial = run
        .collectibles
        .values()
        .filter(|c| !c.kind.is_penalty())
        .count();
    let penalty = run.collectibles.len() - beneficial;

    let mut room = config.max_entities.saturating_sub(run.collectibles.len());
    let mut spawned = 0;

    let coin_deficit = config.min_beneficial.saturating_sub(beneficial).min(room);
    for _ in 0..coin_deficit {
        spawn_one(run, config, CollectibleKind::Coin);
        spawned += 1;
    }
    room -= coin_deficit;

    let penalty_deficit = config.min_penalty.saturating_sub(penalty).min(room);
    for _ in 0..penalty_deficit {
        let kind = roll_penalty_kind(run);
        spawn_one(run, config, kind);
        spawned += 1;
    }

    spawned
}

/// Purge penalty entities whose lifetime elapsed.
pub fn cleanup_expired(run: &mut RunningState) -> Vec<u32> {
    let now = run.tick;
    let expired: Vec<u32> = run
        .collectibles
        .values()
        .filter(|c| c.is_expired(now))
        .map(|c| c.id)
        .collect();

    for id in &expired {
        run.collectibles.remove(id);
        run.push_event(GameEvent::collectible_expired(now, *id));
    }

    expired
}

/// Remove a collectible by id.
///
/// Returns `None` when the id is absent (already collected or expired) -
/// concurrent timers routinely race with user taps, so this is a no-op,
/// not an error.
pub fn collect(run: &mut RunningState, id: u32) -> Option<Collectible> {
    run.collectibles.remove(&id)
}

/// Apply one difficulty step: shrink the uniform scale toward the floor
/// and restamp every field entity with it. Returns the new scale.
pub fn apply_difficulty_step(run: &mut RunningState) -> Fixed {
    let new_scale = fixed_max(SCALE_FLOOR, fixed_mul(run.difficulty_scale, SCALE_STEP_FACTOR));
    run.difficulty_scale = new_scale;

    for collectible in run.collectibles.values_mut() {
        collectible.scale = new_scale;
    }

    new_scale
}

fn roll_penalty_kind(run: &mut RunningState) -> CollectibleKind {
    let weights: Vec<u32> = CollectibleKind::PENALTY_KINDS
        .iter()
        .map(|k| k.penalty_spawn_weight())
        .collect();
    CollectibleKind::PENALTY_KINDS[run.rng.weighted_index(&weights)]
}

fn spawn_one(run: &mut RunningState, config: &ModeConfig, kind: CollectibleKind) -> u32 {
    let position = run.spawn_position(config);
    let id = run.spawn_collectible(kind, position);
    run.push_event(GameEvent::collectible_spawned(run.tick, id, kind, position));
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{FIXED_ONE, SCALE_FLOOR};
    use crate::game::state::RunningState;

    fn test_state() -> (RunningState, ModeConfig) {
        let config = ModeConfig::classic().sanitized();
        let run = RunningState::new([0; 16], 12345, &config);
        (run, config)
    }

    #[test]
    fn test_kind_table() {
        assert_eq!(CollectibleKind::Coin.base_value(), 10);
        assert!(!CollectibleKind::Coin.is_penalty());
        assert!(CollectibleKind::Coin.lifetime_ticks().is_none());

        for kind in CollectibleKind::PENALTY_KINDS {
            assert!(kind.is_penalty());
            assert!(kind.base_value() < 0);
            assert!(kind.lifetime_ticks().is_some());
        }
    }

    #[test]
    fn test_spawn_initial_meets_minimums() {
        let (mut run, config) = test_state();
        spawn_initial(&mut run, &config);

        let beneficial = run
            .collectibles
            .values()
            .filter(|c| !c.kind.is_penalty())
            .count();
        let penalty = run.collectibles.len() - beneficial;

        assert_eq!(beneficial, config.min_beneficial);
        assert_eq!(penalty, config.min_penalty);
    }

    #[test]
    fn test_spawn_initial_is_deterministic() {
        let config = ModeConfig::classic().sanitized();
        let mut run1 = RunningState::new([0; 16], 999, &config);
        let mut run2 = RunningState::new([0; 16], 999, &config);

        spawn_initial(&mut run1, &config);
        spawn_initial(&mut run2, &config);

        assert_eq!(run1.collectibles.len(), run2.collectibles.len());
        for (id, c1) in &run1.collectibles {
            let c2 = &run2.collectibles[id];
            assert_eq!(c1.position, c2.position);
            assert_eq!(c1.kind, c2.kind);
        }
    }

    #[test]
    fn test_maintain_tops_up_after_collection() {
        let (mut run, config) = test_state();
        spawn_initial(&mut run, &config);

        let coin_id = run
            .collectibles
            .values()
            .find(|c| !c.kind.is_penalty())
            .map(|c| c.id)
            .unwrap();
        collect(&mut run, coin_id).unwrap();

        let spawned = maintain(&mut run, &config);
        assert_eq!(spawned, 1);

        let beneficial = run
            .collectibles
            .values()
            .filter(|c| !c.kind.is_penalty())
            .count();
        assert_eq!(beneficial, config.min_beneficial);
    }

    #[test]
    fn test_maintain_respects_entity_cap() {
        let config = ModeConfig {
            max_entities: 3,
            min_beneficial: 4,
            min_penalty: 3,
            ..ModeConfig::classic()
        }
        .sanitized();
        let mut run = RunningState::new([0; 16], 7, &config);

        maintain(&mut run, &config);
        assert!(run.collectibles.len() <= config.max_entities);
    }

    #[test]
    fn test_collect_is_single_shot() {
        let (mut run, config) = test_state();
        spawn_initial(&mut run, &config);

        let id = *run.collectibles.keys().next().unwrap();
        assert!(collect(&mut run, id).is_some());

        // Second collection of the same id is a stale reference: no-op
        assert!(collect(&mut run, id).is_none());
        assert!(!run.collectibles.contains_key(&id));
    }

    #[test]
    fn test_cleanup_expires_only_aged_penalties() {
        let (mut run, config) = test_state();
        spawn_initial(&mut run, &config);

        let total = run.collectibles.len();
        let penalties = run
            .collectibles
            .values()
            .filter(|c| c.kind.is_penalty())
            .count();

        // Advance past the longest penalty lifetime
        run.tick = seconds_to_ticks(13);
        let expired = cleanup_expired(&mut run);

        assert_eq!(expired.len(), penalties);
        assert_eq!(run.collectibles.len(), total - penalties);
        assert!(run.collectibles.values().all(|c| !c.kind.is_penalty()));
    }

    #[test]
    fn test_difficulty_scale_hits_floor() {
        let (mut run, config) = test_state();
        spawn_initial(&mut run, &config);

        assert_eq!(run.difficulty_scale, FIXED_ONE);

        let mut last = FIXED_ONE;
        for _ in 0..50 {
            let scale = apply_difficulty_step(&mut run);
            assert!(scale <= last);
            assert!(scale >= SCALE_FLOOR);
            last = scale;
        }
        assert_eq!(last, SCALE_FLOOR);

        // Applied uniformly to every field entity
        assert!(run.collectibles.values().all(|c| c.scale == SCALE_FLOOR));
    }
}
