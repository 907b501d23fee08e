//! Power-Ups and Active Effects
//!
//! A power-up is a collectible entity on the field; collecting it turns
//! it into a timed active effect on the player. Effects of different
//! kinds stack (multipliers combine as a product); re-collecting the
//! same kind replaces the running effect instead of stacking it.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, FIXED_ONE, fixed_mul, to_fixed, seconds_to_ticks};
use crate::core::vec3::FixedVec3;
use crate::game::config::ModeConfig;
use crate::game::events::GameEvent;
use crate::game::state::RunningState;

/// The fixed set of power-up types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PowerUpKind {
    /// 2.0x score multiplier.
    DoubleScore = 0,
    /// 1.5x score multiplier.
    Frenzy = 1,
    /// Absorbs penalty collections entirely.
    Shield = 2,
    /// Doubles the combo window.
    Haste = 3,
    /// 3.0x score multiplier. Competitive modes only.
    Surge = 4,
}

impl PowerUpKind {
    /// All kinds, in spawn-table order.
    pub const ALL: [PowerUpKind; 5] = [
        PowerUpKind::DoubleScore,
        PowerUpKind::Frenzy,
        PowerUpKind::Shield,
        PowerUpKind::Haste,
        PowerUpKind::Surge,
    ];

    /// Effect duration once collected, in ticks.
    pub fn duration_ticks(self) -> u32 {
        match self {
            PowerUpKind::DoubleScore => seconds_to_ticks(10),
            PowerUpKind::Frenzy => seconds_to_ticks(8),
            PowerUpKind::Shield => seconds_to_ticks(12),
            PowerUpKind::Haste => seconds_to_ticks(8),
            PowerUpKind::Surge => seconds_to_ticks(5),
        }
    }

    /// Relative spawn weight.
    pub fn spawn_weight(self) -> u32 {
        match self {
            PowerUpKind::DoubleScore => 35,
            PowerUpKind::Frenzy => 20,
            PowerUpKind::Shield => 25,
            PowerUpKind::Haste => 15,
            PowerUpKind::Surge => 5,
        }
    }

    /// Whether this kind only spawns in competitive modes.
    pub fn competitive_only(self) -> bool {
        matches!(self, PowerUpKind::Surge)
    }

    /// Score multiplier contributed while active, if this is a
    /// multiplier-type effect.
    pub fn score_multiplier(self) -> Option<Fixed> {
        match self {
            PowerUpKind::DoubleScore => Some(to_fixed(2.0)),
            PowerUpKind::Frenzy => Some(to_fixed(1.5)),
            PowerUpKind::Surge => Some(to_fixed(3.0)),
            PowerUpKind::Shield | PowerUpKind::Haste => None,
        }
    }

    /// Stable tag string.
    pub fn tag(self) -> &'static str {
        match self {
            PowerUpKind::DoubleScore => "double_score",
            PowerUpKind::Frenzy => "frenzy",
            PowerUpKind::Shield => "shield",
            PowerUpKind::Haste => "haste",
            PowerUpKind::Surge => "surge",
        }
    }

    /// Parse a kind tag from external data.
    ///
    /// Unknown tags fall back to `DoubleScore` - malformed sync data is
    /// recovered, never propagated.
    pub fn parse_tag(tag: &str) -> PowerUpKind {
        Self::ALL
            .into_iter()
            .find(|k| k.tag() == tag)
            .unwrap_or(PowerUpKind::DoubleScore)
    }
}

/// A power-up entity on the field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PowerUp {
    /// Unique id (monotonic counter, shared with collectibles).
    pub id: u32,
    /// Power-up type.
    pub kind: PowerUpKind,
    /// Position in the world.
    pub position: FixedVec3,
    /// Tick the power-up appeared.
    pub spawned_tick: u32,
    /// Absolute tick the uncollected power-up disappears.
    pub expires_tick: u32,
}

/// A timed effect running on the player.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ActiveEffect {
    /// Effect type.
    pub kind: PowerUpKind,
    /// Tick the effect started.
    pub started_tick: u32,
    /// Absolute tick the effect ends.
    pub ends_tick: u32,
}

impl ActiveEffect {
    /// Whether the effect is still running at `now`.
    #[inline]
    pub fn is_active(&self, now: u32) -> bool {
        now < self.ends_tick
    }
}

/// The set of effects currently running on one player.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EffectRegistry {
    effects: Vec<ActiveEffect>,
}

impl EffectRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate an effect, replacing any running effect of the same kind.
    pub fn activate(&mut self, kind: PowerUpKind, now: u32) -> ActiveEffect {
        let effect = ActiveEffect {
            kind,
            started_tick: now,
            ends_tick: now + kind.duration_ticks(),
        };
        self.effects.retain(|e| e.kind != kind);
        self.effects.push(effect);
        effect
    }

    /// Drop elapsed effects, returning the kinds that just ended.
    pub fn expire_elapsed(&mut self, now: u32) -> Vec<PowerUpKind> {
        let mut ended = Vec::new();
        self.effects.retain(|e| {
            if e.is_active(now) {
                true
            } else {
                ended.push(e.kind);
                false
            }
        });
        ended
    }

    /// Whether an effect of `kind` is running at `now`.
    pub fn is_active(&self, kind: PowerUpKind, now: u32) -> bool {
        self.effects.iter().any(|e| e.kind == kind && e.is_active(now))
    }

    /// Product of all active multiplier-type effects; 1.0 with none active.
    pub fn score_multiplier(&self, now: u32) -> Fixed {
        let mut product = FIXED_ONE;
        for effect in &self.effects {
            if !effect.is_active(now) {
                continue;
            }
            if let Some(mult) = effect.kind.score_multiplier() {
                product = fixed_mul(product, mult);
            }
        }
        product
    }

    /// Whether a shield is up at `now`.
    pub fn shield_active(&self, now: u32) -> bool {
        self.is_active(PowerUpKind::Shield, now)
    }

    /// Combo-window factor: 2.0 while Haste runs, 1.0 otherwise.
    pub fn combo_window_factor(&self, now: u32) -> Fixed {
        if self.is_active(PowerUpKind::Haste, now) {
            to_fixed(2.0)
        } else {
            FIXED_ONE
        }
    }

    /// Currently tracked effects (may include just-elapsed ones until the
    /// next cleanup pass).
    pub fn active(&self) -> &[ActiveEffect] {
        &self.effects
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.effects.clear();
    }
}

// =============================================================================
// FIELD SPAWNING
// =============================================================================

/// Spawn a power-up if the interval elapsed and the field has room.
///
/// Kind selection is a weighted roll over the spawn table; competitive-only
/// kinds are masked out of the table in solo modes.
pub fn maybe_spawn_power_up(run: &mut RunningState, config: &ModeConfig) -> Option<u32> {
    if run.power_ups.len() >= config.max_powerups {
        return None;
    }

    let competitive = config.mode.is_competitive();
    let kinds: Vec<PowerUpKind> = PowerUpKind::ALL
        .into_iter()
        .filter(|k| competitive || !k.competitive_only())
        .collect();
    let weights: Vec<u32> = kinds.iter().map(|k| k.spawn_weight()).collect();

    let kind = kinds[run.rng.weighted_index(&weights)];
    let position = run.spawn_position(config);
    let id = run.spawn_power_up(kind, position, config.powerup_field_lifetime_ticks);
    run.push_event(GameEvent::power_up_spawned(run.tick, id, kind, position));

    Some(id)
}

/// Remove uncollected power-ups whose field lifetime elapsed.
pub fn cleanup_expired_power_ups(run: &mut RunningState) -> Vec<u32> {
    let now = run.tick;
    let expired: Vec<u32> = run
        .power_ups
        .values()
        .filter(|p| now >= p.expires_tick)
        .map(|p| p.id)
        .collect();

    for id in &expired {
        run.power_ups.remove(id);
        run.push_event(GameEvent::power_up_expired(now, *id));
    }

    expired
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_table() {
        assert_eq!(PowerUpKind::DoubleScore.score_multiplier(), Some(to_fixed(2.0)));
        assert_eq!(PowerUpKind::Shield.score_multiplier(), None);
        assert!(PowerUpKind::Surge.competitive_only());
        assert!(!PowerUpKind::Shield.competitive_only());
        assert_eq!(PowerUpKind::Surge.duration_ticks(), seconds_to_ticks(5));
    }

    #[test]
    fn test_kind_tag_round_trip() {
        for kind in PowerUpKind::ALL {
            assert_eq!(PowerUpKind::parse_tag(kind.tag()), kind);
        }
        // Unknown tags recover to the documented default
        assert_eq!(PowerUpKind::parse_tag("mystery"), PowerUpKind::DoubleScore);
    }

    #[test]
    fn test_activate_and_expire() {
        let mut registry = EffectRegistry::new();

        let effect = registry.activate(PowerUpKind::DoubleScore, 100);
        assert_eq!(effect.ends_tick, 100 + seconds_to_ticks(10));
        assert!(registry.is_active(PowerUpKind::DoubleScore, 150));
        assert!(!registry.is_active(PowerUpKind::DoubleScore, effect.ends_tick));

        let ended = registry.expire_elapsed(effect.ends_tick);
        assert_eq!(ended, vec![PowerUpKind::DoubleScore]);
        assert!(registry.active().is_empty());
    }

    #[test]
    fn test_same_kind_replaces() {
        let mut registry = EffectRegistry::new();

        registry.activate(PowerUpKind::Frenzy, 0);
        let replaced = registry.activate(PowerUpKind::Frenzy, 100);

        assert_eq!(registry.active().len(), 1);
        assert_eq!(registry.active()[0].ends_tick, replaced.ends_tick);
    }

    #[test]
    fn test_multiplier_product() {
        let mut registry = EffectRegistry::new();
        assert_eq!(registry.score_multiplier(0), FIXED_ONE);

        registry.activate(PowerUpKind::DoubleScore, 0);
        assert_eq!(registry.score_multiplier(10), to_fixed(2.0));

        // Different kinds stack multiplicatively: 2.0 * 1.5 = 3.0
        registry.activate(PowerUpKind::Frenzy, 0);
        assert_eq!(registry.score_multiplier(10), to_fixed(3.0));

        // Shield contributes nothing to the product
        registry.activate(PowerUpKind::Shield, 0);
        assert_eq!(registry.score_multiplier(10), to_fixed(3.0));

        // Once DoubleScore lapses only Frenzy remains
        let after_double = seconds_to_ticks(10);
        assert!(registry.score_multiplier(after_double) < to_fixed(3.0));
    }

    #[test]
    fn test_shield_and_haste_flags() {
        let mut registry = EffectRegistry::new();
        assert!(!registry.shield_active(0));
        assert_eq!(registry.combo_window_factor(0), FIXED_ONE);

        registry.activate(PowerUpKind::Shield, 0);
        registry.activate(PowerUpKind::Haste, 0);

        assert!(registry.shield_active(10));
        assert_eq!(registry.combo_window_factor(10), to_fixed(2.0));

        // Both lapsed
        let later = seconds_to_ticks(12);
        assert!(!registry.shield_active(later));
        assert_eq!(registry.combo_window_factor(later), FIXED_ONE);
    }
}
