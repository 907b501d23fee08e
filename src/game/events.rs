//! Engine Events
//!
//! Typed events generated by the session and competitive layers. Events
//! carry a tick and a processing priority with a total order so hosts
//! can merge or replay streams deterministically. The engine itself
//! performs no I/O on them; feedback (sound/haptic) is the host's job.

use serde::{Serialize, Deserialize};

use crate::core::fixed::Fixed;
use crate::core::vec3::FixedVec3;
use crate::game::collectible::CollectibleKind;
use crate::game::powerup::PowerUpKind;
use crate::game::state::{EndCause, PlayerId};

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Eliminations and lives first
    Elimination = 0,
    /// Then collections
    Collection = 1,
    /// Then power-up activity
    PowerUp = 2,
    /// Then combo transitions
    Combo = 3,
    /// Then team scoring
    Team = 4,
    /// Then session transitions
    Session = 5,
    /// Lowest priority
    Other = 255,
}

/// Event data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GameEventData {
    /// Session transitioned Ready -> Running.
    SessionStarted {
        /// Mode tag of the started session.
        mode_tag: String,
    },

    /// Session reached a terminal state.
    SessionEnded {
        /// Final clamped score.
        final_score: u32,
        /// Final score beat the host-supplied prior best.
        new_high_score: bool,
        /// Zero penalty collections over the whole run.
        perfect_run: bool,
        /// Why the session ended.
        cause: EndCause,
    },

    /// A collectible appeared on the field.
    CollectibleSpawned {
        /// Entity id.
        id: u32,
        /// Category.
        kind: CollectibleKind,
        /// World position.
        position: FixedVec3,
    },

    /// A collectible was collected and scored.
    CollectibleCollected {
        /// Entity id.
        id: u32,
        /// Category.
        kind: CollectibleKind,
        /// Signed score delta actually computed.
        points_delta: i64,
        /// Score after clamping.
        new_score: u32,
        /// Combo count after this collection.
        combo_count: u32,
        /// Multiplier applied to this collection.
        multiplier: Fixed,
    },

    /// A penalty entity aged out.
    CollectibleExpired {
        /// Entity id.
        id: u32,
    },

    /// A shield fully absorbed a penalty collection.
    ShieldAbsorbed {
        /// Entity id of the absorbed penalty.
        id: u32,
        /// Penalty category absorbed.
        kind: CollectibleKind,
    },

    /// A power-up appeared on the field.
    PowerUpSpawned {
        /// Entity id.
        id: u32,
        /// Power-up type.
        kind: PowerUpKind,
        /// World position.
        position: FixedVec3,
    },

    /// A power-up was collected and its effect activated.
    PowerUpCollected {
        /// Entity id.
        id: u32,
        /// Power-up type.
        kind: PowerUpKind,
        /// Absolute tick the effect ends.
        ends_tick: u32,
    },

    /// An uncollected power-up left the field.
    PowerUpExpired {
        /// Entity id.
        id: u32,
    },

    /// A running effect elapsed.
    EffectExpired {
        /// Effect type that ended.
        kind: PowerUpKind,
    },

    /// The combo hit a milestone count.
    ComboMilestone {
        /// Milestone streak count.
        count: u32,
    },

    /// A penalty broke a live streak.
    ComboBroken {
        /// Streak count that was lost.
        lost_count: u32,
    },

    /// The combo window elapsed with no collection.
    ComboExpired,

    /// A penalty cost a life (survival modes).
    LifeLost {
        /// Lives remaining after the loss.
        remaining: u32,
    },

    /// The difficulty scale stepped down.
    DifficultyStepped {
        /// New uniform entity scale.
        scale: Fixed,
    },

    /// Elimination round incoming (competitive).
    EliminationWarning {
        /// Ticks until the elimination fires.
        countdown_ticks: u32,
        /// Number of players about to be eliminated.
        pending_count: u32,
    },

    /// A player was eliminated (competitive).
    PlayerEliminated {
        /// Eliminated player.
        player_id: PlayerId,
        /// Final rank assigned at elimination.
        rank: u32,
    },

    /// The elimination phase changed (competitive).
    EliminationPhaseChanged {
        /// Tag of the phase entered.
        phase_tag: String,
    },

    /// The match finished with a winner (competitive).
    MatchFinished {
        /// Winner, if any player survived.
        winner: Option<PlayerId>,
    },

    /// The leading team changed (team mode).
    TeamLeadChanged {
        /// New leading team.
        team: u8,
    },

    /// A territory changed owner (team mode).
    TerritoryCaptured {
        /// Territory id.
        territory: u8,
        /// New owning team.
        team: u8,
    },

    /// A territory was taken from its owner (team mode).
    TerritoryLost {
        /// Territory id.
        territory: u8,
        /// Team that lost it.
        team: u8,
    },

    /// Overtime started after an exact tie (team mode).
    OvertimeStarted {
        /// Overtime duration in ticks.
        duration_ticks: u32,
    },

    /// The team battle resolved (team mode).
    TeamBattleEnded {
        /// Winning team, `None` for a declared draw.
        winner: Option<u8>,
    },
}

/// An engine event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when the event occurred.
    pub tick: u32,

    /// Processing priority.
    pub priority: EventPriority,

    /// Player involved (for deterministic tie-breaking).
    pub player_id: Option<PlayerId>,

    /// Event data.
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, priority: EventPriority, data: GameEventData) -> Self {
        let player_id = match &data {
            GameEventData::PlayerEliminated { player_id, .. } => Some(*player_id),
            GameEventData::MatchFinished { winner, .. } => *winner,
            _ => None,
        };

        Self {
            tick,
            priority,
            player_id,
            data,
        }
    }

    /// Session started.
    pub fn session_started(tick: u32, mode_tag: &str) -> Self {
        Self::new(
            tick,
            EventPriority::Session,
            GameEventData::SessionStarted {
                mode_tag: mode_tag.to_string(),
            },
        )
    }

    /// Session ended.
    pub fn session_ended(
        tick: u32,
        final_score: u32,
        new_high_score: bool,
        perfect_run: bool,
        cause: EndCause,
    ) -> Self {
        Self::new(
            tick,
            EventPriority::Session,
            GameEventData::SessionEnded {
                final_score,
                new_high_score,
                perfect_run,
                cause,
            },
        )
    }

    /// Collectible spawned.
    pub fn collectible_spawned(
        tick: u32,
        id: u32,
        kind: CollectibleKind,
        position: FixedVec3,
    ) -> Self {
        Self::new(
            tick,
            EventPriority::Collection,
            GameEventData::CollectibleSpawned { id, kind, position },
        )
    }

    /// Collectible collected.
    pub fn collectible_collected(
        tick: u32,
        id: u32,
        kind: CollectibleKind,
        points_delta: i64,
        new_score: u32,
        combo_count: u32,
        multiplier: Fixed,
    ) -> Self {
        Self::new(
            tick,
            EventPriority::Collection,
            GameEventData::CollectibleCollected {
                id,
                kind,
                points_delta,
                new_score,
                combo_count,
                multiplier,
            },
        )
    }

    /// Collectible expired.
    pub fn collectible_expired(tick: u32, id: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Collection,
            GameEventData::CollectibleExpired { id },
        )
    }

    /// Shield absorbed a penalty.
    pub fn shield_absorbed(tick: u32, id: u32, kind: CollectibleKind) -> Self {
        Self::new(
            tick,
            EventPriority::Collection,
            GameEventData::ShieldAbsorbed { id, kind },
        )
    }

    /// Power-up spawned.
    pub fn power_up_spawned(tick: u32, id: u32, kind: PowerUpKind, position: FixedVec3) -> Self {
        Self::new(
            tick,
            EventPriority::PowerUp,
            GameEventData::PowerUpSpawned { id, kind, position },
        )
    }

    /// Power-up collected.
    pub fn power_up_collected(tick: u32, id: u32, kind: PowerUpKind, ends_tick: u32) -> Self {
        Self::new(
            tick,
            EventPriority::PowerUp,
            GameEventData::PowerUpCollected { id, kind, ends_tick },
        )
    }

    /// Power-up expired on the field.
    pub fn power_up_expired(tick: u32, id: u32) -> Self {
        Self::new(
            tick,
            EventPriority::PowerUp,
            GameEventData::PowerUpExpired { id },
        )
    }

    /// Active effect elapsed.
    pub fn effect_expired(tick: u32, kind: PowerUpKind) -> Self {
        Self::new(
            tick,
            EventPriority::PowerUp,
            GameEventData::EffectExpired { kind },
        )
    }

    /// Combo milestone reached.
    pub fn combo_milestone(tick: u32, count: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Combo,
            GameEventData::ComboMilestone { count },
        )
    }

    /// Combo broken by a penalty.
    pub fn combo_broken(tick: u32, lost_count: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Combo,
            GameEventData::ComboBroken { lost_count },
        )
    }

    /// Combo expired idle.
    pub fn combo_expired(tick: u32) -> Self {
        Self::new(tick, EventPriority::Combo, GameEventData::ComboExpired)
    }

    /// Life lost.
    pub fn life_lost(tick: u32, remaining: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Elimination,
            GameEventData::LifeLost { remaining },
        )
    }

    /// Difficulty stepped.
    pub fn difficulty_stepped(tick: u32, scale: Fixed) -> Self {
        Self::new(
            tick,
            EventPriority::Other,
            GameEventData::DifficultyStepped { scale },
        )
    }

    /// Elimination warning.
    pub fn elimination_warning(tick: u32, countdown_ticks: u32, pending_count: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Elimination,
            GameEventData::EliminationWarning {
                countdown_ticks,
                pending_count,
            },
        )
    }

    /// Player eliminated.
    pub fn player_eliminated(tick: u32, player_id: PlayerId, rank: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Elimination,
            GameEventData::PlayerEliminated { player_id, rank },
        )
    }

    /// Elimination phase changed.
    pub fn elimination_phase_changed(tick: u32, phase_tag: &str) -> Self {
        Self::new(
            tick,
            EventPriority::Elimination,
            GameEventData::EliminationPhaseChanged {
                phase_tag: phase_tag.to_string(),
            },
        )
    }

    /// Match finished.
    pub fn match_finished(tick: u32, winner: Option<PlayerId>) -> Self {
        Self::new(
            tick,
            EventPriority::Session,
            GameEventData::MatchFinished { winner },
        )
    }

    /// Team lead changed.
    pub fn team_lead_changed(tick: u32, team: u8) -> Self {
        Self::new(
            tick,
            EventPriority::Team,
            GameEventData::TeamLeadChanged { team },
        )
    }

    /// Territory captured.
    pub fn territory_captured(tick: u32, territory: u8, team: u8) -> Self {
        Self::new(
            tick,
            EventPriority::Team,
            GameEventData::TerritoryCaptured { territory, team },
        )
    }

    /// Territory lost.
    pub fn territory_lost(tick: u32, territory: u8, team: u8) -> Self {
        Self::new(
            tick,
            EventPriority::Team,
            GameEventData::TerritoryLost { territory, team },
        )
    }

    /// Overtime started.
    pub fn overtime_started(tick: u32, duration_ticks: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Team,
            GameEventData::OvertimeStarted { duration_ticks },
        )
    }

    /// Team battle ended.
    pub fn team_battle_ended(tick: u32, winner: Option<u8>) -> Self {
        Self::new(
            tick,
            EventPriority::Team,
            GameEventData::TeamBattleEnded { winner },
        )
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.player_id == other.player_id
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then player_id
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.player_id.cmp(&other.player_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ordering() {
        let id1 = PlayerId::new([1; 16]);
        let id2 = PlayerId::new([2; 16]);

        let elimination = GameEvent::player_eliminated(10, id1, 5);
        let collection = GameEvent::collectible_collected(
            10,
            0,
            CollectibleKind::Coin,
            10,
            10,
            1,
            crate::core::fixed::FIXED_ONE,
        );
        let later_elimination = GameEvent::player_eliminated(10, id2, 4);

        // Same tick: eliminations before collections
        assert!(elimination < collection);

        // Same tick and priority: id order breaks the tie
        assert!(elimination < later_elimination);

        // Earlier tick always first
        let early = GameEvent::combo_expired(5);
        assert!(early < elimination);
    }

    #[test]
    fn test_player_id_extraction() {
        let id = PlayerId::new([7; 16]);
        let event = GameEvent::player_eliminated(1, id, 3);
        assert_eq!(event.player_id, Some(id));

        let event = GameEvent::combo_expired(1);
        assert_eq!(event.player_id, None);
    }
}
