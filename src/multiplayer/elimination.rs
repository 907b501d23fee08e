//! Elimination Engine (Battle Royale)
//!
//! Periodically removes the lowest-scoring players until one remains or
//! time runs out. Owns its own state, synchronized with the session only
//! through score updates; emits ranking events through the shared event
//! queue pattern.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{
    Fixed, FIXED_ONE, fixed_ceil_to_int, fixed_clamp, to_fixed, seconds_to_ticks,
};
use crate::game::events::GameEvent;
use crate::game::state::PlayerId;

/// Phase of the elimination match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EliminationPhase {
    /// Pre-start countdown.
    Countdown {
        /// Ticks until the grace period begins.
        ticks_remaining: u32,
    },
    /// No eliminations yet.
    GracePeriod {
        /// Ticks until normal play begins.
        ticks_remaining: u32,
    },
    /// Regular play between elimination rounds.
    Normal,
    /// An elimination round is imminent.
    EliminationWarning {
        /// Ticks until the round fires.
        countdown_ticks: u32,
    },
    /// Sudden-death window with few players left.
    FinalShowdown {
        /// Ticks until the match ends.
        ticks_remaining: u32,
    },
    /// Match over.
    Finished,
}

impl EliminationPhase {
    /// Stable tag string for the current phase.
    pub fn tag(&self) -> &'static str {
        match self {
            EliminationPhase::Countdown { .. } => "countdown",
            EliminationPhase::GracePeriod { .. } => "grace_period",
            EliminationPhase::Normal => "normal",
            EliminationPhase::EliminationWarning { .. } => "elimination_warning",
            EliminationPhase::FinalShowdown { .. } => "final_showdown",
            EliminationPhase::Finished => "finished",
        }
    }
}

/// Tuning for the elimination match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EliminationConfig {
    /// Pre-start countdown length.
    pub countdown_ticks: u32,
    /// Grace period after start with no eliminations.
    pub grace_period_ticks: u32,
    /// Interval between elimination rounds.
    pub elimination_interval_ticks: u32,
    /// Remaining-time threshold that triggers the warning phase.
    pub warning_threshold_ticks: u32,
    /// Fraction of alive players removed per round (Q16.16, 0..1).
    pub elimination_percentage: Fixed,
    /// Eliminations never reduce alive-count below this.
    pub minimum_players: usize,
    /// Alive-count at or below this triggers the final showdown.
    pub final_showdown_players: usize,
    /// Length of the final showdown.
    pub showdown_duration_ticks: u32,
    /// Total match length.
    pub match_duration_ticks: u32,
}

impl Default for EliminationConfig {
    fn default() -> Self {
        Self {
            countdown_ticks: seconds_to_ticks(3),
            grace_period_ticks: seconds_to_ticks(10),
            elimination_interval_ticks: seconds_to_ticks(20),
            warning_threshold_ticks: seconds_to_ticks(5),
            elimination_percentage: to_fixed(0.2),
            minimum_players: 3,
            final_showdown_players: 5,
            showdown_duration_ticks: seconds_to_ticks(30),
            match_duration_ticks: seconds_to_ticks(180),
        }
    }
}

/// One player's standing in the match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerRanking {
    /// Player identity.
    pub id: PlayerId,
    /// Current score.
    pub score: u32,
    /// Whether the player has been eliminated.
    pub eliminated: bool,
    /// Elimination-order rank. Set once, immutable thereafter.
    pub rank: Option<u32>,
}

/// The elimination state machine.
///
/// Players are kept in input order; score ties are broken by that order
/// (stable sort), so a given score history always eliminates the same
/// players.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EliminationEngine {
    config: EliminationConfig,
    players: Vec<PlayerRanking>,
    phase: EliminationPhase,
    tick: u32,
    next_elimination_tick: u32,
    winner: Option<PlayerId>,
    #[serde(skip)]
    pending_events: Vec<GameEvent>,
}

impl EliminationEngine {
    /// Create an engine for the given players.
    ///
    /// Config violations are clamped: a percentage outside [0, 1] and a
    /// zero minimum are both repaired rather than rejected.
    pub fn new(player_ids: &[PlayerId], mut config: EliminationConfig) -> Self {
        config.elimination_percentage =
            fixed_clamp(config.elimination_percentage, 0, FIXED_ONE);
        config.minimum_players = config.minimum_players.max(1);

        let players = player_ids
            .iter()
            .map(|id| PlayerRanking {
                id: *id,
                score: 0,
                eliminated: false,
                rank: None,
            })
            .collect();

        let phase = EliminationPhase::Countdown {
            ticks_remaining: config.countdown_ticks,
        };

        Self {
            config,
            players,
            phase,
            tick: 0,
            next_elimination_tick: 0,
            winner: None,
            pending_events: Vec::new(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> EliminationPhase {
        self.phase
    }

    /// Current tick.
    pub fn tick_count(&self) -> u32 {
        self.tick
    }

    /// Players still in the match.
    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| !p.eliminated).count()
    }

    /// All standings, in input order.
    pub fn players(&self) -> &[PlayerRanking] {
        &self.players
    }

    /// Winner, once the match finished.
    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Update a player's score.
    ///
    /// Unknown or already-eliminated players are a silent no-op - score
    /// updates race with elimination rounds by design.
    pub fn record_score(&mut self, id: PlayerId, score: u32) {
        if let Some(player) = self
            .players
            .iter_mut()
            .find(|p| p.id == id && !p.eliminated)
        {
            player.score = score;
        }
    }

    /// Elimination quota for the current round.
    ///
    /// `ceil(alive * percentage)`, floored at 1, capped so the survivors
    /// never drop below `minimum_players`. A cap of zero skips the round.
    pub fn quota(&self) -> usize {
        let alive = self.alive_count();
        if alive <= self.config.minimum_players {
            return 0;
        }

        // alive is a plain integer, so the product is already Q16.16.
        let scaled = (alive as i64 * self.config.elimination_percentage as i64) as Fixed;
        let raw = fixed_ceil_to_int(scaled).max(1) as usize;
        raw.min(alive - self.config.minimum_players)
    }

    /// Advance the match by one tick.
    pub fn advance(&mut self) {
        if matches!(self.phase, EliminationPhase::Finished) {
            return;
        }

        self.tick += 1;

        // Hard time limit applies to every phase.
        if self.tick >= self.config.match_duration_ticks {
            self.finish();
            return;
        }

        match self.phase {
            EliminationPhase::Countdown { ticks_remaining } => {
                if ticks_remaining <= 1 {
                    self.enter_phase(EliminationPhase::GracePeriod {
                        ticks_remaining: self.config.grace_period_ticks,
                    });
                } else {
                    self.phase = EliminationPhase::Countdown {
                        ticks_remaining: ticks_remaining - 1,
                    };
                }
            }
            EliminationPhase::GracePeriod { ticks_remaining } => {
                if ticks_remaining <= 1 {
                    self.next_elimination_tick =
                        self.tick + self.config.elimination_interval_ticks;
                    self.enter_phase(EliminationPhase::Normal);
                } else {
                    self.phase = EliminationPhase::GracePeriod {
                        ticks_remaining: ticks_remaining - 1,
                    };
                }
            }
            EliminationPhase::Normal => {
                if self.check_showdown_trigger() {
                    return;
                }

                let until = self.next_elimination_tick.saturating_sub(self.tick);
                if until <= self.config.warning_threshold_ticks {
                    let pending = self.quota() as u32;
                    self.enter_phase(EliminationPhase::EliminationWarning {
                        countdown_ticks: until,
                    });
                    self.pending_events.push(GameEvent::elimination_warning(
                        self.tick,
                        until,
                        pending,
                    ));
                }
            }
            EliminationPhase::EliminationWarning { countdown_ticks } => {
                if countdown_ticks <= 1 {
                    self.run_elimination_round();

                    if matches!(self.phase, EliminationPhase::Finished) {
                        return;
                    }
                    if self.check_showdown_trigger() {
                        return;
                    }

                    self.next_elimination_tick =
                        self.tick + self.config.elimination_interval_ticks;
                    self.enter_phase(EliminationPhase::Normal);
                } else {
                    self.phase = EliminationPhase::EliminationWarning {
                        countdown_ticks: countdown_ticks - 1,
                    };
                }
            }
            EliminationPhase::FinalShowdown { ticks_remaining } => {
                if ticks_remaining <= 1 {
                    self.finish();
                } else {
                    self.phase = EliminationPhase::FinalShowdown {
                        ticks_remaining: ticks_remaining - 1,
                    };
                }
            }
            EliminationPhase::Finished => {}
        }
    }

    /// Final standings: `(player, rank, score)` sorted by rank.
    ///
    /// Eliminated players keep their elimination-order rank; survivors are
    /// ranked by live score, best first.
    pub fn final_rankings(&self) -> Vec<(PlayerId, u32, u32)> {
        let mut survivors: Vec<&PlayerRanking> =
            self.players.iter().filter(|p| !p.eliminated).collect();
        // Stable sort: input order breaks score ties.
        survivors.sort_by(|a, b| b.score.cmp(&a.score));

        let mut results: Vec<(PlayerId, u32, u32)> = survivors
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, (i + 1) as u32, p.score))
            .collect();

        for player in self.players.iter().filter(|p| p.eliminated) {
            results.push((player.id, player.rank.unwrap_or(0), player.score));
        }

        results.sort_by_key(|(_, rank, _)| *rank);
        results
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn enter_phase(&mut self, phase: EliminationPhase) {
        self.phase = phase;
        self.pending_events
            .push(GameEvent::elimination_phase_changed(self.tick, phase.tag()));
    }

    /// Unconditional showdown trigger on low alive-count.
    fn check_showdown_trigger(&mut self) -> bool {
        let alive = self.alive_count();
        if alive <= 1 {
            self.finish();
            return true;
        }
        if alive <= self.config.final_showdown_players {
            self.enter_phase(EliminationPhase::FinalShowdown {
                ticks_remaining: self.config.showdown_duration_ticks,
            });
            return true;
        }
        false
    }

    /// Eliminate the bottom `quota` players.
    fn run_elimination_round(&mut self) {
        let quota = self.quota();
        if quota == 0 {
            return;
        }

        let alive_before = self.alive_count();

        // Indices of alive players, ascending by score. sort_by is stable,
        // so equal scores keep input order (documented tie-break).
        let mut alive_indices: Vec<usize> = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.eliminated)
            .map(|(i, _)| i)
            .collect();
        alive_indices.sort_by_key(|i| self.players[*i].score);

        for (order, idx) in alive_indices.into_iter().take(quota).enumerate() {
            let rank = (alive_before - order) as u32;
            let player = &mut self.players[idx];
            player.eliminated = true;
            player.rank = Some(rank);

            self.pending_events
                .push(GameEvent::player_eliminated(self.tick, player.id, rank));
        }

        if self.alive_count() <= 1 {
            self.finish();
        }
    }

    /// End the match and pick the winner.
    fn finish(&mut self) {
        if matches!(self.phase, EliminationPhase::Finished) {
            return;
        }

        // Highest-scoring survivor; stable sort means input order breaks ties.
        let mut survivors: Vec<&PlayerRanking> =
            self.players.iter().filter(|p| !p.eliminated).collect();
        survivors.sort_by(|a, b| b.score.cmp(&a.score));
        self.winner = survivors.first().map(|p| p.id);

        self.enter_phase(EliminationPhase::Finished);
        self.pending_events
            .push(GameEvent::match_finished(self.tick, self.winner));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(n: usize) -> Vec<PlayerId> {
        (0..n).map(|i| PlayerId::new([i as u8; 16])).collect()
    }

    /// Drive the engine past countdown and grace into Normal.
    fn advance_to_normal(engine: &mut EliminationEngine) {
        let limit = engine.config.countdown_ticks + engine.config.grace_period_ticks + 2;
        for _ in 0..limit {
            if matches!(engine.phase(), EliminationPhase::Normal) {
                return;
            }
            engine.advance();
        }
        assert!(matches!(engine.phase(), EliminationPhase::Normal));
    }

    /// Drive the engine until the next elimination round fires.
    fn advance_through_round(engine: &mut EliminationEngine) {
        let limit = engine.config.elimination_interval_ticks + 2;
        let before = engine.alive_count();
        for _ in 0..limit {
            engine.advance();
            if engine.alive_count() != before
                || matches!(engine.phase(), EliminationPhase::Finished)
            {
                return;
            }
        }
    }

    #[test]
    fn test_phase_progression() {
        let mut engine = EliminationEngine::new(&ids(10), EliminationConfig::default());
        assert!(matches!(engine.phase(), EliminationPhase::Countdown { .. }));

        for _ in 0..engine.config.countdown_ticks {
            engine.advance();
        }
        assert!(matches!(engine.phase(), EliminationPhase::GracePeriod { .. }));

        for _ in 0..engine.config.grace_period_ticks {
            engine.advance();
        }
        assert!(matches!(engine.phase(), EliminationPhase::Normal));

        // No one is eliminated before the first round fires.
        assert_eq!(engine.alive_count(), 10);
    }

    #[test]
    fn test_quota_scenario() {
        // 10 alive, 20%, minimum 3 -> quota 2
        let engine = EliminationEngine::new(&ids(10), EliminationConfig::default());
        assert_eq!(engine.quota(), 2);
    }

    #[test]
    fn test_quota_respects_minimum() {
        let config = EliminationConfig {
            minimum_players: 3,
            ..Default::default()
        };

        // 4 alive: raw quota 1, cap 1
        let engine = EliminationEngine::new(&ids(4), config.clone());
        assert_eq!(engine.quota(), 1);

        // 3 alive: cap is 0, no elimination
        let engine = EliminationEngine::new(&ids(3), config.clone());
        assert_eq!(engine.quota(), 0);

        let engine = EliminationEngine::new(&ids(2), config);
        assert_eq!(engine.quota(), 0);
    }

    #[test]
    fn test_elimination_removes_lowest_scorers() {
        let players = ids(10);
        let config = EliminationConfig {
            final_showdown_players: 2,
            ..Default::default()
        };
        let mut engine = EliminationEngine::new(&players, config);

        for (i, id) in players.iter().enumerate() {
            engine.record_score(*id, (i as u32 + 1) * 10);
        }

        advance_to_normal(&mut engine);
        advance_through_round(&mut engine);

        // 10 * 0.2 = 2 eliminated; the two lowest scorers
        assert_eq!(engine.alive_count(), 8);
        assert!(engine.players()[0].eliminated);
        assert!(engine.players()[1].eliminated);

        // Ranks: alive_before - index -> lowest gets 10, next gets 9
        assert_eq!(engine.players()[0].rank, Some(10));
        assert_eq!(engine.players()[1].rank, Some(9));
    }

    #[test]
    fn test_elimination_tie_break_is_input_order() {
        let players = ids(6);
        let config = EliminationConfig {
            minimum_players: 1,
            final_showdown_players: 1,
            ..Default::default()
        };
        let mut engine = EliminationEngine::new(&players, config);

        // Everyone tied at zero: the earliest-registered players go first.
        advance_to_normal(&mut engine);
        advance_through_round(&mut engine);

        // ceil(6 * 0.2) = 2
        assert_eq!(engine.alive_count(), 4);
        assert!(engine.players()[0].eliminated);
        assert!(engine.players()[1].eliminated);
        assert!(!engine.players()[2].eliminated);
    }

    #[test]
    fn test_showdown_triggers_at_threshold() {
        let players = ids(10);
        let config = EliminationConfig {
            final_showdown_players: 5,
            elimination_percentage: to_fixed(0.3),
            ..Default::default()
        };
        let mut engine = EliminationEngine::new(&players, config);
        for (i, id) in players.iter().enumerate() {
            engine.record_score(*id, i as u32 * 5);
        }

        advance_to_normal(&mut engine);
        // Round 1: ceil(10 * 0.3) = 3 -> 7 alive
        advance_through_round(&mut engine);
        assert_eq!(engine.alive_count(), 7);

        // Round 2: ceil(7 * 0.3) = 3 -> 4 alive, below the threshold of 5:
        // the engine must enter FinalShowdown immediately, not wait for the
        // next elimination schedule.
        advance_through_round(&mut engine);
        assert_eq!(engine.alive_count(), 4);
        engine.advance();
        assert!(matches!(engine.phase(), EliminationPhase::FinalShowdown { .. }));
    }

    #[test]
    fn test_showdown_duration_ends_match() {
        let players = ids(4);
        let config = EliminationConfig {
            final_showdown_players: 5, // triggers right away
            showdown_duration_ticks: 10,
            ..Default::default()
        };
        let mut engine = EliminationEngine::new(&players, config);
        engine.record_score(players[2], 99);

        advance_to_normal(&mut engine);
        engine.advance();
        assert!(matches!(engine.phase(), EliminationPhase::FinalShowdown { .. }));

        for _ in 0..10 {
            engine.advance();
        }
        assert!(matches!(engine.phase(), EliminationPhase::Finished));
        assert_eq!(engine.winner(), Some(players[2]));
    }

    #[test]
    fn test_time_expiry_finishes() {
        let config = EliminationConfig {
            match_duration_ticks: 5,
            ..Default::default()
        };
        let mut engine = EliminationEngine::new(&ids(10), config);

        for _ in 0..5 {
            engine.advance();
        }
        assert!(matches!(engine.phase(), EliminationPhase::Finished));
        assert!(engine.winner().is_some());
    }

    #[test]
    fn test_final_rankings_merge_eliminated_and_survivors() {
        let players = ids(10);
        let config = EliminationConfig {
            final_showdown_players: 2,
            match_duration_ticks: seconds_to_ticks(40),
            ..Default::default()
        };
        let mut engine = EliminationEngine::new(&players, config);
        for (i, id) in players.iter().enumerate() {
            engine.record_score(*id, (i as u32 + 1) * 10);
        }

        advance_to_normal(&mut engine);
        advance_through_round(&mut engine);
        while !matches!(engine.phase(), EliminationPhase::Finished) {
            engine.advance();
        }

        let rankings = engine.final_rankings();
        assert_eq!(rankings.len(), 10);

        // Ranks 1..=10, each exactly once
        let mut ranks: Vec<u32> = rankings.iter().map(|(_, r, _)| *r).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (1..=10).collect::<Vec<_>>());

        // Winner is rank 1 with the top score
        assert_eq!(rankings[0].0, engine.winner().unwrap());
        assert_eq!(rankings[0].2, 100);
    }

    #[test]
    fn test_record_score_after_elimination_is_noop() {
        let players = ids(10);
        let mut engine = EliminationEngine::new(&players, EliminationConfig::default());

        advance_to_normal(&mut engine);
        advance_through_round(&mut engine);

        let eliminated = engine
            .players()
            .iter()
            .find(|p| p.eliminated)
            .map(|p| (p.id, p.score, p.rank))
            .unwrap();

        engine.record_score(eliminated.0, 9999);

        let after = engine
            .players()
            .iter()
            .find(|p| p.id == eliminated.0)
            .unwrap();
        assert_eq!(after.score, eliminated.1);
        assert_eq!(after.rank, eliminated.2);
    }

    #[test]
    fn test_warning_event_carries_pending_count() {
        let players = ids(10);
        let mut engine = EliminationEngine::new(&players, EliminationConfig::default());
        advance_to_normal(&mut engine);
        engine.take_events();

        // Run until the warning fires
        let limit = engine.config.elimination_interval_ticks;
        let mut warned = false;
        for _ in 0..limit {
            engine.advance();
            for event in engine.take_events() {
                if let crate::game::events::GameEventData::EliminationWarning {
                    pending_count,
                    ..
                } = event.data
                {
                    assert_eq!(pending_count, 2);
                    warned = true;
                }
            }
            if warned {
                break;
            }
        }
        assert!(warned, "warning must fire before the round");
    }

    proptest! {
        /// Quota never drops alive below minimum and is never negative.
        #[test]
        fn prop_quota_bounds(
            alive in 0usize..200,
            pct in 0i32..=FIXED_ONE,
            minimum in 1usize..20,
        ) {
            let config = EliminationConfig {
                elimination_percentage: pct,
                minimum_players: minimum,
                ..Default::default()
            };
            let engine = EliminationEngine::new(&ids(alive), config);
            let quota = engine.quota();

            prop_assert!(quota <= alive.saturating_sub(minimum));
            if alive > minimum && pct > 0 {
                prop_assert!(quota >= 1);
            }
        }
    }
}
