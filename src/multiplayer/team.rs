//! Team Scoring Engine (Team Battle)
//!
//! Aggregates personal scores into team scores, tracks territory capture,
//! detects lead changes, and resolves exact ties with a sudden-death
//! overtime. Owns its own state, fed only by score-update calls.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::fixed::{
    Fixed, FIXED_ONE, fixed_clamp, fixed_scale_int, to_fixed, seconds_to_ticks,
};
use crate::core::rng::DeterministicRng;
use crate::game::events::GameEvent;
use crate::game::state::PlayerId;

/// Team identifier.
pub type TeamId = u8;

/// Tuning for the team battle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TeamConfig {
    /// Number of teams players are partitioned into.
    pub team_count: usize,
    /// Fraction of personal points credited to the team (Q16.16, 0..1).
    pub team_share: Fixed,
    /// Flat team bonus when a teammate of the local player collects.
    ///
    /// Proximity is a stub: the bonus is granted regardless of distance.
    pub assist_bonus: u32,
    /// Whether territory capture runs.
    pub territory_capture: bool,
    /// Number of territories on the map.
    pub territory_count: usize,
    /// Ticks between territory bonus payouts.
    pub territory_bonus_interval_ticks: u32,
    /// Bonus per owned territory per payout.
    pub territory_bonus_per_territory: u32,
    /// Overtime length after an exact tie.
    pub overtime_duration_ticks: u32,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            team_count: 2,
            team_share: to_fixed(0.5),
            assist_bonus: 5,
            territory_capture: true,
            territory_count: 3,
            territory_bonus_interval_ticks: seconds_to_ticks(10),
            territory_bonus_per_territory: 15,
            overtime_duration_ticks: seconds_to_ticks(30),
        }
    }
}

/// Phase of the team battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamPhase {
    /// Regular play.
    Regulation,
    /// Sudden-death after an exact tie at expiry.
    Overtime {
        /// Ticks until the battle ends as a draw.
        ticks_remaining: u32,
    },
    /// Battle resolved.
    Ended {
        /// Winning team, `None` for a declared draw.
        winner: Option<TeamId>,
    },
}

/// A player's membership and personal score.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TeamMember {
    /// Player identity.
    pub id: PlayerId,
    /// Assigned team.
    pub team: TeamId,
    /// Personal score (full points, before the team share).
    pub personal_score: u32,
}

/// A team's aggregate standing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Team {
    /// Team identity.
    pub id: TeamId,
    /// Aggregate team score.
    pub score: u32,
}

/// A capturable zone.
///
/// Per-team progress accumulates independently in [0, 1]; ownership
/// changes only when a team's progress reaches 1.0.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Territory {
    /// Territory identity.
    pub id: u8,
    /// Current owner, if captured.
    pub owner: Option<TeamId>,
    /// Capture progress per team.
    pub progress: BTreeMap<TeamId, Fixed>,
}

/// The team scoring state machine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TeamScoringEngine {
    config: TeamConfig,
    teams: Vec<Team>,
    members: Vec<TeamMember>,
    territories: Vec<Territory>,
    phase: TeamPhase,
    tick: u32,
    leader: Option<TeamId>,
    local_player: PlayerId,
    #[serde(skip)]
    pending_events: Vec<GameEvent>,
}

impl TeamScoringEngine {
    /// Partition players into teams and start regulation play.
    ///
    /// The player list is shuffled with the session RNG and assigned
    /// round-robin, so a given seed always produces the same teams.
    /// Config violations are clamped (at least one team, share in [0, 1]).
    pub fn new(
        player_ids: &[PlayerId],
        local_player: PlayerId,
        mut config: TeamConfig,
        rng: &mut DeterministicRng,
    ) -> Self {
        config.team_count = config.team_count.max(1);
        config.team_share = fixed_clamp(config.team_share, 0, FIXED_ONE);

        let mut shuffled: Vec<PlayerId> = player_ids.to_vec();
        rng.shuffle(&mut shuffled);

        let members = shuffled
            .iter()
            .enumerate()
            .map(|(i, id)| TeamMember {
                id: *id,
                team: (i % config.team_count) as TeamId,
                personal_score: 0,
            })
            .collect();

        let teams = (0..config.team_count)
            .map(|i| Team {
                id: i as TeamId,
                score: 0,
            })
            .collect();

        let territories = if config.territory_capture {
            (0..config.territory_count)
                .map(|i| Territory {
                    id: i as u8,
                    owner: None,
                    progress: BTreeMap::new(),
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            config,
            teams,
            members,
            territories,
            phase: TeamPhase::Regulation,
            tick: 0,
            leader: None,
            local_player,
            pending_events: Vec::new(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> TeamPhase {
        self.phase
    }

    /// All teams.
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// All members.
    pub fn members(&self) -> &[TeamMember] {
        &self.members
    }

    /// All territories.
    pub fn territories(&self) -> &[Territory] {
        &self.territories
    }

    /// Current leading team, if any score has been posted.
    pub fn leader(&self) -> Option<TeamId> {
        self.leader
    }

    /// Team a player belongs to.
    pub fn team_of(&self, player: PlayerId) -> Option<TeamId> {
        self.members.iter().find(|m| m.id == player).map(|m| m.team)
    }

    /// Territories owned by a team.
    pub fn territories_owned(&self, team: TeamId) -> usize {
        self.territories
            .iter()
            .filter(|t| t.owner == Some(team))
            .count()
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Credit a coin collection to a player.
    ///
    /// Adds the full points to the player's personal score and the
    /// configured share to the team. A teammate of the local player also
    /// grants the flat assist bonus (proximity stub). Unknown players and
    /// ended battles are silent no-ops.
    pub fn on_coin_collected(&mut self, player: PlayerId, points: u32) {
        if matches!(self.phase, TeamPhase::Ended { .. }) {
            return;
        }

        let Some(member_idx) = self.members.iter().position(|m| m.id == player) else {
            return;
        };

        let team = self.members[member_idx].team;
        self.members[member_idx].personal_score =
            self.members[member_idx].personal_score.saturating_add(points);

        let mut team_delta =
            fixed_scale_int(points as i64, self.config.team_share).max(0) as u32;

        if player != self.local_player && self.team_of(self.local_player) == Some(team) {
            team_delta = team_delta.saturating_add(self.config.assist_bonus);
        }

        if team_delta > 0 {
            self.add_team_score(team, team_delta);
        }
    }

    /// Accumulate capture progress for a team on a territory.
    ///
    /// Reaching 1.0 transfers ownership atomically: the previous owner
    /// gets a territory-lost event, the new owner a territory-captured
    /// event, and every team's progress on that territory resets.
    pub fn add_capture_progress(&mut self, territory: u8, team: TeamId, amount: Fixed) {
        if matches!(self.phase, TeamPhase::Ended { .. }) {
            return;
        }
        if team as usize >= self.teams.len() {
            return;
        }

        let tick = self.tick;
        let Some(territory) = self.territories.iter_mut().find(|t| t.id == territory) else {
            return;
        };
        if territory.owner == Some(team) {
            return;
        }

        let entry = territory.progress.entry(team).or_insert(0);
        *entry = fixed_clamp(entry.saturating_add(amount), 0, FIXED_ONE);

        if *entry >= FIXED_ONE {
            let previous = territory.owner;
            territory.owner = Some(team);
            territory.progress.clear();

            let territory_id = territory.id;
            if let Some(previous) = previous {
                self.pending_events
                    .push(GameEvent::territory_lost(tick, territory_id, previous));
            }
            self.pending_events
                .push(GameEvent::territory_captured(tick, territory_id, team));
        }
    }

    /// Advance the battle by one tick.
    ///
    /// In regulation this pays territory bonuses on the configured
    /// interval; in overtime it counts down toward a declared draw.
    /// Territory bonuses are suspended in overtime so the tie-break is
    /// decided by play, not by the payout timer.
    pub fn advance(&mut self) {
        self.tick += 1;

        match self.phase {
            TeamPhase::Regulation => {
                if self.config.territory_capture
                    && self.tick % self.config.territory_bonus_interval_ticks == 0
                {
                    self.pay_territory_bonuses();
                }
            }
            TeamPhase::Overtime { ticks_remaining } => {
                if ticks_remaining <= 1 {
                    self.end(None);
                } else {
                    self.phase = TeamPhase::Overtime {
                        ticks_remaining: ticks_remaining - 1,
                    };
                }
            }
            TeamPhase::Ended { .. } => {}
        }
    }

    /// Resolve the battle at timer expiry.
    ///
    /// An exact tie between the top two teams enters overtime; anything
    /// else ends the battle with the leading team as winner.
    pub fn on_time_expired(&mut self) {
        if !matches!(self.phase, TeamPhase::Regulation) {
            return;
        }

        let standings = self.standings();
        let tied = standings.len() >= 2 && standings[0].1 == standings[1].1;

        if tied {
            self.phase = TeamPhase::Overtime {
                ticks_remaining: self.config.overtime_duration_ticks,
            };
            self.pending_events.push(GameEvent::overtime_started(
                self.tick,
                self.config.overtime_duration_ticks,
            ));
        } else {
            let winner = standings.first().map(|(id, _)| *id);
            self.end(winner);
        }
    }

    /// Teams sorted descending by score. Stable: equal scores keep team
    /// id order.
    pub fn standings(&self) -> Vec<(TeamId, u32)> {
        let mut standings: Vec<(TeamId, u32)> =
            self.teams.iter().map(|t| (t.id, t.score)).collect();
        standings.sort_by(|a, b| b.1.cmp(&a.1));
        standings
    }

    fn add_team_score(&mut self, team: TeamId, delta: u32) {
        if let Some(entry) = self.teams.iter_mut().find(|t| t.id == team) {
            entry.score = entry.score.saturating_add(delta);
        }

        // First score change during overtime decides the battle.
        if matches!(self.phase, TeamPhase::Overtime { .. }) {
            self.end(Some(team));
            return;
        }

        self.recompute_leader();
    }

    fn pay_territory_bonuses(&mut self) {
        let payouts: Vec<(TeamId, u32)> = self
            .teams
            .iter()
            .map(|t| {
                let owned = self.territories_owned(t.id) as u32;
                (t.id, owned * self.config.territory_bonus_per_territory)
            })
            .filter(|(_, bonus)| *bonus > 0)
            .collect();

        for (team, bonus) in payouts {
            self.add_team_score(team, bonus);
        }
    }

    /// Emit a lead-change event exactly once per change of leading team.
    fn recompute_leader(&mut self) {
        let new_leader = self.standings().first().map(|(id, _)| *id);
        if new_leader != self.leader {
            self.leader = new_leader;
            if let Some(team) = new_leader {
                self.pending_events
                    .push(GameEvent::team_lead_changed(self.tick, team));
            }
        }
    }

    fn end(&mut self, winner: Option<TeamId>) {
        self.phase = TeamPhase::Ended { winner };
        self.pending_events
            .push(GameEvent::team_battle_ended(self.tick, winner));
    }
}
