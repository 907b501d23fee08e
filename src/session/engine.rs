//! Session Engine
//!
//! Owns the canonical [`SessionState`] and drives it with independent
//! periodic processes (timer, maintenance, cleanup, power-up
//! spawn/cleanup, combo decay). Each process reads the latest state
//! under the write lock, checks the state tag, computes the new state,
//! and publishes events; work in flight when the session leaves
//! `Running` is simply discarded. `reset` aborts every process
//! immediately and idempotently.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::core::fixed::{Fixed, FIXED_ONE, TICK_RATE, DIFFICULTY_STEP_TICKS};
use crate::core::rng::{derive_session_seed, DeterministicRng};
use crate::core::vec3::FixedVec3;
use crate::game::collectible::{self, Collectible, CollectibleKind};
use crate::game::config::{GameMode, ModeConfig};
use crate::game::events::{GameEvent, GameEventData};
use crate::game::powerup::{self, PowerUp, PowerUpKind};
use crate::game::score;
use crate::game::state::{EndCause, PlayerId, RunningState, SessionState};
use crate::multiplayer::elimination::{EliminationConfig, EliminationEngine, EliminationPhase};
use crate::multiplayer::team::{TeamConfig, TeamPhase, TeamScoringEngine};
use crate::session::boundary::{
    FeedbackSink, HapticCue, HighScoreStore, MemoryHighScores, NoopFeedback, NoopSync,
    RemoteSnapshot, SoundCue, SyncAdapter,
};

/// Host collaborators, injected once at construction.
pub struct EngineDeps {
    /// Sound/haptic sink.
    pub feedback: Arc<dyn FeedbackSink>,
    /// High-score accessor.
    pub high_scores: Arc<dyn HighScoreStore>,
    /// Outbound multiplayer sync.
    pub sync: Arc<dyn SyncAdapter>,
}

impl Default for EngineDeps {
    fn default() -> Self {
        Self {
            feedback: Arc::new(NoopFeedback),
            high_scores: Arc::new(MemoryHighScores::default()),
            sync: Arc::new(NoopSync),
        }
    }
}

/// Result of a successful collection.
#[derive(Clone, Copy, Debug)]
pub struct CollectOutcome {
    /// Category collected.
    pub kind: CollectibleKind,
    /// Raw signed delta applied (zero when shielded).
    pub points_delta: i64,
    /// Score after clamping.
    pub new_score: u32,
    /// Combo count after the collection.
    pub combo_count: u32,
    /// Multiplier applied to the collection.
    pub multiplier: Fixed,
    /// A shield absorbed this penalty.
    pub shield_absorbed: bool,
    /// Milestone reached, if any.
    pub milestone: Option<u32>,
}

/// Everything the periodic processes share.
struct EngineShared {
    state: RwLock<SessionState>,
    config: ModeConfig,
    events: broadcast::Sender<GameEvent>,
    deps: EngineDeps,
    local_player: PlayerId,
    elimination: RwLock<Option<EliminationEngine>>,
    team: RwLock<Option<TeamScoringEngine>>,
}

/// The session engine.
///
/// One engine drives one session at a time. All collaborators are
/// injected; there is no ambient global state.
pub struct SessionEngine {
    shared: Arc<EngineShared>,
    tasks: StdMutex<Vec<JoinHandle<()>>>,
}

impl SessionEngine {
    /// Create an engine for the given mode and host collaborators.
    pub fn new(config: ModeConfig, local_player: PlayerId, deps: EngineDeps) -> Self {
        let (events, _) = broadcast::channel(256);

        Self {
            shared: Arc::new(EngineShared {
                state: RwLock::new(SessionState::Ready),
                config: config.sanitized(),
                events,
                deps,
                local_player,
                elimination: RwLock::new(None),
                team: RwLock::new(None),
            }),
            tasks: StdMutex::new(Vec::new()),
        }
    }

    /// Subscribe to the engine's event stream.
    pub fn subscribe_events(&self) -> broadcast::Receiver<GameEvent> {
        self.shared.events.subscribe()
    }

    /// Clone of the current canonical state.
    pub async fn snapshot(&self) -> SessionState {
        self.shared.state.read().await.clone()
    }

    /// Start a solo session with host-derived entropy.
    ///
    /// No-op (returns false) unless the engine is `Ready`.
    pub async fn start(&self) -> bool {
        let session_id = *uuid::Uuid::new_v4().as_bytes();
        let mut entropy = [0u8; 32];
        entropy[..16].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
        entropy[16..].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
        let seed = derive_session_seed(&entropy, &session_id, &[self.shared.local_player.0]);

        self.start_inner(session_id, seed, &[self.shared.local_player])
            .await
    }

    /// Start a session with an explicit seed (reproducible runs).
    pub async fn start_with_seed(&self, seed: u64) -> bool {
        self.start_inner([0u8; 16], seed, &[self.shared.local_player])
            .await
    }

    /// Start a competitive session with the full participant list.
    ///
    /// Builds the elimination or team layer according to the mode and
    /// launches its driver alongside the session processes.
    pub async fn start_competitive(&self, seed: u64, players: &[PlayerId]) -> bool {
        self.start_inner([0u8; 16], seed, players).await
    }

    async fn start_inner(&self, session_id: [u8; 16], seed: u64, players: &[PlayerId]) -> bool {
        let events = {
            let mut guard = self.shared.state.write().await;
            if !matches!(*guard, SessionState::Ready) {
                debug!("start ignored: session is {}", guard.phase_tag());
                return false;
            }

            let mut run = RunningState::new(session_id, seed, &self.shared.config);
            collectible::spawn_initial(&mut run, &self.shared.config);
            run.push_event(GameEvent::session_started(0, run.mode.tag()));

            let events = run.take_events();
            *guard = SessionState::Running(run);
            events
        };
        self.shared.publish(events);

        // Competitive layers own their state independently of the session.
        match self.shared.config.mode {
            GameMode::BattleRoyale => {
                let engine = EliminationEngine::new(players, EliminationConfig::default());
                *self.shared.elimination.write().await = Some(engine);
            }
            GameMode::TeamBattle => {
                let mut rng = DeterministicRng::new(seed ^ 0x7EA7);
                let engine = TeamScoringEngine::new(
                    players,
                    self.shared.local_player,
                    TeamConfig::default(),
                    &mut rng,
                );
                *self.shared.team.write().await = Some(engine);
            }
            _ => {}
        }

        self.spawn_processes();

        info!(
            session = %hex::encode(&session_id[..4]),
            mode = self.shared.config.mode.tag(),
            seed,
            "session started"
        );
        true
    }

    /// Collect a collectible by id.
    ///
    /// Silent no-op (`None`) when the session is not running or the id is
    /// stale - a tap racing an expiry timer must never be an error.
    pub async fn collect(&self, id: u32) -> Option<CollectOutcome> {
        let (outcome, events, score_now) = {
            let mut guard = self.shared.state.write().await;
            let run = guard.as_running_mut()?;

            let collectible = collectible::collect(run, id)?;
            let now = run.tick;
            let kind = collectible.kind;

            let mut lives_exhausted = false;
            let outcome = if kind.is_penalty() {
                if run.effects.shield_active(now) {
                    // Shield bypasses the score calculator entirely.
                    run.push_event(GameEvent::shield_absorbed(now, id, kind));
                    CollectOutcome {
                        kind,
                        points_delta: 0,
                        new_score: run.score,
                        combo_count: run.combo.count(),
                        multiplier: FIXED_ONE,
                        shield_absorbed: true,
                        milestone: None,
                    }
                } else {
                    let lost = run.combo.count();
                    if run.combo.on_disqualifying_collect() {
                        run.push_event(GameEvent::combo_broken(now, lost));
                    }

                    let (new_score, delta) =
                        score::apply(run.score, kind.base_value(), FIXED_ONE, FIXED_ONE);
                    run.score = new_score;
                    run.penalty_count += 1;
                    run.push_event(GameEvent::collectible_collected(
                        now, id, kind, delta, new_score, 0, FIXED_ONE,
                    ));

                    if self.shared.config.mode.uses_lives() {
                        let remaining = run.lives.unwrap_or(0).saturating_sub(1);
                        run.lives = Some(remaining);
                        run.push_event(GameEvent::life_lost(now, remaining));
                        lives_exhausted = remaining == 0;
                    }

                    CollectOutcome {
                        kind,
                        points_delta: delta,
                        new_score,
                        combo_count: 0,
                        multiplier: FIXED_ONE,
                        shield_absorbed: false,
                        milestone: None,
                    }
                }
            } else {
                let window_factor = run.effects.combo_window_factor(now);
                let advance = run.combo.on_qualifying_collect(now, window_factor);
                let effect_mult = run.effects.score_multiplier(now);

                let (new_score, delta) =
                    score::apply(run.score, kind.base_value(), advance.multiplier, effect_mult);
                run.score = new_score;
                run.collected_count += 1;
                run.push_event(GameEvent::collectible_collected(
                    now,
                    id,
                    kind,
                    delta,
                    new_score,
                    advance.count,
                    advance.multiplier,
                ));
                if let Some(milestone) = advance.milestone {
                    run.push_event(GameEvent::combo_milestone(now, milestone));
                }

                CollectOutcome {
                    kind,
                    points_delta: delta,
                    new_score,
                    combo_count: advance.count,
                    multiplier: advance.multiplier,
                    shield_absorbed: false,
                    milestone: advance.milestone,
                }
            };

            let score_now = run.score;
            let mut events = run.take_events();
            if lives_exhausted {
                events.extend(
                    self.shared
                        .finish_in_place(&mut guard, EndCause::LivesExhausted),
                );
            }

            (outcome, events, score_now)
        };

        self.shared.deps.sync.publish_score(score_now);
        self.shared
            .record_competitive_score(outcome, score_now)
            .await;
        self.shared.publish(events);

        Some(outcome)
    }

    /// Collect a power-up by id, activating its effect.
    ///
    /// Re-collecting a kind already active replaces the running effect.
    /// Stale ids and wrong states are silent no-ops.
    pub async fn collect_power_up(&self, id: u32) -> Option<PowerUpKind> {
        let (kind, events) = {
            let mut guard = self.shared.state.write().await;
            let run = guard.as_running_mut()?;

            let power_up = run.power_ups.remove(&id)?;
            let now = run.tick;
            let effect = run.effects.activate(power_up.kind, now);
            run.push_event(GameEvent::power_up_collected(
                now,
                id,
                power_up.kind,
                effect.ends_tick,
            ));

            (power_up.kind, run.take_events())
        };

        self.shared.publish(events);
        Some(kind)
    }

    /// Update the local player's anchor position.
    ///
    /// Spawning bands follow the anchor; the position is also forwarded
    /// to the sync boundary.
    pub async fn update_position(&self, position: FixedVec3) {
        {
            let mut guard = self.shared.state.write().await;
            match guard.as_running_mut() {
                Some(run) => run.anchor = position,
                None => return,
            }
        }
        self.shared.deps.sync.publish_position(position);
    }

    /// Cancel all periodic processes and return to `Ready`.
    ///
    /// Valid from any state; cancelling twice is harmless.
    pub async fn reset(&self) {
        self.abort_tasks();

        {
            let mut guard = self.shared.state.write().await;
            if !matches!(*guard, SessionState::Ready) {
                info!("session reset to ready from {}", guard.phase_tag());
            }
            *guard = SessionState::Ready;
        }

        *self.shared.elimination.write().await = None;
        *self.shared.team.write().await = None;
    }

    /// Mirror an authoritative snapshot into the local state.
    ///
    /// The snapshot REPLACES the local running payload (no merging).
    /// Finished snapshots are ignored - the local finish path owns the
    /// terminal transition. Malformed tags decode to defaults.
    pub async fn apply_remote_snapshot(&self, snapshot: RemoteSnapshot) {
        mirror_snapshot(&self.shared, snapshot).await;
    }

    /// Consume an authoritative snapshot stream until it ends or the
    /// engine resets.
    pub fn spawn_mirror_task<S>(&self, stream: S)
    where
        S: Stream<Item = RemoteSnapshot> + Send + 'static,
    {
        let shared = self.shared.clone();
        let handle = tokio::spawn(async move {
            let mut stream = Box::pin(stream);
            while let Some(snapshot) = stream.next().await {
                mirror_snapshot(&shared, snapshot).await;
            }
        });
        self.push_task(handle);
    }

    /// Clone of the elimination layer, when running Battle Royale.
    pub async fn elimination_snapshot(&self) -> Option<EliminationEngine> {
        self.shared.elimination.read().await.clone()
    }

    /// Clone of the team layer, when running Team Battle.
    pub async fn team_snapshot(&self) -> Option<TeamScoringEngine> {
        self.shared.team.read().await.clone()
    }

    // -------------------------------------------------------------------------
    // Periodic processes
    // -------------------------------------------------------------------------

    fn spawn_processes(&self) {
        let cfg = &self.shared.config;

        self.push_task(spawn_timer_process(self.shared.clone()));
        self.push_task(spawn_collectible_process(
            self.shared.clone(),
            cfg.maintenance_interval_ticks,
            CollectibleProcess::Maintain,
        ));
        self.push_task(spawn_collectible_process(
            self.shared.clone(),
            cfg.cleanup_interval_ticks,
            CollectibleProcess::Cleanup,
        ));
        self.push_task(spawn_powerup_process(self.shared.clone()));
        self.push_task(spawn_combo_decay_process(self.shared.clone()));

        if cfg.mode.is_competitive() {
            self.push_task(spawn_competitive_process(self.shared.clone()));
        }
    }

    fn push_task(&self, handle: JoinHandle<()>) {
        let mut tasks = self
            .tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        tasks.push(handle);
    }

    fn abort_tasks(&self) {
        let mut tasks = self
            .tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for SessionEngine {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

impl EngineShared {
    /// Publish events to subscribers and mirror them into feedback cues.
    fn publish(&self, events: Vec<GameEvent>) {
        for event in events {
            self.emit_feedback(&event);
            // Send fails only with no live subscribers; that is fine.
            let _ = self.events.send(event);
        }
    }

    fn emit_feedback(&self, event: &GameEvent) {
        let feedback = &self.deps.feedback;
        match &event.data {
            GameEventData::CollectibleCollected { points_delta, .. } => {
                if *points_delta < 0 {
                    feedback.play_sound(SoundCue::Penalty);
                    feedback.haptic(HapticCue::Medium);
                } else {
                    feedback.play_sound(SoundCue::Collect);
                    feedback.haptic(HapticCue::Light);
                }
            }
            GameEventData::ShieldAbsorbed { .. } => {
                feedback.play_sound(SoundCue::ShieldBlock);
                feedback.haptic(HapticCue::Light);
            }
            GameEventData::ComboMilestone { .. } => {
                feedback.play_sound(SoundCue::ComboMilestone);
                feedback.haptic(HapticCue::Medium);
            }
            GameEventData::PowerUpCollected { .. } => {
                feedback.play_sound(SoundCue::PowerUp);
                feedback.haptic(HapticCue::Light);
            }
            GameEventData::LifeLost { .. } => {
                feedback.haptic(HapticCue::Heavy);
            }
            GameEventData::SessionEnded { new_high_score, .. } => {
                let cue = if *new_high_score {
                    SoundCue::HighScore
                } else {
                    SoundCue::SessionEnd
                };
                feedback.play_sound(cue);
                feedback.haptic(HapticCue::Heavy);
            }
            _ => {}
        }
    }

    /// Transition `Running -> Finished` under an already-held write lock.
    ///
    /// Returns the events to publish (drained pending plus the terminal
    /// one). A non-running state returns nothing: the caller raced a
    /// concurrent finish and its work is discarded.
    fn finish_in_place(&self, state: &mut SessionState, cause: EndCause) -> Vec<GameEvent> {
        let old = std::mem::take(state);
        let mut run = match old {
            SessionState::Running(run) => run,
            other => {
                *state = other;
                return Vec::new();
            }
        };

        let mut events = run.take_events();

        let prior_best = self.deps.high_scores.high_score();
        let new_high_score = run.score > prior_best;
        if new_high_score {
            self.deps.high_scores.save_high_score(run.score);
        }

        let summary = run.summarize(new_high_score, cause, chrono::Utc::now());
        events.push(GameEvent::session_ended(
            run.tick,
            summary.final_score,
            summary.new_high_score,
            summary.perfect_run,
            cause,
        ));

        self.deps.sync.publish_score(summary.final_score);
        info!(
            final_score = summary.final_score,
            new_high_score,
            perfect = summary.perfect_run,
            "session finished"
        );

        *state = SessionState::Finished(summary);
        events
    }

    /// Push the local player's score into the competitive layers.
    async fn record_competitive_score(&self, outcome: CollectOutcome, score_now: u32) {
        if !self.config.mode.is_competitive() {
            return;
        }

        {
            let mut elimination = self.elimination.write().await;
            if let Some(engine) = elimination.as_mut() {
                engine.record_score(self.local_player, score_now);
            }
        }

        // Only beneficial collections feed team scoring.
        if outcome.points_delta > 0 {
            let events = {
                let mut team = self.team.write().await;
                match team.as_mut() {
                    Some(engine) => {
                        engine.on_coin_collected(self.local_player, outcome.points_delta as u32);
                        engine.take_events()
                    }
                    None => Vec::new(),
                }
            };
            self.publish(events);
        }
    }
}

/// Convert a tick count into the wall-clock interval of a process.
fn ticks_to_duration(ticks: u32) -> Duration {
    Duration::from_millis(ticks.max(1) as u64 * 1000 / TICK_RATE as u64)
}

/// The session timer: advances the clock, drives difficulty, ends timed
/// sessions.
fn spawn_timer_process(shared: Arc<EngineShared>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(ticks_to_duration(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let events = {
                let mut guard = shared.state.write().await;
                let Some(run) = guard.as_running_mut() else {
                    break;
                };

                run.tick += 1;

                #[cfg(feature = "debug-tracing")]
                tracing::trace!(tick = run.tick, score = run.score, "timer tick");

                if shared.config.difficulty_scaling && run.tick % DIFFICULTY_STEP_TICKS == 0 {
                    let scale = collectible::apply_difficulty_step(run);
                    let tick = run.tick;
                    run.push_event(GameEvent::difficulty_stepped(tick, scale));
                }

                let mut time_up = false;
                if let Some(remaining) = run.remaining_ticks {
                    let remaining = remaining.saturating_sub(1);
                    run.remaining_ticks = Some(remaining);
                    time_up = remaining == 0;
                }

                let mut events = run.take_events();

                if time_up && shared.config.mode == GameMode::TeamBattle {
                    // An exact tie extends the session into overtime
                    // instead of finishing outright.
                    let mut team = shared.team.write().await;
                    if let Some(engine) = team.as_mut() {
                        engine.on_time_expired();
                        events.extend(engine.take_events());
                        if let TeamPhase::Overtime { ticks_remaining } = engine.phase() {
                            run.remaining_ticks = Some(ticks_remaining);
                            time_up = false;
                        }
                    }
                }

                if time_up {
                    events.extend(shared.finish_in_place(&mut guard, EndCause::TimeUp));
                }
                events
            };

            shared.publish(events);
        }
    })
}

/// Which collectible housekeeping a process performs.
enum CollectibleProcess {
    Maintain,
    Cleanup,
}

/// Maintenance and cleanup loops share one shape: lock, check the tag,
/// transform, publish.
fn spawn_collectible_process(
    shared: Arc<EngineShared>,
    interval_ticks: u32,
    process: CollectibleProcess,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(ticks_to_duration(interval_ticks));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let events = {
                let mut guard = shared.state.write().await;
                let Some(run) = guard.as_running_mut() else {
                    break;
                };

                match process {
                    CollectibleProcess::Maintain => {
                        collectible::maintain(run, &shared.config);
                    }
                    CollectibleProcess::Cleanup => {
                        collectible::cleanup_expired(run);
                    }
                }
                run.take_events()
            };

            shared.publish(events);
        }
    })
}

/// Power-up spawn and cleanup, plus active-effect expiry.
fn spawn_powerup_process(shared: Arc<EngineShared>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(ticks_to_duration(shared.config.cleanup_interval_ticks));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let events = {
                let mut guard = shared.state.write().await;
                let Some(run) = guard.as_running_mut() else {
                    break;
                };

                let now = run.tick;
                for kind in run.effects.expire_elapsed(now) {
                    run.push_event(GameEvent::effect_expired(now, kind));
                }

                powerup::cleanup_expired_power_ups(run);

                if run.tick >= run.next_powerup_spawn_tick {
                    powerup::maybe_spawn_power_up(run, &shared.config);
                    run.next_powerup_spawn_tick =
                        run.tick + shared.config.powerup_spawn_interval_ticks;
                }

                run.take_events()
            };

            shared.publish(events);
        }
    })
}

/// Combo idle decay.
fn spawn_combo_decay_process(shared: Arc<EngineShared>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(ticks_to_duration(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let events = {
                let mut guard = shared.state.write().await;
                let Some(run) = guard.as_running_mut() else {
                    break;
                };

                let now = run.tick;
                let window_factor = run.effects.combo_window_factor(now);
                if run.combo.tick(now, window_factor) {
                    run.push_event(GameEvent::combo_expired(now));
                }
                run.take_events()
            };

            shared.publish(events);
        }
    })
}

/// Driver for the competitive layer of the active mode.
fn spawn_competitive_process(shared: Arc<EngineShared>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(ticks_to_duration(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if !shared.state.read().await.is_running() {
                break;
            }

            let layer_done = match shared.config.mode {
                GameMode::BattleRoyale => {
                    let (events, done) = {
                        let mut elimination = shared.elimination.write().await;
                        match elimination.as_mut() {
                            Some(engine) => {
                                engine.advance();
                                let done =
                                    matches!(engine.phase(), EliminationPhase::Finished);
                                (engine.take_events(), done)
                            }
                            None => break,
                        }
                    };
                    shared.publish(events);
                    done
                }
                GameMode::TeamBattle => {
                    let (events, done) = {
                        let mut team = shared.team.write().await;
                        match team.as_mut() {
                            Some(engine) => {
                                engine.advance();
                                let done = matches!(engine.phase(), TeamPhase::Ended { .. });
                                (engine.take_events(), done)
                            }
                            None => break,
                        }
                    };
                    shared.publish(events);
                    done
                }
                _ => break,
            };

            if layer_done {
                let events = {
                    let mut guard = shared.state.write().await;
                    shared.finish_in_place(&mut guard, EndCause::TimeUp)
                };
                shared.publish(events);
                break;
            }
        }
    })
}

/// Apply one authoritative snapshot: replace the local running payload
/// and feed participant scores into the competitive layers.
async fn mirror_snapshot(shared: &Arc<EngineShared>, snapshot: RemoteSnapshot) {
    if snapshot.phase_tag == "finished" {
        debug!("ignoring finished remote snapshot");
        return;
    }

    {
        let mut guard = shared.state.write().await;
        if matches!(*guard, SessionState::Finished(_)) {
            return;
        }

        let mut run = match std::mem::take(&mut *guard) {
            SessionState::Running(run) => run,
            _ => RunningState::new([0u8; 16], 0, &shared.config),
        };

        run.tick = snapshot.tick;
        run.remaining_ticks = snapshot.remaining_ticks;
        run.score = snapshot.score;
        run.lives = snapshot.lives;
        run.mode = GameMode::parse_tag(&snapshot.mode_tag);

        run.collectibles.clear();
        for remote in &snapshot.collectibles {
            let kind = CollectibleKind::parse_tag(&remote.kind_tag);
            run.collectibles.insert(
                remote.id,
                Collectible {
                    id: remote.id,
                    position: remote.position,
                    kind,
                    scale: run.difficulty_scale,
                    spawned_tick: snapshot.tick,
                    lifetime_ticks: kind.lifetime_ticks(),
                },
            );
            run.next_entity_id = run.next_entity_id.max(remote.id + 1);
        }

        run.power_ups.clear();
        for remote in &snapshot.power_ups {
            let kind = PowerUpKind::parse_tag(&remote.kind_tag);
            run.power_ups.insert(
                remote.id,
                PowerUp {
                    id: remote.id,
                    kind,
                    position: remote.position,
                    spawned_tick: snapshot.tick,
                    expires_tick: remote.expires_tick,
                },
            );
            run.next_entity_id = run.next_entity_id.max(remote.id + 1);
        }

        *guard = SessionState::Running(run);
    }

    let mut elimination = shared.elimination.write().await;
    if let Some(engine) = elimination.as_mut() {
        for entry in &snapshot.player_scores {
            match entry.player_id_bytes() {
                Some(bytes) => engine.record_score(PlayerId::new(bytes), entry.score),
                None => {
                    warn!(player = %entry.player_id, "dropping malformed player id in snapshot")
                }
            }
        }
    }
}
