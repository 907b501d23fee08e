//! Coindash Engine Demo
//!
//! Drives a scripted Classic session through the real engine, then a
//! Battle Royale elimination match, logging what happens. Useful as a
//! smoke test and as an example of the host-facing API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use coindash::{
    EngineDeps, GameMode, ModeConfig, PlayerId, SessionEngine, SessionState, VERSION,
};
use coindash::core::fixed::to_float;
use coindash::game::events::GameEventData;
use coindash::multiplayer::elimination::{EliminationConfig, EliminationEngine, EliminationPhase};
use coindash::session::boundary::MemoryHighScores;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Coindash Engine v{}", VERSION);

    demo_classic_session().await?;
    demo_battle_royale();

    Ok(())
}

/// Run a short Classic session through the full async engine.
async fn demo_classic_session() -> Result<()> {
    info!("=== Classic Session Demo ===");

    let deps = EngineDeps {
        high_scores: Arc::new(MemoryHighScores::with_best(25)),
        ..EngineDeps::default()
    };
    let local = PlayerId::new([1; 16]);
    let engine = SessionEngine::new(ModeConfig::classic(), local, deps);
    let mut events = engine.subscribe_events();

    engine.start_with_seed(20260808).await;

    // Collect every coin currently on the field, then let the session
    // run briefly so maintenance and power-ups do their work.
    for round in 0..3 {
        let coins: Vec<u32> = match engine.snapshot().await {
            SessionState::Running(run) => run
                .collectibles
                .values()
                .filter(|c| !c.kind.is_penalty())
                .map(|c| c.id)
                .collect(),
            _ => break,
        };

        for id in coins {
            if let Some(outcome) = engine.collect(id).await {
                info!(
                    "round {round}: collected #{id} for {:+} -> score {} (combo x{:.1})",
                    outcome.points_delta,
                    outcome.new_score,
                    to_float(outcome.multiplier),
                );
            }
        }

        tokio::time::sleep(Duration::from_millis(600)).await;
    }

    // Drain interesting events
    while let Ok(event) = events.try_recv() {
        match &event.data {
            GameEventData::ComboMilestone { count } => {
                info!("combo milestone: {count}");
            }
            GameEventData::PowerUpSpawned { kind, .. } => {
                info!("power-up on the field: {:?}", kind);
            }
            GameEventData::DifficultyStepped { scale } => {
                info!("difficulty step: scale now {:.2}", to_float(*scale));
            }
            _ => {}
        }
    }

    if let SessionState::Running(run) = engine.snapshot().await {
        info!(
            "session running: score {} with {} collected, {} on field",
            run.score,
            run.collected_count,
            run.collectibles.len()
        );
    }

    engine.reset().await;
    info!("classic demo reset to ready");
    Ok(())
}

/// Run a full Battle Royale elimination match on the pure state machine.
fn demo_battle_royale() {
    info!("=== Battle Royale Demo ===");

    let players: Vec<PlayerId> = (0..10u8).map(|i| PlayerId::new([i; 16])).collect();
    let mut engine = EliminationEngine::new(&players, EliminationConfig::default());

    info!(
        "{} players, mode {}",
        players.len(),
        GameMode::BattleRoyale.tag()
    );

    let mut tick: u32 = 0;
    while !matches!(engine.phase(), EliminationPhase::Finished) {
        tick += 1;

        // Simulated play: players accumulate score at different rates.
        for (i, id) in players.iter().enumerate() {
            if tick % (i as u32 + 2) == 0 {
                let alive = engine
                    .players()
                    .iter()
                    .find(|p| p.id == *id)
                    .map(|p| (p.eliminated, p.score));
                if let Some((false, score)) = alive {
                    engine.record_score(*id, score + 10);
                }
            }
        }

        engine.advance();

        for event in engine.take_events() {
            match event.data {
                GameEventData::EliminationPhaseChanged { phase_tag } => {
                    info!("tick {tick}: phase -> {phase_tag}");
                }
                GameEventData::EliminationWarning {
                    countdown_ticks,
                    pending_count,
                } => {
                    info!(
                        "tick {tick}: {pending_count} players eliminated in {countdown_ticks} ticks"
                    );
                }
                GameEventData::PlayerEliminated { player_id, rank } => {
                    info!(
                        "tick {tick}: player {} out at rank {rank}",
                        hex::encode(&player_id.0[..4])
                    );
                }
                _ => {}
            }
        }
    }

    info!("=== Final Rankings ===");
    for (id, rank, score) in engine.final_rankings() {
        info!("#{rank}: player {} - score {score}", hex::encode(&id.0[..4]));
    }

    if let Some(winner) = engine.winner() {
        info!("winner: {}", hex::encode(&winner.0[..4]));
    }
}
