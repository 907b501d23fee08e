//! # Coindash Session Engine
//!
//! Real-time session engine for a location-anchored collection game:
//! collectibles and power-ups spawn into a bounded world, players
//! collect them under timing constraints, and a scoring/elimination
//! layer converts collection events into ranked outcomes for solo and
//! competitive modes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   COINDASH SESSION ENGINE                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/          - Deterministic primitives                   │
//! │  ├── fixed.rs   - Q16.16 fixed-point arithmetic              │
//! │  ├── vec3.rs    - 3D vector with fixed-point                 │
//! │  └── rng.rs     - Deterministic Xorshift128+ PRNG            │
//! │                                                              │
//! │  game/          - Session logic (deterministic)              │
//! │  ├── config.rs      - Game modes and tuning                  │
//! │  ├── state.rs       - Tagged session state                   │
//! │  ├── collectible.rs - Collectible lifecycle                  │
//! │  ├── powerup.rs     - Power-ups and active effects           │
//! │  ├── combo.rs       - Windowed combo tracker                 │
//! │  ├── score.rs       - Score calculator                       │
//! │  └── events.rs      - Typed prioritized events               │
//! │                                                              │
//! │  session/       - Coordination (non-deterministic)           │
//! │  ├── engine.rs      - Periodic processes, transitions        │
//! │  └── boundary.rs    - Host traits, snapshot codecs           │
//! │                                                              │
//! │  multiplayer/   - Competitive layers                         │
//! │  ├── elimination.rs - Battle-royale elimination              │
//! │  └── team.rs        - Team scoring with territories          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/`, `game/`, and `multiplayer/` modules are deterministic:
//! - No floating-point arithmetic in session logic
//! - No HashMap (BTreeMap for sorted iteration)
//! - No system time dependencies (the engine layer stamps summaries)
//! - All randomness from seeded Xorshift128+
//!
//! Given the same seed and operation sequence, a session produces
//! identical spawns, scores, and rankings whether it is driven locally
//! or mirrored from a remote authority.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod multiplayer;
pub mod session;

// Re-export commonly used types
pub use crate::core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE, TICK_RATE};
pub use crate::core::rng::DeterministicRng;
pub use crate::core::vec3::FixedVec3;
pub use crate::game::config::{GameMode, ModeConfig};
pub use crate::game::state::{PlayerId, SessionState, SessionSummary};
pub use crate::session::engine::{CollectOutcome, EngineDeps, SessionEngine};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
