//! Host Boundary
//!
//! The engine is a library consumed by a host. Everything the host
//! supplies or observes crosses one of these traits: feedback cues
//! (sound/haptic), the high-score accessor, and the multiplayer sync
//! adapter with its snapshot codecs. The engine never performs I/O
//! itself.

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::vec3::FixedVec3;

// =============================================================================
// FEEDBACK SINK
// =============================================================================

/// Sound cues the engine raises. Playback is the host's job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    /// Beneficial collection.
    Collect,
    /// Penalty collection.
    Penalty,
    /// Combo milestone reached.
    ComboMilestone,
    /// Power-up collected.
    PowerUp,
    /// Shield absorbed a penalty.
    ShieldBlock,
    /// Session ended.
    SessionEnd,
    /// Session ended with a new high score.
    HighScore,
}

/// Haptic intensity tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticCue {
    /// Light tap.
    Light,
    /// Medium pulse.
    Medium,
    /// Heavy thud.
    Heavy,
}

/// Fire-and-forget feedback sink. Implementations must never block.
pub trait FeedbackSink: Send + Sync {
    /// Play a sound cue.
    fn play_sound(&self, cue: SoundCue);
    /// Trigger a haptic cue.
    fn haptic(&self, cue: HapticCue);
}

/// Feedback sink that drops every cue.
#[derive(Debug, Default)]
pub struct NoopFeedback;

impl FeedbackSink for NoopFeedback {
    fn play_sound(&self, _cue: SoundCue) {}
    fn haptic(&self, _cue: HapticCue) {}
}

// =============================================================================
// PERSISTENCE BOUNDARY
// =============================================================================

/// Host-supplied high-score accessor.
///
/// The engine only compares and stores a single integer; the storage
/// format is entirely the host's concern.
pub trait HighScoreStore: Send + Sync {
    /// Best score recorded so far.
    fn high_score(&self) -> u32;
    /// Persist a new best score.
    fn save_high_score(&self, score: u32);
}

/// In-memory high-score store for tests and the demo binary.
#[derive(Debug, Default)]
pub struct MemoryHighScores {
    best: AtomicU32,
}

impl MemoryHighScores {
    /// Store seeded with a prior best.
    pub fn with_best(best: u32) -> Self {
        Self {
            best: AtomicU32::new(best),
        }
    }
}

impl HighScoreStore for MemoryHighScores {
    fn high_score(&self) -> u32 {
        self.best.load(Ordering::Relaxed)
    }

    fn save_high_score(&self, score: u32) {
        self.best.fetch_max(score, Ordering::Relaxed);
    }
}

// =============================================================================
// SYNC ADAPTER
// =============================================================================

/// Outbound multiplayer sync boundary.
///
/// Both calls are fire-and-forget; the transport behind them is an
/// excluded collaborator.
pub trait SyncAdapter: Send + Sync {
    /// Publish the local player's score.
    fn publish_score(&self, score: u32);
    /// Publish the local player's position.
    fn publish_position(&self, position: FixedVec3);
}

/// Sync adapter that drops every update (solo play).
#[derive(Debug, Default)]
pub struct NoopSync;

impl SyncAdapter for NoopSync {
    fn publish_score(&self, _score: u32) {}
    fn publish_position(&self, _position: FixedVec3) {}
}

// =============================================================================
// REMOTE SNAPSHOTS
// =============================================================================

/// Snapshot decode failure.
///
/// Raised by the codecs below; the engine recovers every decode failure
/// to defaults and logs it, it never propagates one into a session.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Malformed JSON text form.
    #[error("malformed snapshot json: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed binary form.
    #[error("malformed snapshot bytes: {0}")]
    Bytes(#[from] bincode::Error),
}

/// One authoritative collectible in a remote snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteCollectible {
    /// Entity id.
    pub id: u32,
    /// Category tag; unknown tags decode as `coin`.
    pub kind_tag: String,
    /// World position.
    pub position: FixedVec3,
}

/// One authoritative power-up in a remote snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemotePowerUp {
    /// Entity id.
    pub id: u32,
    /// Kind tag; unknown tags decode as `double_score`.
    pub kind_tag: String,
    /// World position.
    pub position: FixedVec3,
    /// Absolute tick the power-up leaves the field.
    pub expires_tick: u32,
}

/// One participant's score in a remote snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemotePlayerScore {
    /// Player id as a hex string (JSON-friendly).
    pub player_id: String,
    /// Authoritative score.
    pub score: u32,
}

impl RemotePlayerScore {
    /// Parse the hex player id to raw bytes.
    pub fn player_id_bytes(&self) -> Option<[u8; 16]> {
        let bytes = hex::decode(&self.player_id).ok()?;
        if bytes.len() != 16 {
            return None;
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(&bytes);
        Some(arr)
    }
}

/// An authoritative session snapshot from the remote source.
///
/// The local engine mirrors these wholesale: a snapshot REPLACES the
/// local running payload, it is never merged. Tags are strings so a
/// newer authority can ship values an older client does not know;
/// unknown tags decode to documented defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteSnapshot {
    /// Session phase tag ("ready" / "running" / "finished").
    pub phase_tag: String,
    /// Game mode tag; unknown tags decode as `classic`.
    pub mode_tag: String,
    /// Authoritative tick.
    pub tick: u32,
    /// Ticks remaining, for timed modes.
    pub remaining_ticks: Option<u32>,
    /// Local player's authoritative score.
    pub score: u32,
    /// Lives remaining, for modes with lives.
    pub lives: Option<u32>,
    /// Field collectibles.
    #[serde(default)]
    pub collectibles: Vec<RemoteCollectible>,
    /// Field power-ups.
    #[serde(default)]
    pub power_ups: Vec<RemotePowerUp>,
    /// All participants' scores.
    #[serde(default)]
    pub player_scores: Vec<RemotePlayerScore>,
}

impl RemoteSnapshot {
    /// Decode from the JSON text form.
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode to the JSON text form.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from the compact binary form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Encode to the compact binary form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::collectible::CollectibleKind;
    use crate::game::config::GameMode;
    use crate::game::powerup::PowerUpKind;

    fn sample_snapshot() -> RemoteSnapshot {
        RemoteSnapshot {
            phase_tag: "running".to_string(),
            mode_tag: "battle_royale".to_string(),
            tick: 240,
            remaining_ticks: Some(3360),
            score: 120,
            lives: None,
            collectibles: vec![RemoteCollectible {
                id: 3,
                kind_tag: "bomb".to_string(),
                position: FixedVec3::from_ints(1, 1, 2),
            }],
            power_ups: vec![RemotePowerUp {
                id: 4,
                kind_tag: "shield".to_string(),
                position: FixedVec3::from_ints(2, 1, 0),
                expires_tick: 500,
            }],
            player_scores: vec![RemotePlayerScore {
                player_id: hex::encode([7u8; 16]),
                score: 90,
            }],
        }
    }

    #[test]
    fn test_json_round_trip() {
        let snapshot = sample_snapshot();
        let text = snapshot.to_json().unwrap();
        let decoded = RemoteSnapshot::from_json(&text).unwrap();

        assert_eq!(decoded.tick, 240);
        assert_eq!(decoded.score, 120);
        assert_eq!(decoded.collectibles.len(), 1);
        assert_eq!(decoded.power_ups[0].expires_tick, 500);
    }

    #[test]
    fn test_bytes_round_trip() {
        let snapshot = sample_snapshot();
        let bytes = snapshot.to_bytes().unwrap();
        let decoded = RemoteSnapshot::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.mode_tag, "battle_royale");
    }

    #[test]
    fn test_malformed_json_is_typed_error() {
        assert!(RemoteSnapshot::from_json("{not json").is_err());
        assert!(RemoteSnapshot::from_bytes(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_unknown_tags_decode_to_defaults() {
        // An authority newer than this client may ship unknown tags;
        // they decode to the documented fallbacks instead of failing.
        assert_eq!(GameMode::parse_tag("warp_mode"), GameMode::Classic);
        assert_eq!(CollectibleKind::parse_tag("meteor"), CollectibleKind::Coin);
        assert_eq!(PowerUpKind::parse_tag("rocket"), PowerUpKind::DoubleScore);
    }

    #[test]
    fn test_player_id_hex_parse() {
        let entry = RemotePlayerScore {
            player_id: hex::encode([9u8; 16]),
            score: 10,
        };
        assert_eq!(entry.player_id_bytes(), Some([9u8; 16]));

        let bad = RemotePlayerScore {
            player_id: "zz".to_string(),
            score: 10,
        };
        assert_eq!(bad.player_id_bytes(), None);

        let short = RemotePlayerScore {
            player_id: "abcd".to_string(),
            score: 10,
        };
        assert_eq!(short.player_id_bytes(), None);
    }

    #[test]
    fn test_memory_high_scores() {
        let store = MemoryHighScores::with_best(100);
        assert_eq!(store.high_score(), 100);

        store.save_high_score(50);
        assert_eq!(store.high_score(), 100);

        store.save_high_score(150);
        assert_eq!(store.high_score(), 150);
    }
}
