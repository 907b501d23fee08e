//! Windowed Combo Tracker
//!
//! A rolling streak of qualifying collections inside a time window.
//! The tracker is pure state: it never emits side effects, only returns
//! multipliers, milestone flags, and expiry booleans for the caller to
//! act on.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{
    Fixed, FIXED_ONE,
    COMBO_MULT_BASE, COMBO_MULT_TIER1, COMBO_MULT_TIER2,
    COMBO_MULT_TIER3, COMBO_MULT_TIER4,
};

/// Streak counts that callers surface as secondary effects (sound/haptic).
pub const COMBO_MILESTONES: [u32; 8] = [3, 5, 10, 15, 20, 25, 30, 50];

/// Multiplier for a given streak count.
///
/// Pure function of the count:
/// <3 → 1.0, 3-4 → 1.2, 5-9 → 1.5, 10-19 → 2.0, ≥20 → 2.5.
pub fn multiplier_for(count: u32) -> Fixed {
    match count {
        0..=2 => COMBO_MULT_BASE,
        3..=4 => COMBO_MULT_TIER1,
        5..=9 => COMBO_MULT_TIER2,
        10..=19 => COMBO_MULT_TIER3,
        _ => COMBO_MULT_TIER4,
    }
}

/// Result of a qualifying collection.
#[derive(Clone, Copy, Debug)]
pub struct ComboAdvance {
    /// Streak count after this collection.
    pub count: u32,
    /// Multiplier applied to THIS collection.
    pub multiplier: Fixed,
    /// Milestone reached by this collection, if any.
    pub milestone: Option<u32>,
}

/// Rolling combo state.
///
/// Invariant: a stored count only produces a multiplier above 1.0 while
/// the window is still open; once idle past the window, the effective
/// multiplier is 1.0 until the next reset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComboState {
    /// Current streak count.
    count: u32,
    /// Tick of the last qualifying collection, `None` after reset/expiry.
    last_collect_tick: Option<u32>,
    /// Base window in ticks.
    window_ticks: u32,
    /// Highest streak reached this session.
    peak: u32,
}

impl ComboState {
    /// Create a tracker with the given base window.
    pub fn new(window_ticks: u32) -> Self {
        Self {
            count: 0,
            last_collect_tick: None,
            window_ticks: window_ticks.max(1),
            peak: 0,
        }
    }

    /// Current streak count.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Highest streak reached this session.
    pub fn peak(&self) -> u32 {
        self.peak
    }

    /// Base window in ticks.
    pub fn window_ticks(&self) -> u32 {
        self.window_ticks
    }

    /// Window after applying an effect factor (e.g. Haste doubles it).
    fn effective_window(&self, window_factor: Fixed) -> u32 {
        ((self.window_ticks as u64 * window_factor as u64) >> 16) as u32
    }

    /// Whether the streak is still live at `now`.
    pub fn is_active(&self, now: u32) -> bool {
        match self.last_collect_tick {
            Some(last) if self.count > 0 => now.saturating_sub(last) < self.window_ticks,
            _ => false,
        }
    }

    /// Display multiplier for the current streak: the tier for the
    /// stored count while the window is open, 1.0 once it lapsed.
    pub fn current_multiplier(&self, now: u32) -> Fixed {
        if self.is_active(now) {
            multiplier_for(self.count)
        } else {
            FIXED_ONE
        }
    }

    /// Register a qualifying collection at `now`.
    ///
    /// Extends the streak if the previous collection is still inside the
    /// (factor-adjusted) window, otherwise restarts at 1. The returned
    /// multiplier is the one applied to this collection.
    pub fn on_qualifying_collect(&mut self, now: u32, window_factor: Fixed) -> ComboAdvance {
        let window = self.effective_window(window_factor);
        let within = match self.last_collect_tick {
            Some(last) => now.saturating_sub(last) < window,
            None => false,
        };

        self.count = if within { self.count + 1 } else { 1 };
        self.last_collect_tick = Some(now);
        self.peak = self.peak.max(self.count);

        let milestone = COMBO_MILESTONES
            .iter()
            .copied()
            .find(|m| *m == self.count);

        ComboAdvance {
            count: self.count,
            multiplier: multiplier_for(self.count),
            milestone,
        }
    }

    /// Register a disqualifying (penalty) collection.
    ///
    /// A single penalty breaks the combo entirely - no partial decay.
    /// Returns true if a live streak was actually broken.
    pub fn on_disqualifying_collect(&mut self) -> bool {
        let had_streak = self.count > 0;
        self.count = 0;
        self.last_collect_tick = None;
        had_streak
    }

    /// Idle decay check, called from the combo-decay process.
    ///
    /// If the window elapsed with no new collection, resets the streak
    /// and reports the expiry exactly once.
    pub fn tick(&mut self, now: u32, window_factor: Fixed) -> bool {
        let window = self.effective_window(window_factor);
        match self.last_collect_tick {
            Some(last) if self.count > 0 && now.saturating_sub(last) >= window => {
                self.count = 0;
                self.last_collect_tick = None;
                true
            }
            _ => false,
        }
    }
}
