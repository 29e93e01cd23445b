//! # Button Edge Tracker
//!
//! Turns the level-valued button state of each tick into one-shot press and
//! release events per watched combination.
//!
//! ## Match Policy
//!
//! A combination counts as held only when the raw button state is *exactly*
//! the combination. Holding an unrelated button at the same time suppresses
//! the match (pressing `A` while holding `X` fires nothing for `A`). See
//! [`MATCH_POLICY`].

use std::collections::HashMap;

use super::snapshot::{Buttons, InputSnapshot};

/// How a watched combination is compared with the raw button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Raw state must equal the combination.
    Exact,
}

/// Policy applied to every watched combination.
pub const MATCH_POLICY: MatchPolicy = MatchPolicy::Exact;

impl MatchPolicy {
    #[must_use]
    pub fn matches(self, raw: Buttons, watched: Buttons) -> bool {
        match self {
            MatchPolicy::Exact => raw == watched,
        }
    }
}

/// Transitions observed for one combination on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Edge {
    /// First tick the combination is held.
    pub down: bool,
    /// First tick the combination is no longer held.
    pub up: bool,
}

/// Per-combination Up/Down state machine.
///
/// Entries are created lazily on first observation (starting from Up) and are
/// never removed; the key set is the fixed list of combinations the poll loop
/// watches.
///
/// # Examples
///
/// ```
/// use padmouse::controller::{Buttons, ButtonEdgeTracker, InputSnapshot};
///
/// let mut tracker = ButtonEdgeTracker::new();
/// let pressed = InputSnapshot::with_buttons(Buttons::A);
///
/// assert!(tracker.observe(&pressed, Buttons::A).down);
/// assert!(!tracker.observe(&pressed, Buttons::A).down); // held, no repeat
/// assert!(tracker.observe(&InputSnapshot::default(), Buttons::A).up);
/// ```
#[derive(Debug)]
pub struct ButtonEdgeTracker {
    was_down: HashMap<Buttons, bool>,
}

impl Default for ButtonEdgeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonEdgeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            was_down: HashMap::new(),
        }
    }

    /// Advances the state machine of `watched` with this tick's reading.
    pub fn observe(&mut self, snapshot: &InputSnapshot, watched: Buttons) -> Edge {
        let is_down = MATCH_POLICY.matches(snapshot.buttons, watched);
        let was_down = self.was_down.entry(watched).or_insert(false);

        let edge = Edge {
            down: is_down && !*was_down,
            up: !is_down && *was_down,
        };
        *was_down = is_down;
        edge
    }

    /// Whether `watched` was held on the last tick it was observed.
    #[must_use]
    pub fn is_held(&self, watched: Buttons) -> bool {
        self.was_down.get(&watched).copied().unwrap_or(false)
    }

    /// Number of combinations observed so far.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.was_down.len()
    }
}
