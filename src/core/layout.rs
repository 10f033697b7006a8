//! Layout - panel height state machine
//!
//! The panel is always in one of four states. Heights are in pixels; the
//! host decides how pixels map to its own units.
//!
//! ```text
//!            toggle_close              toggle_maximize
//!   CLOSED <-------------> DEFAULT <-----------------> MAXIMIZED
//!                             ^                            ^
//!                             |  drag (clamped to bounds)  |
//!                             +---------> CUSTOM(h) -------+
//! ```
//!
//! Reopening after a close always lands on DEFAULT, never on the height the
//! panel had before it was closed.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoundsError {
    #[error("minimum panel height must be greater than zero")]
    ZeroMinimum,

    #[error("panel heights must satisfy min <= default <= max (got {min} / {default} / {max})")]
    Unordered { min: u32, default: u32, max: u32 },
}

/// Height limits for the panel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelBounds {
    /// Hard floor for dragging (the topbar height)
    pub min: u32,
    pub default: u32,
    pub max: u32,
}

impl PanelBounds {
    pub fn new(min: u32, default: u32, max: u32) -> Result<Self, BoundsError> {
        if min == 0 {
            return Err(BoundsError::ZeroMinimum);
        }
        if !(min <= default && default <= max) {
            return Err(BoundsError::Unordered { min, default, max });
        }
        Ok(Self { min, default, max })
    }

    pub fn clamp(&self, height: i64) -> u32 {
        height.clamp(self.min as i64, self.max as i64) as u32
    }
}

/// Logical panel state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelState {
    Closed,
    Default,
    Maximized,
    /// User-dragged height, within bounds and distinct from default/max
    Custom(u32),
}

/// Panel layout controller
#[derive(Clone, Debug)]
pub struct PanelLayout {
    bounds: PanelBounds,
    state: PanelState,
}

impl PanelLayout {
    pub fn new(bounds: PanelBounds) -> Self {
        Self {
            bounds,
            state: PanelState::Default,
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    /// Current height in pixels
    pub fn height(&self) -> u32 {
        match self.state {
            PanelState::Closed => 0,
            PanelState::Default => self.bounds.default,
            PanelState::Maximized => self.bounds.max,
            PanelState::Custom(h) => h,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state == PanelState::Closed
    }

    pub fn is_maximized(&self) -> bool {
        self.height() == self.bounds.max
    }

    /// Height left for text once the topbar is taken out
    pub fn content_height(&self) -> u32 {
        self.height().saturating_sub(self.bounds.min)
    }

    /// Classify a height into one of the four states
    fn state_for(&self, height: u32) -> PanelState {
        if height == 0 {
            PanelState::Closed
        } else if height == self.bounds.max {
            PanelState::Maximized
        } else if height == self.bounds.default {
            PanelState::Default
        } else {
            PanelState::Custom(height)
        }
    }

    /// Returns true when the visible height changed
    fn set_state(&mut self, state: PanelState) -> bool {
        let before = self.height();
        self.state = state;
        tracing::debug!("Panel state: {:?} ({}px)", self.state, self.height());
        before != self.height()
    }

    /// MAXIMIZED -> DEFAULT, anything else -> MAXIMIZED
    pub fn toggle_maximize(&mut self) -> bool {
        if self.height() == self.bounds.max {
            self.set_state(PanelState::Default)
        } else {
            self.set_state(PanelState::Maximized)
        }
    }

    /// CLOSED -> DEFAULT, anything else -> CLOSED
    pub fn toggle_close(&mut self) -> bool {
        if self.is_closed() {
            self.set_state(PanelState::Default)
        } else {
            self.set_state(PanelState::Closed)
        }
    }

    /// Resize by a drag delta (positive grows), clamped to bounds
    pub fn drag_resize(&mut self, delta: i32) -> bool {
        let height = self.bounds.clamp(self.height() as i64 + delta as i64);
        let state = self.state_for(height);
        self.set_state(state)
    }

    /// Back to the initial state
    pub fn reset(&mut self) -> bool {
        self.set_state(PanelState::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> PanelLayout {
        PanelLayout::new(PanelBounds::new(30, 200, 500).unwrap())
    }

    #[test]
    fn test_bounds_validation() {
        assert_eq!(PanelBounds::new(0, 10, 20), Err(BoundsError::ZeroMinimum));
        assert!(matches!(
            PanelBounds::new(30, 600, 500),
            Err(BoundsError::Unordered { .. })
        ));
        assert!(PanelBounds::new(30, 30, 30).is_ok());
    }

    #[test]
    fn test_walkthrough() {
        let mut panel = layout();
        assert_eq!(panel.state(), PanelState::Default);

        panel.drag_resize(400);
        assert_eq!(panel.height(), 500);
        assert_eq!(panel.state(), PanelState::Maximized);

        panel.toggle_maximize();
        assert_eq!(panel.height(), 200);
        assert_eq!(panel.state(), PanelState::Default);

        panel.toggle_close();
        assert_eq!(panel.height(), 0);
        assert_eq!(panel.state(), PanelState::Closed);

        panel.toggle_close();
        assert_eq!(panel.height(), 200);
    }

    #[test]
    fn test_close_twice_restores_default_not_custom() {
        for start in [31, 123, 250, 499, 500] {
            let mut panel = layout();
            panel.drag_resize(start - 200);
            assert_eq!(panel.height(), start as u32);

            assert!(panel.toggle_close());
            assert!(panel.is_closed());
            assert!(panel.toggle_close());
            assert_eq!(panel.height(), 200);
        }
    }

    #[test]
    fn test_toggle_maximize_from_any_height() {
        let mut panel = layout();
        panel.drag_resize(-50);
        assert_eq!(panel.state(), PanelState::Custom(150));
        panel.toggle_maximize();
        assert_eq!(panel.height(), 500);
        panel.toggle_maximize();
        assert_eq!(panel.height(), 200);

        let mut closed = layout();
        closed.toggle_close();
        closed.toggle_maximize();
        assert!(closed.is_maximized());
    }

    #[test]
    fn test_drag_is_always_clamped() {
        for delta in [-10_000, -171, -170, -1, 0, 1, 299, 300, 301, i32::MAX, i32::MIN] {
            let mut panel = layout();
            panel.drag_resize(delta);
            assert!((30..=500).contains(&panel.height()), "delta {}", delta);
        }

        let mut panel = layout();
        panel.drag_resize(-1_000);
        assert_eq!(panel.state(), PanelState::Custom(30));
        assert_eq!(panel.content_height(), 0);
    }

    #[test]
    fn test_drag_onto_default_is_default() {
        let mut panel = layout();
        panel.drag_resize(50);
        assert_eq!(panel.state(), PanelState::Custom(250));
        panel.drag_resize(-50);
        assert_eq!(panel.state(), PanelState::Default);
        assert!(!panel.drag_resize(0));
    }
}
