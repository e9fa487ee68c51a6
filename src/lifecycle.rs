//! Visibility gating.
//!
//! The animation only does work while someone can see it. Three independent
//! signals feed the gate:
//!
//! | Signal | Source |
//! |--------|--------|
//! | `page_hidden` | tab hidden, window minimized or occluded |
//! | `intersecting` | canvas scrolled into view |
//! | `undersized` | viewport narrower than the disable threshold |
//!
//! Pausing stops scheduling but keeps every piece of engine state, so resuming
//! continues exactly where it left off.

/// Combined visibility of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityGate {
    page_hidden: bool,
    intersecting: bool,
    undersized: bool,
}

impl Default for VisibilityGate {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityGate {
    /// A gate for a shown page with the canvas in view.
    pub const fn new() -> Self {
        Self {
            page_hidden: false,
            intersecting: true,
            undersized: false,
        }
    }

    /// Record a page visibility change. Returns whether overall visibility changed.
    pub fn set_page_hidden(&mut self, hidden: bool) -> bool {
        self.update(|gate| gate.page_hidden = hidden)
    }

    /// Record an intersection change. Returns whether overall visibility changed.
    pub fn set_intersecting(&mut self, intersecting: bool) -> bool {
        self.update(|gate| gate.intersecting = intersecting)
    }

    /// Record whether the viewport fell below the disable threshold.
    pub fn set_undersized(&mut self, undersized: bool) -> bool {
        self.update(|gate| gate.undersized = undersized)
    }

    fn update(&mut self, change: impl FnOnce(&mut Self)) -> bool {
        let before = self.is_visible();
        change(self);
        before != self.is_visible()
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        !self.page_hidden && self.intersecting && !self.undersized
    }

    #[inline]
    pub fn page_hidden(&self) -> bool {
        self.page_hidden
    }

    #[inline]
    pub fn intersecting(&self) -> bool {
        self.intersecting
    }

    #[inline]
    pub fn undersized(&self) -> bool {
        self.undersized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_by_default() {
        assert!(VisibilityGate::new().is_visible());
    }

    #[test]
    fn test_any_signal_hides() {
        let mut gate = VisibilityGate::new();
        assert!(gate.set_page_hidden(true));
        assert!(!gate.is_visible());
        assert!(!gate.set_intersecting(false));
        assert!(!gate.set_page_hidden(false));
        assert!(!gate.is_visible());
        assert!(gate.set_intersecting(true));
        assert!(gate.is_visible());
    }

    #[test]
    fn test_undersized_hides() {
        let mut gate = VisibilityGate::new();
        assert!(gate.set_undersized(true));
        assert!(!gate.is_visible());
        assert!(!gate.set_undersized(true));
        assert!(gate.set_undersized(false));
    }
}
