//! Edit/present mode switching with a scroll anchor

use crate::notebook::CellId;
use folio_core::ViewMode;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Whether the two boxes share a non-empty area; touching edges do not count
    pub fn intersects(&self, other: &Rect) -> bool {
        self.top < other.bottom()
            && other.top < self.bottom()
            && self.left < other.right()
            && other.left < self.right()
    }
}

/// Rendered output of one cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRegion {
    pub cell_id: CellId,
    pub bounds: Rect,
}

/// Read-only view of what is rendered on screen
pub trait VisibleRegions: Send + Sync {
    /// Output regions in document order
    fn output_regions(&self) -> Vec<OutputRegion>;

    fn viewport(&self) -> Rect;

    fn scroll_into_view(&self, cell_id: &CellId);
}

/// First region in document order that is at least partly on screen
pub fn first_visible_output(regions: &[OutputRegion], viewport: &Rect) -> Option<CellId> {
    regions
        .iter()
        .find(|region| region.bounds.intersects(viewport))
        .map(|region| region.cell_id.clone())
}

/// Current view mode and the cell to keep in view across a switch
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewState {
    pub mode: ViewMode,
    pub cell_anchor: Option<CellId>,
}

/// Owner of the [`ViewState`]
#[derive(Debug, Default)]
pub struct PresentationToggle {
    state: ViewState,
}

impl PresentationToggle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn mode(&self) -> ViewMode {
        self.state.mode
    }

    /// Record the anchor from what is currently visible, then flip the mode
    pub fn toggle(&mut self, regions: &dyn VisibleRegions) -> ViewState {
        let anchor = first_visible_output(&regions.output_regions(), &regions.viewport());
        self.state = ViewState {
            mode: self.state.mode.toggled(),
            cell_anchor: anchor,
        };
        tracing::debug!(
            "View mode is now {} (anchor: {:?})",
            self.state.mode,
            self.state.cell_anchor
        );
        self.state.clone()
    }

    /// Call once the new mode has been rendered; scrolls back to the anchor
    ///
    /// Returns whether a scroll was requested.
    pub fn on_rendered(&self, regions: &dyn VisibleRegions) -> bool {
        match &self.state.cell_anchor {
            Some(anchor) => {
                regions.scroll_into_view(anchor);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StackedRegions;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_rect_intersection() {
        let viewport = Rect::new(0.0, 0.0, 800.0, 600.0);
        assert!(Rect::new(550.0, 0.0, 800.0, 100.0).intersects(&viewport));
        assert!(!Rect::new(600.0, 0.0, 800.0, 100.0).intersects(&viewport));
        assert!(!Rect::new(-100.0, 0.0, 800.0, 100.0).intersects(&viewport));
        assert!(!Rect::new(0.0, 900.0, 100.0, 100.0).intersects(&viewport));
    }

    #[test]
    fn test_toggle_anchors_first_visible_output() {
        // viewport scrolled so that cell "b" (100..200) is partly visible
        let regions = StackedRegions::new(&["a", "b", "c"], Rect::new(150.0, 0.0, 800.0, 600.0));
        let mut toggle = PresentationToggle::new();

        let state = toggle.toggle(&regions);
        assert_eq!(state.mode, ViewMode::Present);
        assert_eq!(state.cell_anchor, Some(CellId::new("b")));

        assert!(toggle.on_rendered(&regions));
        assert_eq!(regions.scrolled_to(), vec![CellId::new("b")]);
    }

    #[test]
    fn test_toggle_without_visible_output() {
        let regions = StackedRegions::empty();
        let mut toggle = PresentationToggle::new();

        let state = toggle.toggle(&regions);
        assert!(regions.queried.load(Ordering::SeqCst));
        assert_eq!(state.mode, ViewMode::Present);
        assert_eq!(state.cell_anchor, None);

        assert!(!toggle.on_rendered(&regions));
        assert_eq!(regions.scroll_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_toggle_back_to_edit() {
        let regions = StackedRegions::new(&["a"], Rect::new(0.0, 0.0, 800.0, 600.0));
        let mut toggle = PresentationToggle::new();

        toggle.toggle(&regions);
        let state = toggle.toggle(&regions);
        assert_eq!(state.mode, ViewMode::Edit);
        assert_eq!(toggle.mode(), ViewMode::Edit);
        assert_eq!(state.cell_anchor, Some(CellId::new("a")));
    }

    #[test]
    fn test_offscreen_outputs_give_no_anchor() {
        let regions = StackedRegions::new(&["a", "b"], Rect::new(1000.0, 0.0, 800.0, 600.0));
        assert_eq!(
            first_visible_output(&regions.output_regions(), &regions.viewport()),
            None
        );
    }
}
