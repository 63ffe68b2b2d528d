//! Optional debug visualization boundary.
//!
//! Rendering itself (windows, overlays) is outside this crate; the
//! orchestrator only consumes the `DebugView` contract and honors a quit
//! signal by routing through the normal stop path. The view is fully
//! configuration-driven - it is never forced on.

use anyhow::Result;

use crate::frame::{Frame, NormalizedPlate};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewSignal {
    Continue,
    /// The operator asked to quit from the view (e.g. a key press).
    Quit,
}

pub trait DebugView {
    /// Present one processed frame with its surviving plates.
    fn show(&mut self, frame: &Frame, plates: &[NormalizedPlate]) -> Result<ViewSignal>;

    /// Release any display resource. Idempotent.
    fn close(&mut self) {}
}

/// Headless view that logs instead of rendering.
pub struct LogView;

impl DebugView for LogView {
    fn show(&mut self, frame: &Frame, plates: &[NormalizedPlate]) -> Result<ViewSignal> {
        let texts: Vec<&str> = plates.iter().map(|p| p.text.as_str()).collect();
        log::debug!(
            "view: {}x{} frame from {} plates={:?}",
            frame.width,
            frame.height,
            frame.source,
            texts
        );
        Ok(ViewSignal::Continue)
    }
}
