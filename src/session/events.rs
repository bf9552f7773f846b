//! UI events and the x-ray reveal state.

use crate::render::{RenderStats, RevealRegion};

/// Radius of the x-ray reveal disc, in canvas pixels.
pub const DEFAULT_XRAY_RADIUS: f64 = 75.0;

/// Discrete parameter change coming from the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    BlockSizeChanged(u32),
    PaddingChanged(u32),
    /// Raw style identifier; unknown ids fall back to plain circles.
    StyleChanged(String),
    JitterToggled(bool),
    XrayToggled(bool),
    PointerMoved { x: f64, y: f64 },
}

/// What handling an event produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventOutcome {
    /// A render pass ran.
    Rendered(RenderStats),
    /// The reveal region changed; `None` means nothing should be revealed.
    Reveal(Option<RevealRegion>),
}

/// Cursor-following reveal of the original image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XrayState {
    pub enabled: bool,
    pub pointer: Option<(f64, f64)>,
    pub radius: f64,
}

impl Default for XrayState {
    fn default() -> Self {
        Self::with_radius(DEFAULT_XRAY_RADIUS)
    }
}

impl XrayState {
    pub fn with_radius(radius: f64) -> Self {
        Self {
            enabled: false,
            pointer: None,
            radius,
        }
    }

    /// Region to reveal, if enabled and the pointer position is known.
    pub fn region(&self) -> Option<RevealRegion> {
        if !self.enabled {
            return None;
        }
        self.pointer.map(|(x, y)| RevealRegion {
            x,
            y,
            radius: self.radius,
        })
    }
}
