//! Viewport Geometry
//!
//! Current window dimensions plus the overscanned comparison frame used by
//! the classifier.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Extra margin added around the viewport before testing visibility
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overscan {
    /// Vertical margin (px)
    pub vertical: f64,
    /// Horizontal margin (px)
    pub horizontal: f64,
}

impl Default for Overscan {
    fn default() -> Self {
        Self {
            vertical: 100.0,
            horizontal: 100.0,
        }
    }
}

/// Viewport bounding box with overscan offsets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasterBox {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub v_offset: f64,
    pub h_offset: f64,
}

/// Element bounding box in viewport coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementBox {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl ElementBox {
    pub fn new(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self { top, bottom, left, right }
    }

    /// Create from position and size
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            top: y,
            bottom: y + height,
            left: x,
            right: x + width,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ViewportState {
    width: f64,
    height: f64,
}

/// Shared viewport state
///
/// One per page; every placeholder reads it and the global coordinator
/// writes it on resize. Cloning yields another handle to the same state.
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    state: Rc<Cell<ViewportState>>,
    overscan: Overscan,
}

impl Viewport {
    pub fn new(overscan: Overscan) -> Self {
        Self {
            state: Rc::default(),
            overscan,
        }
    }

    /// Store the current window dimensions
    pub fn set_window_view(&self, height: f64, width: f64) {
        tracing::trace!("viewport set to {}x{}", width, height);
        self.state.set(ViewportState { width, height });
    }

    pub fn width(&self) -> f64 {
        self.state.get().width
    }

    pub fn height(&self) -> f64 {
        self.state.get().height
    }

    pub fn overscan(&self) -> Overscan {
        self.overscan
    }

    /// Viewport bounds with overscan offsets
    pub fn master_box(&self) -> MasterBox {
        let ViewportState { width, height } = self.state.get();
        MasterBox {
            top: 0.0,
            left: 0.0,
            bottom: height,
            right: width,
            v_offset: self.overscan.vertical,
            h_offset: self.overscan.horizontal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_view() {
        let viewport = Viewport::default();
        viewport.set_window_view(123.0, 456.0);

        assert_eq!(viewport.width(), 456.0);
        assert_eq!(viewport.height(), 123.0);
        assert_eq!(
            viewport.master_box(),
            MasterBox {
                top: 0.0,
                left: 0.0,
                bottom: 123.0,
                right: 456.0,
                v_offset: 100.0,
                h_offset: 100.0,
            }
        );
    }

    #[test]
    fn test_handles_share_state() {
        let viewport = Viewport::new(Overscan {
            vertical: 10.0,
            horizontal: 20.0,
        });
        let other = viewport.clone();
        other.set_window_view(600.0, 800.0);

        let frame = viewport.master_box();
        assert_eq!(frame.bottom, 600.0);
        assert_eq!(frame.right, 800.0);
        assert_eq!(frame.v_offset, 10.0);
        assert_eq!(frame.h_offset, 20.0);
    }

    #[test]
    fn test_element_box() {
        let rect = ElementBox::from_xywh(100.0, 0.0, 200.0, 150.0);
        assert_eq!(rect, ElementBox::new(0.0, 150.0, 100.0, 300.0));
        assert_eq!(rect.width(), 200.0);
        assert_eq!(rect.height(), 150.0);
    }
}
