//! Visibility Classifier
//!
//! Decides whether an element box is in view relative to the overscanned
//! viewport. Pure functions; geometry can change every frame so nothing is
//! cached.
//!
//! An element is visible when either:
//! - it engulfs the overscanned viewport on one axis (oversized element), or
//! - all four edge tests pass.
//!
//! The right-hand edge test compares the element's *right* edge against the
//! viewport's right edge, as does the left-hand test against the left edge.

use crate::{ElementBox, MasterBox};

/// Which rule, if any, made an element visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityClass {
    /// Element spans past the overscanned viewport on an axis
    Oversized,
    /// All four edge tests passed
    EdgeOverlap,
    /// Neither rule matched
    OutOfView,
}

impl VisibilityClass {
    #[inline]
    pub fn is_visible(&self) -> bool {
        !matches!(self, VisibilityClass::OutOfView)
    }
}

/// Element bottom is below the viewport top
#[inline]
fn check_bottom(element: &ElementBox, view: &MasterBox) -> bool {
    element.bottom + view.v_offset >= view.top
}

/// Element top is above the viewport bottom
#[inline]
fn check_top(element: &ElementBox, view: &MasterBox) -> bool {
    element.top - view.v_offset <= view.bottom
}

/// Element right is right of the viewport left
#[inline]
fn check_left(element: &ElementBox, view: &MasterBox) -> bool {
    element.right + view.h_offset >= view.left
}

/// Element right is left of the viewport right
#[inline]
fn check_right(element: &ElementBox, view: &MasterBox) -> bool {
    element.right - view.h_offset <= view.right
}

/// Element engulfs the overscanned viewport horizontally or vertically
#[inline]
fn check_oversized(element: &ElementBox, view: &MasterBox) -> bool {
    (element.left <= view.left - view.h_offset && element.right >= view.right + view.h_offset)
        || (element.bottom >= view.bottom + view.v_offset && element.top <= view.top - view.v_offset)
}

/// Classify an element against the viewport
pub fn classify(element: &ElementBox, view: &MasterBox) -> VisibilityClass {
    if check_oversized(element, view) {
        VisibilityClass::Oversized
    } else if check_bottom(element, view)
        && check_top(element, view)
        && check_left(element, view)
        && check_right(element, view)
    {
        VisibilityClass::EdgeOverlap
    } else {
        VisibilityClass::OutOfView
    }
}

/// Whether an element is in view
#[inline]
pub fn is_visible(element: &ElementBox, view: &MasterBox) -> bool {
    classify(element, view).is_visible()
}
