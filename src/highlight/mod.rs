//! Hover highlighting of correlated source cells

mod controller;

pub use controller::{HighlightController, HighlightDelta};
