//! Terminal UI module using ratatui.
//!
//! - `render`: Main frame rendering and layout
//! - `grid`: Service card grid
//! - `input`: Keyboard event handling
//! - `styles`: Color schemes and text styling

pub mod grid;
pub mod input;
pub mod render;
pub mod styles;
