//! UI module for the console TUI

pub mod render;
pub mod theme;
pub mod widgets;
