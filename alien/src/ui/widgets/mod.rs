//! TUI widgets for the console

pub mod input;
pub mod meters;
pub mod narrative;

pub use input::InputWidget;
pub use meters::MetersWidget;
pub use narrative::NarrativeWidget;
