// Presentation host: renders a session and its allocation for the terminal or other tools.

pub mod export;
pub mod grid;

pub use export::{ElectionReport, OutputFormat};
pub use grid::{GridRenderer, Theme};
