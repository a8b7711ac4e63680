//! Client side of manga-creator.
//!
//! - `http` talks to the generation endpoint
//! - `view` holds the prompt and the latest image reference
//! - `tui` draws the view and runs the event loop

pub mod http;
pub mod tui;
pub mod view;

pub use http::{HttpGenerator, ImageGenerator};
pub use tui::run_tui;
