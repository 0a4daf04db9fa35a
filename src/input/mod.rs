//! Command surface
//!
//! Gesture and voice recognition live outside the narrator; they deliver
//! utterances that are parsed into [`Command`]s and dispatched here.

pub mod commands;
pub mod dispatch;

pub use commands::{parse_command, Command, PHRASES};
pub use dispatch::{Dispatcher, TextCapture};
