//! CLI Interface: operator input and terminal rendering
//!
//! # Components
//! - `input.rs`: Abort/restart key polling using crossterm
//! - `display.rs`: Live panel and final summary rendering

pub mod display;
pub mod input;
