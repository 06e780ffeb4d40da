//! Command handlers.
//!
//! Each submodule exposes a single `execute` function taking its parsed
//! arguments plus whatever context it needs.

pub mod completions;
pub mod list;
pub mod new;
