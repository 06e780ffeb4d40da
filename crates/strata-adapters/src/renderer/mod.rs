//! Template rendering adapters.
//!
//! `HandlebarsRenderer` implements the `ContentRenderer` port with the
//! project helper library registered. `preflight` holds the lint-style scan
//! used for dry runs and `helpers` the helper implementations themselves.

mod engine;
pub mod helpers;
pub mod preflight;

pub use engine::HandlebarsRenderer;

pub(crate) use preflight::closest_helper;
