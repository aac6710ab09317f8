//! Data-integration and layout engine for RNA structure and chemical-probing
//! figures.
//!
//! ```text
//!   data::loader ─▶ data::registry ─▶ data::structure ─▶ data::filter ─▶ geometry ─▶ figure
//! ```
//!
//! The egui viewer in `src/main.rs` is a thin shell over [`figure::Session`].

pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod figure;
pub mod geometry;
