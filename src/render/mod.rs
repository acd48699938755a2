//! Renderer-facing helpers.
//!
//! Drawing itself belongs to the host. This module only fixes how sample
//! values map to surface coordinates and offers a terminal preview.

pub mod ascii;
mod polyline;

pub use polyline::{Point, TraceProjection};
