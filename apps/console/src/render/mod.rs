// Dynamic result rendering.
// Turns a schema-less extraction payload into a labeled display tree. Pure: no I/O, never fails.

pub mod text;
mod tree;

pub use tree::{render_result, render_vision, Rendered, RenderedField, VisionRow};
