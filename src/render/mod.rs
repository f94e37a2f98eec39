//! Rendering of reconstructed documents.

mod json;
mod outline;

pub use json::{to_json, write_json, JsonFormat};
pub use outline::to_outline;
