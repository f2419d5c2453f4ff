//! Adapters layer: Concrete implementations of ports.
//!
//! - `forest`: random-forest classifier read from a JSON export, with
//!   optional signed-manifest verification

pub mod forest;

pub use forest::{ForestClassifier, ForestLoader, SignaturePolicy};
