//! Token accounting for chat requests
//!
//! - `encoding`: the `Encoding` seam and its tiktoken implementation
//! - `registry`: model -> encoding resolution with a lazy per-kind cache
//! - `estimator`: text, message, and truncation operations
//! - `image`: tile-based image cost

pub mod encoding;
pub mod estimator;
pub mod image;
pub mod registry;

pub use encoding::{Encoding, EncodingKind, TiktokenEncoding};
pub use estimator::{LEGACY_MODEL, TokenEstimator, per_message_overhead};
pub use image::tokens_for_image;
pub use registry::EncoderRegistry;
