//! Core domain models for tally
//!
//! This crate contains:
//! - Chat message models (Message, Content, ContentPart)
//! - Accounting results (Truncation, StopReason, Usage)
//! - The shared error type

pub mod error;
pub mod message;
pub mod usage;

pub use error::{Error, Result};
pub use message::{Content, ContentPart, ImageDetail, ImageUrl, Message, parse_messages};
pub use usage::{StopReason, Truncation, Usage};
