use std::fmt;

use serde::{Deserialize, Serialize};

/// Why truncation ended, in completion-style vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopReason {
    /// The budget was reached; text may have been cut.
    Length,
    /// The text fit whole.
    Stop,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Length => "length",
            StopReason::Stop => "stop",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of clipping text to a token budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Truncation {
    pub text: String,
    pub token_count: usize,
    pub reason: StopReason,
}

/// Completion-style usage block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

impl Usage {
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}
