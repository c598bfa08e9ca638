use std::sync::Arc;

use tally_core::{Content, ContentPart, ImageDetail, Message, Result, StopReason, Truncation};

use crate::encoding::Encoding;
use crate::image;
use crate::registry::EncoderRegistry;

/// Model id that pays one extra token of framing per message.
pub const LEGACY_MODEL: &str = "gpt-3.5-turbo-0301";

/// Tokens added to every reply to prime the assistant turn.
const REPLY_PRIMING_TOKENS: usize = 3;

/// Framing tokens charged per message for `model`.
pub fn per_message_overhead(model: &str) -> usize {
    if model == LEGACY_MODEL { 4 } else { 3 }
}

/// Token estimator over a shared encoder registry
#[derive(Clone)]
pub struct TokenEstimator {
    registry: Arc<EncoderRegistry>,
}

impl TokenEstimator {
    /// Create new estimator with the tiktoken registry (cl100k_base fallback)
    pub fn new() -> Self {
        Self::with_registry(Arc::new(EncoderRegistry::new()))
    }

    pub fn with_registry(registry: Arc<EncoderRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &EncoderRegistry {
        &self.registry
    }

    /// Token count for a single string
    pub fn tokens_for_text(&self, text: &str, model: &str) -> Result<usize> {
        let encoding = self.registry.resolve(model)?;
        Ok(encoding.encode(text).len())
    }

    /// Token counts for multiple strings, resolving the encoding once
    pub fn tokens_for_texts(&self, texts: &[&str], model: &str) -> Result<Vec<usize>> {
        let encoding = self.registry.resolve(model)?;
        Ok(texts.iter().map(|text| encoding.encode(text).len()).collect())
    }

    /// Prompt tokens for a chat message list, text only.
    ///
    /// Image parts contribute nothing here; their cost comes from [`Self::tokens_for_image`]
    /// and is added by the caller.
    ///
    /// Every message is charged both the model's per-message overhead and the 3-token reply
    /// priming. The priming is per message, not per request; existing totals depend on it.
    pub fn tokens_for_messages(&self, messages: &[Message], model: &str) -> Result<usize> {
        let encoding = self.registry.resolve(model)?;
        let overhead = per_message_overhead(model);

        let total: usize = messages
            .iter()
            .map(|message| {
                overhead + message_tokens(encoding.as_ref(), message) + REPLY_PRIMING_TOKENS
            })
            .sum();

        Ok(total)
    }

    pub fn tokens_for_image(&self, width: u32, height: u32, detail: ImageDetail) -> usize {
        image::tokens_for_image(width, height, detail)
    }

    /// Clip `text` to at most `max_tokens` tokens.
    ///
    /// Reaching the budget exactly still reports [`StopReason::Length`]. A cut inside a
    /// multi-byte character leaves U+FFFD at the end of the text.
    pub fn truncate(&self, text: &str, max_tokens: usize, model: &str) -> Result<Truncation> {
        let encoding = self.registry.resolve(model)?;
        let tokens = encoding.encode(text);

        if tokens.len() >= max_tokens {
            let text = encoding.decode(&tokens[..max_tokens])?;
            Ok(Truncation {
                text,
                token_count: max_tokens,
                reason: StopReason::Length,
            })
        } else {
            Ok(Truncation {
                text: text.to_string(),
                token_count: tokens.len(),
                reason: StopReason::Stop,
            })
        }
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new()
    }
}

fn message_tokens(encoding: &dyn Encoding, message: &Message) -> usize {
    let extra: usize = message
        .extra
        .values()
        .map(|value| content_tokens(encoding, value))
        .sum();

    encoding.encode(&message.role).len() + content_tokens(encoding, &message.content) + extra
}

/// Text parts only; images and unknown parts are free.
fn content_tokens(encoding: &dyn Encoding, content: &Content) -> usize {
    match content {
        Content::Text(text) => encoding.encode(text).len(),
        Content::Parts(parts) => parts
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => encoding.encode(text).len(),
                ContentPart::ImageUrl { .. } | ContentPart::Other { .. } => 0,
            })
            .sum(),
    }
}
