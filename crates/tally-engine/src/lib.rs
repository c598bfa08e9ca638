pub mod probe;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tally_core::{ImageDetail, Message, Usage};
use tally_tokens::TokenEstimator;

pub use probe::{ImageProbe, StaticImageProbe};

/// Cost of one inline image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageCharge {
    pub message_index: usize,
    pub width: u32,
    pub height: u32,
    pub detail: ImageDetail,
    pub tokens: usize,
}

/// Prompt cost split into text and image shares
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptUsage {
    pub text_tokens: usize,
    pub image_tokens: usize,
    pub total_tokens: usize,
    pub images: Vec<ImageCharge>,
    /// Image parts whose size couldn't be resolved
    pub skipped_images: usize,
}

/// Full prompt accounting: message text plus inline images.
pub struct PromptAccountant {
    estimator: TokenEstimator,
    probe: Arc<dyn ImageProbe>,
    default_detail: ImageDetail,
}

impl PromptAccountant {
    pub fn new(estimator: TokenEstimator, probe: Arc<dyn ImageProbe>) -> Self {
        Self {
            estimator,
            probe,
            default_detail: ImageDetail::default(),
        }
    }

    /// Detail used for image parts that don't carry one.
    pub fn with_default_detail(mut self, detail: ImageDetail) -> Self {
        self.default_detail = detail;
        self
    }

    pub fn estimator(&self) -> &TokenEstimator {
        &self.estimator
    }

    pub async fn account(&self, messages: &[Message], model: &str) -> Result<PromptUsage> {
        // 1. Text
        let text_tokens = self.estimator.tokens_for_messages(messages, model)?;

        // 2. Images, in message order
        let mut images = Vec::new();
        let mut skipped_images = 0;

        for (message_index, message) in messages.iter().enumerate() {
            for image in message.images() {
                let size = self
                    .probe
                    .dimensions(&image.url)
                    .await
                    .with_context(|| {
                        format!("Failed to probe image in message {}", message_index)
                    })?;

                let Some((width, height)) = size else {
                    tracing::warn!(message_index, "image size unavailable, not charged");
                    skipped_images += 1;
                    continue;
                };

                let detail = image.detail.unwrap_or(self.default_detail);
                images.push(ImageCharge {
                    message_index,
                    width,
                    height,
                    detail,
                    tokens: self.estimator.tokens_for_image(width, height, detail),
                });
            }
        }

        let image_tokens: usize = images.iter().map(|charge| charge.tokens).sum();
        let usage = PromptUsage {
            text_tokens,
            image_tokens,
            total_tokens: text_tokens + image_tokens,
            images,
            skipped_images,
        };

        tracing::debug!(
            model,
            text_tokens = usage.text_tokens,
            image_tokens = usage.image_tokens,
            "accounted prompt"
        );
        Ok(usage)
    }

    /// Completion-style usage for a prompt and the text generated for it.
    pub async fn usage(
        &self,
        messages: &[Message],
        completion: &str,
        model: &str,
    ) -> Result<Usage> {
        let prompt = self.account(messages, model).await?;
        let completion_tokens = self.estimator.tokens_for_text(completion, model)?;
        Ok(Usage::new(prompt.total_tokens, completion_tokens))
    }
}
