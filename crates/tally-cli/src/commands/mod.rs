pub mod count;
pub mod image;
pub mod truncate;

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tally_config::Config;
use tally_tokens::{EncoderRegistry, EncodingKind, TokenEstimator};

/// Shared state for every subcommand
pub struct Context {
    pub config: Config,
    pub model: String,
    pub estimator: TokenEstimator,
}

impl Context {
    pub fn new(config: Config, model: Option<String>) -> Result<Self> {
        let fallback: EncodingKind = config
            .fallback_encoding
            .parse()
            .context("Invalid `fallback_encoding` in config")?;
        let registry = EncoderRegistry::with_default_kind(fallback);
        let model = model.unwrap_or_else(|| config.default_model.clone());

        Ok(Self {
            config,
            model,
            estimator: TokenEstimator::with_registry(Arc::new(registry)),
        })
    }
}

/// Use the given argument, or read all of stdin
pub fn text_or_stdin(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}
