//! Model -> encoding resolution
//!
//! Each bundled encoding is built at most once per registry, on first use, and then shared.
//! Unknown models fall back to the default encoding instead of failing.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tally_core::Result;

use crate::encoding::{Encoding, EncodingKind, TiktokenEncoding};

pub struct EncoderRegistry {
    default_kind: EncodingKind,
    default_encoding: Option<Arc<dyn Encoding>>,
    models: HashMap<String, Arc<dyn Encoding>>,
    cache: [OnceCell<Arc<dyn Encoding>>; EncodingKind::ALL.len()],
}

impl EncoderRegistry {
    /// Registry backed by tiktoken, falling back to cl100k_base.
    pub fn new() -> Self {
        Self::with_default_kind(EncodingKind::default())
    }

    pub fn with_default_kind(default_kind: EncodingKind) -> Self {
        Self {
            default_kind,
            default_encoding: None,
            models: HashMap::new(),
            cache: Default::default(),
        }
    }

    /// Pin a model id to a specific encoding. Checked before the tiktoken model table.
    pub fn with_model_encoding(
        mut self,
        model: impl Into<String>,
        encoding: Arc<dyn Encoding>,
    ) -> Self {
        self.models.insert(model.into(), encoding);
        self
    }

    /// Replace the fallback for unrecognized models.
    pub fn with_default_encoding(mut self, encoding: Arc<dyn Encoding>) -> Self {
        self.default_encoding = Some(encoding);
        self
    }

    pub fn default_kind(&self) -> EncodingKind {
        self.default_kind
    }

    /// Resolve the encoding for `model`. Never fails for unknown model ids; only a broken
    /// BPE table surfaces as an error.
    pub fn resolve(&self, model: &str) -> Result<Arc<dyn Encoding>> {
        if let Some(encoding) = self.models.get(model) {
            return Ok(Arc::clone(encoding));
        }

        if let Some(kind) = EncodingKind::for_model(model) {
            return self.load(kind);
        }

        tracing::debug!(
            model,
            fallback = %self.default_kind,
            "unrecognized model, using default encoding"
        );
        match &self.default_encoding {
            Some(encoding) => Ok(Arc::clone(encoding)),
            None => self.load(self.default_kind),
        }
    }

    /// Shared encoding for `kind`, built on first request.
    pub fn load(&self, kind: EncodingKind) -> Result<Arc<dyn Encoding>> {
        self.cache[kind.index()]
            .get_or_try_init(|| {
                TiktokenEncoding::load(kind).map(|encoding| Arc::new(encoding) as Arc<dyn Encoding>)
            })
            .cloned()
    }
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
