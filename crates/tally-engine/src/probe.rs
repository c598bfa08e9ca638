//! Image dimension lookup
//!
//! Fetching and decoding images belongs to the file layer; accounting only needs pixel sizes.

use std::collections::HashMap;

use async_trait::async_trait;

/// Supplies pixel dimensions for image URLs (http(s) or data URLs)
#[async_trait]
pub trait ImageProbe: Send + Sync {
    /// `(width, height)` of the image behind `url`, or `None` if it can't be resolved.
    async fn dimensions(&self, url: &str) -> anyhow::Result<Option<(u32, u32)>>;
}

/// Probe over a fixed URL -> size table
#[derive(Debug, Clone, Default)]
pub struct StaticImageProbe {
    sizes: HashMap<String, (u32, u32)>,
}

impl StaticImageProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, url: impl Into<String>, width: u32, height: u32) -> Self {
        self.insert(url, width, height);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, width: u32, height: u32) {
        self.sizes.insert(url.into(), (width, height));
    }
}

#[async_trait]
impl ImageProbe for StaticImageProbe {
    async fn dimensions(&self, url: &str) -> anyhow::Result<Option<(u32, u32)>> {
        Ok(self.sizes.get(url).copied())
    }
}
