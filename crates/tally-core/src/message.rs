//! Chat message model
//!
//! Messages arrive as loosely shaped JSON (`{"role": ..., "content": ...}` where content is
//! either a string or a list of typed parts). The shape is validated once here so the
//! tokenizers can work on a closed sum type.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: String,
    pub content: Content,
    /// Any other string- or list-valued fields (`name`, `tool_call_id`, `tool_calls`, ...).
    /// They are tokenized exactly like `content`.
    pub extra: BTreeMap<String, Content>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
    /// Part with a type tag we don't account for (e.g. `input_audio`).
    Other { kind: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrl {
    pub url: String,
    pub detail: Option<ImageDetail>,
}

/// Resolution hint for inline images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ImageDetail {
    Low,
    High,
    #[default]
    Auto,
}

impl ImageDetail {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageDetail::Low => "low",
            ImageDetail::High => "high",
            ImageDetail::Auto => "auto",
        }
    }
}

impl From<&str> for ImageDetail {
    /// Anything that is not `low` or `high` is charged like `auto`.
    fn from(value: &str) -> Self {
        match value {
            "low" => ImageDetail::Low,
            "high" => ImageDetail::High,
            _ => ImageDetail::Auto,
        }
    }
}

impl From<String> for ImageDetail {
    fn from(value: String) -> Self {
        ImageDetail::from(value.as_str())
    }
}

impl FromStr for ImageDetail {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(ImageDetail::from(s))
    }
}

impl fmt::Display for ImageDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Message {
    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Content::Text(content.into()),
            extra: BTreeMap::new(),
        }
    }

    pub fn parts(role: impl Into<String>, parts: Vec<ContentPart>) -> Self {
        Self {
            role: role.into(),
            content: Content::Parts(parts),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), Content::Text(value.into()));
        self
    }

    pub fn with_parts(mut self, key: impl Into<String>, parts: Vec<ContentPart>) -> Self {
        self.extra.insert(key.into(), Content::Parts(parts));
        self
    }

    /// Image parts in content order. Empty for plain-text content.
    pub fn images(&self) -> impl Iterator<Item = &ImageUrl> {
        let parts: &[ContentPart] = match &self.content {
            Content::Parts(parts) => parts,
            Content::Text(_) => &[],
        };
        parts.iter().filter_map(|part| match part {
            ContentPart::ImageUrl { image_url } => Some(image_url),
            _ => None,
        })
    }

    /// Validate one JSON message. `index` is only used for error reporting.
    pub fn from_value(index: usize, value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::invalid_message(index, "message must be an object"))?;

        let role = match object.get("role") {
            Some(Value::String(role)) => role.clone(),
            Some(_) => return Err(Error::invalid_message(index, "`role` must be a string")),
            None => return Err(Error::invalid_message(index, "missing `role`")),
        };

        let content = match object.get("content") {
            Some(value) => Content::from_value(index, "content", value)?,
            None => return Err(Error::invalid_message(index, "missing `content`")),
        };

        let mut extra = BTreeMap::new();
        for (key, value) in object {
            if key == "role" || key == "content" {
                continue;
            }
            extra.insert(key.clone(), Content::from_value(index, key, value)?);
        }

        Ok(Self {
            role,
            content,
            extra,
        })
    }
}

impl Content {
    /// A string or a list of parts; `field` names the key in error reasons.
    fn from_value(index: usize, field: &str, value: &Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(Content::Text(text.clone())),
            Value::Array(items) => Ok(Content::Parts(
                items
                    .iter()
                    .map(|item| ContentPart::from_value(index, item))
                    .collect::<Result<Vec<_>>>()?,
            )),
            _ => Err(Error::invalid_message(
                index,
                format!("`{}` must be a string or a list of parts", field),
            )),
        }
    }
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>, detail: Option<ImageDetail>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: url.into(),
                detail,
            },
        }
    }

    fn from_value(index: usize, value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::invalid_message(index, "content part must be an object"))?;

        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::invalid_message(index, "content part is missing `type`"))?;

        match kind {
            "text" => match object.get("text") {
                Some(Value::String(text)) => Ok(ContentPart::text(text.clone())),
                _ => Err(Error::invalid_message(
                    index,
                    "text part must carry a string `text`",
                )),
            },
            "image_url" => Ok(ContentPart::ImageUrl {
                image_url: parse_image_url(index, object)?,
            }),
            other => Ok(ContentPart::Other {
                kind: other.to_string(),
            }),
        }
    }
}

fn parse_image_url(index: usize, part: &Map<String, Value>) -> Result<ImageUrl> {
    match part.get("image_url") {
        // Older clients send the URL directly.
        Some(Value::String(url)) => Ok(ImageUrl {
            url: url.clone(),
            detail: None,
        }),
        Some(Value::Object(image)) => {
            let url = image
                .get("url")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::invalid_message(index, "image part is missing `url`"))?;
            let detail = image
                .get("detail")
                .and_then(Value::as_str)
                .map(ImageDetail::from);
            Ok(ImageUrl {
                url: url.to_string(),
                detail,
            })
        }
        _ => Err(Error::invalid_message(
            index,
            "image part must carry `image_url`",
        )),
    }
}

/// Parse a JSON array of chat messages.
pub fn parse_messages(value: &Value) -> Result<Vec<Message>> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::invalid_message(0, "expected an array of messages"))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| Message::from_value(index, item))
        .collect()
}
