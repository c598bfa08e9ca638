use std::fmt;
use std::str::FromStr;

use tally_core::{Error, Result};
use tiktoken_rs::CoreBPE;
use tiktoken_rs::tokenizer::Tokenizer;

/// Reversible text <-> token id mapping.
///
/// Implementations must be immutable once built; the registry shares them across threads.
pub trait Encoding: Send + Sync {
    fn name(&self) -> &str;

    fn encode(&self, text: &str) -> Vec<u32>;

    /// Decode a token sequence. Bytes that don't form valid UTF-8 (a sequence cut inside a
    /// multi-byte character) decode to U+FFFD.
    fn decode(&self, tokens: &[u32]) -> Result<String>;
}

/// BPE families bundled with tiktoken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EncodingKind {
    O200kBase,
    #[default]
    Cl100kBase,
    P50kBase,
    P50kEdit,
    R50kBase,
}

impl EncodingKind {
    pub const ALL: [EncodingKind; 5] = [
        EncodingKind::O200kBase,
        EncodingKind::Cl100kBase,
        EncodingKind::P50kBase,
        EncodingKind::P50kEdit,
        EncodingKind::R50kBase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EncodingKind::O200kBase => "o200k_base",
            EncodingKind::Cl100kBase => "cl100k_base",
            EncodingKind::P50kBase => "p50k_base",
            EncodingKind::P50kEdit => "p50k_edit",
            EncodingKind::R50kBase => "r50k_base",
        }
    }

    /// Dedicated encoding for a known model, `None` for anything unrecognized.
    pub fn for_model(model: &str) -> Option<Self> {
        tiktoken_rs::tokenizer::get_tokenizer(model).map(Self::from)
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            EncodingKind::O200kBase => 0,
            EncodingKind::Cl100kBase => 1,
            EncodingKind::P50kBase => 2,
            EncodingKind::P50kEdit => 3,
            EncodingKind::R50kBase => 4,
        }
    }

    fn load_bpe(&self) -> anyhow::Result<CoreBPE> {
        match self {
            EncodingKind::O200kBase => tiktoken_rs::o200k_base(),
            EncodingKind::Cl100kBase => tiktoken_rs::cl100k_base(),
            EncodingKind::P50kBase => tiktoken_rs::p50k_base(),
            EncodingKind::P50kEdit => tiktoken_rs::p50k_edit(),
            EncodingKind::R50kBase => tiktoken_rs::r50k_base(),
        }
    }
}

impl From<Tokenizer> for EncodingKind {
    fn from(tokenizer: Tokenizer) -> Self {
        match tokenizer {
            Tokenizer::O200kBase => EncodingKind::O200kBase,
            Tokenizer::Cl100kBase => EncodingKind::Cl100kBase,
            Tokenizer::P50kBase => EncodingKind::P50kBase,
            Tokenizer::P50kEdit => EncodingKind::P50kEdit,
            // gpt2 shares r50k's vocabulary
            Tokenizer::R50kBase | Tokenizer::Gpt2 => EncodingKind::R50kBase,
        }
    }
}

impl FromStr for EncodingKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::EncodingUnavailable(format!("unknown encoding name: {}", s)))
    }
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `Encoding` backed by tiktoken's BPE tables
pub struct TiktokenEncoding {
    kind: EncodingKind,
    bpe: CoreBPE,
}

impl TiktokenEncoding {
    pub fn load(kind: EncodingKind) -> Result<Self> {
        let bpe = kind
            .load_bpe()
            .map_err(|e| Error::EncodingUnavailable(format!("{}: {}", kind, e)))?;
        tracing::debug!(encoding = %kind, "loaded BPE tables");
        Ok(Self { kind, bpe })
    }
}

impl Encoding for TiktokenEncoding {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    /// Special-token text such as `<|endoftext|>` is encoded as ordinary text.
    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe.encode_ordinary(text)
    }

    fn decode(&self, tokens: &[u32]) -> Result<String> {
        let bytes: Vec<u8> = self
            .bpe
            ._decode_native_and_split(tokens.to_vec())
            .flatten()
            .collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_models_resolve() {
        assert_eq!(EncodingKind::for_model("gpt-4"), Some(EncodingKind::Cl100kBase));
        assert_eq!(
            EncodingKind::for_model("gpt-3.5-turbo-0301"),
            Some(EncodingKind::Cl100kBase)
        );
        assert_eq!(EncodingKind::for_model("gpt-4o"), Some(EncodingKind::O200kBase));
        assert_eq!(
            EncodingKind::for_model("text-davinci-003"),
            Some(EncodingKind::P50kBase)
        );
    }

    #[test]
    fn test_unknown_models_have_no_kind() {
        assert_eq!(EncodingKind::for_model(""), None);
        assert_eq!(EncodingKind::for_model("my-local-llama"), None);
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in EncodingKind::ALL {
            assert_eq!(kind.as_str().parse::<EncodingKind>().unwrap(), kind);
        }
        assert!("cl100k".parse::<EncodingKind>().is_err());
    }

    #[test]
    fn test_tiktoken_encode_decode() {
        let encoding = TiktokenEncoding::load(EncodingKind::Cl100kBase).unwrap();

        let tokens = encoding.encode("hello world");
        assert_eq!(tokens.len(), 2);
        assert_eq!(encoding.decode(&tokens).unwrap(), "hello world");
        assert_eq!(encoding.name(), "cl100k_base");
        assert!(encoding.encode("").is_empty());
    }

    #[test]
    fn test_decode_replaces_partial_character() {
        let encoding = TiktokenEncoding::load(EncodingKind::Cl100kBase).unwrap();

        let tokens = encoding.encode("🦀");
        assert!(tokens.len() > 1);
        assert_eq!(encoding.decode(&tokens[..1]).unwrap(), "\u{FFFD}");
        assert_eq!(encoding.decode(&tokens).unwrap(), "🦀");
    }
}
