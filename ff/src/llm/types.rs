//! LLM request/response types for Focus Flow
//!
//! Provider-agnostic: one system prompt plus an ordered list of user parts,
//! where a part is text or inline base64 media (image or audio).

use serde::{Deserialize, Serialize};

/// A completion request - everything needed for one LLM call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt (rendered from Handlebars template)
    pub system_prompt: String,

    /// User content, in the order the model should read it
    pub parts: Vec<Part>,

    /// Max tokens for response (capped by config)
    pub max_tokens: u32,

    /// Ask the provider for a raw JSON body where supported
    pub json_output: bool,
}

impl CompletionRequest {
    pub fn new(system_prompt: impl Into<String>, parts: Vec<Part>, max_tokens: u32) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            parts,
            max_tokens,
            json_output: true,
        }
    }
}

/// One piece of user content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        mime_type: String,
        /// Base64-encoded payload
        data: String,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    /// Inline media; `data` is already base64-encoded
    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Part::InlineData { mime_type, .. } if mime_type.starts_with("image/"))
    }
}

/// Response from a completion request
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    /// Text content, concatenated across content blocks
    pub content: Option<String>,

    /// Token usage for this request
    pub usage: TokenUsage,
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_media_kind() {
        let image = Part::inline("image/png", "aGk=");
        assert!(image.is_image());

        assert!(!Part::inline("audio/webm", "QUJD").is_image());
        assert!(!Part::text("hello").is_image());
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            input_tokens: 100,
            output_tokens: 50,
        };
        assert_eq!(usage.total(), 150);
    }
}
