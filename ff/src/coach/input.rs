//! User input for one generation request

use std::fs;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use eyre::{Context, Result};
use tracing::debug;

use crate::domain::EnergyLevel;
use crate::llm::Part;

/// Whether an attachment is a picture or a voice recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Audio,
}

impl AttachmentKind {
    /// Mime type assumed when the extension says nothing useful
    fn default_mime(self) -> &'static str {
        match self {
            Self::Image => "image/jpeg",
            Self::Audio => "audio/webm",
        }
    }
}

/// Inline media sent to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub mime_type: String,
    /// Base64 payload
    pub data: String,
}

impl Attachment {
    /// Read a file and encode it, guessing the mime type from the extension
    pub fn from_path(path: impl AsRef<Path>, kind: AttachmentKind) -> Result<Self> {
        let path = path.as_ref();
        debug!(?path, ?kind, "Attachment::from_path: called");
        let bytes = fs::read(path).context(format!("Failed to read attachment {}", path.display()))?;

        Ok(Self {
            kind,
            mime_type: mime_for(path, kind),
            data: STANDARD.encode(bytes),
        })
    }

    /// Wrap already-encoded data
    ///
    /// Data URLs (`data:image/jpeg;base64,...`) are accepted; only the
    /// payload after the comma is kept.
    pub fn from_base64(kind: AttachmentKind, encoded: &str) -> Self {
        let data = encoded.split_once(',').map(|(_, d)| d).unwrap_or(encoded);
        Self {
            kind,
            mime_type: kind.default_mime().to_string(),
            data: data.to_string(),
        }
    }

    pub fn to_part(&self) -> Part {
        Part::inline(&self.mime_type, &self.data)
    }
}

fn mime_for(path: &Path, kind: AttachmentKind) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let mime = match (kind, ext.as_str()) {
        (AttachmentKind::Image, "jpg" | "jpeg") => "image/jpeg",
        (AttachmentKind::Image, "png") => "image/png",
        (AttachmentKind::Image, "webp") => "image/webp",
        (AttachmentKind::Image, "gif") => "image/gif",
        (AttachmentKind::Audio, "webm") => "audio/webm",
        (AttachmentKind::Audio, "mp3") => "audio/mpeg",
        (AttachmentKind::Audio, "wav") => "audio/wav",
        (AttachmentKind::Audio, "ogg") => "audio/ogg",
        (AttachmentKind::Audio, "m4a") => "audio/mp4",
        (kind, _) => kind.default_mime(),
    };
    mime.to_string()
}

/// One submission: free text, energy level and optional media
#[derive(Debug, Clone, Default)]
pub struct UserInput {
    pub text: String,
    pub energy: EnergyLevel,
    pub image: Option<Attachment>,
    pub audio: Option<Attachment>,
}

impl UserInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_energy(mut self, energy: EnergyLevel) -> Self {
        self.energy = energy;
        self
    }

    pub fn with_image(mut self, image: Attachment) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_audio(mut self, audio: Attachment) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Nothing to send: blank text and no media
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.image.is_none() && self.audio.is_none()
    }

    /// Text actually sent to the model
    pub fn prompt_text(&self) -> &str {
        let text = self.text.trim();
        if !text.is_empty() {
            text
        } else if self.audio.is_some() {
            "Analyze my audio and tell me what to do."
        } else {
            "What should I do next?"
        }
    }

    /// Ordered request parts: image, audio, then text
    pub fn to_parts(&self) -> Vec<Part> {
        let mut parts = Vec::new();
        if let Some(image) = &self.image {
            parts.push(image.to_part());
            parts.push(Part::text("Context Image included."));
        }
        if let Some(audio) = &self.audio {
            parts.push(audio.to_part());
            parts.push(Part::text("User voice recording included. Analyze tone and intent."));
        }
        parts.push(Part::text(self.prompt_text()));
        parts
    }
}
