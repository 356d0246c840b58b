//! Message content and file attachments.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::RestError;

/// Filename used when an attachment has none.
pub const DEFAULT_FILENAME: &str = "upload";

/// What to post: text, an embed, a file, or any combination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageContent {
    /// Message text. Empty means no text.
    pub content: String,
    /// Rich embed object, passed through to the API as-is.
    pub embed: Option<Value>,
    /// File to upload alongside the message.
    pub file: Option<FileAttachment>,
    /// Send as text-to-speech.
    pub tts: bool,
}

impl MessageContent {
    /// A plain text message.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Attach an embed.
    #[must_use]
    pub fn with_embed(mut self, embed: Value) -> Self {
        self.embed = Some(embed);
        self
    }

    /// Attach a file.
    #[must_use]
    pub fn with_file(mut self, file: FileAttachment) -> Self {
        self.file = Some(file);
        self
    }

    /// Mark as text-to-speech.
    #[must_use]
    pub const fn tts(mut self, tts: bool) -> Self {
        self.tts = tts;
        self
    }

    /// Whether there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.embed.is_none() && self.file.is_none()
    }

    /// The JSON part of the request: everything except the file.
    pub(crate) fn payload(&self) -> MessagePayload<'_> {
        MessagePayload {
            content: (!self.content.is_empty()).then_some(self.content.as_str()),
            embed: self.embed.as_ref(),
            tts: self.tts,
        }
    }
}

impl From<&str> for MessageContent {
    fn from(content: &str) -> Self {
        Self::text(content)
    }
}

impl From<String> for MessageContent {
    fn from(content: String) -> Self {
        Self::text(content)
    }
}

/// Request body sent as JSON, or as the `payload_json` form field.
#[derive(Debug, Serialize)]
pub(crate) struct MessagePayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    embed: Option<&'a Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    tts: bool,
}

/// A file uploaded with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    /// File contents.
    pub data: Vec<u8>,
    /// Sanitized filename.
    pub filename: String,
    /// MIME type of the part, if known.
    pub content_type: Option<String>,
}

impl FileAttachment {
    /// An attachment from bytes. The filename is sanitized.
    pub fn new(data: impl Into<Vec<u8>>, filename: &str) -> Self {
        Self {
            data: data.into(),
            filename: sanitize_filename(filename),
            content_type: None,
        }
    }

    /// Read an attachment from disk, named after the file.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Io`] if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, RestError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(data, &filename))
    }

    /// Set the MIME type of the part, e.g. `text/plain`.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Lowercase `name` and replace anything outside `[a-z0-9_.-]` with `_`.
///
/// An empty name becomes [`DEFAULT_FILENAME`].
pub fn sanitize_filename(name: &str) -> String {
    if name.is_empty() {
        return DEFAULT_FILENAME.to_owned();
    }
    name.chars()
        .map(|c| c.to_ascii_lowercase())
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn sanitizes_filenames() {
        assert_eq!(sanitize_filename("hello-world.txt"), "hello-world.txt");
        assert_eq!(sanitize_filename("My Report (1).PDF"), "my_report__1_.pdf");
        assert_eq!(sanitize_filename("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_filename("über.png"), "_ber.png");
        assert_eq!(sanitize_filename(""), DEFAULT_FILENAME);
    }

    #[test]
    fn payload_omits_unset_fields() {
        let text = serde_json::to_value(MessageContent::text("hi").payload()).unwrap();
        assert_eq!(text, json!({"content": "hi"}));

        let embed = MessageContent::default()
            .with_embed(json!({"description": "d"}))
            .tts(true);
        assert_eq!(
            serde_json::to_value(embed.payload()).unwrap(),
            json!({"embed": {"description": "d"}, "tts": true})
        );
    }

    #[test]
    fn empty_content_is_detected() {
        assert!(MessageContent::default().is_empty());
        assert!(MessageContent::default().tts(true).is_empty());
        assert!(!MessageContent::from("x").is_empty());
        assert!(
            !MessageContent::default()
                .with_file(FileAttachment::new(b"x".to_vec(), "a.txt"))
                .is_empty()
        );
    }

    #[tokio::test]
    async fn reads_attachment_from_disk() {
        let path = std::env::temp_dir().join(format!("Relay Attachment {}.TXT", std::process::id()));
        tokio::fs::write(&path, b"hello").await.unwrap();

        let file = FileAttachment::from_path(&path).await.unwrap();
        assert_eq!(file.data, b"hello");
        assert!(file.filename.starts_with("relay_attachment_"));
        assert!(file.filename.ends_with(".txt"));

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
