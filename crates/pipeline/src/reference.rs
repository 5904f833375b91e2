//! Inbound media references.

/// What kind of attachment the message carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Photo,
    Video,
    Document,
}

impl AttachmentKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Document => "document",
        }
    }
}

/// Opaque handle to a file stored on the messaging platform, plus the
/// sender-declared filename hint. Immutable once received.
#[derive(Debug, Clone)]
pub struct MediaReference {
    pub file_id: String,
    pub kind: AttachmentKind,
    pub file_name: Option<String>,
}

impl MediaReference {
    #[must_use]
    pub fn photo(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            kind: AttachmentKind::Photo,
            file_name: None,
        }
    }

    #[must_use]
    pub fn video(file_id: impl Into<String>, file_name: Option<String>) -> Self {
        Self {
            file_id: file_id.into(),
            kind: AttachmentKind::Video,
            file_name,
        }
    }

    #[must_use]
    pub fn document(file_id: impl Into<String>, file_name: Option<String>) -> Self {
        Self {
            file_id: file_id.into(),
            kind: AttachmentKind::Document,
            file_name,
        }
    }

    /// Lowercase extension hint: the declared filename's extension, with
    /// per-kind defaults when the platform supplies no name.
    #[must_use]
    pub fn extension(&self) -> String {
        let declared = self.file_name.as_deref().and_then(extension_of);
        match (declared, self.kind) {
            (Some(extension), _) => extension,
            // Telegram photos are always JPEG and never carry a filename.
            (None, AttachmentKind::Photo) => ".jpg".into(),
            (None, AttachmentKind::Video) => ".mp4".into(),
            (None, AttachmentKind::Document) => String::new(),
        }
    }
}

fn extension_of(name: &str) -> Option<String> {
    name.rfind('.').map(|idx| name[idx..].to_ascii_lowercase())
}
