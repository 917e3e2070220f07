//! Strongly-typed domain structures for form uploads.
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
        pub struct $name(i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self::new(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Identifier of a pet record on the backend.
    PetId
);
record_id!(
    /// Identifier of a lost/found report on the backend.
    ReportId
);
record_id!(
    /// Identifier of a photo already stored on the backend.
    PhotoId
);

/// Sanitized file name (single path component).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FileName(String);

impl FileName {
    pub fn try_new(value: String) -> Result<Self, TypeConstraintError> {
        let path = Path::new(&value);
        let mut components = path.components();
        match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(component)), None) => {
                Ok(Self(component.to_string_lossy().to_string()))
            }
            _ => Err(TypeConstraintError::InvalidFileName),
        }
    }

    pub fn try_from_str(value: &str) -> Result<Self, TypeConstraintError> {
        Self::try_new(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// MIME type reported for a selected file.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ContentType(String);

impl ContentType {
    pub const JPEG: &'static str = "image/jpeg";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_ascii_lowercase())
    }

    /// Guess the type from the file extension, as browsers do for local picks.
    pub fn guess(name: &FileName) -> Self {
        let ext = Path::new(name.as_str())
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        let mime = match ext.as_deref() {
            Some("jpg") | Some("jpeg") => Self::JPEG,
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            Some("bmp") => "image/bmp",
            _ => "application/octet-stream",
        };
        Self::new(mime)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_image(&self) -> bool {
        self.0.starts_with("image/")
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Identity of a file within an upload session: name plus byte size.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FileKey {
    pub name: FileName,
    pub size: u64,
}

impl FileKey {
    pub fn new(name: FileName, size: u64) -> Self {
        Self { name, size }
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.name, self.size)
    }
}

/// A file picked by the user, before any session rules are applied.
#[derive(Clone, Debug)]
pub struct SelectedFile {
    name: FileName,
    content_type: ContentType,
    bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(name: FileName, content_type: ContentType, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name,
            content_type,
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &FileName {
        &self.name
    }

    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn key(&self) -> FileKey {
        FileKey::new(self.name.clone(), self.size())
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }
}

/// A file accepted into an upload session.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub name: FileName,
    pub size: u64,
    pub content_type: ContentType,
    pub original: Arc<[u8]>,
}

impl UploadedFile {
    pub fn key(&self) -> FileKey {
        FileKey::new(self.name.clone(), self.size)
    }
}

impl From<SelectedFile> for UploadedFile {
    fn from(file: SelectedFile) -> Self {
        Self {
            size: file.size(),
            name: file.name,
            content_type: file.content_type,
            original: file.bytes,
        }
    }
}

/// Re-encoded, size-bounded version of an uploaded file, ready for submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptimizedFile {
    pub key: FileKey,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum TypeConstraintError {
    #[error("invalid file name")]
    InvalidFileName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_keeps_single_component() {
        let name = FileName::try_new("photo.PNG".to_string()).unwrap();
        assert_eq!(name.as_str(), "photo.PNG");
        assert_eq!(name.to_string(), "photo.PNG");
    }

    #[test]
    fn file_name_rejects_nested() {
        assert!(FileName::try_new("foo/bar.jpg".to_string()).is_err());
        assert!(FileName::try_new("../evil.jpg".to_string()).is_err());
    }

    #[test]
    fn content_type_guess_and_normalize() {
        let name = FileName::try_from_str("cat.JPEG").unwrap();
        assert_eq!(ContentType::guess(&name).as_str(), "image/jpeg");
        assert!(ContentType::new(" Image/PNG ").is_image());
        assert!(!ContentType::new("application/pdf").is_image());
    }

    #[test]
    fn selected_file_key_uses_name_and_size() {
        let name = FileName::try_from_str("dog.png").unwrap();
        let file = SelectedFile::new(name.clone(), ContentType::new("image/png"), vec![0u8; 12]);

        assert_eq!(file.key(), FileKey::new(name, 12));
    }
}
