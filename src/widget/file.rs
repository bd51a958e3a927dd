use anyhow::{Context, Error};
use bytes::Bytes;
use std::path::Path;

/// A file handed over by a drop or a file picker.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    /// Declared content type, e.g. `image/png`.
    pub content_type: String,
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk, declaring its type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self, Error> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, content_type, bytes))
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn declares_type_from_extension() {
        let dir = std::env::temp_dir().join(format!("svgify-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let png = dir.join("cat.png");
        tokio::fs::write(&png, [0x89, b'P', b'N', b'G']).await.unwrap();
        let file = ImageFile::from_path(&png).await.unwrap();
        assert_eq!(file.name, "cat.png");
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.bytes.len(), 4);
        assert!(file.is_image());

        let txt = dir.join("notes.txt");
        tokio::fs::write(&txt, "hello").await.unwrap();
        assert!(!ImageFile::from_path(&txt).await.unwrap().is_image());

        assert!(ImageFile::from_path(&dir.join("missing.png")).await.is_err());
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
