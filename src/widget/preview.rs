//! Display references for the selected image.
//!
//! A reference is only meaningful locally (think object URL): it lets a view
//! show the picked file without sending it anywhere. Each one must be revoked
//! exactly once.

use crate::widget::file::ImageFile;
use bytes::Bytes;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewHandle(String);

impl PreviewHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub trait PreviewStore {
    fn create(&mut self, file: &ImageFile) -> PreviewHandle;
    fn revoke(&mut self, handle: &PreviewHandle);
}

/// Keeps preview bytes in memory behind `blob:` style handles.
#[derive(Default)]
pub struct InMemoryPreviewStore {
    live: HashMap<PreviewHandle, (String, Bytes)>,
}

impl InMemoryPreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type and bytes behind a live handle.
    pub fn resolve(&self, handle: &PreviewHandle) -> Option<(&str, &Bytes)> {
        self.live
            .get(handle)
            .map(|(content_type, bytes)| (content_type.as_str(), bytes))
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

impl PreviewStore for InMemoryPreviewStore {
    fn create(&mut self, file: &ImageFile) -> PreviewHandle {
        let handle = PreviewHandle(format!("blob:svgify/{}", Uuid::new_v4()));
        self.live
            .insert(handle.clone(), (file.content_type.clone(), file.bytes.clone()));
        debug!("Created preview {} for {}", handle.as_str(), file.name);
        handle
    }

    fn revoke(&mut self, handle: &PreviewHandle) {
        if self.live.remove(handle).is_some() {
            debug!("Revoked preview {}", handle.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_resolve_until_revoked() {
        let mut store = InMemoryPreviewStore::new();
        let file = ImageFile::new("a.png", "image/png", vec![1u8, 2, 3]);

        let first = store.create(&file);
        let second = store.create(&file);
        assert_ne!(first, second);
        assert!(first.as_str().starts_with("blob:svgify/"));
        assert_eq!(store.live_count(), 2);

        let (content_type, bytes) = store.resolve(&first).unwrap();
        assert_eq!(content_type, "image/png");
        assert_eq!(&bytes[..], &[1u8, 2, 3]);

        store.revoke(&first);
        store.revoke(&first);
        assert!(store.resolve(&first).is_none());
        assert_eq!(store.live_count(), 1);
    }
}
