//! Upload widget state machine.
//!
//! ```text
//! idle ──drag──▶ dragging ──leave──▶ idle | ready
//!  │                │
//!  └──file──▶ ready ◀──file──┘
//!               │ ▲
//!        process│ │done / failed
//!               ▼ │
//!            processing
//! ```
//!
//! The transition methods are the only mutators. Side effects that belong to
//! a transition (revoking the old preview, building the outbound payload)
//! happen inside it.

use crate::core::sanitize::sanitize_svg;
use crate::widget::client::{ProcessPayload, RelayClient};
use crate::widget::file::ImageFile;
use crate::widget::preview::{PreviewHandle, PreviewStore};
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use tracing::{debug, info, warn};

const INTERRUPTED_MESSAGE: &str = "Processing was interrupted";
const UNDISPLAYABLE_MESSAGE: &str = "The generated image could not be displayed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    Dragging,
    Ready,
    Processing,
}

#[derive(Debug, Clone)]
pub struct SelectedImage {
    pub bytes: Bytes,
    pub content_type: String,
    pub preview: PreviewHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessResult {
    Svg(String),
    Error(String),
}

/// What a view needs to draw the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetView {
    pub state: UploadState,
    pub preview: Option<PreviewHandle>,
    /// Sanitized markup, safe to embed as-is.
    pub svg: Option<String>,
    pub error: Option<String>,
    /// Drives the enabled state of the process trigger.
    pub can_process: bool,
}

pub struct UploadWidget<P: PreviewStore> {
    state: UploadState,
    image: Option<SelectedImage>,
    result: Option<ProcessResult>,
    previews: P,
}

impl<P: PreviewStore> UploadWidget<P> {
    pub fn new(previews: P) -> Self {
        Self {
            state: UploadState::Idle,
            image: None,
            result: None,
            previews,
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn image(&self) -> Option<&SelectedImage> {
        self.image.as_ref()
    }

    pub fn result(&self) -> Option<&ProcessResult> {
        self.result.as_ref()
    }

    pub fn previews(&self) -> &P {
        &self.previews
    }

    pub fn can_process(&self) -> bool {
        self.state == UploadState::Ready && self.image.is_some()
    }

    pub fn drag_enter(&mut self) {
        if matches!(self.state, UploadState::Idle | UploadState::Ready) {
            self.state = UploadState::Dragging;
        }
    }

    pub fn drag_leave(&mut self) {
        if self.state == UploadState::Dragging {
            self.state = self.resting_state();
        }
    }

    /// Takes a dropped or picked file. Non-images are ignored, as is anything
    /// arriving while a request is in flight. Returns whether it was taken.
    pub fn accept_file(&mut self, file: ImageFile) -> bool {
        if !file.is_image() {
            debug!("Ignoring {} ({})", file.name, file.content_type);
            return false;
        }
        if self.state == UploadState::Processing {
            warn!("Ignoring {} while a request is in flight", file.name);
            return false;
        }

        if let Some(previous) = self.image.take() {
            self.previews.revoke(&previous.preview);
        }
        let preview = self.previews.create(&file);
        self.image = Some(SelectedImage {
            bytes: file.bytes,
            content_type: file.content_type,
            preview,
        });
        self.result = None;
        self.state = UploadState::Ready;
        true
    }

    /// Moves to processing and returns the payload to send, or `None` when
    /// the trigger is disabled.
    pub fn begin_process(&mut self) -> Option<ProcessPayload> {
        if !self.can_process() {
            return None;
        }
        let image = self.image.as_ref()?;
        let payload = ProcessPayload {
            image_data: general_purpose::STANDARD.encode(&image.bytes),
            mime_type: image.content_type.clone(),
        };

        self.result = None;
        self.state = UploadState::Processing;
        Some(payload)
    }

    /// Records the outcome of the in-flight request and returns to ready.
    pub fn finish_process(&mut self, outcome: Result<String, String>) {
        if self.state != UploadState::Processing {
            return;
        }
        self.result = Some(match outcome {
            Ok(svg) => ProcessResult::Svg(svg),
            Err(message) => ProcessResult::Error(message),
        });
        self.state = self.resting_state();
    }

    /// Runs one request end to end. Returns `false` without sending anything
    /// when the trigger is disabled.
    pub async fn process<C>(&mut self, client: &C) -> bool
    where
        C: RelayClient + ?Sized,
    {
        let Some(payload) = self.begin_process() else {
            return false;
        };
        info!(
            "Sending {} image ({} base64 bytes)",
            payload.mime_type,
            payload.image_data.len()
        );

        let guard = ProcessingGuard { widget: self };
        let outcome = client.process(&payload).await.map_err(|e| e.to_string());
        if let Err(message) = &outcome {
            warn!("Processing failed: {}", message);
        }
        guard.widget.finish_process(outcome);
        true
    }

    pub fn render(&self) -> WidgetView {
        let (svg, error) = match &self.result {
            Some(ProcessResult::Svg(markup)) => match sanitize_svg(markup) {
                Some(svg) => (Some(svg), None),
                None => (None, Some(UNDISPLAYABLE_MESSAGE.to_string())),
            },
            Some(ProcessResult::Error(message)) => (None, Some(message.clone())),
            None => (None, None),
        };

        WidgetView {
            state: self.state,
            preview: self.image.as_ref().map(|image| image.preview.clone()),
            svg,
            error,
            can_process: self.can_process(),
        }
    }

    fn resting_state(&self) -> UploadState {
        if self.image.is_some() {
            UploadState::Ready
        } else {
            UploadState::Idle
        }
    }
}

impl<P: PreviewStore> Drop for UploadWidget<P> {
    fn drop(&mut self) {
        if let Some(image) = self.image.take() {
            self.previews.revoke(&image.preview);
        }
    }
}

/// Leaves the widget in ready even if the request future is dropped midway.
struct ProcessingGuard<'a, P: PreviewStore> {
    widget: &'a mut UploadWidget<P>,
}

impl<P: PreviewStore> Drop for ProcessingGuard<'_, P> {
    fn drop(&mut self) {
        self.widget.finish_process(Err(INTERRUPTED_MESSAGE.to_string()));
    }
}
