//! Browser driver seam
//!
//! [`PageDriver`] captures the minimal capability surface the page objects
//! and the overlay-dismissal routine need; the CDP implementation lives in
//! [`page`], with its transport in [`transport`]. Tests substitute a
//! scripted mock.

pub mod js;
pub mod page;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

use crate::error::DriverError;
use crate::locator::Selector;
use async_trait::async_trait;

/// Reference to one document in the page: the top-level document or an
/// embedded frame. Resolvable only through the driver that produced it.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FrameRef {
    frame_id: String,
    session_id: String,
}

impl FrameRef {
    pub(crate) fn new(frame_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            frame_id: frame_id.into(),
            session_id: session_id.into(),
        }
    }

    pub fn frame_id(&self) -> &str {
        &self.frame_id
    }

    pub(crate) fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Capability surface of one browser page session.
///
/// Every method resolves its selector at call time; element handles are
/// never cached across calls.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate the top-level document and wait for it to become ready.
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    /// URL currently shown by the top-level document.
    async fn current_url(&self) -> Result<String, DriverError>;

    /// Enumerate the current document set, top-level document first. The
    /// set may change between calls as the page loads.
    async fn frames(&self) -> Result<Vec<FrameRef>, DriverError>;

    /// Number of elements matching the selector in the given frame.
    async fn count(&self, frame: &FrameRef, selector: &Selector) -> Result<usize, DriverError>;

    /// Whether the first match is currently visible.
    async fn is_visible(&self, frame: &FrameRef, selector: &Selector)
        -> Result<bool, DriverError>;

    /// Click the first match.
    async fn click(&self, frame: &FrameRef, selector: &Selector) -> Result<(), DriverError>;

    /// Replace the value of the first matching input and fire input/change.
    async fn fill(
        &self,
        frame: &FrameRef,
        selector: &Selector,
        text: &str,
    ) -> Result<(), DriverError>;

    /// Choose an option of the first matching select element.
    async fn select_option(
        &self,
        frame: &FrameRef,
        selector: &Selector,
        value: &str,
    ) -> Result<(), DriverError>;

    /// Ordered rendered texts of every match.
    async fn visible_texts(
        &self,
        frame: &FrameRef,
        selector: &Selector,
    ) -> Result<Vec<String>, DriverError>;

    /// Current value of the first matching input.
    async fn value(&self, frame: &FrameRef, selector: &Selector) -> Result<String, DriverError>;

    /// The top-level document of this page.
    async fn main_frame(&self) -> Result<FrameRef, DriverError> {
        self.frames()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::Protocol("page reported no frames".to_string()))
    }
}
