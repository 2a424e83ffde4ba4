//! Element selection
//!
//! Selectors describe a UI region by accessible role + name or by CSS; a
//! [`Locator`] binds a selector to a frame and resolves it at the time of
//! use, never caching a DOM node.

pub mod overlay;

use crate::driver::{FrameRef, PageDriver};
use crate::error::DriverError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Accessible roles the suite selects by.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Button,
    Link,
    Textbox,
    Spinbutton,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Button => "button",
            Role::Link => "link",
            Role::Textbox => "textbox",
            Role::Spinbutton => "spinbutton",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named UI region, resolvable against any frame.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// Accessible role plus human-readable name
    ByRole { role: Role, name: String },
    /// Raw CSS, for regions that expose no accessible role
    ByCss(String),
}

impl Selector {
    pub fn button(name: impl Into<String>) -> Self {
        Selector::ByRole {
            role: Role::Button,
            name: name.into(),
        }
    }

    pub fn link(name: impl Into<String>) -> Self {
        Selector::ByRole {
            role: Role::Link,
            name: name.into(),
        }
    }

    pub fn textbox(name: impl Into<String>) -> Self {
        Selector::ByRole {
            role: Role::Textbox,
            name: name.into(),
        }
    }

    pub fn spinbutton(name: impl Into<String>) -> Self {
        Selector::ByRole {
            role: Role::Spinbutton,
            name: name.into(),
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Selector::ByCss(selector.into())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::ByRole { role, name } => write!(f, "role={role} name={name:?}"),
            Selector::ByCss(css) => write!(f, "css={css:?}"),
        }
    }
}

/// A handle over (driver, frame, selector). Every operation resolves the
/// selector afresh against the live document.
#[derive(Clone)]
pub struct Locator {
    driver: Arc<dyn PageDriver>,
    frame: FrameRef,
    selector: Selector,
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locator")
            .field("frame", &self.frame)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

impl Locator {
    pub fn new(driver: Arc<dyn PageDriver>, frame: FrameRef, selector: Selector) -> Self {
        Self {
            driver,
            frame,
            selector,
        }
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Number of elements currently matching.
    pub async fn count(&self) -> Result<usize, DriverError> {
        self.driver.count(&self.frame, &self.selector).await
    }

    /// Whether the first match is currently rendered and visible.
    pub async fn is_visible(&self) -> Result<bool, DriverError> {
        self.driver.is_visible(&self.frame, &self.selector).await
    }

    pub async fn click(&self) -> Result<(), DriverError> {
        self.driver.click(&self.frame, &self.selector).await
    }

    pub async fn fill(&self, text: &str) -> Result<(), DriverError> {
        self.driver.fill(&self.frame, &self.selector, text).await
    }

    pub async fn select_option(&self, value: &str) -> Result<(), DriverError> {
        self.driver
            .select_option(&self.frame, &self.selector, value)
            .await
    }

    /// Ordered visible texts of all matches; recomputed on every call.
    pub async fn all_texts(&self) -> Result<Vec<String>, DriverError> {
        self.driver.visible_texts(&self.frame, &self.selector).await
    }

    pub async fn value(&self) -> Result<String, DriverError> {
        self.driver.value(&self.frame, &self.selector).await
    }

    /// Poll until the first match is visible, failing with
    /// [`DriverError::Timeout`] once the bound elapses.
    pub async fn wait_visible(&self, timeout: Duration, poll: Duration) -> Result<(), DriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_visible().await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout(format!(
                    "element not visible within {}ms: {}",
                    timeout.as_millis(),
                    self.selector
                )));
            }
            sleep(poll).await;
        }
    }
}
