//! Suite configuration
//!
//! Everything the suite needs to reach the application under test lives in
//! one struct passed to constructors; there are no module-level URL or
//! timeout constants. Integration runs override the defaults through
//! environment variables.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration handed to page objects and the API client.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    pub ui: UiConfig,
    pub api: ApiConfig,
    pub browser: BrowserOptions,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            ui: UiConfig::default(),
            api: ApiConfig::default(),
            browser: BrowserOptions::default(),
        }
    }
}

impl SuiteConfig {
    /// Defaults overridden from the environment:
    /// `BOOKSTORE_BASE_URL`, `BOOKSTORE_CHROME`, `BOOKSTORE_HEADLESS`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(base) = std::env::var("BOOKSTORE_BASE_URL") {
            let base = base.trim_end_matches('/').to_string();
            cfg.ui.books_url = format!("{base}/books");
            cfg.api.base_url = base;
        }

        if let Ok(chrome) = std::env::var("BOOKSTORE_CHROME") {
            if !chrome.is_empty() {
                cfg.browser.executable = Some(PathBuf::from(chrome));
            }
        }

        if let Ok(flag) = std::env::var("BOOKSTORE_HEADLESS") {
            cfg.browser.headless = flag != "0" && !flag.eq_ignore_ascii_case("false");
        }

        cfg
    }
}

/// UI-side settings for the Books page.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Landing URL of the books grid
    pub books_url: String,
    /// Default bound for driver operations
    pub default_timeout_ms: u64,
    /// Bounded wait for a book link to become visible
    pub link_wait_timeout_ms: u64,
    /// Poll interval for bounded waits
    pub poll_interval_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            books_url: "https://demoqa.com/books".to_string(),
            default_timeout_ms: 30_000,
            link_wait_timeout_ms: 5_000,
            poll_interval_ms: 100,
        }
    }
}

impl UiConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn link_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.link_wait_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// API-side settings for the BookStore endpoints.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Scheme + host the versioned paths are joined onto
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://demoqa.com".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl ApiConfig {
    pub const BOOKS_PATH: &'static str = "/BookStore/v1/Books";
    pub const REGISTER_USER_PATH: &'static str = "/Account/v1/User";
    pub const GENERATE_TOKEN_PATH: &'static str = "/Account/v1/GenerateToken";

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Chromium launch options.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    pub headless: bool,
    /// Explicit Chrome/Chromium binary; autodetected when absent
    pub executable: Option<PathBuf>,
    pub user_data_dir: Option<PathBuf>,
    pub nav_timeout_ms: u64,
    pub command_timeout_ms: u64,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            user_data_dir: None,
            nav_timeout_ms: 30_000,
            command_timeout_ms: 30_000,
        }
    }
}

impl BrowserOptions {
    pub fn nav_timeout(&self) -> Duration {
        Duration::from_millis(self.nav_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}
