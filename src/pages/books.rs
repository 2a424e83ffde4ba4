//! Books page object
//!
//! Maps the named regions of the bookstore grid to locators and exposes the
//! interactions the scenarios need. All filtering and pagination is done by
//! the remote application; this facade only drives it.

use std::sync::Arc;

use tracing::debug;

use crate::config::{SuiteConfig, UiConfig};
use crate::driver::PageDriver;
use crate::error::{DriverError, SuiteError};
use crate::locator::{overlay, Locator, Selector};

pub struct BooksPage {
    driver: Arc<dyn PageDriver>,
    ui: UiConfig,
}

impl BooksPage {
    pub fn new(driver: Arc<dyn PageDriver>, config: &SuiteConfig) -> Self {
        Self {
            driver,
            ui: config.ui.clone(),
        }
    }

    fn search_box() -> Selector {
        Selector::textbox("Type to search")
    }

    fn search_button() -> Selector {
        Selector::css("#basic-addon2")
    }

    fn next_button() -> Selector {
        Selector::button("Next")
    }

    fn previous_button() -> Selector {
        Selector::button("Previous")
    }

    fn jump_to_page() -> Selector {
        Selector::spinbutton("jump to page")
    }

    fn rows_per_page() -> Selector {
        Selector::css("select[aria-label='rows per page']")
    }

    /// Title links live in the second grid column; scoping the selector
    /// there keeps profile/footer links out of the enumeration.
    fn book_links() -> Selector {
        Selector::css(".rt-td:nth-child(2) a")
    }

    async fn locator(&self, selector: Selector) -> Result<Locator, DriverError> {
        let frame = self.driver.main_frame().await?;
        Ok(Locator::new(self.driver.clone(), frame, selector))
    }

    /// Navigate to the books grid and verify the landing URL.
    pub async fn open(&self) -> Result<(), SuiteError> {
        self.driver.navigate(&self.ui.books_url).await?;
        let actual = self.driver.current_url().await?;
        if actual.trim_end_matches('/') != self.ui.books_url.trim_end_matches('/') {
            return Err(SuiteError::UnexpectedUrl {
                expected: self.ui.books_url.clone(),
                actual,
            });
        }
        Ok(())
    }

    pub async fn current_url(&self) -> Result<String, DriverError> {
        self.driver.current_url().await
    }

    /// Ordered titles currently rendered in the grid; recomputed on every
    /// call, never cached.
    pub async fn visible_book_titles(&self) -> Result<Vec<String>, DriverError> {
        self.locator(Self::book_links()).await?.all_texts().await
    }

    /// Fill the search box and submit. Filtering happens remotely.
    pub async fn search_book(&self, title: &str) -> Result<(), DriverError> {
        debug!(title, "searching for book");
        self.locator(Self::search_box()).await?.fill(title).await?;
        self.locator(Self::search_button()).await?.click().await
    }

    /// Locator for the title link, waiting up to the configured bound for
    /// it to become visible.
    pub async fn book_link(&self, title: &str) -> Result<Locator, DriverError> {
        let locator = self.locator(Selector::link(title)).await?;
        locator
            .wait_visible(self.ui.link_wait_timeout(), self.ui.poll_interval())
            .await?;
        Ok(locator)
    }

    /// Non-waiting variant for negative assertions: resolves immediately so
    /// proving absence does not pay the visibility timeout.
    pub async fn book_link_no_wait(&self, title: &str) -> Result<Locator, DriverError> {
        self.locator(Selector::link(title)).await
    }

    /// Click a title link and land on its details view.
    pub async fn open_book(&self, title: &str) -> Result<(), DriverError> {
        self.book_link(title).await?.click().await
    }

    /// Choose among the page-size options the remote grid exposes.
    pub async fn select_rows_per_page(&self, rows: u32) -> Result<(), DriverError> {
        self.locator(Self::rows_per_page())
            .await?
            .select_option(&rows.to_string())
            .await
    }

    /// Current value of the jump-to-page spinbutton.
    pub async fn page_number(&self) -> Result<String, DriverError> {
        self.locator(Self::jump_to_page()).await?.value().await
    }

    pub async fn next_page(&self) -> Result<(), DriverError> {
        self.locator(Self::next_button()).await?.click().await
    }

    pub async fn previous_page(&self) -> Result<(), DriverError> {
        self.locator(Self::previous_button()).await?.click().await
    }

    /// Best-effort overlay dismissal; see [`overlay::dismiss_ad_overlay`].
    pub async fn dismiss_ad_overlay(&self) {
        overlay::dismiss_ad_overlay(self.driver.as_ref()).await;
    }
}
