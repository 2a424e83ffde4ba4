//! End-to-end suite for the DemoQA bookstore.
//!
//! Two consumed surfaces, nothing owned: the Books page UI driven over the
//! Chrome DevTools Protocol, and the BookStore/Account HTTP API. The crate
//! provides the page-object facade, the selector/locator layer with the
//! ad-overlay dismissal routine, the CDP driver underneath, and a typed API
//! client; the scenarios live in `tests/`.

pub mod api;
pub mod config;
pub mod driver;
pub mod error;
pub mod locator;
pub mod pages;
pub mod trace;

pub use api::models::{Book, BooksEnvelope, CollectionEnvelope, Credentials};
pub use api::BookStoreApi;
pub use config::SuiteConfig;
pub use driver::page::CdpPage;
pub use driver::transport::{CdpTransport, ChromiumTransport};
pub use driver::{FrameRef, PageDriver};
pub use error::{DriverError, SuiteError};
pub use locator::overlay::dismiss_ad_overlay;
pub use locator::{Locator, Role, Selector};
pub use pages::BooksPage;
