//! Wire models for the BookStore API
//!
//! All shapes are externally defined; this suite validates presence and
//! type, nothing more.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// One book record as returned by `GET /BookStore/v1/Books`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Book {
    pub isbn: String,
    pub title: String,
    #[serde(default, rename = "subTitle")]
    pub sub_title: Option<String>,
    pub author: String,
    /// ISO-8601 timestamp, kept as a string and validated separately
    pub publish_date: String,
    pub publisher: String,
    pub pages: u32,
    pub description: String,
    pub website: String,
}

impl Book {
    /// Whether `publish_date` matches `YYYY-MM-DDTHH:MM:SS.mmmZ`, the exact
    /// shape the service emits.
    pub fn publish_date_is_well_formed(&self) -> bool {
        chrono::NaiveDateTime::parse_from_str(&self.publish_date, "%Y-%m-%dT%H:%M:%S%.3fZ").is_ok()
    }
}

/// Envelope wrapping the full catalogue in the list response.
#[derive(Clone, Debug, Deserialize)]
pub struct BooksEnvelope {
    pub books: Vec<Book>,
}

/// The add-to-collection response echoes bare isbn references, not full
/// book records.
#[derive(Clone, Debug, Deserialize)]
pub struct CollectionEnvelope {
    pub books: Vec<IsbnRef>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IsbnRef {
    pub isbn: String,
}

/// Ephemeral credential pair, generated per run, never persisted here.
#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
    #[serde(rename = "userName")]
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Fresh random pair; the password shape satisfies the service's
    /// complexity rules (upper, lower, digit, special).
    pub fn random() -> Self {
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
        Self {
            username: format!("testuser_{suffix}"),
            password: format!("TestPassword{suffix}!"),
        }
    }
}

/// Payload for adding books to a user's collection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddBooksRequest<'a> {
    pub user_id: &'a str,
    pub collection_of_isbns: Vec<IsbnEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct IsbnEntry<'a> {
    pub isbn: &'a str,
}
