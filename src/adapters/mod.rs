//! Per-source scraping adapters.
//!
//! Each external site gets one adapter implementing [`SourceAdapter`]; the
//! aggregator invokes them sequentially and isolates their failures. The
//! sites share no markup, so each adapter carries its own URL builder and
//! selector chain, but all defensive extraction goes through
//! [`extract`] and all rendered-page work through [`browser`].

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::CONFIG;
use crate::data_models::{Listing, SearchQuery};
use crate::error::Result;

pub mod browser;
pub mod extract;

pub mod doomos;
pub mod infocasas;
pub mod nestoria;
pub mod properati;
pub mod urbania;

pub use doomos::DoomosScraper;
pub use infocasas::InfocasasScraper;
pub use nestoria::NestoriaScraper;
pub use properati::ProperatiScraper;
pub use urbania::UrbaniaScraper;

/// Desktop user agent sent on every request, static and browser-driven.
pub const COMMON_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

/// Uniform search contract over the five sites.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable source identifier stamped onto every listing.
    fn name(&self) -> &'static str;

    /// True when the site applies keywords server-side, so the shared
    /// post-hoc keyword filter must not run for this source.
    fn keyword_native(&self) -> bool {
        false
    }

    /// Fetch raw listings for the query. Errors are fine here; the
    /// aggregator records them as a per-source outcome and moves on.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Listing>>;
}

/// Shared client builder for the static-fetch adapters.
pub(crate) fn http_client() -> Client {
    Client::builder()
        .user_agent(COMMON_UA)
        .timeout(Duration::from_secs(CONFIG.http_timeout_secs))
        .build()
        .expect("failed to build HTTP client")
}
