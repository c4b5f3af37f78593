//! Scoped headless-Chrome session for the sources that render listings
//! client-side.
//!
//! One session per `search` call, never shared or pooled. The Chrome
//! process is owned by the session value, so teardown rides on Drop and
//! runs on every exit path, including timeouts and errors. All of this is
//! synchronous CDP work and must run inside `spawn_blocking`.

use std::ffi::OsStr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};

use crate::adapters::COMMON_UA;
use crate::config::CONFIG;
use crate::error::{Result, ScrapeError};

/// Evaluated after every navigation; hides the obvious automation marker.
const STEALTH_JS: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined});";

/// Launch configuration, enumerated explicitly so the fingerprint knobs
/// are visible in one place.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub headless: bool,
    pub user_agent: String,
    pub window_size: (u32, u32),
}

impl Default for BrowserConfig {
    fn default() -> Self {
        BrowserConfig {
            headless: CONFIG.browser_headless,
            user_agent: COMMON_UA.to_string(),
            window_size: (1920, 1080),
        }
    }
}

pub struct BrowserSession {
    // Held for ownership: dropping the Browser kills the Chrome process.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl BrowserSession {
    pub fn launch(config: &BrowserConfig) -> Result<BrowserSession> {
        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some(config.window_size))
            .sandbox(false)
            .args(vec![
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-blink-features=AutomationControlled"),
            ])
            .idle_browser_timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ScrapeError::browser(format!("launch options: {e}")))?;

        let browser = Browser::new(options).map_err(ScrapeError::browser)?;
        let tab = browser.new_tab().map_err(ScrapeError::browser)?;
        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(ScrapeError::browser)?;

        Ok(BrowserSession {
            _browser: browser,
            tab,
        })
    }

    /// Navigate and apply the fingerprint suppression script.
    pub fn goto(&self, url: &str) -> Result<()> {
        self.tab.navigate_to(url).map_err(ScrapeError::browser)?;
        self.tab.wait_until_navigated().map_err(ScrapeError::browser)?;
        let _ = self.tab.evaluate(STEALTH_JS, false);
        Ok(())
    }

    /// Wait for a representative element; false on timeout (some sources
    /// render the grid late or not at all, which is not fatal).
    pub fn wait_for(&self, selector: &str, timeout: Duration) -> bool {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .is_ok()
    }

    /// Fixed number of scroll-to-bottom rounds (infinite-scroll sources
    /// with no height feedback worth trusting).
    pub fn scroll_rounds(&self, rounds: usize, pause: Duration) {
        for _ in 0..rounds {
            let _ = self
                .tab
                .evaluate("window.scrollTo(0, document.body.scrollHeight);", false);
            thread::sleep(pause);
        }
    }

    /// Scroll until the page height stops growing, up to `max_rounds`.
    pub fn scroll_until_stable(&self, max_rounds: usize, pause: Duration) {
        let mut last_height = self.body_height();
        for _ in 0..max_rounds {
            let _ = self
                .tab
                .evaluate("window.scrollTo(0, document.body.scrollHeight);", false);
            thread::sleep(pause);
            let height = self.body_height();
            if height == last_height {
                break;
            }
            last_height = height;
        }
    }

    fn body_height(&self) -> i64 {
        self.tab
            .evaluate("document.body.scrollHeight", false)
            .ok()
            .and_then(|obj| obj.value)
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .unwrap_or(0)
    }

    /// Current rendered document, for parsing with the same selector
    /// chains the static adapters use.
    pub fn page_html(&self) -> Result<String> {
        self.tab.get_content().map_err(ScrapeError::browser)
    }

    pub fn current_url(&self) -> String {
        self.tab.get_url()
    }

    /// Try an ordered list of "next page / load more" control candidates;
    /// true when one of them was clicked.
    pub fn click_first(&self, selectors: &[&str]) -> bool {
        for selector in selectors {
            if let Ok(element) = self.tab.find_element(selector) {
                if element.click().is_ok() {
                    return true;
                }
            }
        }
        false
    }
}
