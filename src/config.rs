use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config {
        bind_addr: get_env_or_default("BIND_ADDR", "0.0.0.0:8000"),
        http_timeout_secs: get_env_parsed("HTTP_TIMEOUT_SECS", 15),
        browser_headless: get_env_parsed("BROWSER_HEADLESS", true),
        scroll_rounds: get_env_parsed("SCROLL_ROUNDS", 8),
        scroll_pause_ms: get_env_parsed("SCROLL_PAUSE_MS", 600),
        max_browser_pages: get_env_parsed("MAX_BROWSER_PAGES", 6),
        page_wait_ms: get_env_parsed("PAGE_WAIT_MS", 1500),
        district_delay_ms: get_env_parsed("DISTRICT_DELAY_MS", 500),
        max_results_per_zone: get_env_parsed("MAX_RESULTS_PER_ZONE", 200),
        home_feed_ttl_secs: get_env_parsed("HOME_FEED_TTL_SECS", 900),
        trending_limit: get_env_parsed("TRENDING_LIMIT", 10),
    }
});

pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Timeout for static-fetch requests against the sources.
    pub http_timeout_secs: u64,
    /// Run Chrome headless (disable for local scraper debugging).
    pub browser_headless: bool,
    /// Scroll-to-bottom rounds for infinite-scroll sources.
    pub scroll_rounds: usize,
    /// Pause between scroll rounds.
    pub scroll_pause_ms: u64,
    /// Hard cap on paginated browser fetches per search.
    pub max_browser_pages: usize,
    /// Settle time after a page advance.
    pub page_wait_ms: u64,
    /// Delay between per-district requests during fan-out.
    pub district_delay_ms: u64,
    /// Cap on listings collected from a single zone fetch.
    pub max_results_per_zone: usize,
    /// How long a computed home feed stays valid.
    pub home_feed_ttl_secs: u64,
    /// Default number of trending entries returned.
    pub trending_limit: usize,
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
