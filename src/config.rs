use std::env;

pub const DEFAULT_BACKEND_URL: &str = "https://backend.betaisports.net";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    Live,
    Demo,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub source: FeedSource,
    pub fetch_parallelism: usize,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            source: FeedSource::Live,
            fetch_parallelism: 6,
            request_timeout_secs: 10,
        }
    }
}

impl BackendConfig {
    pub fn from_env() -> Self {
        let base_url = env::var("BETAI_BACKEND_URL")
            .ok()
            .map(|s| normalize_base_url(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let source = match env::var("BETAI_SOURCE")
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "demo" | "fake" | "offline" => FeedSource::Demo,
            _ => FeedSource::Live,
        };
        let fetch_parallelism = env::var("FETCH_PARALLELISM")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(6)
            .clamp(2, 32);
        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(10)
            .clamp(2, 60);

        Self {
            base_url,
            source,
            fetch_parallelism,
            request_timeout_secs,
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{path}", self.base_url)
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
