use std::fmt;

use serde::{Deserialize, Serialize};

/// Platforms the scraper knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Telegram,
    Vk,
    Instagram,
    Rutube,
    Tiktok,
}

impl Platform {
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Telegram => "telegram",
            Platform::Vk => "vk",
            Platform::Instagram => "instagram",
            Platform::Rutube => "rutube",
            Platform::Tiktok => "tiktok",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// One scrape invocation. Immutable once built by the dispatcher.
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub url: String,
    pub platform: Platform,
    pub credentials: Option<Credentials>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScrapeStatus {
    Ok,
    ChallengeFailed,
    SelectorsExhausted,
    NavigationTimeout,
    LoginFailed,
    UnsupportedDomain,
}

/// The only artifact returned to the caller. Always fully populated:
/// on failure both fields carry sentinel text, never empty strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub channel_name: String,
    pub followers_count: String,
    pub status: ScrapeStatus,
}

impl ScrapeResult {
    pub fn ok(channel_name: String, followers_count: String) -> Self {
        Self {
            channel_name,
            followers_count,
            status: ScrapeStatus::Ok,
        }
    }

    /// Sentinel result for a failed scrape.
    pub fn failed(status: ScrapeStatus) -> Self {
        debug_assert_ne!(status, ScrapeStatus::Ok);
        let channel_name = match status {
            ScrapeStatus::Ok | ScrapeStatus::SelectorsExhausted => "Scraping Failed",
            ScrapeStatus::ChallengeFailed => "Challenge Failed",
            ScrapeStatus::NavigationTimeout => "Navigation Timeout",
            ScrapeStatus::LoginFailed => "Login Failed",
            ScrapeStatus::UnsupportedDomain => "Unsupported Domain",
        };
        Self {
            channel_name: channel_name.to_string(),
            followers_count: "N/A".to_string(),
            status,
        }
    }
}
