//! Headless-browser scraper that reads a channel name and follower count
//! off social-media profile pages (Telegram, VK, Instagram, Rutube,
//! TikTok) and always returns a fully-populated, typed result.

pub mod challenge;
pub mod config;
pub mod dom;
pub mod errors;
pub mod extract;
pub mod model;
pub mod navigate;
pub mod normalize;
pub mod retry;
pub mod scraper;
pub mod session;

pub use errors::ScrapeError;
pub use model::{Credentials, Platform, ScrapeRequest, ScrapeResult, ScrapeStatus};
pub use scraper::{ScrapeOptions, route, scrape, scrape_many};
