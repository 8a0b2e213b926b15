//! Runs the ordered selector-fallback chains against the rendered page.
//!
//! The ordered lists in `config.rs` are the resilience mechanism against
//! markup drift: a precise primary selector first, progressively looser
//! fallbacks after it. The walk itself is generic over the selector lookup
//! so it can run against a live page or an in-memory stand-in.

use std::future::Future;

use chromiumoxide::Page;

use crate::config::{MAX_SCRAPING_ROUNDS, PlatformSpec, ROUND_SETTLE_MS, SelectorStrategy};
use crate::dom::query_value;
use crate::retry::retry_bounded;

/// Raw field values pulled off the page. `None` means every selector for
/// that field missed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub channel_name: Option<String>,
    pub followers: Option<String>,
}

impl Extracted {
    pub fn is_empty(&self) -> bool {
        self.channel_name.is_none() && self.followers.is_none()
    }
}

/// First selector in `list` that produces a non-empty trimmed value wins.
async fn first_match<F, Fut>(lookup: &F, list: &'static [SelectorStrategy]) -> Option<String>
where
    F: Fn(&'static SelectorStrategy) -> Fut,
    Fut: Future<Output = Option<String>>,
{
    for strategy in list {
        if let Some(value) = lookup(strategy).await {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Walks both field chains for up to [`MAX_SCRAPING_ROUNDS`] rounds with a
/// settle delay in between. Stops early as soon as any field has a value;
/// finding something is treated as good enough to stop retrying.
pub async fn extract_fields<F, Fut>(lookup: &F, spec: &'static PlatformSpec) -> Extracted
where
    F: Fn(&'static SelectorStrategy) -> Fut,
    Fut: Future<Output = Option<String>>,
{
    let found = retry_bounded(
        "selector round",
        MAX_SCRAPING_ROUNDS,
        ROUND_SETTLE_MS..=ROUND_SETTLE_MS,
        |_round| {
            let lookup = lookup;
            async move {
                let extracted = Extracted {
                    channel_name: first_match(lookup, spec.channel_name).await,
                    followers: first_match(lookup, spec.followers).await,
                };
                (!extracted.is_empty()).then_some(extracted)
            }
        },
    )
    .await;
    found.unwrap_or_default()
}

/// Live-page extraction entry point.
pub async fn extract_from_page(page: &Page, spec: &'static PlatformSpec) -> Extracted {
    let lookup = |strategy: &'static SelectorStrategy| query_value(page, strategy);
    extract_fields(&lookup, spec).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::platform_spec;
    use crate::model::Platform;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn dom(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn primary_selector_wins() {
        let page = dom(&[
            ("div.tgme_page_title", "Example Channel"),
            ("h1", "Something Else"),
        ]);
        let spec = platform_spec(Platform::Telegram);
        let lookup = |s: &'static SelectorStrategy| {
            let hit = page.get(s.selector).cloned();
            async move { hit }
        };
        let extracted = extract_fields(&lookup, spec).await;
        assert_eq!(extracted.channel_name.as_deref(), Some("Example Channel"));
    }

    #[tokio::test]
    async fn fallback_selector_wins_when_primary_misses() {
        let page = dom(&[("h1", "Fallback Channel")]);
        let spec = platform_spec(Platform::Telegram);
        let lookup = |s: &'static SelectorStrategy| {
            let hit = page.get(s.selector).cloned();
            async move { hit }
        };
        let extracted = extract_fields(&lookup, spec).await;
        assert_eq!(extracted.channel_name.as_deref(), Some("Fallback Channel"));
    }

    #[tokio::test]
    async fn whitespace_only_matches_do_not_win() {
        let page = dom(&[("div.tgme_page_title", "   "), ("h1", "Real Name")]);
        let spec = platform_spec(Platform::Telegram);
        let lookup = |s: &'static SelectorStrategy| {
            let hit = page.get(s.selector).cloned();
            async move { hit }
        };
        let extracted = extract_fields(&lookup, spec).await;
        assert_eq!(extracted.channel_name.as_deref(), Some("Real Name"));
    }

    #[tokio::test]
    async fn stops_after_first_round_with_any_value() {
        let rounds = AtomicU32::new(0);
        let spec = platform_spec(Platform::Vk);
        let lookup = |s: &'static SelectorStrategy| {
            // Count one round per pass over the first name selector.
            if s.selector == spec.channel_name[0].selector {
                rounds.fetch_add(1, Ordering::SeqCst);
            }
            let hit = (s.selector == "h1").then(|| "Club".to_string());
            async move { hit }
        };
        let extracted = extract_fields(&lookup, spec).await;
        assert_eq!(extracted.channel_name.as_deref(), Some("Club"));
        assert_eq!(extracted.followers, None);
        assert_eq!(rounds.load(Ordering::SeqCst), 1, "found a value, no retry rounds");
    }

    #[tokio::test(start_paused = true)]
    async fn empty_page_exhausts_all_rounds() {
        let rounds = AtomicU32::new(0);
        let spec = platform_spec(Platform::Vk);
        let lookup = |s: &'static SelectorStrategy| {
            if s.selector == spec.channel_name[0].selector {
                rounds.fetch_add(1, Ordering::SeqCst);
            }
            async { None }
        };
        let extracted = extract_fields(&lookup, spec).await;
        assert!(extracted.is_empty());
        assert_eq!(rounds.load(Ordering::SeqCst), MAX_SCRAPING_ROUNDS);
    }
}
