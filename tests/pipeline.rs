//! Browserless pipeline tests: routing, selector fallback, and result
//! assembly wired together over an in-memory DOM lookup.

use std::collections::HashMap;

use followscan::config::{SelectorStrategy, platform_spec};
use followscan::extract::extract_fields;
use followscan::scraper::{assemble_result, route};
use followscan::{Platform, ScrapeOptions, ScrapeStatus, scrape, scrape_many};

fn dom(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

async fn run(platform: Platform, page: HashMap<String, String>) -> followscan::ScrapeResult {
    let spec = platform_spec(platform);
    let lookup = |s: &'static SelectorStrategy| {
        let hit = page.get(s.selector).cloned();
        async move { hit }
    };
    let extracted = extract_fields(&lookup, spec).await;
    assemble_result(extracted, spec)
}

#[tokio::test]
async fn telegram_profile_end_to_end() {
    let url = "https://t.me/examplechannel";
    assert_eq!(route(url).unwrap(), Platform::Telegram);

    let page = dom(&[
        ("div.tgme_page_title", "Example Channel"),
        ("div.tgme_page_extra", "12345 subscribers"),
    ]);
    let result = run(Platform::Telegram, page).await;
    assert_eq!(result.status, ScrapeStatus::Ok);
    assert_eq!(result.channel_name, "Example Channel");
    assert_eq!(result.followers_count, "12345");
}

#[tokio::test]
async fn telegram_spaced_count_is_collapsed() {
    let page = dom(&[
        ("div.tgme_page_title", "Example Channel"),
        ("div.tgme_page_extra", "12 345 subscribers"),
    ]);
    let result = run(Platform::Telegram, page).await;
    assert_eq!(result.followers_count, "12345");
}

#[tokio::test]
async fn vk_group_reads_name_and_count() {
    let page = dom(&[
        (
            ".page_block.redesigned-cover-block .redesigned-group-info \
             .redesigned-group-info__main .page_top h1",
            "Example Club",
        ),
        ("#page_subscribers > div > span", "54 321"),
    ]);
    let result = run(Platform::Vk, page).await;
    assert_eq!(result.status, ScrapeStatus::Ok);
    assert_eq!(result.channel_name, "Example Club");
    assert_eq!(result.followers_count, "54321");
}

#[tokio::test]
async fn tiktok_expands_magnitude_suffix() {
    let page = dom(&[
        ("h2[data-e2e=\"user-title\"]", "exampleuser"),
        ("[data-e2e=\"followers-count\"]", "12.3K"),
    ]);
    let result = run(Platform::Tiktok, page).await;
    assert_eq!(result.channel_name, "exampleuser");
    assert_eq!(result.followers_count, "12300");
}

#[tokio::test]
async fn instagram_meta_tags_yield_handle_and_count() {
    let page = dom(&[
        (
            "meta[property=\"og:title\"]",
            "Jane Doe (@janedoe) • Instagram photos and videos",
        ),
        (
            "meta[name=\"description\"]",
            "1.2M Followers, 40 Following, 112 Posts - see photos from janedoe",
        ),
    ]);
    let result = run(Platform::Instagram, page).await;
    assert_eq!(result.channel_name, "janedoe");
    assert_eq!(result.followers_count, "1200000");
}

#[tokio::test(start_paused = true)]
async fn empty_markup_reports_selector_exhaustion() {
    let result = run(Platform::Rutube, HashMap::new()).await;
    assert_eq!(result.status, ScrapeStatus::SelectorsExhausted);
    assert_eq!(result.channel_name, "Scraping Failed");
    assert_eq!(result.followers_count, "N/A");
}

#[tokio::test]
async fn batch_results_come_back_in_input_order() {
    // Each of these is rejected before any session launch: unknown hosts
    // route nowhere, and Instagram without credentials fails fast.
    let urls = vec![
        "https://example.com/a".to_string(),
        "https://www.instagram.com/janedoe/".to_string(),
        "https://example.org/b".to_string(),
    ];
    let results = scrape_many(&urls, None, 2, &ScrapeOptions::default()).await;
    let statuses: Vec<_> = results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            ScrapeStatus::UnsupportedDomain,
            ScrapeStatus::LoginFailed,
            ScrapeStatus::UnsupportedDomain,
        ]
    );
}

#[tokio::test]
async fn unsupported_domain_returns_without_a_browser() {
    let result = scrape(
        "https://example.com/someone",
        None,
        &ScrapeOptions::default(),
    )
    .await;
    assert_eq!(result.status, ScrapeStatus::UnsupportedDomain);
    assert_eq!(result.followers_count, "N/A");
}
