use std::time::Duration;

use rand::seq::IndexedRandom;

use crate::model::Platform;

/// Outer extraction rounds before giving up on a platform's selectors.
pub const MAX_SCRAPING_ROUNDS: u32 = 3;
/// Settle delay between extraction rounds, in milliseconds.
pub const ROUND_SETTLE_MS: u64 = 3000;
/// Challenge click-through attempts before reporting failure.
pub const MAX_CHALLENGE_ATTEMPTS: u32 = 5;
/// Default hard cap on a single page navigation.
pub const DEFAULT_NAV_TIMEOUT: Duration = Duration::from_secs(30);

/// Rotation pool. Read-only after startup; one entry is picked per scrape.
static USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36 Edg/92.0.902.55",
];

/// Stylesheets and fonts are dead weight for text extraction; blocking them
/// cuts load time and shrinks the fingerprint surface.
static BLOCKED_URL_PATTERNS: &[&str] = &["*.css", "*.woff", "*.woff2", "*.ttf", "*.otf"];

/// Per-scrape browser settings. Built fresh for every scrape, never shared.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub user_agent: &'static str,
    pub viewport: (u32, u32),
    pub blocked_url_patterns: &'static [&'static str],
    pub headless: bool,
    pub nav_timeout: Duration,
}

impl SessionConfig {
    pub fn rotate(headless: bool, nav_timeout: Duration) -> Self {
        let user_agent = USER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);
        Self {
            user_agent,
            viewport: (1366, 768),
            blocked_url_patterns: BLOCKED_URL_PATTERNS,
            headless,
            nav_timeout,
        }
    }
}

/// How a selector's value is pulled out of the matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    Text,
    Attribute(&'static str),
}

/// One DOM-query rule. Lists are consulted in order, first non-empty wins.
#[derive(Debug, Clone, Copy)]
pub struct SelectorStrategy {
    pub selector: &'static str,
    pub extract: Extract,
}

const fn text(selector: &'static str) -> SelectorStrategy {
    SelectorStrategy {
        selector,
        extract: Extract::Text,
    }
}

const fn attr(selector: &'static str, name: &'static str) -> SelectorStrategy {
    SelectorStrategy {
        selector,
        extract: Extract::Attribute(name),
    }
}

/// Post-extraction cleanup applied to the raw followers text before the
/// generic count expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowerRefine {
    /// Use the raw text as-is.
    Plain,
    /// Telegram: the text must mention subscribers/members/followers; the
    /// count is the first digits-and-spaces run.
    LabelledCount,
    /// Instagram: the count is the "<n> Followers" token inside the page
    /// description meta tag.
    FollowersLabel,
}

/// Anti-bot interstitial signature plus the scripted way through it.
#[derive(Debug, Clone, Copy)]
pub struct ChallengeSpec {
    /// Path fragment identifying the interstitial URL.
    pub url_marker: &'static str,
    /// The control that starts the pass-through.
    pub start_selector: &'static str,
}

/// Everything that differs between platforms. Static, read-only after init.
pub struct PlatformSpec {
    pub platform: Platform,
    pub requires_login: bool,
    pub login_url: Option<&'static str>,
    pub challenge: Option<ChallengeSpec>,
    /// Selector that must appear before extraction is worth trying.
    /// Waited for with a bounded timeout; missing it is not fatal.
    pub content_gate: Option<&'static str>,
    pub channel_name: &'static [SelectorStrategy],
    pub followers: &'static [SelectorStrategy],
    pub refine: FollowerRefine,
    /// Instagram composes the page title as "Name (@handle) • ..."; the
    /// handle has to be dug out of it.
    pub clean_title: bool,
}

static TELEGRAM: PlatformSpec = PlatformSpec {
    platform: Platform::Telegram,
    requires_login: false,
    login_url: None,
    challenge: None,
    content_gate: None,
    channel_name: &[
        text("div.tgme_page_title"),
        text(".tgme_page_title"),
        text("h1"),
        text(".page-title"),
        text(".channel-title"),
    ],
    followers: &[
        text("div.tgme_page_extra"),
        text(".tgme_page_extra"),
        text(".subscribers-count"),
        text(".members-count"),
        text(".followers-count"),
        text("[class*=\"subscriber\"]"),
        text("[class*=\"member\"]"),
    ],
    refine: FollowerRefine::LabelledCount,
    clean_title: false,
};

static VK: PlatformSpec = PlatformSpec {
    platform: Platform::Vk,
    requires_login: false,
    login_url: None,
    challenge: Some(ChallengeSpec {
        url_marker: "/challenge.html",
        start_selector: "body > div > button.start",
    }),
    content_gate: None,
    channel_name: &[
        text(
            ".page_block.redesigned-cover-block .redesigned-group-info \
             .redesigned-group-info__main .page_top h1",
        ),
        text("h1"),
    ],
    followers: &[
        text("#page_subscribers > div > span"),
        text("[class*=\"subscriber\"]"),
    ],
    refine: FollowerRefine::Plain,
    clean_title: false,
};

static INSTAGRAM: PlatformSpec = PlatformSpec {
    platform: Platform::Instagram,
    requires_login: true,
    login_url: Some("https://www.instagram.com/accounts/login/"),
    challenge: None,
    content_gate: None,
    channel_name: &[attr("meta[property=\"og:title\"]", "content")],
    followers: &[attr("meta[name=\"description\"]", "content")],
    refine: FollowerRefine::FollowersLabel,
    clean_title: true,
};

static RUTUBE: PlatformSpec = PlatformSpec {
    platform: Platform::Rutube,
    requires_login: false,
    login_url: None,
    challenge: None,
    content_gate: None,
    channel_name: &[
        attr("h1.wdp-feed-banner-module__wdp-feed-banner__title-text", "title"),
        text("h1.wdp-feed-banner-module__wdp-feed-banner__title-text"),
        text(".wdp-feed-banner__title-text"),
        text("h1[class*=\"title\"]"),
        text(".channel-title"),
        text("h1"),
        text(".page-title"),
    ],
    followers: &[
        text(".wdp-feed-banner-module__wdp-feed-banner__title p"),
        text(".wdp-feed-banner__title p"),
        text("[class*=\"subscriber\"]"),
        text("[class*=\"follower\"]"),
        text(".subscribers-count"),
        text(".followers-count"),
        text("p[class*=\"banner\"]"),
    ],
    refine: FollowerRefine::Plain,
    clean_title: false,
};

static TIKTOK: PlatformSpec = PlatformSpec {
    platform: Platform::Tiktok,
    requires_login: false,
    login_url: None,
    challenge: None,
    content_gate: Some("#main-content-others_homepage"),
    channel_name: &[
        text(
            "#main-content-others_homepage > div > \
             div.e1457k4r14.css-cooqqt-DivShareLayoutHeader-StyledDivShareLayoutHeaderV2-CreatorPageHeader.e13xij562 > \
             div.css-1o9t6sm-DivShareTitleContainer-CreatorPageHeaderShareContainer.e1457k4r15 > \
             div.css-dozy74-DivUserIdentifierWrapper.e1gnmlil1 > div > div > h1",
        ),
        text("h2[data-e2e=\"user-title\"]"),
        text("[data-e2e=\"user-title\"]"),
        text("h1"),
        text("h2"),
    ],
    followers: &[
        text(
            "#main-content-others_homepage > div > \
             div.e1457k4r14.css-cooqqt-DivShareLayoutHeader-StyledDivShareLayoutHeaderV2-CreatorPageHeader.e13xij562 > \
             div.css-1o9t6sm-DivShareTitleContainer-CreatorPageHeaderShareContainer.e1457k4r15 > \
             div.css-1ygxkc0-CreatorPageHeaderTextContainer.e1457k4r16 > h3 > div:nth-child(2) > strong",
        ),
        text("[data-e2e=\"followers-count\"]"),
        text("strong[data-e2e=\"followers-count\"]"),
        text("div[data-e2e=\"followers-count\"] strong"),
        text(".follower-count"),
    ],
    refine: FollowerRefine::Plain,
    clean_title: false,
};

pub fn platform_spec(platform: Platform) -> &'static PlatformSpec {
    match platform {
        Platform::Telegram => &TELEGRAM,
        Platform::Vk => &VK,
        Platform::Instagram => &INSTAGRAM,
        Platform::Rutube => &RUTUBE,
        Platform::Tiktok => &TIKTOK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_platform_has_both_selector_lists() {
        for platform in [
            Platform::Telegram,
            Platform::Vk,
            Platform::Instagram,
            Platform::Rutube,
            Platform::Tiktok,
        ] {
            let spec = platform_spec(platform);
            assert!(!spec.channel_name.is_empty(), "{platform} has no name selectors");
            assert!(!spec.followers.is_empty(), "{platform} has no follower selectors");
            assert_eq!(spec.platform, platform);
        }
    }

    #[test]
    fn login_platforms_carry_a_login_url() {
        let spec = platform_spec(Platform::Instagram);
        assert!(spec.requires_login);
        assert!(spec.login_url.is_some());
    }

    #[test]
    fn rotated_configs_use_pool_agents() {
        for _ in 0..20 {
            let config = SessionConfig::rotate(true, DEFAULT_NAV_TIMEOUT);
            assert!(USER_AGENTS.contains(&config.user_agent));
            assert_eq!(config.viewport, (1366, 768));
        }
    }
}
