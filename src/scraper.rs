//! Dispatcher and pipeline orchestration: URL in, one fully-populated
//! [`ScrapeResult`] out, browser session released on every path.

use std::time::Duration;

use futures::StreamExt;
use futures::stream;
use tracing::{error, info, instrument, warn};
use url::Url;

use crate::challenge::{ChallengeOutcome, pass_challenges};
use crate::config::{DEFAULT_NAV_TIMEOUT, PlatformSpec, SessionConfig, platform_spec};
use crate::dom::wait_for_element;
use crate::errors::ScrapeError;
use crate::extract::{Extracted, extract_from_page};
use crate::model::{Credentials, Platform, ScrapeRequest, ScrapeResult, ScrapeStatus};
use crate::navigate::{NavOutcome, canonical_url, goto_within, instagram_login};
use crate::normalize::{clean_instagram_title, expand_count, refine_followers};
use crate::session::Session;

const CONTENT_GATE_WAIT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub headless: bool,
    pub nav_timeout: Duration,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            headless: true,
            nav_timeout: DEFAULT_NAV_TIMEOUT,
        }
    }
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// Maps a URL's host to the platform pipeline that handles it. Runs before
/// any browser is launched; an unknown host never costs a session.
pub fn route(url: &str) -> Result<Platform, ScrapeError> {
    let link = url.trim();
    let with_scheme = if link.contains("://") {
        link.to_string()
    } else {
        format!("https://{}", link)
    };
    let host = Url::parse(&with_scheme)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .ok_or_else(|| ScrapeError::UnsupportedDomain(link.to_string()))?;

    let platform = if host_matches(&host, "t.me") || host_matches(&host, "telegram.me") {
        Platform::Telegram
    } else if host_matches(&host, "vk.com") {
        Platform::Vk
    } else if host_matches(&host, "instagram.com") {
        Platform::Instagram
    } else if host_matches(&host, "rutube.ru") {
        Platform::Rutube
    } else if host_matches(&host, "tiktok.com") {
        Platform::Tiktok
    } else {
        return Err(ScrapeError::UnsupportedDomain(host));
    };
    Ok(platform)
}

/// Folds raw extracted values into the canonical result. Empty extraction
/// becomes the selector-exhaustion sentinel; a found-but-unreadable
/// follower text becomes "0" because the field was at least attempted.
pub fn assemble_result(extracted: Extracted, spec: &PlatformSpec) -> ScrapeResult {
    if extracted.is_empty() {
        return ScrapeResult::failed(ScrapeStatus::SelectorsExhausted);
    }

    let channel_name = match extracted.channel_name {
        Some(raw) if spec.clean_title => clean_instagram_title(&raw),
        Some(raw) => raw,
        None => "Unknown".to_string(),
    };

    let followers_count = match extracted
        .followers
        .as_deref()
        .and_then(|raw| refine_followers(raw, spec.refine))
    {
        Some(refined) => expand_count(&refined),
        None => "0".to_string(),
    };

    ScrapeResult::ok(channel_name, followers_count)
}

fn status_for(error: &ScrapeError) -> ScrapeStatus {
    match error {
        ScrapeError::LoginFailed(_) => ScrapeStatus::LoginFailed,
        ScrapeError::ChallengeFailed(_) => ScrapeStatus::ChallengeFailed,
        ScrapeError::SelectorsExhausted => ScrapeStatus::SelectorsExhausted,
        ScrapeError::UnsupportedDomain(_) => ScrapeStatus::UnsupportedDomain,
        // Launch, navigation and evaluation faults all mean the page was
        // never readable.
        ScrapeError::BrowserLaunch(_)
        | ScrapeError::PageCreation(_)
        | ScrapeError::Navigation(_)
        | ScrapeError::NavigationTimeout(_)
        | ScrapeError::EvaluationFailed(_) => ScrapeStatus::NavigationTimeout,
    }
}

async fn run_pipeline(
    session: &Session,
    request: &ScrapeRequest,
    spec: &'static PlatformSpec,
    options: &ScrapeOptions,
) -> Result<ScrapeResult, ScrapeError> {
    let page = session.page();

    if spec.requires_login {
        let credentials = request
            .credentials
            .as_ref()
            .ok_or_else(|| ScrapeError::LoginFailed("credentials required".into()))?;
        let login_url = spec
            .login_url
            .ok_or_else(|| ScrapeError::LoginFailed("no login url configured".into()))?;
        instagram_login(page, login_url, credentials, options.nav_timeout).await?;
    }

    match goto_within(page, &request.url, options.nav_timeout).await? {
        NavOutcome::Arrived => {}
        NavOutcome::TimedOut => {
            return Err(ScrapeError::NavigationTimeout(request.url.clone()));
        }
    }

    if let Some(challenge) = &spec.challenge {
        match pass_challenges(page, challenge).await {
            ChallengeOutcome::Clear => {}
            ChallengeOutcome::Exhausted => {
                return Err(ScrapeError::ChallengeFailed(request.url.clone()));
            }
        }
    }

    if let Some(gate) = spec.content_gate {
        // Worth waiting for, not worth failing over; the selector chains
        // have their own retry rounds.
        wait_for_element(page, gate, CONTENT_GATE_WAIT).await;
    }

    let extracted = extract_from_page(page, spec).await;
    if extracted.is_empty() {
        return Err(ScrapeError::SelectorsExhausted);
    }
    Ok(assemble_result(extracted, spec))
}

/// Scrapes one profile URL end to end. Never panics and never returns a
/// half-filled result; every failure folds into a sentinel status.
#[instrument(skip(credentials, options))]
pub async fn scrape(
    url: &str,
    credentials: Option<Credentials>,
    options: &ScrapeOptions,
) -> ScrapeResult {
    let platform = match route(url) {
        Ok(platform) => platform,
        Err(e) => {
            warn!("{}", e);
            return ScrapeResult::failed(ScrapeStatus::UnsupportedDomain);
        }
    };
    info!(%platform, "dispatching");

    let request = ScrapeRequest {
        url: canonical_url(platform, url),
        platform,
        credentials,
    };
    let spec = platform_spec(platform);

    if spec.requires_login && request.credentials.is_none() {
        error!(%platform, "credentials required but not provided");
        return ScrapeResult::failed(ScrapeStatus::LoginFailed);
    }

    let config = SessionConfig::rotate(options.headless, options.nav_timeout);
    let session = match Session::launch(&config).await {
        Ok(session) => session,
        Err(e) => {
            error!("session launch failed: {}", e);
            return ScrapeResult::failed(status_for(&e));
        }
    };

    let outcome = run_pipeline(&session, &request, spec, options).await;
    // One acquire, one release, on every path.
    session.close().await;

    match outcome {
        Ok(result) => result,
        Err(e) => {
            warn!(%platform, "scrape failed: {}", e);
            ScrapeResult::failed(status_for(&e))
        }
    }
}

/// Scrapes a batch of URLs with at most `limit` simultaneous browser
/// sessions, preserving input order in the output.
pub async fn scrape_many(
    urls: &[String],
    credentials: Option<Credentials>,
    limit: usize,
    options: &ScrapeOptions,
) -> Vec<ScrapeResult> {
    stream::iter(urls.iter().cloned())
        .map(|url| {
            let credentials = credentials.clone();
            async move { scrape(&url, credentials, options).await }
        })
        .buffered(limit.max(1))
        .collect()
        .await
}
