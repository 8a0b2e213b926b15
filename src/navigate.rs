//! Drives the page to target and login URLs with bounded waits.

use std::ops::RangeInclusive;
use std::time::Duration;

use chromiumoxide::Page;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::dom::{click_element, evaluate_bool, js_escape, poll_until, wait_for_element};
use crate::errors::ScrapeError;
use crate::model::{Credentials, Platform};
use crate::retry::human_delay;

/// Jitter before each navigation, desynchronizing the automation rhythm.
pub const PRE_NAV_JITTER_MS: RangeInclusive<u64> = 500..=1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Arrived,
    TimedOut,
}

/// Rewrites the input link into the canonical form the platforms expect:
/// https scheme always, and TikTok subdomains collapsed onto
/// `www.tiktok.com`.
pub fn canonical_url(platform: Platform, raw: &str) -> String {
    let mut link = raw.trim().to_string();
    if let Some(rest) = link.strip_prefix("http://") {
        link = format!("https://{}", rest);
    } else if !link.starts_with("https://") {
        link = format!("https://{}", link);
    }

    if platform == Platform::Tiktok {
        if let Ok(mut parsed) = url::Url::parse(&link) {
            let is_tiktok = parsed
                .host_str()
                .is_some_and(|h| h == "tiktok.com" || h.ends_with(".tiktok.com"));
            if is_tiktok && parsed.set_host(Some("www.tiktok.com")).is_ok() {
                link = parsed.to_string();
            }
        }
    }
    link
}

/// Navigates to `url` with a hard timeout, bracketed by randomized
/// human-looking delays before the request and after arrival.
pub async fn goto_within(
    page: &Page,
    url: &str,
    nav_timeout: Duration,
) -> Result<NavOutcome, ScrapeError> {
    human_delay(PRE_NAV_JITTER_MS).await;
    info!(url, "navigating");
    match timeout(nav_timeout, page.goto(url)).await {
        Ok(Ok(_)) => {
            human_delay(2000..=4000).await;
            Ok(NavOutcome::Arrived)
        }
        Ok(Err(e)) => Err(ScrapeError::Navigation(e.to_string())),
        Err(_) => {
            warn!(url, ?nav_timeout, "navigation timed out");
            Ok(NavOutcome::TimedOut)
        }
    }
}

/// Fills an input through the DOM so framework listeners see the change.
async fn type_into_field(page: &Page, selector: &str, text: &str) -> bool {
    let js = format!(
        r#"
        (() => {{
            const field = document.querySelector('{}');
            if (!field) return false;
            field.focus();
            field.value = '{}';
            field.dispatchEvent(new InputEvent('input', {{ bubbles: true }}));
            field.dispatchEvent(new Event('change', {{ bubbles: true }}));
            field.blur();
            return true;
        }})()
        "#,
        js_escape(selector),
        js_escape(text)
    );
    evaluate_bool(page, &js).await
}

const COOKIE_CONSENT_WAIT: Duration = Duration::from_secs(5);

const COOKIE_ACCEPT_JS: &str = r#"
    (() => {
        const acceptTexts = ['allow all cookies', 'accept all', 'accept', 'agree', 'allow essential'];
        const buttons = document.querySelectorAll('button, div[role="button"]');
        for (const btn of buttons) {
            const text = (btn.textContent || '').toLowerCase().trim();
            if (acceptTexts.some(t => text.includes(t)) && text.length < 40) {
                btn.click();
                return true;
            }
        }
        return false;
    })()
"#;

/// Best-effort cookie-consent dismissal. The banner can render a moment
/// after the page settles, so the accept button is polled for a bounded
/// window; failure never surfaces past a debug log entry.
async fn dismiss_cookie_consent(page: &Page) {
    let clicked = poll_until(COOKIE_CONSENT_WAIT, || {
        evaluate_bool(page, COOKIE_ACCEPT_JS)
    })
    .await;
    if clicked {
        debug!("cookie consent dismissed");
        sleep(Duration::from_millis(1000)).await;
    } else {
        debug!("no cookie consent banner found");
    }
}

/// Scripted Instagram login. Navigates to the login form, fills the
/// credentials, submits and waits for the resulting navigation. Every wait
/// is bounded; any miss maps to `LoginFailed`.
pub async fn instagram_login(
    page: &Page,
    login_url: &str,
    credentials: &Credentials,
    nav_timeout: Duration,
) -> Result<(), ScrapeError> {
    match goto_within(page, login_url, nav_timeout).await? {
        NavOutcome::Arrived => {}
        NavOutcome::TimedOut => {
            return Err(ScrapeError::LoginFailed("login page did not load".into()));
        }
    }

    dismiss_cookie_consent(page).await;

    if !wait_for_element(page, "input[name=\"username\"]", Duration::from_secs(15)).await {
        return Err(ScrapeError::LoginFailed("username field not found".into()));
    }
    if !type_into_field(page, "input[name=\"username\"]", &credentials.username).await {
        return Err(ScrapeError::LoginFailed("could not fill username".into()));
    }
    human_delay(300..=800).await;
    if !type_into_field(page, "input[name=\"password\"]", &credentials.password).await {
        return Err(ScrapeError::LoginFailed("could not fill password".into()));
    }
    human_delay(300..=800).await;

    if !click_element(page, "button[type=\"submit\"]").await {
        return Err(ScrapeError::LoginFailed("submit button not found".into()));
    }

    info!("waiting for post-login navigation");
    let nav = page.wait_for_navigation();
    tokio::select! {
        res = nav => {
            if let Err(e) = res {
                return Err(ScrapeError::LoginFailed(format!("post-login navigation: {}", e)));
            }
        }
        _ = sleep(nav_timeout) => {
            return Err(ScrapeError::LoginFailed("post-login navigation timed out".into()));
        }
    }
    human_delay(1500..=3000).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_https() {
        assert_eq!(
            canonical_url(Platform::Telegram, "t.me/examplechannel"),
            "https://t.me/examplechannel"
        );
    }

    #[test]
    fn upgrades_plain_http() {
        assert_eq!(
            canonical_url(Platform::Vk, "http://vk.com/club1"),
            "https://vk.com/club1"
        );
    }

    #[test]
    fn collapses_tiktok_subdomains() {
        assert_eq!(
            canonical_url(Platform::Tiktok, "https://m.tiktok.com/@user"),
            "https://www.tiktok.com/@user"
        );
        assert_eq!(
            canonical_url(Platform::Tiktok, "tiktok.com/@user"),
            "https://www.tiktok.com/@user"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pre_nav_jitter_stays_inside_its_bounds() {
        let delay = human_delay(PRE_NAV_JITTER_MS);
        tokio::pin!(delay);
        assert!(futures::poll!(delay.as_mut()).is_pending());
        tokio::time::advance(Duration::from_millis(499)).await;
        assert!(futures::poll!(delay.as_mut()).is_pending());
        tokio::time::advance(Duration::from_millis(1001)).await;
        assert!(futures::poll!(delay.as_mut()).is_ready());
    }

    #[test]
    fn leaves_other_platforms_hosts_alone() {
        assert_eq!(
            canonical_url(Platform::Rutube, "https://rutube.ru/channel/1/"),
            "https://rutube.ru/channel/1/"
        );
    }
}
