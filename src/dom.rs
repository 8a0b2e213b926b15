//! Shared page-inspection helpers. Everything here is read-only except
//! [`click_element`], and every wait is bounded.

use std::future::Future;
use std::time::Duration;

use chromiumoxide::Page;
use tokio::time::sleep;
use tracing::debug;

use crate::config::{Extract, SelectorStrategy};

/// Escapes a CSS selector for embedding in a single-quoted JS string.
pub fn js_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

pub async fn current_url(page: &Page) -> String {
    page.url().await.ok().flatten().unwrap_or_default()
}

/// Evaluates a JS snippet expected to produce a boolean; any failure reads
/// as `false`.
pub async fn evaluate_bool(page: &Page, js: &str) -> bool {
    page.evaluate(js)
        .await
        .ok()
        .and_then(|v| v.into_value::<bool>().ok())
        .unwrap_or(false)
}

/// Runs `check` every 200ms until it yields `true` or `timeout` runs out.
pub async fn poll_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let check_interval = Duration::from_millis(200);
    let mut elapsed = Duration::ZERO;
    while elapsed < timeout {
        if check().await {
            return true;
        }
        sleep(check_interval).await;
        elapsed += check_interval;
    }
    false
}

/// Polls for a visible element matching `selector` every 200ms until
/// `timeout` runs out. Returns whether it showed up.
pub async fn wait_for_element(page: &Page, selector: &str, timeout: Duration) -> bool {
    let js = format!(
        r#"
        (() => {{
            try {{
                const el = document.querySelector('{}');
                if (!el) return false;
                const rect = el.getBoundingClientRect();
                return rect.width > 0 && rect.height > 0;
            }} catch (e) {{
                return false;
            }}
        }})()
        "#,
        js_escape(selector)
    );

    let found = poll_until(timeout, || evaluate_bool(page, &js)).await;
    if !found {
        debug!(selector, ?timeout, "element never appeared");
    }
    found
}

/// Runs one selector strategy against the live DOM. Returns the trimmed
/// text or attribute value, or `None` when the selector misses or matches
/// something empty.
pub async fn query_value(page: &Page, strategy: &SelectorStrategy) -> Option<String> {
    let accessor = match strategy.extract {
        Extract::Text => "(el.innerText || el.textContent || '')".to_string(),
        Extract::Attribute(name) => format!("(el.getAttribute('{}') || '')", js_escape(name)),
    };
    let js = format!(
        r#"
        (() => {{
            const el = document.querySelector('{}');
            if (!el) return null;
            const value = {}.trim();
            return value.length > 0 ? value : null;
        }})()
        "#,
        js_escape(strategy.selector),
        accessor
    );

    page.evaluate(js)
        .await
        .ok()
        .and_then(|v| v.into_value::<Option<String>>().ok())
        .flatten()
}

/// Scrolls the element into view and clicks it. Returns whether a matching
/// element was there to click.
pub async fn click_element(page: &Page, selector: &str) -> bool {
    let js = format!(
        r#"
        (() => {{
            try {{
                const el = document.querySelector('{}');
                if (!el) return false;
                el.scrollIntoView({{ block: 'center' }});
                el.click();
                return true;
            }} catch (e) {{
                return false;
            }}
        }})()
        "#,
        js_escape(selector)
    );
    evaluate_bool(page, &js).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn poll_until_stops_on_success() {
        let calls = AtomicU32::new(0);
        let found = poll_until(Duration::from_secs(5), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { n >= 3 }
        })
        .await;
        assert!(found);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_until_gives_up_at_the_deadline() {
        let calls = AtomicU32::new(0);
        let found = poll_until(Duration::from_secs(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { false }
        })
        .await;
        assert!(!found);
        // One probe per 200ms tick inside the one-second budget.
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(js_escape(r#"a[name='x']"#), r#"a[name=\'x\']"#);
        assert_eq!(js_escape(r"a\b"), r"a\\b");
    }
}
