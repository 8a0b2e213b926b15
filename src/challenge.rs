//! Anti-bot interstitial handling. Some platforms (VK) park first-time
//! visitors on a challenge page that needs a scripted click before the real
//! profile loads; this walks through up to [`MAX_CHALLENGE_ATTEMPTS`] of
//! them with bounded waits at every step.

use std::time::Duration;

use chromiumoxide::Page;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{ChallengeSpec, MAX_CHALLENGE_ATTEMPTS};
use crate::dom::{click_element, current_url, wait_for_element};
use crate::retry::{human_delay, retry_bounded};

const START_CONTROL_WAIT: Duration = Duration::from_secs(15);
const CHALLENGE_NAV_WAIT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOutcome {
    /// Not on a challenge page (anymore).
    Clear,
    /// Attempt budget spent and the interstitial is still up.
    Exhausted,
}

async fn on_challenge_page(page: &Page, spec: &ChallengeSpec) -> bool {
    current_url(page).await.contains(spec.url_marker)
}

/// One scripted pass-through: wait for the start control, click it, wait
/// for the resulting navigation, then settle.
async fn solve_once(page: &Page, spec: &ChallengeSpec) -> bool {
    if !wait_for_element(page, spec.start_selector, START_CONTROL_WAIT).await {
        warn!(selector = spec.start_selector, "challenge start control never appeared");
        return false;
    }
    human_delay(500..=1500).await;
    if !click_element(page, spec.start_selector).await {
        warn!("challenge start control vanished before the click");
        return false;
    }

    let nav = page.wait_for_navigation();
    let navigated = tokio::select! {
        res = nav => res.is_ok(),
        _ = sleep(CHALLENGE_NAV_WAIT) => false,
    };
    if navigated {
        human_delay(2000..=4000).await;
        true
    } else {
        warn!("challenge click did not lead anywhere");
        false
    }
}

/// Detects and passes challenge interstitials until the page is clear or
/// the attempt budget runs out. Each attempt covers one challenge
/// encounter, so a site chaining interstitials still terminates within the
/// budget.
pub async fn pass_challenges(page: &Page, spec: &ChallengeSpec) -> ChallengeOutcome {
    let cleared = retry_bounded(
        "challenge pass-through",
        MAX_CHALLENGE_ATTEMPTS,
        3000..=5000,
        |attempt| async move {
            if !on_challenge_page(page, spec).await {
                return Some(());
            }
            info!(attempt, "challenge page detected");
            human_delay(1000..=3000).await;
            solve_once(page, spec).await;
            if on_challenge_page(page, spec).await {
                None
            } else {
                Some(())
            }
        },
    )
    .await;

    match cleared {
        Some(()) => {
            debug!("no challenge page in the way");
            ChallengeOutcome::Clear
        }
        None => {
            warn!(
                max_attempts = MAX_CHALLENGE_ATTEMPTS,
                "still on the challenge page after all attempts"
            );
            ChallengeOutcome::Exhausted
        }
    }
}
