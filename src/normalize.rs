//! Turns raw extracted page text into the canonical
//! `(channel name, integer-string followers count)` pair.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::FollowerRefine;

/// First numeric token immediately carrying a K/M magnitude suffix.
/// The word boundary keeps "123 members" from reading as "123M".
static SUFFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)\s?([KkMm])\b").unwrap()
});

/// "<n> Followers" token inside an Instagram description meta tag, e.g.
/// "12.3K Followers, 40 Following, 112 Posts".
static FOLLOWERS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?\s?[KkMm]?)\s+Followers").unwrap()
});

/// First run of digits and spaces, the way Telegram renders
/// "12 345 subscribers".
static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\d\s]+").unwrap());

/// Expands a follower-count string to a plain integer string.
///
/// "12.3K" becomes "12300" and "1.2M" becomes "1200000"; the fraction below
/// the suffix scale is truncated, matching the upstream behavior. Without a
/// suffix every non-digit character is stripped, so "1 234 subscribers"
/// becomes "1234". When nothing numeric remains the result is "0".
/// A comma with exactly three digits behind it is a thousands separator
/// ("1,234K"); anything else is a decimal comma ("20,5K").
fn decimalize(token: &str) -> String {
    match token.split_once(',') {
        Some((int_part, frac)) if frac.len() == 3 => format!("{}{}", int_part, frac),
        Some((int_part, frac)) => format!("{}.{}", int_part, frac),
        None => token.to_string(),
    }
}

pub fn expand_count(raw: &str) -> String {
    let raw = raw.trim();

    if let Some(caps) = SUFFIXED.captures(raw) {
        let number = decimalize(&caps[1]);
        if let Ok(value) = number.parse::<f64>() {
            let factor = match caps[2].to_ascii_uppercase().as_str() {
                "K" => 1_000.0,
                _ => 1_000_000.0,
            };
            return ((value * factor) as u64).to_string();
        }
    }

    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        "0".to_string()
    } else {
        digits
    }
}

/// Applies the platform-specific reading of the raw followers text before
/// the generic expansion. Returns `None` when the text does not look like a
/// follower count at all; the caller maps that to "0", the
/// attempted-but-unreadable sentinel.
pub fn refine_followers(raw: &str, refine: FollowerRefine) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match refine {
        FollowerRefine::Plain => Some(raw.to_string()),
        FollowerRefine::LabelledCount => {
            let lowered = raw.to_lowercase();
            if !(lowered.contains("subscriber")
                || lowered.contains("member")
                || lowered.contains("follower"))
            {
                return None;
            }
            DIGIT_RUN
                .find(raw)
                .map(|m| m.as_str().replace(' ', ""))
                .filter(|run| !run.is_empty())
        }
        FollowerRefine::FollowersLabel => {
            FOLLOWERS_LABEL.captures(raw).map(|caps| caps[1].to_string())
        }
    }
}

/// Digs the handle out of an Instagram page title such as
/// "Jane Doe (@janedoe) • Instagram photos and videos".
pub fn clean_instagram_title(raw: &str) -> String {
    let raw = raw.trim();
    if !raw.contains('•') {
        return raw.to_string();
    }
    let before = raw.split('•').next().unwrap_or(raw).trim();
    let last = before.split_whitespace().last().unwrap_or(before);
    last.chars().filter(|c| !matches!(c, '(' | ')' | '@')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_thousands_suffix() {
        assert_eq!(expand_count("12.3K Followers"), "12300");
        assert_eq!(expand_count("20K"), "20000");
        assert_eq!(expand_count("20,5K"), "20500");
    }

    #[test]
    fn comma_grouping_before_a_suffix_is_not_a_decimal() {
        assert_eq!(expand_count("1,234K"), "1234000");
        assert_eq!(expand_count("1,234M"), "1234000000");
        // A short fraction is still a decimal comma.
        assert_eq!(expand_count("1,23K"), "1230");
    }

    #[test]
    fn expands_millions_suffix() {
        assert_eq!(expand_count("1.2M"), "1200000");
        assert_eq!(expand_count("1M"), "1000000");
    }

    #[test]
    fn truncates_fraction_below_suffix_scale() {
        // 1.2345K is 1234.5; the upstream behavior drops the .5.
        assert_eq!(expand_count("1.2345K"), "1234");
    }

    #[test]
    fn strips_thousands_separators() {
        assert_eq!(expand_count("1 234 subscribers"), "1234");
        assert_eq!(expand_count("5,000"), "5000");
    }

    #[test]
    fn plain_word_m_is_not_a_suffix() {
        assert_eq!(expand_count("123 members"), "123");
    }

    #[test]
    fn empty_input_yields_zero() {
        assert_eq!(expand_count(""), "0");
        assert_eq!(expand_count("no numbers here"), "0");
    }

    #[test]
    fn labelled_count_requires_a_label() {
        assert_eq!(
            refine_followers("12 345 subscribers", FollowerRefine::LabelledCount),
            Some("12345".to_string())
        );
        assert_eq!(
            refine_followers("897 members", FollowerRefine::LabelledCount),
            Some("897".to_string())
        );
        assert_eq!(
            refine_followers("Example Channel", FollowerRefine::LabelledCount),
            None
        );
    }

    #[test]
    fn followers_label_picks_the_followers_token() {
        assert_eq!(
            refine_followers(
                "12.3K Followers, 40 Following, 112 Posts - janedoe on Instagram",
                FollowerRefine::FollowersLabel
            ),
            Some("12.3K".to_string())
        );
        assert_eq!(
            refine_followers("no counts at all", FollowerRefine::FollowersLabel),
            None
        );
    }

    #[test]
    fn cleans_instagram_title_to_handle() {
        assert_eq!(
            clean_instagram_title("Jane Doe (@janedoe) • Instagram photos"),
            "janedoe"
        );
        // A title without the decoration is kept verbatim.
        assert_eq!(clean_instagram_title("Plain Name"), "Plain Name");
    }
}
