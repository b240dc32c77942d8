//! Heuristic screening of lead-capture form submissions.
//!
//! Checks run in a fixed order and the first failure decides the verdict. Silent
//! rejections are meant to look like success to the submitter.

use crate::config::SpamConfig;
use crate::models::FormSubmission;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpamVerdict {
    Pass,
    /// Drop the submission but report success.
    Silent(SilentReason),
    /// Refuse with a message the submitter can act on.
    Reject(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilentReason {
    Honeypot,
    TooFast,
}

impl std::fmt::Display for SilentReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Honeypot => write!(f, "honeypot filled"),
            Self::TooFast => write!(f, "submitted too quickly"),
        }
    }
}

pub const INVALID_FIRST_NAME: &str = "Please enter a valid first name.";
pub const INVALID_LAST_NAME: &str = "Please enter a valid last name.";
pub const INVALID_PHONE: &str = "Please enter a valid 10-digit phone number.";
pub const INVALID_MESSAGE: &str = "Your message could not be processed. Please try rephrasing it.";

/// Screens `submission` as of `now_ms` (milliseconds since the Unix epoch).
pub fn check_submission(config: &SpamConfig, submission: &FormSubmission, now_ms: i64) -> SpamVerdict {
    if submission.honeypot().is_some() {
        return SpamVerdict::Silent(SilentReason::Honeypot);
    }
    if !is_plausible_name(config, &submission.first_name) {
        return SpamVerdict::Reject(INVALID_FIRST_NAME.to_string());
    }
    if !is_plausible_name(config, &submission.last_name) {
        return SpamVerdict::Reject(INVALID_LAST_NAME.to_string());
    }
    if let Some(phone) = submission.phone() {
        if normalize_phone(phone).is_none() {
            return SpamVerdict::Reject(INVALID_PHONE.to_string());
        }
    }
    if let Some(message) = submission.message() {
        if is_gibberish(config, message) {
            return SpamVerdict::Reject(INVALID_MESSAGE.to_string());
        }
    }
    if let Some(rendered_at) = submission.rendered_at_ms() {
        if now_ms.saturating_sub(rendered_at) < config.min_submit_ms {
            return SpamVerdict::Silent(SilentReason::TooFast);
        }
    }
    SpamVerdict::Pass
}

pub fn is_plausible_name(config: &SpamConfig, name: &str) -> bool {
    let name = name.trim();
    let len = name.chars().count();
    if len < config.name_min_len || len > config.name_max_len {
        return false;
    }
    if !name.chars().any(char::is_alphabetic) {
        return false;
    }
    !is_gibberish(config, name)
}

/// Returns the ten national digits of a North American number, or `None` if invalid.
pub fn normalize_phone(phone: &str) -> Option<String> {
    let mut digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 11 && digits.starts_with('1') {
        digits.remove(0);
    }
    if digits.len() != 10 {
        return None;
    }
    match digits.as_bytes()[0] {
        b'0' | b'1' => None,
        _ => Some(digits),
    }
}

const ACCENTED_VOWELS: &str = "àáâãäåæèéêëìíîïòóôõöøœùúûüýÿ";

fn is_vowel(c: char) -> bool {
    c.to_lowercase()
        .any(|l| matches!(l, 'a' | 'e' | 'i' | 'o' | 'u' | 'y') || ACCENTED_VOWELS.contains(l))
}

/// True when any one gibberish signal fires: too few vowels, a long consonant
/// run, or erratic casing.
pub fn is_gibberish(config: &SpamConfig, text: &str) -> bool {
    low_vowel_ratio(config, text) || has_consonant_run(config, text) || has_erratic_casing(config, text)
}

fn low_vowel_ratio(config: &SpamConfig, text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < config.vowel_ratio_min_letters {
        return false;
    }
    let vowels = letters.iter().filter(|c| is_vowel(**c)).count();
    (vowels as f64 / letters.len() as f64) < config.min_vowel_ratio
}

fn has_consonant_run(config: &SpamConfig, text: &str) -> bool {
    let mut run = 0;
    for c in text.chars() {
        if c.is_alphabetic() && !is_vowel(c) {
            run += 1;
            if run > config.max_consonant_run {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

fn has_erratic_casing(config: &SpamConfig, text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    let upper = chars.iter().filter(|c| c.is_uppercase()).count();
    let lower = chars.iter().filter(|c| c.is_lowercase()).count();
    if lower == 0 {
        return false;
    }

    // Case flips between neighbouring letters, ignoring the leading capital.
    let letters: Vec<char> = chars.iter().copied().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 2 {
        let pairs = letters.len() - 2;
        let transitions = letters[1..]
            .windows(2)
            .filter(|w| w[0].is_uppercase() != w[1].is_uppercase())
            .count();
        if transitions as f64 / pairs as f64 > config.max_case_transition_ratio {
            return true;
        }
    }

    let mut run = 0;
    for c in chars.iter().skip(1) {
        if c.is_uppercase() {
            run += 1;
            if run > config.max_upper_run {
                return true;
            }
        } else {
            run = 0;
        }
    }

    upper >= config.mixed_case_min_count
        && lower >= config.mixed_case_min_count
        && (upper as f64 / chars.len() as f64) > config.max_upper_ratio
}
