//! OTP extraction from raw message text.

use regex::Regex;

/// Ordered pattern list. The first pattern that yields a valid 4-6
/// digit capture wins, so the order is a behavioral contract: changing
/// it changes which code a multi-number message resolves to. Pass a
/// different list to [`OtpExtractor::new`] to override it.
pub const DEFAULT_OTP_PATTERNS: &[&str] = &[
    r"\b(\d{4,6})\b",
    r"code[:\s]*(\d{4,6})",
    r"verification[:\s]*(\d{4,6})",
    r"otp[:\s]*(\d{4,6})",
    r"password[:\s]*(\d{4,6})",
    r"pin[:\s]*(\d{4,6})",
    r"passcode[:\s]*(\d{4,6})",
    r"(\d{4,6})[^\d]*$",
    r"(\d{4,6})\s+is\s+your",
    r"your\s+(\d{4,6})",
];

/// A code pulled out of a message, together with where it came from.
/// Transient: lives only long enough to notify and retire.
#[derive(Debug, Clone)]
pub struct ExtractedOtp {
    pub code: String,
    pub sender: String,
    pub message: String,
}

/// Compiled, ordered OTP matcher. Pure and deterministic: the same
/// message always yields the same result.
pub struct OtpExtractor {
    patterns: Vec<Regex>,
}

impl OtpExtractor {
    /// Compile an ordered pattern list. Each pattern must have one
    /// capture group for the candidate digits.
    pub fn new(patterns: &[&str]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Extract a code from `message`, or `None` if no pattern yields a
    /// valid candidate. Matching is case-insensitive; candidates must
    /// be 4-6 characters and entirely numeric.
    pub fn extract(&self, message: &str) -> Option<String> {
        if message.is_empty() {
            return None;
        }

        let lower = message.to_lowercase();
        for pattern in &self.patterns {
            let Some(captures) = pattern.captures(&lower) else {
                continue;
            };
            let Some(candidate) = captures.get(1) else {
                continue;
            };
            let candidate = candidate.as_str();
            if (4..=6).contains(&candidate.len())
                && candidate.chars().all(|c| c.is_ascii_digit())
            {
                return Some(candidate.to_string());
            }
        }
        None
    }
}

impl Default for OtpExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_OTP_PATTERNS).expect("built-in OTP patterns must compile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_code_from_is_your_message() {
        let extractor = OtpExtractor::default();
        let otp = extractor.extract("# Snapchat 157737 is your one time passcode");
        assert_eq!(otp.as_deref(), Some("157737"));
    }

    #[test]
    fn extracts_prefixed_code() {
        let extractor = OtpExtractor::default();
        assert_eq!(extractor.extract("Your OTP: 4821").as_deref(), Some("4821"));
        assert_eq!(
            extractor.extract("verification 90210 expires soon").as_deref(),
            Some("90210")
        );
        assert_eq!(extractor.extract("pin:7788 ok").as_deref(), Some("7788"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let extractor = OtpExtractor::default();
        assert_eq!(
            extractor.extract("YOUR PASSCODE: 314159").as_deref(),
            Some("314159")
        );
    }

    #[test]
    fn seven_digit_run_yields_valid_six_digit_capture() {
        let extractor = OtpExtractor::default();

        // A bare 7-digit run never matches the word-bounded pattern,
        // but later patterns still select a valid 4-6 digit substring.
        assert_eq!(
            extractor.extract("Your code: 1234567").as_deref(),
            Some("123456")
        );
        assert_eq!(extractor.extract("9876543").as_deref(), Some("876543"));
    }

    #[test]
    fn first_pattern_wins_over_later_patterns() {
        let extractor = OtpExtractor::default();

        // "9876543" is too long for the word-bounded pattern, so that
        // pattern locks onto "1234" before the code-prefix pattern
        // would have picked six digits out of the long run.
        assert_eq!(
            extractor.extract("code: 9876543 ref 1234").as_deref(),
            Some("1234")
        );
    }

    #[test]
    fn rejects_messages_without_a_valid_code() {
        let extractor = OtpExtractor::default();
        assert_eq!(extractor.extract(""), None);
        assert_eq!(extractor.extract("hello there"), None);
        assert_eq!(extractor.extract("call me at 123"), None);
    }

    #[test]
    fn extraction_is_deterministic() {
        let extractor = OtpExtractor::default();
        let message = "Snapchat 157737 is your one time passcode";
        assert_eq!(extractor.extract(message), extractor.extract(message));
    }

    #[test]
    fn custom_pattern_order_changes_result() {
        let reordered = OtpExtractor::new(&[r"code[:\s]*(\d{4,6})", r"\b(\d{4,6})\b"]).unwrap();
        assert_eq!(
            reordered.extract("code: 9876543 ref 1234").as_deref(),
            Some("987654")
        );
    }

    #[test]
    fn invalid_pattern_is_rejected_at_construction() {
        assert!(OtpExtractor::new(&[r"("]).is_err());
    }
}
