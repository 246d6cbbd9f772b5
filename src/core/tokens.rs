//! Token estimation for LLM context budgeting
//!
//! Uses a fixed characters-per-token ratio with a safety margin rather than a
//! real tokenizer. The estimate is deliberately biased high: splitting a
//! content export one entry too early is recoverable, overflowing a model's
//! real context window is not.

/// Approximate characters per token for code and prose
pub const CHARS_PER_TOKEN: usize = 4;

/// Safety margin applied on top of the raw ratio (10%)
pub const SAFETY_MARGIN_PERCENT: usize = 10;

/// Estimate the token count of a text blob.
///
/// `estimate("")` is 0; otherwise `ceil(len / 4 * 1.1)`, computed in exact
/// integer arithmetic as `ceil(len * 110 / 400)`.
pub fn estimate(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    (text.len() * (100 + SAFETY_MARGIN_PERCENT)).div_ceil(CHARS_PER_TOKEN * 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_empty() {
        assert_eq!(estimate(""), 0);
    }

    #[test]
    fn test_estimate_matches_formula() {
        // Spot checks of ceil(len * 11 / 40) at and around the boundaries.
        for (len, expected) in [
            (1, 1),
            (3, 1),
            (4, 2),   // ceil(1.1)
            (36, 10), // ceil(9.9)
            (39, 11), // ceil(10.725)
            (40, 11), // exactly 11
            (41, 12), // ceil(11.275)
            (100, 28),
            (400, 110),
        ] {
            assert_eq!(estimate(&"x".repeat(len)), expected, "len={}", len);
        }
    }

    #[test]
    fn test_estimate_small() {
        // 5 chars -> ceil(1.375) = 2
        assert_eq!(estimate("hello"), 2);
        // 4 chars -> ceil(1.1) = 2
        assert_eq!(estimate("abcd"), 2);
        // 40 chars -> exactly 11
        assert_eq!(estimate(&"y".repeat(40)), 11);
    }

    #[test]
    fn test_estimate_large() {
        // 1,000,000 chars -> 275,000 tokens
        assert_eq!(estimate(&"z".repeat(1_000_000)), 275_000);
    }

    #[test]
    fn test_estimate_counts_bytes_not_chars() {
        // The ratio is applied to the serialized length, which for multi-byte
        // UTF-8 overestimates further in the safe direction.
        let ascii = "aaaa";
        let cjk = "\u{4f60}\u{597d}"; // 6 bytes
        assert!(estimate(cjk) >= estimate(ascii));
    }
}
