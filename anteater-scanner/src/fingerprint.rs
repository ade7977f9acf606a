// Locality-sensitive content fingerprints.
//
// Text is folded to lowercase word characters and cut into overlapping
// character shingles. Every shingle hash votes on each of the 64 output
// bits, so texts sharing most of their shingles end up a small Hamming
// distance apart.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use xxhash_rust::xxh3::xxh3_64;

/// Width of a character shingle.
pub const SHINGLE_WIDTH: usize = 3;

/// Number of bits in a fingerprint.
pub const FINGERPRINT_BITS: u32 = u64::BITS;

/// SimHash of a page's visible text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Fingerprint page text.
    pub fn compute(text: &str) -> Self {
        let cleaned = clean_text(text);
        let mut weights: HashMap<String, i64> = HashMap::new();
        for shingle in shingles(&cleaned, SHINGLE_WIDTH) {
            *weights.entry(shingle).or_insert(0) += 1;
        }
        Self::from_weighted(weights.iter().map(|(s, w)| (xxh3_64(s.as_bytes()), *w)))
    }

    /// Combine weighted feature hashes into a fingerprint.
    ///
    /// For each bit position the weight is added when the feature hash has
    /// the bit set and subtracted otherwise; output bits are set where the
    /// accumulated vote is positive.
    pub fn from_weighted<I>(features: I) -> Self
    where
        I: IntoIterator<Item = (u64, i64)>,
    {
        let mut votes = [0i64; FINGERPRINT_BITS as usize];
        for (hash, weight) in features {
            for (bit, vote) in votes.iter_mut().enumerate() {
                if hash & (1u64 << bit) != 0 {
                    *vote += weight;
                } else {
                    *vote -= weight;
                }
            }
        }

        let value = votes
            .iter()
            .enumerate()
            .filter(|(_, vote)| **vote > 0)
            .fold(0u64, |acc, (bit, _)| acc | (1u64 << bit));
        Fingerprint(value)
    }

    pub fn hamming_distance(&self, other: &Fingerprint) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    pub fn is_similar(&self, other: &Fingerprint, max_distance: u32) -> bool {
        self.hamming_distance(other) <= max_distance
    }
}

/// Lowercase and drop everything that is not a word character.
fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Overlapping character windows of `width`; a string shorter than the
/// width is a single shingle.
fn shingles(cleaned: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = cleaned.chars().collect();
    if chars.len() <= width {
        return vec![cleaned.to_string()];
    }
    chars.windows(width).map(|w| w.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("Hello, World! It's 2024_ok"), "helloworldits2024_ok");
    }

    #[test]
    fn test_shingles() {
        let s = shingles("abcde", 3);
        assert_eq!(s, vec!["abc", "bcd", "cde"]);
    }

    #[test]
    fn test_short_text_is_one_shingle() {
        assert_eq!(shingles("ab", 3), vec!["ab"]);
        assert_eq!(shingles("abc", 3), vec!["abc"]);
        assert_eq!(shingles("", 3), vec![""]);
    }

    #[test]
    fn test_identical_text_identical_fingerprint() {
        let text = "The quick brown fox jumps over the lazy dog";
        assert_eq!(Fingerprint::compute(text), Fingerprint::compute(text));
    }

    #[test]
    fn test_case_and_punctuation_ignored() {
        let a = Fingerprint::compute("The Quick, Brown Fox!");
        let b = Fingerprint::compute("the quick brown fox");
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_weighted_votes() {
        // Two votes for bit 0, one against.
        let fp = Fingerprint::from_weighted(vec![(0b01, 2), (0b10, 1)]);
        assert_eq!(fp.0 & 0b01, 0b01);
        assert_eq!(fp.0 & 0b10, 0);
    }

    #[test]
    fn test_from_weighted_tie_is_zero() {
        let fp = Fingerprint::from_weighted(vec![(u64::MAX, 1), (0, 1)]);
        assert_eq!(fp, Fingerprint(0));
    }

    #[test]
    fn test_hamming_distance() {
        let a = Fingerprint(0b1011);
        let b = Fingerprint(0b0010);
        assert_eq!(a.hamming_distance(&b), 2);
        assert!(a.is_similar(&b, 2));
        assert!(!a.is_similar(&b, 1));
    }
}
