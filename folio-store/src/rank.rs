//! Fractional sort keys for ordering content pieces.
//!
//! Ranks use the LexoRank text form `"<bucket>|<integer>:<fraction>"`, where the
//! integer part is six base-36 digits and the fraction is zero or more base-36
//! digits. Two ranks in the same bucket compare like their digit strings, so a
//! new key can always be generated between two neighbours without touching them.

use crate::error::{Result, StoreError};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

const BASE: u8 = 36;
const INTEGER_WIDTH: usize = 6;
const MAX_BUCKET: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rank {
    bucket: u8,
    // Base-36 digit values. The first INTEGER_WIDTH digits are the integer part,
    // and the fraction carries no trailing zeros.
    digits: Vec<u8>,
}

impl Rank {
    /// The lowest rank in bucket 0. Sorts before every rank generated afterwards.
    pub fn min() -> Self {
        Self::from_digits(0, vec![0; INTEGER_WIDTH])
    }

    /// The highest rank in bucket 0.
    pub fn max() -> Self {
        Self::from_digits(0, vec![BASE - 1; INTEGER_WIDTH])
    }

    /// A rank halfway through bucket 0, a good first key for an empty list.
    pub fn middle() -> Self {
        let digits = midpoint(&trimmed(&Self::min().digits), Some(&trimmed(&Self::max().digits)));
        Self::from_digits(0, digits)
    }

    /// Generate a rank strictly between `prev` and `next`.
    ///
    /// A missing bound means the start or end of the bucket.
    pub fn between(prev: Option<&Rank>, next: Option<&Rank>) -> Result<Self> {
        let bucket = match (prev, next) {
            (Some(p), Some(n)) if p.bucket != n.bucket => {
                return Err(StoreError::InvalidRank(format!(
                    "cannot rank between buckets {} and {}",
                    p.bucket, n.bucket
                )));
            }
            (Some(p), _) => p.bucket,
            (None, Some(n)) => n.bucket,
            (None, None) => 0,
        };

        let lower = prev.cloned().unwrap_or_else(|| Self::min().in_bucket(bucket));
        let upper = next.cloned().unwrap_or_else(|| Self::max().in_bucket(bucket));

        if lower >= upper {
            return Err(StoreError::InvalidRank(format!(
                "no rank between {} and {}",
                lower, upper
            )));
        }

        let digits = midpoint(&trimmed(&lower.digits), Some(&trimmed(&upper.digits)));
        Ok(Self::from_digits(bucket, digits))
    }

    /// A rank that sorts directly after this one.
    pub fn after(&self) -> Result<Self> {
        Self::between(Some(self), None)
    }

    /// A rank that sorts directly before this one.
    pub fn before(&self) -> Result<Self> {
        Self::between(None, Some(self))
    }

    pub fn bucket(&self) -> u8 {
        self.bucket
    }

    fn in_bucket(mut self, bucket: u8) -> Self {
        self.bucket = bucket;
        self
    }

    fn from_digits(bucket: u8, digits: Vec<u8>) -> Self {
        let mut digits = trimmed(&digits);
        if digits.len() < INTEGER_WIDTH {
            digits.resize(INTEGER_WIDTH, 0);
        }
        Self { bucket, digits }
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bucket
            .cmp(&other.bucket)
            .then_with(|| self.digits.cmp(&other.digits))
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (integer, fraction) = self.digits.split_at(INTEGER_WIDTH);
        write!(f, "{}|", self.bucket)?;
        for d in integer {
            write!(f, "{}", to_char(*d))?;
        }
        f.write_str(":")?;
        for d in fraction {
            write!(f, "{}", to_char(*d))?;
        }
        Ok(())
    }
}

impl FromStr for Rank {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || StoreError::InvalidRank(s.to_string());

        let (bucket, value) = s.split_once('|').ok_or_else(invalid)?;
        let bucket: u8 = bucket.parse().map_err(|_| invalid())?;
        if bucket > MAX_BUCKET {
            return Err(invalid());
        }

        let (integer, fraction) = value.split_once(':').ok_or_else(invalid)?;
        if integer.len() != INTEGER_WIDTH {
            return Err(invalid());
        }

        let digits = integer
            .chars()
            .chain(fraction.chars())
            .map(|c| from_char(c).ok_or_else(invalid))
            .collect::<Result<Vec<u8>>>()?;

        Ok(Self::from_digits(bucket, digits))
    }
}

fn to_char(digit: u8) -> char {
    // Digits are always below BASE.
    char::from_digit(u32::from(digit), u32::from(BASE)).unwrap_or('0')
}

fn from_char(c: char) -> Option<u8> {
    c.to_digit(u32::from(BASE)).and_then(|d| u8::try_from(d).ok())
}

fn trimmed(digits: &[u8]) -> Vec<u8> {
    let end = digits.iter().rposition(|d| *d != 0).map_or(0, |i| i + 1);
    digits[..end].to_vec()
}

/// Digits of a fraction strictly between `a` and `b` (or 1 when `b` is absent).
///
/// Both inputs are base-36 fractions without trailing zeros and `a < b`.
fn midpoint(a: &[u8], b: Option<&[u8]>) -> Vec<u8> {
    if let Some(b) = b {
        let shared = b
            .iter()
            .enumerate()
            .take_while(|(i, d)| a.get(*i).copied().unwrap_or(0) == **d)
            .count();
        if shared > 0 {
            let mut out = b[..shared].to_vec();
            out.extend(midpoint(a.get(shared..).unwrap_or(&[]), Some(&b[shared..])));
            return out;
        }
    }

    let digit_a = a.first().copied().unwrap_or(0);
    let digit_b = b.and_then(|b| b.first().copied()).unwrap_or(BASE);

    if digit_b - digit_a > 1 {
        return vec![(digit_a + digit_b) / 2];
    }

    match b {
        Some(b) if b.len() > 1 => vec![b[0]],
        _ => {
            let mut out = vec![digit_a];
            out.extend(midpoint(a.get(1..).unwrap_or(&[]), None));
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank(s: &str) -> Rank {
        s.parse().expect("valid rank")
    }

    #[test]
    fn test_min_and_max_text_form() {
        assert_eq!(Rank::min().to_string(), "0|000000:");
        assert_eq!(Rank::max().to_string(), "0|zzzzzz:");
    }

    #[test]
    fn test_parse_round_trips_text() {
        for text in ["0|000000:", "0|hzzzzz:", "1|0i0000:i", "0|zzzzzz:"] {
            assert_eq!(rank(text).to_string(), text);
        }
    }

    #[test]
    fn test_parse_rejects_malformed_ranks() {
        for text in ["", "0000000", "0|00000:", "3|000000:", "0|00000!:", "x|000000:"] {
            assert!(text.parse::<Rank>().is_err(), "{} should be rejected", text);
        }
    }

    #[test]
    fn test_min_sorts_first() {
        let min = Rank::min();
        assert!(min < Rank::middle());
        assert!(min < min.after().unwrap());
        assert!(Rank::middle() < Rank::max());
    }

    #[test]
    fn test_between_is_strictly_inside() {
        let cases = [
            ("0|000000:", "0|000001:"),
            ("0|000000:", "0|100000:"),
            ("0|hzzzzz:", "0|i00000:"),
            ("0|0i0000:", "0|0i0000:1"),
            ("0|azzzzz:zz", "0|b00000:"),
        ];

        for (low, high) in cases {
            let (low, high) = (rank(low), rank(high));
            let mid = Rank::between(Some(&low), Some(&high)).unwrap();
            assert!(low < mid, "{} < {}", low, mid);
            assert!(mid < high, "{} < {}", mid, high);
            assert_eq!(mid.to_string().parse::<Rank>().unwrap(), mid);
        }
    }

    #[test]
    fn test_repeated_insertion_before_neighbour() {
        let high = Rank::middle();
        let mut low = Rank::min();
        for _ in 0..50 {
            let next = Rank::between(Some(&low), Some(&high)).unwrap();
            assert!(low < next && next < high);
            low = next;
        }
    }

    #[test]
    fn test_between_rejects_empty_interval() {
        let min = Rank::min();
        assert!(min.before().is_err());
        assert!(Rank::max().after().is_err());
        assert!(Rank::between(Some(&min), Some(&min)).is_err());
        assert!(Rank::between(Some(&rank("0|000000:")), Some(&rank("1|000001:"))).is_err());
    }
}
