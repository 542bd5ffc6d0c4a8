//! Candidate label enumeration.
//!
//! Produces every string of a fixed length over an alphabet, in the
//! lexicographic order induced by the alphabet's own ordering. For the default
//! alphanumeric alphabet that means digits sort before letters:
//! `"00"`, `"01"`, ..., `"09"`, `"0a"`, ..., `"zz"`.
//!
//! # Examples
//!
//! ```
//! use domain_sweep_lib::generate::{enumerate, Alphabet};
//!
//! let alphabet = Alphabet::alphanumeric();
//! let names: Vec<String> = enumerate(&alphabet, 2).unwrap().collect();
//! assert_eq!(names.len(), 36 * 36);
//! assert_eq!(names[0], "00");
//! assert_eq!(names[10], "0a");
//! assert_eq!(names.last().unwrap(), "zz");
//! ```

use crate::error::DomainSweepError;
use std::ops::RangeInclusive;

/// Shortest label the enumerator produces.
pub const MIN_LENGTH: usize = 1;

/// Longest label the enumerator produces (36^5 is roughly 60M candidates).
pub const MAX_LENGTH: usize = 5;

/// Ordered set of characters labels are built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    chars: Vec<char>,
}

impl Alphabet {
    /// Digits `0`-`9` followed by lowercase letters `a`-`z`.
    pub fn alphanumeric() -> Self {
        Self {
            chars: ('0'..='9').chain('a'..='z').collect(),
        }
    }

    /// Build an alphabet from an explicit character order.
    pub fn new(chars: Vec<char>) -> Result<Self, DomainSweepError> {
        if chars.is_empty() {
            return Err(DomainSweepError::invalid_alphabet("alphabet cannot be empty"));
        }
        for (i, c) in chars.iter().enumerate() {
            if chars[..i].contains(c) {
                return Err(DomainSweepError::invalid_alphabet(format!(
                    "character '{}' appears more than once",
                    c
                )));
            }
        }
        Ok(Self { chars })
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::alphanumeric()
    }
}

/// Lazy iterator over all labels of one length.
///
/// Works like an odometer: each position is a digit in base `alphabet.len()`
/// and the rightmost position advances first.
#[derive(Debug, Clone)]
pub struct Enumeration<'a> {
    alphabet: &'a Alphabet,
    counters: Vec<usize>,
    remaining: usize,
}

impl<'a> Iterator for Enumeration<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.remaining == 0 {
            return None;
        }

        let name: String = self
            .counters
            .iter()
            .map(|&c| self.alphabet.chars[c])
            .collect();

        self.remaining -= 1;

        // Increment odometer (rightmost first)
        let base = self.alphabet.len();
        for counter in self.counters.iter_mut().rev() {
            *counter += 1;
            if *counter < base {
                break;
            }
            *counter = 0;
        }

        Some(name)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Enumeration<'_> {}

fn check_length(length: usize) -> Result<(), DomainSweepError> {
    if (MIN_LENGTH..=MAX_LENGTH).contains(&length) {
        Ok(())
    } else {
        Err(DomainSweepError::invalid_length(length, MIN_LENGTH, MAX_LENGTH))
    }
}

/// Number of labels of `length` over `alphabet`: `alphabet.len() ^ length`.
pub fn estimate_count(alphabet: &Alphabet, length: usize) -> usize {
    (0..length).fold(1usize, |acc, _| acc.saturating_mul(alphabet.len()))
}

/// Enumerate every label of exactly `length` characters.
///
/// # Errors
///
/// Returns `InvalidLength` unless `1 <= length <= 5`.
pub fn enumerate(alphabet: &Alphabet, length: usize) -> Result<Enumeration<'_>, DomainSweepError> {
    check_length(length)?;
    Ok(Enumeration {
        alphabet,
        counters: vec![0; length],
        remaining: estimate_count(alphabet, length),
    })
}

/// Enumerate every length in `lengths`, shortest first.
pub fn enumerate_range(
    alphabet: &Alphabet,
    lengths: RangeInclusive<usize>,
) -> Result<impl Iterator<Item = String> + '_, DomainSweepError> {
    let per_length = lengths
        .map(|len| enumerate(alphabet, len))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(per_length.into_iter().flatten())
}

/// Total number of labels across a length range.
pub fn estimate_range_count(alphabet: &Alphabet, lengths: RangeInclusive<usize>) -> usize {
    lengths
        .map(|len| estimate_count(alphabet, len))
        .fold(0usize, usize::saturating_add)
}
