//! Ratcliff/Obershelp matching-blocks ratio.
//!
//! Repeatedly finds the longest common run of characters, then recurses on
//! the unmatched pieces to its left and right. When the second string has
//! 200 or more characters, characters making up more than 1% of it are
//! "popular" and cannot seed a match, though matches may still extend
//! across them.

use std::collections::HashMap;

/// Length from which popular characters are excluded from match seeds.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Similarity of `a` and `b` in `0.0..=1.0`: `2 * matched / (len(a) + len(b))`.
///
/// Two empty strings are identical (1.0). Case-sensitive.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = Matcher::new(&a, &b).matched_chars();
    2.0 * matched as f64 / total as f64
}

struct Matcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of each non-popular character in `b`, ascending.
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> Matcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &ch) in b.iter().enumerate() {
            b2j.entry(ch).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Total size of all matching blocks.
    fn matched_chars(&self) -> usize {
        let mut total = 0;
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, size) = self.longest_match(alo, ahi, blo, bhi);
            if size == 0 {
                continue;
            }
            total += size;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + size < ahi && j + size < bhi {
                pending.push((i + size, ahi, j + size, bhi));
            }
        }

        total
    }

    /// Longest run `a[i..i+size] == b[j..j+size]` inside the given windows.
    /// Ties go to the earliest `i`, then the earliest `j`.
    fn longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (a, b) = (self.a, self.b);
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

        // run length of the match ending at (i - 1, j), keyed by j
        let mut run_at: HashMap<usize, usize> = HashMap::new();
        for (i, ch) in a.iter().enumerate().take(ahi).skip(alo) {
            let mut next_run_at = HashMap::new();
            if let Some(positions) = self.b2j.get(ch) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let prev = if j > 0 { run_at.get(&(j - 1)).copied().unwrap_or(0) } else { 0 };
                    let size = prev + 1;
                    next_run_at.insert(j, size);
                    if size > best_size {
                        best_i = i + 1 - size;
                        best_j = j + 1 - size;
                        best_size = size;
                    }
                }
            }
            run_at = next_run_at;
        }

        // popular characters never seed a match, but a match may grow over them
        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-9
    }

    #[test]
    fn known_ratios() {
        assert!(close(similarity_ratio("abcd", "bcde"), 0.75));
        assert!(close(similarity_ratio("abxcd", "abcd"), 8.0 / 9.0));
        assert!(close(similarity_ratio("x^2 + c", "x^3 + c"), 6.0 / 7.0));
        assert!(close(
            similarity_ratio(
                "1/2*tan(ln(x))^2 + c",
                "1/2*tan(ln(x))^2 + ln(cos(ln(x))) + c"
            ),
            40.0 / 57.0
        ));
    }

    #[test]
    fn empty_strings() {
        assert_eq!(similarity_ratio("", ""), 1.0);
        assert_eq!(similarity_ratio("abc", ""), 0.0);
        assert_eq!(similarity_ratio("", "abc"), 0.0);
    }

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(similarity_ratio("tan(x) + C", "tan(x) + C"), 1.0);
        let long = "x".repeat(300);
        assert_eq!(similarity_ratio(&long, &long), 1.0);
    }

    #[test]
    fn popular_characters_cannot_seed_matches() {
        let a = "ab".repeat(150);
        let b = "ba".repeat(150);
        assert_eq!(similarity_ratio(&a, &b), 0.0);
        // below the threshold the same shapes match almost entirely
        assert!(similarity_ratio(&"ab".repeat(10), &"ba".repeat(10)) > 0.9);
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(similarity_ratio("∫x dx", "∫x dx"), 1.0);
        assert!(close(similarity_ratio("∫", "x"), 0.0));
    }
}
