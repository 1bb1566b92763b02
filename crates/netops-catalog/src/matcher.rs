//! Sequence-matching similarity
//!
//! Ratcliff/Obershelp "gestalt" matching: find the longest common
//! substring, recurse on the pieces to its left and right, and score
//! `2 * matched / (len(a) + len(b))`. Longest-match ties go to the block
//! that ends earliest in `a`, then earliest in `b`, so scores are stable
//! for a given argument order.

/// Similarity of `a` and `b` in `0.0..=1.0`.
///
/// `a` is the catalog candidate and `b` the query; the ratio is not
/// strictly symmetric, so callers keep that order.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matched_chars(&a, &b) as f64 / total as f64
}

/// Total size of all matching blocks between `a` and `b`
fn matched_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }

    matched
}

/// Longest common block in `a[alo..ahi]` / `b[blo..bhi]` as `(i, j, len)`
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);
    let width = bhi - blo;
    // run[j - blo + 1] = length of the match ending at (i - 1, j)
    let mut prev = vec![0usize; width + 1];
    let mut cur = vec![0usize; width + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            let slot = j - blo + 1;
            if a[i] == b[j] {
                let k = prev[slot - 1] + 1;
                cur[slot] = k;
                if k > best_len {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_len = k;
                }
            } else {
                cur[slot] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    (best_i, best_j, best_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identical_strings_score_one() {
        assert!(approx(similarity("show ip route", "show ip route"), 1.0));
        assert!(approx(similarity("", ""), 1.0));
    }

    #[test]
    fn test_disjoint_strings_score_zero() {
        assert!(approx(similarity("abc", "xyz"), 0.0));
        assert!(approx(similarity("abc", ""), 0.0));
    }

    #[test]
    fn test_known_ratios() {
        // "Leaf Node" is a 9-char prefix of "Leaf Nodes": 2*9/19
        assert!(approx(similarity("Leaf Nodes", "Leaf Node"), 18.0 / 19.0));
        // blocks "ab" then "cd" out of 9 chars
        assert!(approx(similarity("abxcd", "abcd"), 8.0 / 9.0));
    }

    #[test]
    fn test_recurses_both_sides_of_longest_block() {
        // "show ip int" first, then " brief" from the right-hand remainder
        let score = similarity("show ip interface brief", "show ip int brief");
        assert!(approx(score, 2.0 * 17.0 / 40.0));
    }
}
