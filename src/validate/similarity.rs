//! Character-level similarity ratio.
//!
//! `ratio = 2 * M / (len(a) + len(b))` where `M` is the total size of the
//! matching blocks: the longest common contiguous block is taken first
//! (earliest in `a`, then earliest in `b`, on ties) and the search recurses
//! into the unmatched regions on its left and right. This is the ratio
//! sequence-matching libraries report. It is 1.0 for identical strings and
//! 0.0 for strings sharing no character; two empty strings are identical.
//!
//! When `b` has 200 or more characters, characters occurring in more than
//! 1% of it (plus one) cannot start a block, though blocks may still extend
//! over them.

use std::collections::HashMap;

const POPULAR_MIN_LEN: usize = 200;

/// A run of `size` equal characters at `a[a_start..]` and `b[b_start..]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

struct BlockFinder<'s> {
    a: &'s [char],
    b: &'s [char],
    b_index: HashMap<char, Vec<usize>>,
}

impl<'s> BlockFinder<'s> {
    fn new(a: &'s [char], b: &'s [char]) -> Self {
        let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &ch) in b.iter().enumerate() {
            b_index.entry(ch).or_default().push(j);
        }

        if b.len() >= POPULAR_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b_index.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b_index }
    }

    fn longest_in(&self, a_lo: usize, a_hi: usize, b_lo: usize, b_hi: usize) -> MatchingBlock {
        let (a, b) = (self.a, self.b);
        let mut best = MatchingBlock {
            a_start: a_lo,
            b_start: b_lo,
            size: 0,
        };

        // run length of the match ending at each b position, for the previous a position
        let mut run_at: HashMap<usize, usize> = HashMap::new();
        for i in a_lo..a_hi {
            let mut next_run_at = HashMap::new();
            if let Some(positions) = self.b_index.get(&a[i]) {
                for &j in positions {
                    if j < b_lo {
                        continue;
                    }
                    if j >= b_hi {
                        break;
                    }
                    let run = j
                        .checked_sub(1)
                        .and_then(|prev| run_at.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_run_at.insert(j, run);
                    if run > best.size {
                        best = MatchingBlock {
                            a_start: i + 1 - run,
                            b_start: j + 1 - run,
                            size: run,
                        };
                    }
                }
            }
            run_at = next_run_at;
        }

        while best.a_start > a_lo
            && best.b_start > b_lo
            && a[best.a_start - 1] == b[best.b_start - 1]
        {
            best.a_start -= 1;
            best.b_start -= 1;
            best.size += 1;
        }
        while best.a_start + best.size < a_hi
            && best.b_start + best.size < b_hi
            && a[best.a_start + best.size] == b[best.b_start + best.size]
        {
            best.size += 1;
        }

        best
    }

    fn blocks(&self) -> Vec<MatchingBlock> {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
            let block = self.longest_in(a_lo, a_hi, b_lo, b_hi);
            if block.size == 0 {
                continue;
            }
            if a_lo < block.a_start && b_lo < block.b_start {
                pending.push((a_lo, block.a_start, b_lo, block.b_start));
            }
            let (a_end, b_end) = (block.a_start + block.size, block.b_start + block.size);
            if a_end < a_hi && b_end < b_hi {
                pending.push((a_end, a_hi, b_end, b_hi));
            }
            blocks.push(block);
        }

        blocks.sort_by_key(|block| (block.a_start, block.b_start));
        blocks
    }
}

/// Matching blocks of `a` against `b`, ordered by position.
pub fn matching_blocks(a: &[char], b: &[char]) -> Vec<MatchingBlock> {
    BlockFinder::new(a, b).blocks()
}

pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched: usize = matching_blocks(&a, &b).iter().map(|block| block.size).sum();
    2.0 * matched as f64 / total as f64
}

/// Round to three decimal places for reporting.
pub fn round3(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(ratio("1.1 组件类", "1.1 组件类"), 1.0);
        assert_eq!(ratio("", ""), 1.0);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert!((ratio("组件板", "组板") - 0.8).abs() < 1e-12);
    }

    #[test]
    fn known_ratio_values() {
        assert!((ratio("abcd", "bcde") - 0.75).abs() < 1e-12);
        assert_eq!(ratio("abc", "abcxyzw"), 0.6);
    }

    #[test]
    fn blocks_are_not_a_longest_common_subsequence() {
        // "ZZZ" is taken first and nothing remains on either side of it,
        // although "abcde" is a longer common subsequence.
        assert!((ratio("abcdeZZZ", "ZZZaxbxcxdxe") - 0.3).abs() < 1e-12);
        assert_eq!(
            matching_blocks(&chars("abcdeZZZ"), &chars("ZZZaxbxcxdxe")),
            vec![MatchingBlock { a_start: 5, b_start: 0, size: 3 }]
        );

        assert!((ratio("cbdcacbc", "cbcaabb") - 0.4).abs() < 1e-12);
    }

    #[test]
    fn regions_left_and_right_of_a_block_are_searched() {
        let blocks = matching_blocks(&chars("xabcyde"), &chars("abc-de"));
        assert_eq!(
            blocks,
            vec![
                MatchingBlock { a_start: 1, b_start: 0, size: 3 },
                MatchingBlock { a_start: 5, b_start: 4, size: 2 },
            ]
        );
        assert!((ratio("xabcyde", "abc-de") - 10.0 / 13.0).abs() < 1e-12);
    }

    #[test]
    fn ties_prefer_the_earliest_block_in_a() {
        let blocks = matching_blocks(&chars("abxab"), &chars("ab"));
        assert_eq!(blocks, vec![MatchingBlock { a_start: 0, b_start: 0, size: 2 }]);
    }

    #[test]
    fn popular_characters_in_long_lines_cannot_start_blocks() {
        // 'a' fills most of the long side, so it only seeds blocks when the
        // long string is `a`.
        let long = format!("b{}", "a".repeat(199));
        assert_eq!(ratio("xa", &long), 0.0);
        assert_eq!(ratio(&long, "xa"), 2.0 / 202.0);
    }

    #[test]
    fn round3_keeps_three_decimals() {
        assert_eq!(round3(0.94444), 0.944);
        assert_eq!(round3(0.6666666), 0.667);
        assert_eq!(round3(1.0), 1.0);
    }
}
