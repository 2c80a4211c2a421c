//! Line-by-line validation of extracted outlines.
//!
//! Every title of the outline is compared against every document line and
//! paired with its best match. A match is confident when its score is
//! strictly above the threshold.

use serde::{Deserialize, Serialize};

use super::similarity::{ratio, round3};
use crate::chunking::document::non_empty_lines;
use crate::core::config::settings::DEFAULT_MATCH_THRESHOLD;
use crate::outline::types::{flatten_titles, Outline};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub title: String,
    pub found: bool,
    /// Similarity rounded to three decimals
    pub match_score: f64,
    /// 1-based line number, `None` when no line scored above zero
    pub line_number: Option<usize>,
    pub matched_line: String,
}

/// Best line for one title. `index` is 0-based.
#[derive(Debug, Clone, PartialEq)]
pub struct BestLine<'a> {
    pub index: Option<usize>,
    pub score: f64,
    pub text: &'a str,
}

/// Scan left to right keeping the strictly highest score, so ties resolve to
/// the earliest line.
pub fn find_best_line<'a, S: AsRef<str>>(title: &str, lines: &'a [S]) -> BestLine<'a> {
    let needle = title.trim();
    let mut best = BestLine {
        index: None,
        score: 0.0,
        text: "",
    };

    for (index, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        let score = ratio(needle, line.trim());
        if score > best.score {
            best = BestLine {
                index: Some(index),
                score,
                text: line,
            };
        }
    }

    best
}

pub fn is_confident(score: f64, threshold: f64) -> bool {
    score > threshold
}

#[derive(Debug, Clone, Copy)]
pub struct LineMatcher {
    threshold: f64,
}

impl Default for LineMatcher {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl LineMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn match_title<S: AsRef<str>>(&self, title: &str, lines: &[S]) -> MatchResult {
        let best = find_best_line(title, lines);
        MatchResult {
            title: title.to_string(),
            found: is_confident(best.score, self.threshold),
            match_score: round3(best.score),
            line_number: best.index.map(|i| i + 1),
            matched_line: best.text.to_string(),
        }
    }

    pub fn validate_titles<T, S>(&self, titles: &[T], lines: &[S]) -> ValidationReport
    where
        T: AsRef<str>,
        S: AsRef<str>,
    {
        let results = titles
            .iter()
            .map(|title| self.match_title(title.as_ref(), lines))
            .collect();
        ValidationReport {
            threshold: self.threshold,
            results,
        }
    }

    /// Validate every title of `outline`, in pre-order, against `lines`.
    pub fn validate_outline<S: AsRef<str>>(
        &self,
        outline: &Outline,
        lines: &[S],
    ) -> ValidationReport {
        self.validate_titles(&flatten_titles(outline), lines)
    }

    /// Split raw markdown into trimmed non-empty lines, then validate.
    pub fn validate_markdown(&self, md_text: &str, outline: &Outline) -> ValidationReport {
        let lines: Vec<String> = non_empty_lines(md_text)
            .into_iter()
            .map(|line| line.trim().to_string())
            .collect();
        self.validate_outline(outline, &lines)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub threshold: f64,
    pub results: Vec<MatchResult>,
}

impl ValidationReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn found_count(&self) -> usize {
        self.results.iter().filter(|r| r.found).count()
    }

    pub fn unmatched(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| !r.found)
            .map(|r| r.title.as_str())
            .collect()
    }

    /// Fraction of titles found; 1.0 for an empty outline.
    pub fn coverage(&self) -> f64 {
        if self.results.is_empty() {
            return 1.0;
        }
        self.found_count() as f64 / self.results.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::types::parse_outline;
    use serde_json::json;

    const SAMPLE_MD: &str = "# 目录
# 一、 产品类 .... 3
# 二、 业务模式和合作类型. 6
# 联络中心办事指南及常见问题百问百答0
# 一、 产品类
# 1.1 组件类
# 1.1.1 组件板上为什么有色差？
答：您好，组件在生成过程中的生产工艺上会衍生出许多色系的电池片，属于行业内正常现象。
# 1.1.2 组件板上有白色的斑点是什么情况？
答:您好，组件板上的白点是组件生产过程中印刷网版上自带的激光定位点。

# 1.2 逆变器类
";

    #[test]
    fn exact_line_scores_one() {
        let lines = ["intro", "  1.2 逆变器类  ", "outro"];
        let result = LineMatcher::default().match_title("1.2 逆变器类", &lines);

        assert!(result.found);
        assert_eq!(result.match_score, 1.0);
        assert_eq!(result.line_number, Some(2));
        assert_eq!(result.matched_line, "  1.2 逆变器类  ");
    }

    #[test]
    fn markdown_prefix_still_matches_confidently() {
        let lines = [
            "# 一、 产品类",
            "# 1.1 组件类",
            "# 1.1.1 组件板上为什么有色差？",
            "答：...",
        ];
        let result = LineMatcher::default().match_title("1.1.1 组件板上为什么有色差？", &lines);

        assert!(result.found);
        assert!(result.match_score > 0.6 && result.match_score < 1.0);
        assert_eq!(result.line_number, Some(3));
        assert_eq!(result.matched_line, "# 1.1.1 组件板上为什么有色差？");
    }

    #[test]
    fn ties_keep_the_earliest_line() {
        let lines = ["1.1 组件类", "other", "1.1 组件类"];
        let best = find_best_line("1.1 组件类", &lines);
        assert_eq!(best.index, Some(0));
    }

    #[test]
    fn empty_document_reports_nothing_found() {
        let lines: [&str; 0] = [];
        let report = LineMatcher::default().validate_titles(&["1. 概述", "2. 使用说明"], &lines);

        assert_eq!(report.total(), 2);
        for result in &report.results {
            assert!(!result.found);
            assert_eq!(result.match_score, 0.0);
            assert_eq!(result.line_number, None);
            assert_eq!(result.matched_line, "");
        }
        assert_eq!(report.coverage(), 0.0);
    }

    #[test]
    fn empty_title_list_is_valid() {
        let report = LineMatcher::default().validate_titles::<&str, &str>(&[], &["line"]);
        assert_eq!(report.total(), 0);
        assert_eq!(report.coverage(), 1.0);
    }

    #[test]
    fn threshold_is_exclusive() {
        assert!(!is_confident(0.6, 0.6));
        assert!(is_confident(0.6000001, 0.6));

        // ratio("abc", "abcxyzw") is exactly 0.6
        let result = LineMatcher::default().match_title("abc", &["abcxyzw"]);
        assert_eq!(result.match_score, 0.6);
        assert!(!result.found);
    }

    #[test]
    fn scattered_shared_characters_are_not_a_confident_match() {
        // Only the block "cbc" lines up; the other shared characters are out of order.
        let result = LineMatcher::default().match_title("cbdcacbc", &["cbcaabb"]);

        assert_eq!(result.match_score, 0.4);
        assert!(!result.found);
        assert_eq!(result.line_number, Some(1));
    }

    #[test]
    fn custom_threshold_is_respected() {
        let result = LineMatcher::new(0.5).match_title("abc", &["abcxyzw"]);
        assert!(result.found);
    }

    #[test]
    fn outline_titles_are_reported_in_pre_order() {
        let outline = parse_outline(
            &json!({
                "一、 产品类": { "children": {
                    "1.1 组件类": { "children": {
                        "1.1.1 组件板上为什么有色差？": { "children": {} },
                        "1.1.2 组件板上有白色的斑点是什么情况？": { "children": {} }
                    } },
                    "1.2 逆变器类": { "children": {} }
                } },
                "9.9 不存在的章节标题": { "children": {} }
            }),
            "$",
        )
        .unwrap();

        let report = LineMatcher::default().validate_markdown(SAMPLE_MD, &outline);

        let titles: Vec<&str> = report.results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "一、 产品类",
                "1.1 组件类",
                "1.1.1 组件板上为什么有色差？",
                "1.1.2 组件板上有白色的斑点是什么情况？",
                "1.2 逆变器类",
                "9.9 不存在的章节标题",
            ]
        );
        // "# 一、 产品类 .... 3" (line 2) scores below the exact heading on line 5.
        assert_eq!(report.results[0].line_number, Some(5));
        assert_eq!(report.results[2].line_number, Some(7));
        assert_eq!(report.results[4].line_number, Some(11));
        assert_eq!(report.unmatched(), vec!["9.9 不存在的章节标题"]);
        assert_eq!(report.found_count(), 5);
    }
}
