//! Issue normalization and deduplication.
//!
//! Canonicalizes findings from both analyzer stages into merged issues:
//! findings in the same file and category whose line ranges overlap collapse
//! into one entry with the maximum severity and the union of their spans.
//! Distinct categories never merge, even on identical lines. The whole pass
//! is a pure, total function over its input, so report content cannot depend
//! on worker scheduling order.

use crate::core::{AnalyzerOrigin, Category, Finding, MergedIssue};
use std::collections::BTreeMap;

/// Merge and rank the combined finding set. Output ordering: severity
/// descending, then file path ascending, then line start ascending.
pub fn merge_findings(findings: Vec<Finding>) -> Vec<MergedIssue> {
    let mut groups: BTreeMap<(String, Category), Vec<Finding>> = BTreeMap::new();
    for finding in findings {
        groups
            .entry((finding.file.clone(), finding.category))
            .or_default()
            .push(finding);
    }

    let mut issues = Vec::new();
    for ((_, _), mut group) in groups {
        group.sort_by(|a, b| {
            (a.range.start, a.range.end, &a.rule_id).cmp(&(b.range.start, b.range.end, &b.rule_id))
        });

        let mut iter = group.into_iter();
        let mut current: Vec<Finding> = vec![iter.next().expect("group is nonempty")];

        for finding in iter {
            let current_hull = current
                .iter()
                .skip(1)
                .fold(current[0].range, |hull, f| hull.hull(&f.range));
            if finding.range.overlaps(&current_hull) {
                current.push(finding);
            } else {
                issues.push(collapse(current));
                current = vec![finding];
            }
        }
        issues.push(collapse(current));
    }

    issues.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| a.range.start.cmp(&b.range.start))
    });

    issues
}

/// Collapse one overlap cluster into a single issue.
fn collapse(constituents: Vec<Finding>) -> MergedIssue {
    debug_assert!(!constituents.is_empty());

    let range = constituents
        .iter()
        .skip(1)
        .fold(constituents[0].range, |hull, f| hull.hull(&f.range));

    let severity = constituents
        .iter()
        .map(|f| f.severity)
        .max()
        .expect("nonempty cluster");

    let static_origin = constituents
        .iter()
        .any(|f| f.origin == AnalyzerOrigin::Static);
    let ai_origin = constituents.iter().any(|f| f.origin == AnalyzerOrigin::Ai);

    // Confidence is metadata, not a severity weight: report the strongest
    // contributor and leave ranking to severity alone.
    let confidence = constituents
        .iter()
        .filter_map(|f| f.confidence)
        .fold(None, |max: Option<f64>, c| {
            Some(max.map_or(c, |m| m.max(c)))
        });

    // The static message leads when both stages contributed; the AI side's
    // remediation is appended rather than replacing it.
    let primary = constituents
        .iter()
        .find(|f| f.origin == AnalyzerOrigin::Static)
        .unwrap_or(&constituents[0]);

    let mut message = primary.message.clone();
    let title = primary.title.clone();

    let ai_suggestion = constituents
        .iter()
        .filter(|f| f.origin == AnalyzerOrigin::Ai)
        .find_map(|f| f.suggestion.clone());

    if static_origin && ai_origin {
        if let Some(ref suggestion) = ai_suggestion {
            message.push_str("\nSuggested remediation: ");
            message.push_str(suggestion);
        }
    }

    let suggestion = primary.suggestion.clone().or(ai_suggestion);

    let mut sources: Vec<String> = constituents.iter().map(|f| f.rule_id.clone()).collect();
    sources.sort();
    sources.dedup();

    MergedIssue {
        file: primary.file.clone(),
        range,
        category: primary.category,
        severity,
        title,
        message,
        suggestion,
        confidence,
        static_origin,
        ai_origin,
        merged_count: constituents.len(),
        sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LineRange, Severity};

    fn finding(
        file: &str,
        start: usize,
        end: usize,
        category: Category,
        severity: Severity,
        origin: AnalyzerOrigin,
    ) -> Finding {
        Finding::new(
            match origin {
                AnalyzerOrigin::Static => "static-rule",
                AnalyzerOrigin::Ai => "ai-review",
            },
            file,
            LineRange::new(start, end),
            category,
            severity,
            "title",
            format!("{} issue at {}-{}", category, start, end),
        )
        .with_origin(origin)
    }

    #[test]
    fn test_overlapping_ranges_merge_to_hull_and_max_severity() {
        let findings = vec![
            finding(
                "wallet.py",
                10,
                15,
                Category::Security,
                Severity::Medium,
                AnalyzerOrigin::Static,
            ),
            finding(
                "wallet.py",
                12,
                20,
                Category::Security,
                Severity::Critical,
                AnalyzerOrigin::Ai,
            ),
        ];

        let issues = merge_findings(findings);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].range, LineRange::new(10, 20));
        assert_eq!(issues[0].severity, Severity::Critical);
        assert!(issues[0].static_origin);
        assert!(issues[0].ai_origin);
        assert_eq!(issues[0].merged_count, 2);
    }

    #[test]
    fn test_different_categories_stay_distinct() {
        let findings = vec![
            finding(
                "app.py",
                5,
                5,
                Category::Security,
                Severity::High,
                AnalyzerOrigin::Static,
            ),
            finding(
                "app.py",
                5,
                5,
                Category::Style,
                Severity::Low,
                AnalyzerOrigin::Static,
            ),
        ];

        let issues = merge_findings(findings);
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_report_ordering() {
        let findings = vec![
            finding(
                "a.py",
                50,
                50,
                Category::Logic,
                Severity::High,
                AnalyzerOrigin::Static,
            ),
            finding(
                "b.py",
                10,
                10,
                Category::Security,
                Severity::Critical,
                AnalyzerOrigin::Static,
            ),
            finding(
                "a.py",
                5,
                5,
                Category::Logic,
                Severity::High,
                AnalyzerOrigin::Static,
            ),
        ];

        let issues = merge_findings(findings);
        let order: Vec<_> = issues
            .iter()
            .map(|i| (i.file.as_str(), i.range.start, i.severity))
            .collect();
        assert_eq!(
            order,
            vec![
                ("b.py", 10, Severity::Critical),
                ("a.py", 5, Severity::High),
                ("a.py", 50, Severity::High),
            ]
        );
    }

    #[test]
    fn test_no_overlap_invariant_holds() {
        // A chain of overlapping and touching ranges plus one separate range.
        let findings = vec![
            finding("x.py", 1, 4, Category::Security, Severity::Low, AnalyzerOrigin::Static),
            finding("x.py", 4, 8, Category::Security, Severity::Low, AnalyzerOrigin::Static),
            finding("x.py", 8, 9, Category::Security, Severity::Low, AnalyzerOrigin::Ai),
            finding("x.py", 20, 25, Category::Security, Severity::Low, AnalyzerOrigin::Static),
        ];

        let issues = merge_findings(findings);
        assert_eq!(issues.len(), 2);

        for a in &issues {
            for b in &issues {
                if std::ptr::eq(a, b) || a.file != b.file || a.category != b.category {
                    continue;
                }
                assert!(!a.range.overlaps(&b.range));
            }
        }
    }

    #[test]
    fn test_ai_remediation_appended_when_both_stages_contribute() {
        let static_finding = finding(
            "m.py",
            3,
            3,
            Category::Security,
            Severity::High,
            AnalyzerOrigin::Static,
        );
        let ai_finding = finding(
            "m.py",
            3,
            4,
            Category::Security,
            Severity::High,
            AnalyzerOrigin::Ai,
        )
        .with_suggestion("Validate the input before use")
        .with_confidence(0.8);

        let issues = merge_findings(vec![static_finding, ai_finding]);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Suggested remediation"));
        assert_eq!(issues[0].confidence, Some(0.8));
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(merge_findings(Vec::new()).is_empty());
    }
}
