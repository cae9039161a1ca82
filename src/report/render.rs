use serde_json::Value;

use super::diff::ReportComparison;
use super::{CompetitorScore, Finding};

pub const NO_CHANGES: &str = "No significant changes detected";

/// One sentence listing every non-zero change count in a fixed order.
pub fn summarize(cmp: &ReportComparison) -> String {
    let mut parts = Vec::new();

    let counted = [
        (cmp.new_findings.len(), "new finding"),
        (cmp.removed_findings.len(), "removed finding"),
        (cmp.updated_findings.len(), "updated finding"),
        (cmp.new_competitor_scores.len(), "new competitor score"),
        (cmp.updated_competitor_scores.len(), "updated competitor score"),
        (cmp.removed_competitor_scores.len(), "removed competitor score"),
    ];
    for (n, label) in counted {
        if n > 0 {
            parts.push(format!("{} {}", n, plural(n, label)));
        }
    }
    if cmp.executive_summary_changed {
        parts.push("executive summary changed".to_string());
    }
    if !cmp.changed_sections.is_empty() {
        let names: Vec<&str> = cmp.changed_sections.iter().map(|c| c.section.as_str()).collect();
        parts.push(format!(
            "{} {} changed ({})",
            names.len(),
            plural(names.len(), "section"),
            names.join(", ")
        ));
    }

    if parts.is_empty() {
        return NO_CHANGES.to_string();
    }
    capitalize(&parts.join(", "))
}

/// Multi-section plain-text document for display or notification.
pub fn render_document(cmp: &ReportComparison) -> String {
    let mut out = String::from("# Report changes\n");

    match (cmp.previous_captured_at, cmp.next_captured_at) {
        (Some(prev), Some(next)) => out.push_str(&format!(
            "Compared {} with {}\n",
            prev.format("%Y-%m-%d %H:%M UTC"),
            next.format("%Y-%m-%d %H:%M UTC")
        )),
        (None, Some(next)) => {
            out.push_str(&format!("Latest snapshot {}\n", next.format("%Y-%m-%d %H:%M UTC")))
        }
        _ => {}
    }
    out.push('\n');
    out.push_str(&cmp.summary);
    out.push('\n');

    if !cmp.new_findings.is_empty() {
        heading(&mut out, "New findings", cmp.new_findings.len());
        for f in &cmp.new_findings {
            push_finding(&mut out, f);
        }
    }
    if !cmp.removed_findings.is_empty() {
        heading(&mut out, "Removed findings", cmp.removed_findings.len());
        for f in &cmp.removed_findings {
            push_finding(&mut out, f);
        }
    }
    if !cmp.updated_findings.is_empty() {
        heading(&mut out, "Updated findings", cmp.updated_findings.len());
        for u in &cmp.updated_findings {
            push_finding(&mut out, &u.next);
            push_changes(&mut out, &u.changes);
        }
    }
    if !cmp.new_competitor_scores.is_empty() {
        heading(&mut out, "New competitor scores", cmp.new_competitor_scores.len());
        for s in &cmp.new_competitor_scores {
            push_score(&mut out, s);
        }
    }
    if !cmp.updated_competitor_scores.is_empty() {
        heading(&mut out, "Updated competitor scores", cmp.updated_competitor_scores.len());
        for u in &cmp.updated_competitor_scores {
            push_score(&mut out, &u.next);
            push_changes(&mut out, &u.changes);
        }
    }
    if !cmp.removed_competitor_scores.is_empty() {
        heading(&mut out, "Removed competitor scores", cmp.removed_competitor_scores.len());
        for s in &cmp.removed_competitor_scores {
            push_score(&mut out, s);
        }
    }
    if cmp.executive_summary_changed {
        out.push_str("\n## Executive summary\n");
        out.push_str("The executive summary was rewritten.\n");
    }
    if !cmp.changed_sections.is_empty() {
        heading(&mut out, "Changed sections", cmp.changed_sections.len());
        for c in &cmp.changed_sections {
            out.push_str(&format!("### {}\n", c.section));
            out.push_str(&format!("Previous: {}\n", compact(c.previous.as_ref())));
            out.push_str(&format!("Latest: {}\n", compact(c.next.as_ref())));
        }
    }

    out
}

fn heading(out: &mut String, title: &str, count: usize) {
    out.push_str(&format!("\n## {} ({})\n", title, count));
}

fn push_finding(out: &mut String, f: &Finding) {
    out.push_str(&format!("- [{}] {}\n", f.severity.as_str().to_uppercase(), f.issue));
    if !f.description.is_empty() {
        out.push_str(&format!("  {}\n", f.description));
    }
    if let Some(rec) = &f.recommendation {
        out.push_str(&format!("  Recommendation: {}\n", rec));
    }
    if let Some(area) = &f.affected_area {
        out.push_str(&format!("  Affected area: {}\n", area));
    }
}

fn push_score(out: &mut String, s: &CompetitorScore) {
    let ours = s
        .our_score
        .map(|o| format!(" (ours {})", o))
        .unwrap_or_default();
    out.push_str(&format!("- {} / {}: {}{}\n", s.competitor, s.category, s.score, ours));
    if let Some(c) = &s.comparison {
        out.push_str(&format!("  {}\n", c));
    }
}

fn push_changes(out: &mut String, changes: &[String]) {
    for c in changes {
        out.push_str(&format!("  * {}\n", c));
    }
}

fn compact(value: Option<&Value>) -> String {
    match value {
        None => "(absent)".to_string(),
        Some(v) => serde_json::to_string(v).unwrap_or_default(),
    }
}

fn plural(n: usize, label: &str) -> String {
    if n == 1 {
        label.to_string()
    } else {
        format!("{}s", label)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
