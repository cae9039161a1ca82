use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{render, CompetitorScore, Finding, Report, SectionName};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingUpdate {
    pub previous: Finding,
    pub next: Finding,
    pub changes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorScoreUpdate {
    pub previous: CompetitorScore,
    pub next: CompetitorScore,
    pub changes: Vec<String>,
}

/// A named section whose structured value differs between snapshots.
/// `None` means the section was absent from that snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionChange {
    pub section: SectionName,
    pub previous: Option<Value>,
    pub next: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportComparison {
    pub new_findings: Vec<Finding>,
    pub removed_findings: Vec<Finding>,
    pub updated_findings: Vec<FindingUpdate>,
    pub new_competitor_scores: Vec<CompetitorScore>,
    pub removed_competitor_scores: Vec<CompetitorScore>,
    pub updated_competitor_scores: Vec<CompetitorScoreUpdate>,
    pub executive_summary_changed: bool,
    pub changed_sections: Vec<SectionChange>,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_captured_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_captured_at: Option<DateTime<Utc>>,
}

impl ReportComparison {
    pub fn has_changes(&self) -> bool {
        !(self.new_findings.is_empty()
            && self.removed_findings.is_empty()
            && self.updated_findings.is_empty()
            && self.new_competitor_scores.is_empty()
            && self.removed_competitor_scores.is_empty()
            && self.updated_competitor_scores.is_empty()
            && !self.executive_summary_changed
            && self.changed_sections.is_empty())
    }
}

/// Reconcile two snapshots of the same report by content key.
pub fn compare(previous: &Report, next: &Report) -> ReportComparison {
    let findings = reconcile(&previous.findings, &next.findings, Finding::key, finding_changes);

    let scores = if previous.scores().is_empty() {
        Reconciled {
            added: next.scores().to_vec(),
            removed: Vec::new(),
            updated: Vec::new(),
        }
    } else {
        reconcile(previous.scores(), next.scores(), CompetitorScore::key, score_changes)
    };

    let changed_sections: Vec<SectionChange> = SectionName::ALL
        .iter()
        .filter_map(|&section| {
            let old = previous.section(section);
            let new = next.section(section);
            if old == new {
                None
            } else {
                Some(SectionChange {
                    section,
                    previous: old.cloned(),
                    next: new.cloned(),
                })
            }
        })
        .collect();

    let mut comparison = ReportComparison {
        new_findings: findings.added,
        removed_findings: findings.removed,
        updated_findings: findings
            .updated
            .into_iter()
            .map(|(previous, next, changes)| FindingUpdate { previous, next, changes })
            .collect(),
        new_competitor_scores: scores.added,
        removed_competitor_scores: scores.removed,
        updated_competitor_scores: scores
            .updated
            .into_iter()
            .map(|(previous, next, changes)| CompetitorScoreUpdate { previous, next, changes })
            .collect(),
        executive_summary_changed: previous.executive_summary != next.executive_summary,
        changed_sections,
        summary: String::new(),
        previous_captured_at: previous.captured_at,
        next_captured_at: next.captured_at,
    };
    comparison.summary = render::summarize(&comparison);

    debug!(
        new_findings = comparison.new_findings.len(),
        removed_findings = comparison.removed_findings.len(),
        updated_findings = comparison.updated_findings.len(),
        new_scores = comparison.new_competitor_scores.len(),
        updated_scores = comparison.updated_competitor_scores.len(),
        sections = comparison.changed_sections.len(),
        "compared report snapshots"
    );

    comparison
}

struct Reconciled<T> {
    added: Vec<T>,
    removed: Vec<T>,
    updated: Vec<(T, T, Vec<String>)>,
}

/// Key-based three-way split. The first occurrence of a duplicated key wins;
/// added/updated follow `next` order, removed follows `previous` order.
fn reconcile<T: Clone>(
    previous: &[T],
    next: &[T],
    key: impl Fn(&T) -> String,
    changes: impl Fn(&T, &T) -> Vec<String>,
) -> Reconciled<T> {
    let prev_index = index_by_key(previous, &key);
    let next_index = index_by_key(next, &key);

    let mut added = Vec::new();
    let mut updated = Vec::new();
    let mut seen = HashSet::new();
    for item in next {
        let k = key(item);
        if !seen.insert(k.clone()) {
            continue;
        }
        match prev_index.get(&k) {
            None => added.push(item.clone()),
            Some(old) => {
                let diffs = changes(old, item);
                if !diffs.is_empty() {
                    updated.push(((*old).clone(), item.clone(), diffs));
                }
            }
        }
    }

    let mut removed = Vec::new();
    let mut seen = HashSet::new();
    for item in previous {
        let k = key(item);
        if seen.insert(k.clone()) && !next_index.contains_key(&k) {
            removed.push(item.clone());
        }
    }

    Reconciled { added, removed, updated }
}

fn index_by_key<'a, T>(items: &'a [T], key: &impl Fn(&T) -> String) -> HashMap<String, &'a T> {
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        map.entry(key(item)).or_insert(item);
    }
    map
}

fn finding_changes(old: &Finding, new: &Finding) -> Vec<String> {
    let mut changes = Vec::new();
    if old.severity != new.severity {
        changes.push(format!("Severity changed: {} → {}", old.severity, new.severity));
    }
    if old.description != new.description {
        changes.push("Description updated".to_string());
    }
    if let Some(c) = optional_text_change("Recommendation", &old.recommendation, &new.recommendation) {
        changes.push(c);
    }
    if old.affected_area != new.affected_area {
        changes.push(format!(
            "Affected area changed: {} → {}",
            old.affected_area.as_deref().unwrap_or("none"),
            new.affected_area.as_deref().unwrap_or("none"),
        ));
    }
    changes
}

fn score_changes(old: &CompetitorScore, new: &CompetitorScore) -> Vec<String> {
    let mut changes = Vec::new();
    if old.score != new.score {
        changes.push(format!("Score changed: {} → {}", old.score, new.score));
    }
    if old.our_score != new.our_score {
        changes.push(format!(
            "Our score changed: {} → {}",
            format_optional_score(old.our_score),
            format_optional_score(new.our_score),
        ));
    }
    if let Some(c) = optional_text_change("Comparison", &old.comparison, &new.comparison) {
        changes.push(c);
    }
    changes
}

fn optional_text_change(label: &str, old: &Option<String>, new: &Option<String>) -> Option<String> {
    match (old, new) {
        (a, b) if a == b => None,
        (None, Some(_)) => Some(format!("{} added", label)),
        (Some(_), None) => Some(format!("{} removed", label)),
        _ => Some(format!("{} updated", label)),
    }
}

fn format_optional_score(score: Option<f64>) -> String {
    score.map(|s| s.to_string()).unwrap_or_else(|| "n/a".into())
}
