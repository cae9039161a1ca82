pub mod diff;
pub mod render;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use diff::{compare, CompetitorScoreUpdate, FindingUpdate, ReportComparison, SectionChange};
pub use render::{render_document, summarize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[serde(alias = "Critical", alias = "CRITICAL")]
    Critical,
    #[serde(alias = "High", alias = "HIGH")]
    High,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "Low", alias = "LOW")]
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single UX issue with optional remediation guidance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub issue: String,
    pub severity: Severity,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_area: Option<String>,
}

impl Finding {
    /// Case- and whitespace-insensitive identity used to match findings
    /// across two snapshots.
    pub fn key(&self) -> String {
        self.issue.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorScore {
    pub competitor: String,
    pub category: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub our_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<String>,
}

impl CompetitorScore {
    pub fn key(&self) -> String {
        format!("{}-{}", self.competitor.trim(), self.category.trim()).to_lowercase()
    }
}

/// The closed set of free-form report sections compared by deep equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionName {
    Perception,
    Journey,
    Trends,
    Performance,
    Checking,
}

impl SectionName {
    pub const ALL: [SectionName; 5] = [
        SectionName::Perception,
        SectionName::Journey,
        SectionName::Trends,
        SectionName::Performance,
        SectionName::Checking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionName::Perception => "perception",
            SectionName::Journey => "journey",
            SectionName::Trends => "trends",
            SectionName::Performance => "performance",
            SectionName::Checking => "checking",
        }
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable point-in-time capture of a structured report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor_scores: Option<Vec<CompetitorScore>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executive_summary: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sections: BTreeMap<SectionName, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
}

impl Report {
    pub fn section(&self, name: SectionName) -> Option<&Value> {
        self.sections.get(&name)
    }

    pub fn scores(&self) -> &[CompetitorScore] {
        self.competitor_scores.as_deref().unwrap_or(&[])
    }
}
