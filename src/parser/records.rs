use std::fmt;

use serde::Serialize;

use crate::report::Finding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    ColorSwatch,
    TokenCopy,
    LogoImage,
    UxFindings,
    ReviewSummary,
}

impl BlockKind {
    pub fn marker(&self) -> &'static str {
        match self {
            BlockKind::ColorSwatch => "COLOR_SWATCH",
            BlockKind::TokenCopy => "TOKEN_COPY",
            BlockKind::LogoImage => "LOGO_IMAGE",
            BlockKind::UxFindings => "UX_FINDINGS",
            BlockKind::ReviewSummary => "REVIEW_SUMMARY",
        }
    }

    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "COLOR_SWATCH" => Some(BlockKind::ColorSwatch),
            "TOKEN_COPY" => Some(BlockKind::TokenCopy),
            "LOGO_IMAGE" => Some(BlockKind::LogoImage),
            "UX_FINDINGS" => Some(BlockKind::UxFindings),
            "REVIEW_SUMMARY" => Some(BlockKind::ReviewSummary),
            _ => None,
        }
    }

    /// The block kind whose `MARKER:` opens `rest`, if any.
    pub fn opening(rest: &str) -> Option<Self> {
        [
            BlockKind::ColorSwatch,
            BlockKind::TokenCopy,
            BlockKind::LogoImage,
            BlockKind::UxFindings,
            BlockKind::ReviewSummary,
        ]
        .into_iter()
        .find(|kind| {
            rest.strip_prefix(kind.marker())
                .is_some_and(|after| after.starts_with(':'))
        })
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorSwatch {
    pub token: String,
    pub hex: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCopy {
    pub token: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingsBlock {
    pub title: Option<String>,
    pub source: Option<String>,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub overall_rating: Option<f64>,
    pub total_reviews: Option<u64>,
    pub common_themes: Vec<String>,
    pub strengths: Vec<String>,
}

/// `token:hex[:description[:link]]`. The link keeps any colons it contains.
pub fn parse_swatch(body: &str) -> Option<ColorSwatch> {
    let mut parts = body.splitn(4, ':');
    let token = parts.next()?.trim();
    let hex = parts.next()?.trim();
    if token.is_empty() || hex.is_empty() {
        return None;
    }
    Some(ColorSwatch {
        token: token.to_string(),
        hex: hex.to_string(),
        description: parts.next().unwrap_or("").trim().to_string(),
        link: non_empty(parts.next()),
    })
}

/// `token:value[:link]`.
pub fn parse_token(body: &str) -> Option<TokenCopy> {
    let mut parts = body.splitn(3, ':');
    let token = parts.next()?.trim();
    let value = parts.next()?.trim();
    if token.is_empty() || value.is_empty() {
        return None;
    }
    Some(TokenCopy {
        token: token.to_string(),
        value: value.to_string(),
        link: non_empty(parts.next()),
    })
}

pub fn parse_rating(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|r| r.is_finite())
}

pub fn parse_total(raw: &str) -> Option<u64> {
    raw.trim().replace(',', "").parse::<u64>().ok()
}

pub(crate) fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
