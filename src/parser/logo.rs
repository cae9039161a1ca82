//! Logo reference resolution.
//!
//! `LOGO_IMAGE:<brand>:<type>:<color>:<link>:<downloadPath>` uses `:` as the
//! field separator, but the link is usually a URL and the download path may
//! follow it directly, so the two trailing fields cannot be split on colons.
//! The leading three fields are positional; the remainder is resolved by
//! ordered rules, first match wins:
//!
//! 1. `/logos/` found past the start: link before it, download path from it.
//! 2. Remainder starts with `http`: all link.
//! 3. Remainder starts with `/`: all download path.
//! 4. Non-empty: split at the last colon when the text before it mentions
//!    `http`; otherwise a (trimmed) leading `/` means download path, anything
//!    else is a link.
//! 5. Empty: neither.
//!
//! A single trailing colon left on the link is dropped.

use serde::Serialize;

use super::records::non_empty;

/// Outcome of resolving the trailing fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "resolution", rename_all = "camelCase")]
pub enum LogoAssets {
    /// Fewer than three leading fields were present; nothing after them was read.
    Partial,
    #[serde(rename_all = "camelCase")]
    Resolved {
        #[serde(skip_serializing_if = "Option::is_none")]
        link: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        download_path: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoReference {
    pub brand: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub color: String,
    #[serde(flatten)]
    pub assets: LogoAssets,
}

impl LogoReference {
    pub fn link(&self) -> Option<&str> {
        match &self.assets {
            LogoAssets::Resolved { link, .. } => link.as_deref(),
            LogoAssets::Partial => None,
        }
    }

    pub fn download_path(&self) -> Option<&str> {
        match &self.assets {
            LogoAssets::Resolved { download_path, .. } => download_path.as_deref(),
            LogoAssets::Partial => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.assets, LogoAssets::Resolved { .. })
    }
}

/// Resolve the text following `LOGO_IMAGE:`. Never fails; incomplete input
/// yields a `Partial` record with whatever leading fields were present.
pub fn resolve(body: &str) -> LogoReference {
    let mut fields = body.splitn(4, ':');
    let brand = fields.next().unwrap_or("").trim().to_string();
    let kind = fields.next().unwrap_or("").trim().to_string();
    let color = fields.next().unwrap_or("").trim().to_string();

    let assets = match fields.next() {
        None => LogoAssets::Partial,
        Some(remainder) => {
            let (link, download_path) = split_remainder(remainder);
            let link = link.map(|l| {
                let l = l.trim();
                l.strip_suffix(':').unwrap_or(l)
            });
            LogoAssets::Resolved {
                link: non_empty(link),
                download_path: non_empty(download_path),
            }
        }
    };

    LogoReference { brand, kind, color, assets }
}

fn split_remainder(remainder: &str) -> (Option<&str>, Option<&str>) {
    if let Some(pos) = remainder.find("/logos/").filter(|&p| p > 0) {
        return (Some(&remainder[..pos]), Some(&remainder[pos..]));
    }
    if remainder.starts_with("http") {
        return (Some(remainder), None);
    }
    if remainder.starts_with('/') {
        return (None, Some(remainder));
    }
    if remainder.is_empty() {
        return (None, None);
    }
    if let Some(pos) = remainder.rfind(':') {
        let before = &remainder[..pos];
        if before.contains("http") {
            return (Some(before), Some(&remainder[pos + 1..]));
        }
    }
    if remainder.trim().starts_with('/') {
        (None, Some(remainder))
    } else {
        (Some(remainder), None)
    }
}
