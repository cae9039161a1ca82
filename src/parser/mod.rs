pub mod logo;
pub mod observer;
pub mod payload;
pub mod records;
mod scan;

use serde::{Deserialize, Serialize};

pub use logo::{LogoAssets, LogoReference};
pub use observer::{Checkpoint, ExtractObserver, NoopObserver, TracingObserver};
pub use records::{BlockKind, ColorSwatch, FindingsBlock, ReviewSummary, TokenCopy};

/// Prose plus every typed block found in one assistant message.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub prose: String,
    pub swatches: Vec<ColorSwatch>,
    pub tokens: Vec<TokenCopy>,
    pub logos: Vec<LogoReference>,
    pub findings_blocks: Vec<FindingsBlock>,
    pub summaries: Vec<ReviewSummary>,
}

impl Extraction {
    pub fn block_count(&self) -> usize {
        self.swatches.len()
            + self.tokens.len()
            + self.logos.len()
            + self.findings_blocks.len()
            + self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.block_count() == 0
    }

    /// The authoritative findings block (the last one kept).
    pub fn findings_block(&self) -> Option<&FindingsBlock> {
        self.findings_blocks.last()
    }

    pub fn review_summary(&self) -> Option<&ReviewSummary> {
        self.summaries.first()
    }
}

/// Which occurrences of a block kind are returned. All occurrences are
/// removed from the prose either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    All,
    First,
    Last,
}

impl Multiplicity {
    fn apply<T>(self, items: &mut Vec<T>) -> usize {
        let before = items.len();
        match self {
            Multiplicity::All => {}
            Multiplicity::First => items.truncate(1),
            Multiplicity::Last => {
                if before > 1 {
                    items.drain(..before - 1);
                }
            }
        }
        before - items.len()
    }
}

/// Per-kind multiplicity. Defaults keep every swatch, token and logo, the
/// last findings block and the first review summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    pub swatches: Multiplicity,
    pub tokens: Multiplicity,
    pub logos: Multiplicity,
    pub findings: Multiplicity,
    pub summaries: Multiplicity,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            swatches: Multiplicity::All,
            tokens: Multiplicity::All,
            logos: Multiplicity::All,
            findings: Multiplicity::Last,
            summaries: Multiplicity::First,
        }
    }
}

/// Split a message into prose and typed blocks with default options.
pub fn extract(text: &str) -> Extraction {
    extract_with(text, &ExtractOptions::default(), &NoopObserver)
}

pub fn extract_with(
    text: &str,
    options: &ExtractOptions,
    observer: &dyn ExtractObserver,
) -> Extraction {
    let mut out = scan::scan(text, observer);

    let dropped = [
        (BlockKind::ColorSwatch, options.swatches.apply(&mut out.swatches)),
        (BlockKind::TokenCopy, options.tokens.apply(&mut out.tokens)),
        (BlockKind::LogoImage, options.logos.apply(&mut out.logos)),
        (BlockKind::UxFindings, options.findings.apply(&mut out.findings_blocks)),
        (BlockKind::ReviewSummary, options.summaries.apply(&mut out.summaries)),
    ];
    for (kind, dropped) in dropped {
        if dropped > 0 {
            observer.checkpoint(&Checkpoint::BlockSuperseded { kind, dropped });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::report::Severity;

    #[test]
    fn text_without_markers_is_untouched() {
        let text = "  Here are some ideas:\n\n\n- use more contrast  \n";
        let out = extract(text);
        assert_eq!(out.prose, text);
        assert!(out.is_empty());
    }

    #[test]
    fn reextracting_prose_is_stable() {
        let text = std::fs::read_to_string("tests/fixtures/assistant_message.md").unwrap();
        let first = extract(&text);
        let second = extract(&first.prose);
        assert_eq!(second.prose, first.prose);
        assert!(second.is_empty());
    }

    #[test]
    fn swatches_in_source_order() {
        let out = extract("COLOR_SWATCH:a:#111:first\nCOLOR_SWATCH:b:#222:second");
        assert_eq!(out.swatches.len(), 2);
        assert_eq!(out.swatches[0].token, "a");
        assert_eq!(out.swatches[0].description, "first");
        assert_eq!(out.swatches[1].hex, "#222");
        assert!(!out.prose.contains("COLOR_SWATCH"));
    }

    #[test]
    fn logo_link_only() {
        let out = extract("LOGO_IMAGE:Acme:primary:dark:https://figma.example/x");
        assert_eq!(out.logos[0].link(), Some("https://figma.example/x"));
        assert_eq!(out.logos[0].download_path(), None);
    }

    #[test]
    fn logo_link_and_download() {
        let out = extract("LOGO_IMAGE:Acme:primary:dark:https://figma.example/x:/logos/Acme/primary/dark.svg");
        assert_eq!(out.logos[0].link(), Some("https://figma.example/x"));
        assert_eq!(out.logos[0].download_path(), Some("/logos/Acme/primary/dark.svg"));
    }

    #[test]
    fn last_findings_block_wins() {
        let text = "UX_FINDINGS:Draft:Quick pass:[{\"issue\": \"Old\", \"severity\": \"low\", \"description\": \"x\"}]\n\
                    Correction follows.\n\
                    UX_FINDINGS:Final:Full audit:[{\"issue\": \"New\", \"severity\": \"critical\", \"description\": \"y\"}]";
        let out = extract(text);
        assert_eq!(out.findings_blocks.len(), 1);
        let block = out.findings_block().unwrap();
        assert_eq!(block.title.as_deref(), Some("Final"));
        assert_eq!(block.findings[0].issue, "New");
        assert_eq!(block.findings[0].severity, Severity::Critical);
        assert_eq!(out.prose, "Correction follows.");
    }

    #[test]
    fn first_review_summary_wins_but_all_removed() {
        let text = "REVIEW_SUMMARY:4.5:10:[]:[]\nmid\nREVIEW_SUMMARY:2.0:3:[]:[]";
        let out = extract(text);
        assert_eq!(out.summaries.len(), 1);
        assert_eq!(out.review_summary().unwrap().overall_rating, Some(4.5));
        assert_eq!(out.prose, "mid");
    }

    #[test]
    fn multiplicity_override() {
        let options = ExtractOptions { swatches: Multiplicity::Last, ..Default::default() };
        let out = extract_with("COLOR_SWATCH:a:#111\nCOLOR_SWATCH:b:#222", &options, &NoopObserver);
        assert_eq!(out.swatches.len(), 1);
        assert_eq!(out.swatches[0].token, "b");
    }

    fn observer_fn<F: Fn(&Checkpoint<'_>)>(f: F) -> F {
        f
    }

    #[test]
    fn observer_sees_checkpoints() {
        let events = RefCell::new(Vec::new());
        let observer = observer_fn(|e| events.borrow_mut().push(format!("{:?}", e)));
        let text = "UX_FINDINGS:a:b:[bad]\nUX_FINDINGS:c:d:[]";
        extract_with(text, &ExtractOptions::default(), &observer);
        let events = events.into_inner();
        assert!(events[0].starts_with("ScanStarted"));
        assert!(events.iter().any(|e| e.starts_with("PayloadRejected")));
        assert!(events.iter().any(|e| e.starts_with("ScanFinished { blocks: 2")));
        assert!(events.last().unwrap().starts_with("BlockSuperseded"));
    }

    #[test]
    fn superseded_reported_for_any_trimmed_kind() {
        let events = RefCell::new(Vec::new());
        let observer = observer_fn(|e| {
            if let Checkpoint::BlockSuperseded { kind, dropped } = e {
                events.borrow_mut().push((*kind, *dropped));
            }
        });
        let options = ExtractOptions { swatches: Multiplicity::Last, ..Default::default() };
        extract_with("COLOR_SWATCH:a:#111\nCOLOR_SWATCH:b:#222\nCOLOR_SWATCH:c:#333", &options, &observer);
        assert_eq!(events.into_inner(), vec![(BlockKind::ColorSwatch, 2)]);
    }

    #[test]
    fn fixture_message() {
        let text = std::fs::read_to_string("tests/fixtures/assistant_message.md").unwrap();
        let out = extract(&text);
        assert_eq!(out.swatches.len(), 3);
        assert_eq!(out.tokens.len(), 2);
        assert_eq!(out.logos.len(), 3);
        assert_eq!(out.findings_blocks.len(), 1);
        assert_eq!(out.findings_block().unwrap().findings.len(), 3);
        let summary = out.review_summary().unwrap();
        assert_eq!(summary.total_reviews, Some(12480));
        assert_eq!(summary.strengths.len(), 2);
        assert!(out.logos.iter().any(|l| l.download_path().is_some() && l.link().is_some()));
        assert!(out.prose.starts_with("Here's the palette"));
        assert!(out.prose.contains("Let me know"));
        assert!(!out.prose.contains("\n\n\n"));
    }
}
