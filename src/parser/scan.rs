//! Single forward pass over an assistant message.
//!
//! Every marker occurrence is classified once, in text order. Recognised
//! blocks are cut out of the prose buffer as they are met; nothing already
//! copied into the buffer is searched for blocks again.

use std::sync::LazyLock;

use regex::Regex;

use super::logo;
use super::observer::{Checkpoint, ExtractObserver};
use super::payload;
use super::records::{self, BlockKind, FindingsBlock, ReviewSummary};
use super::Extraction;
use crate::report::Finding;

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(COLOR_SWATCH|TOKEN_COPY|LOGO_IMAGE|UX_FINDINGS|REVIEW_SUMMARY):").unwrap()
});
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\r?\n){2,}").unwrap());

/// Longest `MARKER:` text.
const MARKER_SPAN: usize = "REVIEW_SUMMARY:".len();

pub(super) fn scan(text: &str, observer: &dyn ExtractObserver) -> Extraction {
    observer.checkpoint(&Checkpoint::ScanStarted { bytes: text.len() });

    let mut out = Extraction::default();
    let mut prose = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut search_from = 0;
    let mut removed = 0usize;
    // Prose offset of the latest cut.
    let mut seam = None;
    // Where the body of the latest rejected swatch/token stopped short of
    // its line end.
    let mut dangling = None;
    let mut known_eol = None;

    while let Some(m) = MARKER_RE.find_at(text, search_from) {
        let Some(kind) = BlockKind::from_marker(&text[m.start()..m.end() - 1]) else {
            search_from = m.end();
            continue;
        };
        let at_line_start = starts_line(&text[cursor..m.start()], &prose);
        let body = m.end();
        let eol = match known_eol {
            Some(eol) if eol >= body => eol,
            _ => line_end(text, body),
        };
        known_eol = Some(eol);
        // Single-line bodies end where the next marker on the line begins.
        let stop = MARKER_RE
            .find(&text[body..eol])
            .map_or(eol, |next| body + next.start());

        let end = match kind {
            BlockKind::ColorSwatch => records::parse_swatch(&text[body..stop]).map(|s| {
                out.swatches.push(s);
                stop
            }),
            BlockKind::TokenCopy => records::parse_token(&text[body..stop]).map(|t| {
                out.tokens.push(t);
                stop
            }),
            BlockKind::LogoImage if at_line_start => {
                let reference = logo::resolve(&text[body..stop]);
                observer.checkpoint(&Checkpoint::LogoResolved {
                    brand: &reference.brand,
                    complete: reference.is_complete(),
                });
                out.logos.push(reference);
                Some(stop)
            }
            BlockKind::LogoImage => None,
            BlockKind::UxFindings => {
                let (block, end) = findings_block(text, body, eol, observer);
                out.findings_blocks.push(block);
                Some(end)
            }
            BlockKind::ReviewSummary => {
                let (summary, end) = review_summary(text, body, eol, observer);
                out.summaries.push(summary);
                Some(end)
            }
        };

        let Some(end) = end else {
            // Not a block after all; stays in the prose.
            if kind != BlockKind::LogoImage && stop < eol {
                dangling = Some(stop);
            }
            search_from = m.end();
            continue;
        };

        observer.checkpoint(&Checkpoint::BlockFound { kind, offset: m.start() });
        removed += 1;

        rejoin(&mut prose, &text[cursor..m.start()], seam);
        let kept = prose.trim_end_matches([' ', '\t']).len();
        prose.truncate(kept);
        // A rejected marker right before this block must not take over what
        // follows it.
        let next = text[end..].trim_start_matches([' ', '\t', '\r']);
        if dangling == Some(m.start()) && !next.is_empty() && !next.starts_with('\n') {
            prose.push('\n');
        }
        seam = Some(prose.len());

        cursor = end;
        if at_line_start {
            let rest = &text[end..];
            cursor += rest.len() - rest.trim_start_matches([' ', '\t']).len();
            let rest = &text[cursor..];
            if rest.starts_with("\r\n") {
                cursor += 2;
            } else if rest.starts_with('\n') {
                cursor += 1;
            }
        }
        search_from = cursor;
    }

    if removed == 0 {
        out.prose = text.to_string();
    } else {
        rejoin(&mut prose, &text[cursor..], seam);
        out.prose = BLANK_RUN_RE.replace_all(&prose, "\n\n").trim().to_string();
    }

    observer.checkpoint(&Checkpoint::ScanFinished {
        blocks: removed,
        prose_bytes: out.prose.len(),
    });
    out
}

/// Append `piece` to the prose. When the fragments on both sides of the cut
/// at `seam` now spell a marker, a space is put at the cut.
fn rejoin(prose: &mut String, piece: &str, seam: Option<usize>) {
    prose.push_str(piece);
    let Some(seam) = seam else { return };
    if seam == 0 || seam >= prose.len() {
        return;
    }
    let mut lo = seam.saturating_sub(MARKER_SPAN);
    while !prose.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = (seam + MARKER_SPAN).min(prose.len());
    while !prose.is_char_boundary(hi) {
        hi += 1;
    }
    let spliced = MARKER_RE
        .find_iter(&prose[lo..hi])
        .any(|m| lo + m.start() < seam && seam < lo + m.end());
    if spliced {
        prose.insert(seam, ' ');
    }
}

/// True when only horizontal whitespace separates the marker from the start
/// of its line. `pending` is the uncopied text before the marker; when it
/// holds no newline the answer depends on what was already emitted.
fn starts_line(pending: &str, prose: &str) -> bool {
    let head = pending.trim_end_matches([' ', '\t']);
    if head.is_empty() {
        prose.is_empty() || prose.ends_with('\n')
    } else {
        head.ends_with('\n')
    }
}

fn line_end(text: &str, from: usize) -> usize {
    text[from..].find('\n').map_or(text.len(), |i| from + i)
}

/// Next `:`-terminated field on the current line. Returns the field and the
/// position just past its colon.
fn take_field(text: &str, from: usize, limit: usize) -> Option<(&str, usize)> {
    let line = &text[from..limit];
    line.find(':').map(|i| (&line[..i], from + i + 1))
}

fn findings_block(
    text: &str,
    body: usize,
    eol: usize,
    observer: &dyn ExtractObserver,
) -> (FindingsBlock, usize) {
    let mut block = FindingsBlock::default();

    let Some((title, pos)) = take_field(text, body, eol) else {
        block.title = records::non_empty(Some(&text[body..eol]));
        return (block, eol);
    };
    block.title = records::non_empty(Some(title));

    let Some((source, pos)) = take_field(text, pos, eol) else {
        block.source = records::non_empty(Some(&text[pos..eol]));
        return (block, eol);
    };
    block.source = records::non_empty(Some(source));

    match payload::array_at(text, pos) {
        Some((start, end)) => {
            match payload::decode_list::<Finding>(&text[start..end]) {
                Ok(findings) => block.findings = findings,
                Err(e) => reject(observer, BlockKind::UxFindings, "findings", e.to_string()),
            }
            (block, end)
        }
        None => {
            reject(observer, BlockKind::UxFindings, "findings", "no balanced array".into());
            (block, eol)
        }
    }
}

fn review_summary(
    text: &str,
    body: usize,
    eol: usize,
    observer: &dyn ExtractObserver,
) -> (ReviewSummary, usize) {
    let mut summary = ReviewSummary::default();

    let Some((rating, pos)) = take_field(text, body, eol) else {
        summary.overall_rating = records::parse_rating(&text[body..eol]);
        return (summary, eol);
    };
    summary.overall_rating = records::parse_rating(rating);

    let Some((total, pos)) = take_field(text, pos, eol) else {
        summary.total_reviews = records::parse_total(&text[pos..eol]);
        return (summary, eol);
    };
    summary.total_reviews = records::parse_total(total);

    let strengths_at = match payload::array_at(text, pos) {
        Some((start, end)) => {
            summary.common_themes = decode_strings(&text[start..end], "commonThemes", observer);
            if !text[end..].starts_with(':') {
                return (summary, end);
            }
            end + 1
        }
        None => {
            reject(observer, BlockKind::ReviewSummary, "commonThemes", "no balanced array".into());
            match take_field(text, pos, eol) {
                Some((_, next)) => next,
                None => return (summary, eol),
            }
        }
    };

    match payload::array_at(text, strengths_at) {
        Some((start, end)) => {
            summary.strengths = decode_strings(&text[start..end], "strengths", observer);
            (summary, end)
        }
        None => {
            reject(observer, BlockKind::ReviewSummary, "strengths", "no balanced array".into());
            (summary, line_end(text, strengths_at))
        }
    }
}

fn decode_strings(raw: &str, field: &'static str, observer: &dyn ExtractObserver) -> Vec<String> {
    payload::decode_list::<String>(raw).unwrap_or_else(|e| {
        reject(observer, BlockKind::ReviewSummary, field, e.to_string());
        Vec::new()
    })
}

fn reject(observer: &dyn ExtractObserver, kind: BlockKind, field: &'static str, reason: String) {
    observer.checkpoint(&Checkpoint::PayloadRejected { kind, field, reason });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::observer::NoopObserver;

    fn run(text: &str) -> Extraction {
        scan(text, &NoopObserver)
    }

    #[test]
    fn mid_line_swatch_keeps_leading_prose() {
        let out = run("Use this: COLOR_SWATCH:primary:#0055FF:Brand blue\nThanks!");
        assert_eq!(out.swatches.len(), 1);
        assert_eq!(out.prose, "Use this:\nThanks!");
    }

    #[test]
    fn whole_line_blocks_leave_no_blank_paragraphs() {
        let text = "Intro paragraph.\n\nTOKEN_COPY:radius-sm:4px:\n\nTOKEN_COPY:radius-md:8px:\n\nOutro.";
        let out = run(text);
        assert_eq!(out.tokens.len(), 2);
        assert_eq!(out.prose, "Intro paragraph.\n\nOutro.");
    }

    #[test]
    fn logo_only_at_line_start() {
        let out = run("The marker LOGO_IMAGE:Acme:primary:dark is quoted here.");
        assert!(out.logos.is_empty());
        assert_eq!(out.prose, "The marker LOGO_IMAGE:Acme:primary:dark is quoted here.");

        let out = run("Logos:\n  LOGO_IMAGE:Acme:primary:dark:https://figma.example/x\nDone");
        assert_eq!(out.logos.len(), 1);
        assert_eq!(out.prose, "Logos:\nDone");
    }

    #[test]
    fn partial_logo_still_removed() {
        let out = run("LOGO_IMAGE:Acme\nrest");
        assert_eq!(out.logos.len(), 1);
        assert_eq!(out.logos[0].brand, "Acme");
        assert!(!out.logos[0].is_complete());
        assert_eq!(out.prose, "rest");
    }

    #[test]
    fn findings_array_spans_lines() {
        let text = "Audit below.\nUX_FINDINGS:Checkout audit:Heuristic review:[\n  {\"issue\": \"CTA: hidden\", \"severity\": \"high\", \"description\": \"Below fold\"}\n]\nLet me know.";
        let out = run(text);
        assert_eq!(out.findings_blocks.len(), 1);
        let block = &out.findings_blocks[0];
        assert_eq!(block.title.as_deref(), Some("Checkout audit"));
        assert_eq!(block.source.as_deref(), Some("Heuristic review"));
        assert_eq!(block.findings.len(), 1);
        assert_eq!(block.findings[0].issue, "CTA: hidden");
        assert_eq!(out.prose, "Audit below.\nLet me know.");
    }

    #[test]
    fn malformed_findings_degrade_to_empty() {
        let out = run("UX_FINDINGS:Title:Src:[{\"issue\": 1}]\nafter");
        let block = &out.findings_blocks[0];
        assert_eq!(block.title.as_deref(), Some("Title"));
        assert!(block.findings.is_empty());
        assert_eq!(out.prose, "after");
    }

    #[test]
    fn unbalanced_findings_cut_at_line_end() {
        let out = run("UX_FINDINGS:Title:Src:[{\"issue\": \"x\"\nnext line");
        assert_eq!(out.findings_blocks.len(), 1);
        assert!(out.findings_blocks[0].findings.is_empty());
        assert_eq!(out.prose, "next line");
    }

    #[test]
    fn review_summary_fields() {
        let out = run("REVIEW_SUMMARY:4.3:2,150:[\"fast payouts\",\"clunky search\"]:[\"odds variety\"]\nok");
        let s = &out.summaries[0];
        assert_eq!(s.overall_rating, Some(4.3));
        assert_eq!(s.total_reviews, Some(2150));
        assert_eq!(s.common_themes, vec!["fast payouts", "clunky search"]);
        assert_eq!(s.strengths, vec!["odds variety"]);
        assert_eq!(out.prose, "ok");
    }

    #[test]
    fn review_summary_bad_arrays_keep_numbers() {
        let out = run("REVIEW_SUMMARY:4.1:88:not json:also not\ntail");
        let s = &out.summaries[0];
        assert_eq!(s.overall_rating, Some(4.1));
        assert_eq!(s.total_reviews, Some(88));
        assert!(s.common_themes.is_empty());
        assert!(s.strengths.is_empty());
        assert_eq!(out.prose, "tail");
    }

    #[test]
    fn review_summary_strengths_omitted() {
        let out = run("REVIEW_SUMMARY:3.9:10:[\"slow\"] and more text");
        let s = &out.summaries[0];
        assert_eq!(s.common_themes, vec!["slow"]);
        assert!(s.strengths.is_empty());
        assert_eq!(out.prose, "and more text");
    }

    #[test]
    fn review_summary_bad_themes_keep_strengths() {
        let out = run("REVIEW_SUMMARY:4.1:88:oops:[\"fast\"]\ntail");
        let s = &out.summaries[0];
        assert!(s.common_themes.is_empty());
        assert_eq!(s.strengths, vec!["fast"]);
        assert_eq!(out.prose, "tail");
    }

    #[test]
    fn two_swatches_on_one_line() {
        let out = run("Palette: COLOR_SWATCH:a:#111:first COLOR_SWATCH:b:#222:second");
        assert_eq!(out.swatches.len(), 2);
        assert_eq!(out.swatches[0].description, "first");
        assert_eq!(out.swatches[0].link, None);
        assert_eq!(out.swatches[1].token, "b");
        assert_eq!(out.swatches[1].description, "second");
        assert_eq!(out.prose, "Palette:");
    }

    #[test]
    fn swatch_and_token_share_a_line() {
        let out = run("COLOR_SWATCH:a:#111 TOKEN_COPY:gap:8px\nend");
        assert_eq!(out.swatches[0].hex, "#111");
        assert_eq!(out.swatches[0].description, "");
        assert_eq!(out.tokens[0].value, "8px");
        assert_eq!(out.prose, "end");
    }

    #[test]
    fn cut_does_not_splice_a_marker() {
        let out = run("COLOR_UX_FINDINGS:a:b:[]SWATCH:x:#fff");
        assert_eq!(out.findings_blocks.len(), 1);
        assert_eq!(out.prose, "COLOR_ SWATCH:x:#fff");
        let again = run(&out.prose);
        assert!(again.is_empty());
        assert_eq!(again.prose, out.prose);
    }

    #[test]
    fn rejected_swatch_does_not_absorb_text_after_a_block() {
        let out = run("Note COLOR_SWATCH: x UX_FINDINGS:a:b:[] :#111");
        assert!(out.swatches.is_empty());
        assert_eq!(out.findings_blocks.len(), 1);
        let again = run(&out.prose);
        assert!(again.is_empty());
        assert_eq!(again.prose, out.prose);
    }

    #[test]
    fn line_start_block_closing_mid_line_trims_following_space() {
        let out = run("intro\nUX_FINDINGS:a:b:[] tail");
        assert_eq!(out.prose, "intro\ntail");
    }

    #[test]
    fn repeated_unclosed_findings_scale_linearly() {
        use std::time::{Duration, Instant};

        let line = "UX_FINDINGS:t:s:[ some prose words here\n";
        let timed = |n: usize| {
            let text = line.repeat(n);
            let t0 = Instant::now();
            let out = run(&text);
            let elapsed = t0.elapsed();
            assert_eq!(out.findings_blocks.len(), n);
            assert!(out.prose.is_empty());
            elapsed
        };
        let small = timed(2_000);
        let large = timed(16_000);
        // 8x the input; quadratic work would take about 64x.
        assert!(large < small * 24 + Duration::from_millis(100), "{small:?} vs {large:?}");
    }

    #[test]
    fn unparseable_swatch_stays_in_prose() {
        let out = run("Literal COLOR_SWATCH: marker");
        assert!(out.swatches.is_empty());
        assert_eq!(out.prose, "Literal COLOR_SWATCH: marker");
    }

    #[test]
    fn crlf_lines() {
        let out = run("Hi\r\nCOLOR_SWATCH:a:#111:first\r\nBye");
        assert_eq!(out.swatches[0].description, "first");
        assert_eq!(out.prose, "Hi\r\nBye");
    }
}
