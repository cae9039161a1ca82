//! Extraction checkpoints.
//!
//! The scanner reports progress through an injected observer instead of
//! logging directly. `TracingObserver` forwards to `tracing`.

use tracing::{debug, warn};

use super::records::BlockKind;

#[derive(Debug, Clone, PartialEq)]
pub enum Checkpoint<'a> {
    ScanStarted { bytes: usize },
    BlockFound { kind: BlockKind, offset: usize },
    LogoResolved { brand: &'a str, complete: bool },
    PayloadRejected { kind: BlockKind, field: &'static str, reason: String },
    BlockSuperseded { kind: BlockKind, dropped: usize },
    ScanFinished { blocks: usize, prose_bytes: usize },
}

pub trait ExtractObserver {
    fn checkpoint(&self, event: &Checkpoint<'_>);
}

impl<F> ExtractObserver for F
where
    F: Fn(&Checkpoint<'_>),
{
    fn checkpoint(&self, event: &Checkpoint<'_>) {
        self(event)
    }
}

pub struct NoopObserver;

impl ExtractObserver for NoopObserver {
    fn checkpoint(&self, _event: &Checkpoint<'_>) {}
}

pub struct TracingObserver;

impl ExtractObserver for TracingObserver {
    fn checkpoint(&self, event: &Checkpoint<'_>) {
        match event {
            Checkpoint::ScanStarted { bytes } => debug!(bytes = *bytes, "scanning message"),
            Checkpoint::BlockFound { kind, offset } => {
                debug!(kind = %kind, offset = *offset, "block found")
            }
            Checkpoint::LogoResolved { brand, complete } => {
                debug!(brand = *brand, complete = *complete, "logo resolved")
            }
            Checkpoint::PayloadRejected { kind, field, reason } => {
                warn!(kind = %kind, field = *field, "embedded payload rejected: {}", reason)
            }
            Checkpoint::BlockSuperseded { kind, dropped } => {
                debug!(kind = %kind, dropped = *dropped, "earlier/later occurrences dropped")
            }
            Checkpoint::ScanFinished { blocks, prose_bytes } => {
                debug!(blocks = *blocks, prose_bytes = *prose_bytes, "scan finished")
            }
        }
    }
}
