//! Reading inputs from disk for the CLI: report snapshots and raw messages.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::report::Report;

pub fn load_report(path: &Path) -> Result<Report> {
    let raw = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let report: Report = serde_json::from_str(&raw).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        findings = report.findings.len(),
        scores = report.scores().len(),
        "loaded report snapshot"
    );
    Ok(report)
}

/// Read a message from `path`, or from stdin when `path` is `None`.
pub fn read_message(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) => fs::read_to_string(p).map_err(|source| Error::Io {
            path: p.to_path_buf(),
            source,
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|source| Error::Io {
                    path: PathBuf::from("<stdin>"),
                    source,
                })?;
            Ok(buf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_fixture() {
        let report = load_report(Path::new("tests/fixtures/report_previous.json")).unwrap();
        assert_eq!(report.findings.len(), 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_report(Path::new("tests/fixtures/nope.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("nope.json"));
    }

    #[test]
    fn non_report_json_is_json_error() {
        let err = load_report(Path::new("tests/fixtures/design_blocks.toml")).unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
    }

    #[test]
    fn reads_message_file() {
        let text = read_message(Some(Path::new("tests/fixtures/assistant_message.md"))).unwrap();
        assert!(text.contains("COLOR_SWATCH"));
    }
}
