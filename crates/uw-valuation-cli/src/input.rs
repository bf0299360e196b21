use log::debug;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use uw_valuation_core::{UnderwritingError, UnderwritingResult, UnderwritingSnapshot};

/// Where the snapshot document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    File(PathBuf),
    Stdin,
}

impl fmt::Display for SnapshotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotSource::File(path) => write!(f, "{}", path.display()),
            SnapshotSource::Stdin => f.write_str("stdin"),
        }
    }
}

impl SnapshotSource {
    /// `--input` when given, otherwise piped stdin. An interactive terminal
    /// is not a source.
    pub fn from_arg(path: Option<&str>) -> Result<SnapshotSource, Box<dyn Error>> {
        match path {
            Some(path) => {
                let file = std::env::current_dir()?.join(path);
                if !file.is_file() {
                    return Err(format!("Snapshot not found: {}", file.display()).into());
                }
                Ok(SnapshotSource::File(file))
            }
            None if atty::is(atty::Stream::Stdin) => {
                Err("No snapshot given: pass --input <file> or pipe JSON on stdin".into())
            }
            None => Ok(SnapshotSource::Stdin),
        }
    }

    fn read(&self) -> io::Result<String> {
        match self {
            SnapshotSource::File(path) => fs::read_to_string(path),
            SnapshotSource::Stdin => {
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer)?;
                Ok(buffer)
            }
        }
    }
}

/// Decode one snapshot document. Blank documents are rejected so that an
/// empty pipe is not valued as an empty model.
pub fn decode_snapshot(
    document: &str,
    source: &SnapshotSource,
) -> UnderwritingResult<UnderwritingSnapshot> {
    if document.trim().is_empty() {
        return Err(UnderwritingError::InvalidInput {
            field: source.to_string(),
            reason: "snapshot document is empty".into(),
        });
    }
    serde_json::from_str(document)
        .map_err(|e| UnderwritingError::SerializationError(format!("{source}: {e}")))
}

/// Load the snapshot from `--input` when given, otherwise from piped stdin.
pub fn read_snapshot(path: Option<&str>) -> Result<UnderwritingSnapshot, Box<dyn Error>> {
    let source = SnapshotSource::from_arg(path)?;
    let document = source
        .read()
        .map_err(|e| format!("Failed to read {source}: {e}"))?;
    let snapshot = decode_snapshot(&document, &source)?;
    debug!(
        "event=snapshot_loaded module=cli status=ok source={} expenses={} operating_expenses={} retail_expenses={}",
        source,
        snapshot.expenses.len(),
        snapshot.operating_expenses.len(),
        snapshot.retail_expenses.len()
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_snapshot_directly() {
        let snapshot = decode_snapshot(
            r#"{"expenses": [{"id": 1, "type": "Closing Costs", "cost_per": "1,500"}]}"#,
            &SnapshotSource::Stdin,
        )
        .unwrap();
        assert_eq!(snapshot.expenses.len(), 1);
        assert_eq!(snapshot.expenses[0].id, "1");
    }

    #[test]
    fn test_blank_document_is_rejected() {
        let err = decode_snapshot(" \n", &SnapshotSource::Stdin).unwrap_err();
        assert!(matches!(err, UnderwritingError::InvalidInput { ref field, .. } if field == "stdin"));
    }

    #[test]
    fn test_malformed_document_names_its_source() {
        let source = SnapshotSource::File(PathBuf::from("/tmp/deal.json"));
        let err = decode_snapshot("{\"expenses\": [", &source).unwrap_err();
        assert!(err.to_string().contains("/tmp/deal.json"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(SnapshotSource::from_arg(Some("no/such/snapshot.json")).is_err());
    }
}
