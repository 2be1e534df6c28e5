use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::modules::world::Position;

/// Write guard consulted before a container is mutated. `false` vetoes the write.
pub trait TransactionLog {
    fn log_container_transaction(&mut self, actor: &str, container: Position) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub actor: String,
    pub container: Position,
}

/// Append-only JSON-lines audit file.
#[derive(Debug, Clone)]
pub struct AuditTrail {
    path: PathBuf,
}

impl AuditTrail {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join("audit.jsonl"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, record: &AuditRecord) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)
    }

    pub fn records(&self) -> io::Result<Vec<AuditRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            })
            .collect()
    }
}

impl TransactionLog for AuditTrail {
    fn log_container_transaction(&mut self, actor: &str, container: Position) -> bool {
        let record = AuditRecord {
            timestamp: Utc::now().to_rfc3339(),
            actor: actor.to_string(),
            container,
        };
        match self.append(&record) {
            Ok(()) => true,
            Err(err) => {
                log::warn!(
                    "audit log write to {} failed for {} at {}: {}",
                    self.path.display(),
                    actor,
                    container,
                    err
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn appends_one_line_per_transaction() {
        let dir = TempDir::new().unwrap();
        let mut trail = AuditTrail::in_dir(dir.path());

        assert!(trail.log_container_transaction("Steve", Position::new(1, 2, 3)));
        assert!(trail.log_container_transaction("Alex", Position::origin()));

        let records = trail.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].actor, "Steve");
        assert_eq!(records[0].container, Position::new(1, 2, 3));
        assert!(chrono::DateTime::parse_from_rfc3339(&records[1].timestamp).is_ok());
    }

    #[test]
    fn unwritable_target_vetoes_the_write() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes every append fail.
        let blocked = dir.path().join("audit.jsonl");
        fs::create_dir_all(&blocked).unwrap();
        let mut trail = AuditTrail::new(blocked);

        assert!(!trail.log_container_transaction("Steve", Position::origin()));
    }
}
