// src/ledger.rs
//! The resume ledger: fingerprints of notes already uploaded.
//!
//! Backed by a plain text file with one fingerprint per line. Without a file
//! the ledger still remembers notes completed during the current run.

use crate::error::AppError;
use crate::types::Fingerprint;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct DoneLedger {
    path: Option<PathBuf>,
    done: HashSet<Fingerprint>,
}

impl DoneLedger {
    /// A ledger that is never persisted.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the ledger at `path`. A missing file is an empty ledger.
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let done = match fs::read_to_string(path) {
            Ok(contents) => parse_ledger(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(e.into()),
        };
        log::debug!("Loaded {} done notes from {}", done.len(), path.display());

        Ok(Self {
            path: Some(path.to_path_buf()),
            done,
        })
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.done.contains(fingerprint)
    }

    /// Records a completed note, appending it to the file immediately.
    /// Recording the same note twice writes it once.
    pub fn mark_done(&mut self, fingerprint: &Fingerprint) -> Result<(), AppError> {
        if !self.done.insert(fingerprint.clone()) {
            return Ok(());
        }

        if let Some(path) = &self.path {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{}", fingerprint)?;
            file.flush()?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }
}

fn parse_ledger(contents: &str) -> HashSet<Fingerprint> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match Fingerprint::parse(line) {
            Ok(fingerprint) => Some(fingerprint),
            Err(e) => {
                log::warn!("Ignoring done file entry: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DoneLedger::open(&dir.path().join("done.txt")).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("done.txt");
        fs::write(
            &path,
            "0123456789abcdef0123456789abcdef\n\n   \nFEDCBA9876543210FEDCBA9876543210\n",
        )
        .unwrap();

        let ledger = DoneLedger::open(&path).unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains(&Fingerprint::parse("fedcba9876543210fedcba9876543210").unwrap()));
    }

    #[test]
    fn test_mark_done_appends_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("done.txt");
        let fingerprint = Fingerprint::compute([b"note".as_slice()]);

        let mut ledger = DoneLedger::open(&path).unwrap();
        ledger.mark_done(&fingerprint).unwrap();
        ledger.mark_done(&fingerprint).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, format!("{}\n", fingerprint));

        let reopened = DoneLedger::open(&path).unwrap();
        assert!(reopened.contains(&fingerprint));
    }

    #[test]
    fn test_reopened_ledger_holds_every_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("done.txt");
        let fingerprints: Vec<Fingerprint> = ["delta", "alpha", "echo", "charlie", "bravo"]
            .iter()
            .map(|name| Fingerprint::compute([name.as_bytes()]))
            .collect();

        let mut ledger = DoneLedger::open(&path).unwrap();
        for index in [3, 0, 4, 1, 2, 0] {
            ledger.mark_done(&fingerprints[index]).unwrap();
        }

        let reopened = DoneLedger::open(&path).unwrap();
        assert_eq!(reopened.len(), fingerprints.len());
        assert!(fingerprints.iter().all(|f| reopened.contains(f)));
        assert!(!reopened.contains(&Fingerprint::compute([b"foxtrot".as_slice()])));
    }
}
