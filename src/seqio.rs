//! Sequence I/O Module
//!
//! Loads translated CDS files (multi-record FASTA) into memory.
//! Plain and gzip-compressed files are both accepted.
//!
//! # Format
//! ```text
//! >seqA some description
//! MKFLVLLFNIL
//! CSLPVLA
//! >seqB
//! MKFLV
//! ```
//! A line starting with `>` opens a record; the rest of the line (trimmed)
//! is the identifier. Body lines are trimmed and concatenated until the next
//! header. Text before the first header, and records whose header is empty,
//! are dropped. If an identifier repeats,
//! the later record replaces the earlier one but keeps its original slot in
//! iteration order.
//!
//! # Examples
//! ```
//! use resmut::seqio::SequenceStore;
//!
//! let store = SequenceStore::parse(">seqA\nMKFL\nVL\n");
//! assert_eq!(store.get("seqA"), Some("MKFLVL"));
//! ```

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::ScreenError;

// ============================================================================
// Sequence Record
// ============================================================================

/// A translated sequence: identifier plus residue string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    /// Header text after '>' with surrounding whitespace removed.
    pub id: String,
    /// Residues, one character per position (0-based in storage).
    pub residues: String,
}

// ============================================================================
// Sequence Store
// ============================================================================

/// Identifier-keyed, insertion-ordered collection of sequences.
#[derive(Debug, Clone, Default)]
pub struct SequenceStore {
    records: Vec<Sequence>,
    index: FxHashMap<String, usize>,
}

impl SequenceStore {
    /// Parses FASTA text held in memory.
    pub fn parse(text: &str) -> Self {
        let mut store = Self::default();
        let mut current: Option<Sequence> = None;

        for line in text.lines() {
            store.push_line(line, &mut current);
        }
        if let Some(record) = current {
            store.insert(record);
        }

        store
    }

    /// Parses FASTA from any buffered reader.
    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut store = Self::default();
        let mut current: Option<Sequence> = None;
        let mut line_buf = String::with_capacity(256);

        loop {
            line_buf.clear();
            if reader.read_line(&mut line_buf)? == 0 {
                break;
            }
            store.push_line(&line_buf, &mut current);
        }
        if let Some(record) = current {
            store.insert(record);
        }

        Ok(store)
    }

    /// Opens a FASTA file, decompressing it when the extension is `.gz`.
    ///
    /// # Errors
    /// Returns [`ScreenError::InputNotFound`] if the path does not exist,
    /// or an I/O error with the path attached.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScreenError::InputNotFound(path.to_path_buf()).into());
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open FASTA: {}", path.display()))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let reader: Box<dyn Read> = if ext == "gz" {
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };

        Self::from_reader(BufReader::with_capacity(1024 * 1024, reader))
            .with_context(|| format!("Failed to read FASTA: {}", path.display()))
    }

    fn push_line(&mut self, line: &str, current: &mut Option<Sequence>) {
        let line = line.trim();
        if let Some(header) = line.strip_prefix('>') {
            if let Some(record) = current.take() {
                self.insert(record);
            }
            let id = header.trim();
            // Nameless records are dropped along with their body lines.
            *current = (!id.is_empty()).then(|| Sequence {
                id: id.to_string(),
                residues: String::new(),
            });
        } else if let Some(record) = current.as_mut() {
            record.residues.push_str(line);
        }
    }

    /// Inserts a record; an existing identifier keeps its slot but takes the new residues.
    pub fn insert(&mut self, record: Sequence) {
        match self.index.get(&record.id) {
            Some(&slot) => self.records[slot] = record,
            None => {
                self.index.insert(record.id.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Looks up residues by identifier.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.index
            .get(id)
            .map(|&slot| self.records[slot].residues.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sequence> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[Sequence] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a SequenceStore {
    type Item = &'a Sequence;
    type IntoIter = std::slice::Iter<'a, Sequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================
