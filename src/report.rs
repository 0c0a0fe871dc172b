//! Report Module
//!
//! Runs every mutation rule against every sequence and writes the result
//! table. Rows are ordered by sequence (file order) then by rule (catalog
//! order); nothing is sorted.
//!
//! # Output Columns
//! ```text
//! seqName   Sequence identifier after cleanup
//! Gene      Caller-supplied gene label
//! Mutation  Rule name (tokens joined by '+')
//! Detected  Present | Absent
//! Note      Evidence note
//! ```
//!
//! Fields are comma-separated and never quoted. A backslash is written before
//! every embedded comma, double quote, backslash, CR and LF.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fmt;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::error::ScreenError;
use crate::evaluate::{evaluate, PositionPolicy};
use crate::mutation::MutationSpec;
use crate::seqio::{Sequence, SequenceStore};

pub const HEADER: [&str; 5] = ["seqName", "Gene", "Mutation", "Detected", "Note"];

// ============================================================================
// Identifier Cleanup
// ============================================================================

/// Literal substrings removed from sequence identifiers before reporting.
///
/// Typically holds the organism qualifier a reference header carries,
/// e.g. `" Human respiratory syncytial virus B isolate ..., complete genome"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdCleanup {
    patterns: Vec<String>,
}

impl IdCleanup {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    /// Reads one pattern per line. Only the line terminator is stripped so
    /// leading spaces survive; blank lines are ignored.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScreenError::InputNotFound(path.to_path_buf()).into());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cleanup patterns: {}", path.display()))?;

        Ok(Self::new(
            text.lines()
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string),
        ))
    }

    pub fn extend(&mut self, other: IdCleanup) {
        self.patterns.extend(other.patterns);
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Applies each pattern in order; identifiers without a verbatim match are untouched.
    pub fn apply(&self, id: &str) -> String {
        self.patterns
            .iter()
            .fold(id.to_string(), |acc, p| {
                if acc.contains(p.as_str()) {
                    acc.replace(p.as_str(), "")
                } else {
                    acc
                }
            })
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Settings for one screening run.
#[derive(Debug, Clone)]
pub struct ScreenConfig {
    /// Label copied into the Gene column.
    pub gene: String,
    /// Identifier cleanup rules.
    pub cleanup: IdCleanup,
    /// Out-of-range position handling.
    pub position_policy: PositionPolicy,
    /// Worker threads: 0 uses the global rayon pool, 1 evaluates sequentially.
    pub threads: usize,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            gene: String::new(),
            cleanup: IdCleanup::default(),
            position_policy: PositionPolicy::Report,
            threads: 0,
        }
    }
}

// ============================================================================
// Report Rows
// ============================================================================

/// Detection status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Present,
    Absent,
}

impl From<bool> for Status {
    fn from(detected: bool) -> Self {
        if detected {
            Status::Present
        } else {
            Status::Absent
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Present => write!(f, "Present"),
            Status::Absent => write!(f, "Absent"),
        }
    }
}

/// One (sequence, rule) result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub seq_name: String,
    pub gene: String,
    pub mutation: String,
    pub status: Status,
    pub note: String,
    /// Assertions of this rule that fell outside the sequence.
    pub out_of_range: usize,
}

impl ReportRow {
    fn fields(&self) -> [String; 5] {
        [
            self.seq_name.clone(),
            self.gene.clone(),
            self.mutation.clone(),
            self.status.to_string(),
            self.note.clone(),
        ]
    }
}

/// Counts over a finished report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub rows: usize,
    pub present: usize,
    pub absent: usize,
    pub out_of_range: usize,
}

impl ReportSummary {
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        rows.iter().fold(Self::default(), |mut s, r| {
            s.rows += 1;
            match r.status {
                Status::Present => s.present += 1,
                Status::Absent => s.absent += 1,
            }
            s.out_of_range += r.out_of_range;
            s
        })
    }
}

// ============================================================================
// Report Building
// ============================================================================

fn rows_for_sequence(
    seq: &Sequence,
    specs: &[MutationSpec],
    config: &ScreenConfig,
) -> Result<Vec<ReportRow>, ScreenError> {
    let seq_name = config.cleanup.apply(&seq.id);

    specs
        .iter()
        .map(|spec| -> Result<ReportRow, ScreenError> {
            let eval = evaluate(spec, &seq.id, &seq.residues, config.position_policy)?;
            Ok(ReportRow {
                seq_name: seq_name.clone(),
                gene: config.gene.clone(),
                out_of_range: eval.out_of_range_count(),
                mutation: eval.name,
                status: Status::from(eval.detected),
                note: eval.note,
            })
        })
        .collect()
}

/// Evaluates every rule against every sequence.
///
/// Returns exactly `sequences.len() * specs.len()` rows, sequence-major.
/// Unless `config.threads` is 1, sequences are spread over the rayon pool and
/// the per-sequence buffers are concatenated in input order.
///
/// # Errors
/// Only in [`PositionPolicy::Strict`] mode, on the first out-of-range
/// position.
///
/// # Examples
/// ```
/// use resmut::mutation::parse_rules;
/// use resmut::report::{build, ScreenConfig, Status};
/// use resmut::seqio::SequenceStore;
///
/// let store = SequenceStore::parse(">seqA\nMKFLVLLFNI\n");
/// let specs = parse_rules(["M2K", "M2K+F3Q"]).unwrap();
/// let config = ScreenConfig { gene: "F".to_string(), ..Default::default() };
///
/// let rows = build(&store, &specs, &config).unwrap();
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[0].status, Status::Present);
/// assert_eq!(rows[1].status, Status::Absent);
/// ```
pub fn build(
    store: &SequenceStore,
    specs: &[MutationSpec],
    config: &ScreenConfig,
) -> Result<Vec<ReportRow>, ScreenError> {
    let per_sequence: Vec<Vec<ReportRow>> = if config.threads != 1 {
        store
            .as_slice()
            .par_iter()
            .map(|seq| rows_for_sequence(seq, specs, config))
            .collect::<Result<_, _>>()?
    } else {
        store
            .iter()
            .map(|seq| rows_for_sequence(seq, specs, config))
            .collect::<Result<_, _>>()?
    };

    let rows: Vec<ReportRow> = per_sequence.into_iter().flatten().collect();
    debug!(
        sequences = store.len(),
        rules = specs.len(),
        rows = rows.len(),
        "report built"
    );

    Ok(rows)
}

// ============================================================================
// Report Writing
// ============================================================================

/// Backslash-escapes delimiter, quote, backslash and line breaks.
pub fn escape_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        if matches!(c, ',' | '"' | '\\' | '\n' | '\r') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Writes header and rows. Fields are pre-escaped and never quoted.
pub fn write_report<W: Write>(writer: W, rows: &[ReportRow]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b',')
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    wtr.write_record(HEADER)?;
    for row in rows {
        wtr.write_record(row.fields().iter().map(|f| escape_field(f)))?;
    }
    wtr.flush()?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::parse_rules;

    const RSV_QUALIFIER: &str =
        " Human respiratory syncytial virus B isolate hRSV/B/Australia/VIC-RCH056/2019, complete genome";

    fn config(gene: &str) -> ScreenConfig {
        ScreenConfig {
            gene: gene.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_cleanup_exact_substring_only() {
        let cleanup = IdCleanup::new([RSV_QUALIFIER]);

        let id = format!("hRSV/B/1234{}", RSV_QUALIFIER);
        assert_eq!(cleanup.apply(&id), "hRSV/B/1234");

        // Partial qualifier is left alone
        let partial = "hRSV/B/1234 Human respiratory syncytial virus B isolate";
        assert_eq!(cleanup.apply(partial), partial);

        // No rules, no change
        assert_eq!(IdCleanup::default().apply(&id), id);
    }

    #[test]
    fn test_cleanup_from_file_keeps_leading_space() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strip.txt");
        std::fs::write(&path, format!("{}\n\n , partial\n", RSV_QUALIFIER)).unwrap();

        let cleanup = IdCleanup::from_file(&path).unwrap();
        assert_eq!(cleanup.patterns().len(), 2);
        assert_eq!(cleanup.patterns()[0], RSV_QUALIFIER);
        assert_eq!(cleanup.patterns()[1], " , partial");
    }

    #[test]
    fn test_build_order_and_count() {
        let store = SequenceStore::parse(">s1\nMKFL\n>s2\nMQFL\n>s3\nMKLL\n");
        let specs = parse_rules(["M2K", "F3L", "M2K+F3L"]).unwrap();
        let rows = build(&store, &specs, &config("G")).unwrap();

        assert_eq!(rows.len(), 9);
        let order: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.seq_name.as_str(), r.mutation.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("s1", "M2K"),
                ("s1", "F3L"),
                ("s1", "M2K+F3L"),
                ("s2", "M2K"),
                ("s2", "F3L"),
                ("s2", "M2K+F3L"),
                ("s3", "M2K"),
                ("s3", "F3L"),
                ("s3", "M2K+F3L"),
            ]
        );
        assert!(rows.iter().all(|r| r.gene == "G"));
        assert_eq!(rows[8].status, Status::Present);
        assert_eq!(rows[5].status, Status::Absent);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let text: String = (0..50)
            .map(|i| format!(">seq{}\n{}\n", i, if i % 3 == 0 { "MKFL" } else { "MQLL" }))
            .collect();
        let store = SequenceStore::parse(&text);
        let specs = parse_rules(["M2K", "F3Q+M2K", "A9V"]).unwrap();

        let parallel = build(&store, &specs, &config("F")).unwrap();
        let sequential = build(
            &store,
            &specs,
            &ScreenConfig {
                threads: 1,
                ..config("F")
            },
        )
        .unwrap();

        assert_eq!(parallel, sequential);
        assert_eq!(parallel, build(&store, &specs, &config("F")).unwrap());
    }

    #[test]
    fn test_duplicate_identifier_uses_later_record() {
        let store = SequenceStore::parse(">a\nMQFL\n>a\nMKFL\n");
        let specs = parse_rules(["M2K"]).unwrap();
        let rows = build(&store, &specs, &config("G")).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, Status::Present);
    }

    #[test]
    fn test_nameless_record_not_reported() {
        let store = SequenceStore::parse(">a\nMKFL\n>\nMQFL\n>b\nMKFL\n");
        let specs = parse_rules(["M2K"]).unwrap();
        let rows = build(&store, &specs, &config("G")).unwrap();

        let names: Vec<&str> = rows.iter().map(|r| r.seq_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_out_of_range_row_does_not_stop_run() {
        let store = SequenceStore::parse(">s1\nMKFLVLLFNI\n>s2\nMKFL\n");
        let specs = parse_rules(["M500K", "M2K"]).unwrap();
        let rows = build(&store, &specs, &config("G")).unwrap();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].status, Status::Absent);
        assert!(rows[0].note.contains("out of range"));
        assert_eq!(rows[1].status, Status::Present);

        let summary = ReportSummary::from_rows(&rows);
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.present, 2);
        assert_eq!(summary.absent, 2);
        assert_eq!(summary.out_of_range, 2);
    }

    #[test]
    fn test_strict_policy_fails_run() {
        let store = SequenceStore::parse(">s\nMKFL\n");
        let specs = parse_rules(["M2K", "M500K"]).unwrap();
        let cfg = ScreenConfig {
            position_policy: PositionPolicy::Strict,
            ..config("G")
        };
        assert!(matches!(
            build(&store, &specs, &cfg),
            Err(ScreenError::PositionOutOfRange { .. })
        ));
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "a\\,b");
        assert_eq!(escape_field("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_field("back\\slash"), "back\\\\slash");
        assert_eq!(escape_field("two\nlines"), "two\\\nlines");
    }

    #[test]
    fn test_write_report() {
        let rows = vec![ReportRow {
            seq_name: "hRSV/B/Australia/VIC-RCH056/2019, complete".to_string(),
            gene: "F".to_string(),
            mutation: "M2K+F3Q".to_string(),
            status: Status::Absent,
            note: "Detected mutation: M2K Mutations not detected: F3Q".to_string(),
            out_of_range: 0,
        }];

        let mut buf = Vec::new();
        write_report(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(
            text,
            "seqName,Gene,Mutation,Detected,Note\n\
             hRSV/B/Australia/VIC-RCH056/2019\\, complete,F,M2K+F3Q,Absent,\
             Detected mutation: M2K Mutations not detected: F3Q\n"
        );
    }
}
