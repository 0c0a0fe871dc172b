//! Mutation Catalog Reader
//!
//! Reads resistance mutation rules from a delimited table with a header row.
//! Only one column is used (`Mutation` by default); other columns such as
//! drug or reference annotations are ignored.
//!
//! # Example Table
//! ```text
//! Mutation,Drug
//! F264L,nirsevimab
//! K272M+F264L,nirsevimab
//! ```

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::ScreenError;
use crate::mutation::{parse_rules, MutationSpec};

/// Default name of the rule column.
pub const DEFAULT_COLUMN: &str = "Mutation";

/// Options for reading a catalog table.
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    /// Header name of the rule column.
    pub column: String,
    /// Field delimiter. `None` picks tab for `.tsv` files, comma otherwise.
    pub delimiter: Option<u8>,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            column: DEFAULT_COLUMN.to_string(),
            delimiter: None,
        }
    }
}

/// Extracts raw rule strings from a table, in row order.
///
/// Cells are trimmed. Blank cells and rows too short to reach the rule
/// column are skipped with a warning.
/// `source` is only used in error messages.
pub fn read_rules<R: Read>(reader: R, delimiter: u8, column: &str, source: &Path) -> Result<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .with_context(|| format!("Failed to read catalog header: {}", source.display()))?;
    let col = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| ScreenError::MissingColumn {
            column: column.to_string(),
            path: source.to_path_buf(),
        })?;

    let mut rules = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record
            .with_context(|| format!("Failed to read catalog row {}: {}", row + 1, source.display()))?;
        match record.get(col) {
            Some("") => warn!(row = row + 1, "skipping blank mutation cell"),
            Some(cell) => rules.push(cell.to_string()),
            None => warn!(
                row = row + 1,
                fields = record.len(),
                column,
                "skipping row without a mutation column"
            ),
        }
    }

    Ok(rules)
}

/// Loads and parses every rule in a catalog file.
///
/// # Errors
/// - [`ScreenError::InputNotFound`] if the file does not exist
/// - [`ScreenError::MissingColumn`] if the header lacks the rule column
/// - [`ScreenError::EmptyCatalog`] if no rules were found
/// - [`ScreenError::InvalidRule`] for the first malformed rule
pub fn load<P: AsRef<Path>>(path: P, options: &CatalogOptions) -> Result<Vec<MutationSpec>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScreenError::InputNotFound(path.to_path_buf()).into());
    }

    let delimiter = options.delimiter.unwrap_or_else(|| default_delimiter(path));
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open catalog: {}", path.display()))?;

    let rules = read_rules(file, delimiter, &options.column, path)?;
    if rules.is_empty() {
        return Err(ScreenError::EmptyCatalog(path.to_path_buf()).into());
    }
    debug!(count = rules.len(), path = %path.display(), "read mutation rules");

    Ok(parse_rules(&rules)?)
}

fn default_delimiter(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some("tsv") | Some("tab") => b'\t',
        _ => b',',
    }
}

// ============================================================================
// Tests
// ============================================================================
