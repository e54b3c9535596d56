//! Gene and compound identifier resolution
//!
//! Maps gene symbols to Ensembl gene ids (and back), and compound names to
//! UNIIs, using small static tables. Built-in entries cover the default
//! entities so the common case needs no table on disk.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Gene symbol/id pairs available without a table
const BUILTIN_GENES: &[(&str, &str)] = &[
    ("ADRB2", "ENSG00000169252"),
    ("KCNK3", "ENSG00000171303"),
];

/// Compound name/UNII pairs available without a table
const BUILTIN_COMPOUNDS: &[(&str, &str)] = &[
    ("ALBUTEROL", "QF8SVZ843E"),
    ("OLMESARTAN", "8W1IQP3U10"),
];

/// Column holding the UNII in the compound table
const COMPOUND_UNII_COLUMN: usize = 2;

/// What to do when a key maps to more than one identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbiguityPolicy {
    /// More than one candidate is an error
    #[default]
    Reject,
    /// Take the first candidate and log a warning
    First,
}

/// Errors that can occur when resolving identifiers
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The key is not in the table
    #[error("No {kind} found for '{key}'")]
    NotFound { kind: &'static str, key: String },

    /// The key maps to several identifiers and the policy rejects that
    #[error(
        "Found {} {kind} candidates for '{key}': {}; pass --first-match to use the first",
        .candidates.len(),
        .candidates.join(", ")
    )]
    Ambiguous {
        kind: &'static str,
        key: String,
        candidates: Vec<String>,
    },

    /// The table could not be parsed
    #[error("Failed to read table {}: {source}", .path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The table lacks a required column
    #[error("Table {} has no '{column}' column", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    /// The table file could not be opened
    #[error("Failed to open table {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Chooses one candidate according to `policy`
fn pick(
    kind: &'static str,
    key: &str,
    candidates: &[String],
    policy: AmbiguityPolicy,
) -> Result<String, ResolveError> {
    match (candidates, policy) {
        ([], _) => Err(ResolveError::NotFound {
            kind,
            key: key.to_string(),
        }),
        ([only], _) => Ok(only.clone()),
        ([first, ..], AmbiguityPolicy::First) => {
            warn!(
                "Found {} {} candidates for '{}', using first: {}",
                candidates.len(),
                kind,
                key,
                first
            );
            Ok(first.clone())
        }
        (_, AmbiguityPolicy::Reject) => Err(ResolveError::Ambiguous {
            kind,
            key: key.to_string(),
            candidates: candidates.to_vec(),
        }),
    }
}

/// One row of the gene table
#[derive(Debug, Deserialize)]
struct GeneRecord {
    gene_symbol: String,
    ensembl_gene_id: String,
}

/// Bidirectional gene symbol <-> Ensembl gene id table
#[derive(Debug, Clone, Default)]
pub struct GeneLookup {
    name_to_ids: HashMap<String, Vec<String>>,
    id_to_names: HashMap<String, Vec<String>>,
}

impl GeneLookup {
    /// Table holding only the built-in genes
    pub fn builtin() -> Self {
        let mut lookup = Self::default();
        for (symbol, id) in BUILTIN_GENES {
            lookup.insert(symbol, id);
        }
        lookup
    }

    /// Built-in genes plus every row of the TSV file at `path`
    ///
    /// The file has a header row with `gene_symbol` and `ensembl_gene_id`
    /// columns; a symbol may appear on several rows.
    pub fn load(path: &Path) -> Result<Self, ResolveError> {
        let file = File::open(path).map_err(|source| ResolveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(BufReader::new(file));

        let mut lookup = Self::builtin();
        for record in reader.deserialize() {
            let record: GeneRecord = record.map_err(|source| ResolveError::Table {
                path: path.to_path_buf(),
                source,
            })?;
            lookup.insert(&record.gene_symbol, &record.ensembl_gene_id);
        }
        Ok(lookup)
    }

    /// Adds one pair, skipping duplicates
    pub fn insert(&mut self, symbol: &str, id: &str) {
        let symbol = symbol.trim().to_uppercase();
        let id = id.trim().to_string();
        if symbol.is_empty() || id.is_empty() {
            return;
        }

        let ids = self.name_to_ids.entry(symbol.clone()).or_default();
        if !ids.contains(&id) {
            ids.push(id.clone());
        }
        let names = self.id_to_names.entry(id).or_default();
        if !names.contains(&symbol) {
            names.push(symbol);
        }
    }

    pub fn symbol_to_ids(&self, symbol: &str) -> &[String] {
        self.name_to_ids
            .get(&symbol.to_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn id_to_symbols(&self, id: &str) -> &[String] {
        self.id_to_names.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_symbol(&self, symbol: &str) -> bool {
        !self.symbol_to_ids(symbol).is_empty()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        !self.id_to_symbols(id).is_empty()
    }

    /// Resolves a gene symbol to a single Ensembl gene id
    pub fn resolve_gene_id(
        &self,
        symbol: &str,
        policy: AmbiguityPolicy,
    ) -> Result<String, ResolveError> {
        pick("Ensembl gene id", symbol, self.symbol_to_ids(symbol), policy)
    }

    /// Resolves an Ensembl gene id to a single gene symbol
    pub fn resolve_gene_symbol(
        &self,
        id: &str,
        policy: AmbiguityPolicy,
    ) -> Result<String, ResolveError> {
        pick("gene symbol", id, self.id_to_symbols(id), policy)
    }
}

/// Compound name -> UNII table
#[derive(Debug, Clone, Default)]
pub struct CompoundLookup {
    entries: Vec<(String, String)>,
}

impl CompoundLookup {
    /// Table holding only the built-in compounds
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_COMPOUNDS
                .iter()
                .map(|(name, unii)| (name.to_string(), unii.to_string()))
                .collect(),
        }
    }

    /// Built-in compounds plus every row of the table at `path`
    ///
    /// The header must name a `compound_name` column; the UNII is read from
    /// the third column. Tab-delimited when the header line contains a tab,
    /// comma-delimited otherwise.
    pub fn load(path: &Path) -> Result<Self, ResolveError> {
        let io_error = |source| ResolveError::Io {
            path: path.to_path_buf(),
            source,
        };
        let table_error = |source| ResolveError::Table {
            path: path.to_path_buf(),
            source,
        };

        let mut header = String::new();
        BufReader::new(File::open(path).map_err(io_error)?)
            .read_line(&mut header)
            .map_err(io_error)?;
        let delimiter = if header.contains('\t') { b'\t' } else { b',' };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(table_error)?;
        let name_column = reader
            .headers()
            .map_err(table_error)?
            .iter()
            .position(|h| h.trim() == "compound_name")
            .ok_or_else(|| ResolveError::MissingColumn {
                path: path.to_path_buf(),
                column: "compound_name",
            })?;

        let mut lookup = Self::builtin();
        for record in reader.records() {
            let record = record.map_err(table_error)?;
            if let (Some(name), Some(unii)) =
                (record.get(name_column), record.get(COMPOUND_UNII_COLUMN))
            {
                lookup.insert(name, unii);
            }
        }
        Ok(lookup)
    }

    pub fn insert(&mut self, name: &str, unii: &str) {
        let entry = (name.trim().to_uppercase(), unii.trim().to_string());
        if !entry.0.is_empty() && !entry.1.is_empty() && !self.entries.contains(&entry) {
            self.entries.push(entry);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = name.to_uppercase();
        self.entries.iter().any(|(n, _)| *n == name)
    }

    /// Resolves a compound name to a UNII
    ///
    /// The name is upper-cased and matched as a prefix of table names. A
    /// single exact match wins even when longer names share the prefix.
    pub fn resolve_unii(
        &self,
        name: &str,
        policy: AmbiguityPolicy,
    ) -> Result<String, ResolveError> {
        let name = name.to_uppercase();

        let exact: Vec<String> = self
            .entries
            .iter()
            .filter(|(n, _)| *n == name)
            .map(|(_, unii)| unii.clone())
            .collect();
        if exact.len() == 1 {
            return Ok(exact[0].clone());
        }

        let prefixed: Vec<String> = self
            .entries
            .iter()
            .filter(|(n, _)| n.starts_with(&name))
            .map(|(_, unii)| unii.clone())
            .collect();
        pick("compound UNII", &name, &prefixed, policy)
    }
}
