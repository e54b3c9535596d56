//! Command-line interface parsing for drugcache
//!
//! This module handles parsing of CLI arguments using clap: global options
//! shared by every source, one subcommand per source, and the derivation of
//! the run's `StartupConfig`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

use crate::resolve::AmbiguityPolicy;

pub const DEFAULT_GENE_SYMBOL: &str = "ADRB2";
pub const DEFAULT_GENE_ID: &str = "ENSG00000169252";
pub const DEFAULT_DISEASE_ID: &str = "MONDO_0004979";
pub const DEFAULT_DISEASE_NAME: &str = "asthma";
pub const DEFAULT_DRUG_ID: &str = "CHEMBL714";
pub const DEFAULT_DRUG_NAME: &str = "ALBUTEROL";
pub const DEFAULT_COMPOUND_NAME: &str = "ALBUTEROL";

/// Gene table location relative to the data directory
const GENE_TABLE: &str = "hgnc/gene-ids.tsv";

/// Compound table location relative to the data directory
const COMPOUND_TABLE: &str = "frdb/frdb-drugs.tsv";

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// A name that ends up in a file name is empty or contains a path separator
    #[error("Invalid {field}: '{value}'. Names must be non-empty and must not contain '/' or '\\'")]
    InvalidName { field: &'static str, value: String },
}

/// drugcache - Fetch and cache drug, target and disease data from public APIs
#[derive(Parser, Debug)]
#[command(name = "drugcache")]
#[command(about = "Fetch and cache ChEMBL, Open Targets, gget and NCATS Inxight data")]
#[command(version)]
pub struct Cli {
    /// Refetch even when a result file already exists
    #[arg(short, long, global = true)]
    pub force: bool,

    /// Directory where result files are written
    #[arg(long, global = true, value_name = "DIR", default_value = "results")]
    pub results_dir: PathBuf,

    /// Directory holding lookup tables and the Figshare Stitcher files
    #[arg(long, global = true, value_name = "DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Gene symbol to Ensembl id table (default: <DATA_DIR>/hgnc/gene-ids.tsv)
    #[arg(long, global = true, value_name = "FILE")]
    pub gene_table: Option<PathBuf>,

    /// Compound name to UNII table (default: <DATA_DIR>/frdb/frdb-drugs.tsv)
    #[arg(long, global = true, value_name = "FILE")]
    pub compound_table: Option<PathBuf>,

    /// Use the first candidate when a lookup matches several identifiers
    #[arg(long, global = true)]
    pub first_match: bool,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// One subcommand per data source
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Target, activities and approved molecules from ChEMBL, plus a molecule image
    Chembl(ChemblArgs),
    /// Target, disease and drug data, example queries and gget queries from Open Targets
    OpenTargets(OpenTargetsArgs),
    /// Diseases and drugs for a target, as `gget opentargets` reports them
    Gget(GgetArgs),
    /// GSRS and Stitcher data from NCATS Inxight, plus the Figshare conditions
    Ncats(NcatsArgs),
    /// Every source with its default arguments
    All,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ChemblArgs {
    /// Gene symbol for which to obtain ChEMBL data
    #[arg(long, default_value = DEFAULT_GENE_SYMBOL)]
    pub gene_symbol: String,

    /// ChEMBL id of the molecule whose image is fetched
    #[arg(long, default_value = DEFAULT_DRUG_ID)]
    pub drug_id: String,

    /// Name used for the molecule image file
    #[arg(long, default_value = DEFAULT_DRUG_NAME)]
    pub drug_name: String,
}

impl Default for ChemblArgs {
    fn default() -> Self {
        Self {
            gene_symbol: DEFAULT_GENE_SYMBOL.to_string(),
            drug_id: DEFAULT_DRUG_ID.to_string(),
            drug_name: DEFAULT_DRUG_NAME.to_string(),
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct OpenTargetsArgs {
    /// Gene symbol for which to obtain Open Targets data
    #[arg(long, default_value = DEFAULT_GENE_SYMBOL)]
    pub gene_symbol: String,

    /// EFO or MONDO id of the disease
    #[arg(long, default_value = DEFAULT_DISEASE_ID)]
    pub disease_id: String,

    /// Name used for the disease file
    #[arg(long, default_value = DEFAULT_DISEASE_NAME)]
    pub disease_name: String,

    /// ChEMBL id of the drug
    #[arg(long, default_value = DEFAULT_DRUG_ID)]
    pub drug_id: String,

    /// Name used for the drug file
    #[arg(long, default_value = DEFAULT_DRUG_NAME)]
    pub drug_name: String,
}

impl Default for OpenTargetsArgs {
    fn default() -> Self {
        Self {
            gene_symbol: DEFAULT_GENE_SYMBOL.to_string(),
            disease_id: DEFAULT_DISEASE_ID.to_string(),
            disease_name: DEFAULT_DISEASE_NAME.to_string(),
            drug_id: DEFAULT_DRUG_ID.to_string(),
            drug_name: DEFAULT_DRUG_NAME.to_string(),
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct GgetArgs {
    /// Ensembl gene id for which to obtain gget data
    #[arg(long, default_value = DEFAULT_GENE_ID)]
    pub gene_id: String,
}

impl Default for GgetArgs {
    fn default() -> Self {
        Self {
            gene_id: DEFAULT_GENE_ID.to_string(),
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct NcatsArgs {
    /// Compound name for which to obtain NCATS Inxight data
    #[arg(long, default_value = DEFAULT_COMPOUND_NAME)]
    pub compound_name: String,
}

impl Default for NcatsArgs {
    fn default() -> Self {
        Self {
            compound_name: DEFAULT_COMPOUND_NAME.to_string(),
        }
    }
}

/// Configuration derived from CLI arguments for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupConfig {
    /// Where result files are written
    pub results_dir: PathBuf,
    /// Where the Figshare Stitcher files live
    pub data_dir: PathBuf,
    pub gene_table: PathBuf,
    pub compound_table: PathBuf,
    /// Refetch existing files
    pub force: bool,
    pub ambiguity: AmbiguityPolicy,
}

impl Default for StartupConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("data");
        Self {
            results_dir: PathBuf::from("results"),
            gene_table: data_dir.join(GENE_TABLE),
            compound_table: data_dir.join(COMPOUND_TABLE),
            data_dir,
            force: false,
            ambiguity: AmbiguityPolicy::Reject,
        }
    }
}

/// Checks that a name can be used as part of a file name
///
/// # Arguments
/// * `field` - Argument name used in the error message
/// * `value` - The name from the command line
///
/// # Returns
/// * `Ok(())` if the name is non-empty and has no path separator
/// * `Err(CliError::InvalidName)` otherwise
pub fn validate_name(field: &'static str, value: &str) -> Result<(), CliError> {
    if value.trim().is_empty() || value.contains('/') || value.contains('\\') {
        return Err(CliError::InvalidName {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

impl Command {
    /// Validates every name that ends up in a result file name
    pub fn validate(&self) -> Result<(), CliError> {
        match self {
            Command::Chembl(args) => {
                validate_name("gene symbol", &args.gene_symbol)?;
                validate_name("drug name", &args.drug_name)
            }
            Command::OpenTargets(args) => {
                validate_name("gene symbol", &args.gene_symbol)?;
                validate_name("disease name", &args.disease_name)?;
                validate_name("drug name", &args.drug_name)
            }
            Command::Gget(args) => validate_name("gene id", &args.gene_id),
            Command::Ncats(args) => validate_name("compound name", &args.compound_name),
            Command::All => Ok(()),
        }
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// Table paths default to fixed locations under the data directory.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with the run settings
    /// * `Err(CliError)` if the subcommand carries an unusable name
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        cli.command.validate()?;

        let ambiguity = if cli.first_match {
            AmbiguityPolicy::First
        } else {
            AmbiguityPolicy::Reject
        };

        Ok(StartupConfig {
            results_dir: cli.results_dir.clone(),
            data_dir: cli.data_dir.clone(),
            gene_table: cli
                .gene_table
                .clone()
                .unwrap_or_else(|| cli.data_dir.join(GENE_TABLE)),
            compound_table: cli
                .compound_table
                .clone()
                .unwrap_or_else(|| cli.data_dir.join(COMPOUND_TABLE)),
            force: cli.force,
            ambiguity,
        })
    }
}
