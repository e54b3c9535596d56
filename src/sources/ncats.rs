//! NCATS Inxight Drugs source
//!
//! Fetches the GSRS and Stitcher substance records for a UNII, copies the
//! Stitcher record downloaded from Figshare into the results directory and
//! decodes its base64 `conditions` field.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::{SourceContext, SourceError};
use crate::cache::{CacheKey, CacheOutcome};
use crate::client::{build_url, FetchError};

/// JSON pointer to the encoded conditions in a Stitcher record
const CONDITIONS_POINTER: &str = "/sgroup/properties/conditions/0/value";

/// What to fetch from NCATS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NcatsRequest {
    /// Upper-cased compound name, used in file names
    pub compound_name: String,
    pub unii: String,
    /// Directory holding `stitcher_json_files/`
    pub data_dir: PathBuf,
}

impl NcatsRequest {
    /// Location of the Figshare Stitcher record for this UNII
    pub fn figshare_path(&self) -> PathBuf {
        self.data_dir
            .join("stitcher_json_files")
            .join(format!("{}.json", self.unii))
    }
}

/// Decodes the base64 `conditions` field of a Stitcher record into JSON
///
/// # Arguments
/// * `record` - A Stitcher record as downloaded from Figshare
///
/// # Returns
/// * `Ok(Value)` - The decoded conditions document
/// * `Err(SourceError)` - If the field is missing, not base64, not UTF-8 or not JSON
pub fn decode_conditions(record: &Value) -> Result<Value, SourceError> {
    let encoded = record
        .pointer(CONDITIONS_POINTER)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            FetchError::MissingField("sgroup.properties.conditions[0].value".to_string())
        })?;
    // Wrapped values carry line breaks
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let decoded = String::from_utf8(STANDARD.decode(compact)?)?;
    let conditions = serde_json::from_str(&decoded).map_err(|source| SourceError::Document {
        path: "conditions".to_string(),
        source,
    })?;
    Ok(conditions)
}

fn read_record(path: &Path) -> Result<Value, SourceError> {
    let content = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| SourceError::Document {
        path: path.display().to_string(),
        source,
    })
}

/// Fetches, copies and decodes every NCATS document for the request
pub async fn run(
    ctx: SourceContext<'_>,
    request: &NcatsRequest,
) -> Result<Vec<CacheOutcome>, SourceError> {
    let name = &request.compound_name;
    let substance = format!("substances({})", request.unii);
    let mut outcomes = Vec::new();

    let gsrs_url = build_url(&ctx.endpoints.ncats, &substance, &[("view", "full")])?;
    outcomes.push(
        ctx.cache
            .fetch_json(
                &CacheKey::json(name, "ncats-gsrs"),
                &format!("NCATS GSRS data for {}", name),
                || ctx.get_json(&gsrs_url),
            )
            .await?,
    );

    let stitcher_url = build_url(
        &ctx.endpoints.ncats,
        &format!("{}/@additional", substance),
        &[("view", "full")],
    )?;
    outcomes.push(
        ctx.cache
            .fetch_json(
                &CacheKey::json(name, "ncats-stitcher"),
                &format!("NCATS Stitcher data for {}", name),
                || ctx.get_json(&stitcher_url),
            )
            .await?,
    );

    let figshare_path = request.figshare_path();
    outcomes.push(
        ctx.cache
            .copy_file(&figshare_path, &CacheKey::json(name, "ncats-figshare"))?,
    );

    outcomes.push(
        ctx.cache
            .fetch_json(
                &CacheKey::json(name, "ncats-conditions"),
                &format!("decoded NCATS Figshare conditions field for {}", name),
                || async {
                    read_record(&figshare_path).and_then(|record| decode_conditions(&record))
                },
            )
            .await?,
    );

    Ok(outcomes)
}
