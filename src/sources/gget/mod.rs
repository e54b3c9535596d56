//! `gget opentargets` view of a target
//!
//! Reproduces the record lists `gget opentargets -r diseases --json` and
//! `gget opentargets -r drugs --json` return, by querying the Open Targets
//! GraphQL API and flattening each row the way gget does.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{SourceContext, SourceError};
use crate::cache::{CacheKey, CacheOutcome};
use crate::client::FetchError;
use crate::graphql::GraphQlClient;

const DISEASES_QUERY: &str = include_str!("graphql/diseases.graphql");
const DRUGS_QUERY: &str = include_str!("graphql/drugs.graphql");

/// What to fetch for the gget view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GgetRequest {
    pub gene_id: String,
    pub gene_symbol: String,
}

/// One row of `gget opentargets -r diseases`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseRecord {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub score: f64,
}

/// One row of `gget opentargets -r drugs`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrugRecord {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub drug_type: Option<String>,
    pub action_mechanism: Option<String>,
    pub description: Option<String>,
    pub synonyms: Vec<String>,
    pub trade_names: Vec<String>,
    pub disease_id: Option<String>,
    pub disease_name: Option<String>,
    pub trial_phase: Option<f64>,
    pub trial_status: Option<String>,
    pub trial_ids: Vec<String>,
    pub approved: Option<bool>,
}

/// Document written to `<SYMBOL>-gget.json`
#[derive(Debug, Serialize)]
pub struct GgetTarget {
    pub id: String,
    pub symbol: String,
    pub diseases: Vec<DiseaseRecord>,
    pub drugs: Vec<DrugRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetData<T> {
    target: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssociatedDiseases {
    associated_diseases: Rows<DiseaseRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KnownDrugs {
    known_drugs: Option<Rows<DrugRow>>,
}

#[derive(Debug, Deserialize)]
struct Rows<T> {
    #[serde(default = "Vec::new")]
    rows: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct DiseaseRow {
    disease: NamedEntity,
    score: f64,
}

#[derive(Debug, Deserialize)]
struct NamedEntity {
    id: String,
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrugRow {
    drug: DrugDetails,
    mechanism_of_action: Option<String>,
    disease: Option<NamedEntity>,
    phase: Option<f64>,
    status: Option<String>,
    #[serde(default)]
    ct_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrugDetails {
    id: String,
    name: Option<String>,
    drug_type: Option<String>,
    description: Option<String>,
    #[serde(default)]
    synonyms: Vec<String>,
    #[serde(default)]
    trade_names: Vec<String>,
    is_approved: Option<bool>,
}

impl From<DiseaseRow> for DiseaseRecord {
    fn from(row: DiseaseRow) -> Self {
        Self {
            id: row.disease.id,
            name: row.disease.name,
            description: row.disease.description,
            score: row.score,
        }
    }
}

impl From<DrugRow> for DrugRecord {
    fn from(row: DrugRow) -> Self {
        let (disease_id, disease_name) = match row.disease {
            Some(disease) => (Some(disease.id), disease.name),
            None => (None, None),
        };
        Self {
            id: row.drug.id,
            name: row.drug.name,
            drug_type: row.drug.drug_type,
            action_mechanism: row.mechanism_of_action,
            description: row.drug.description,
            synonyms: row.drug.synonyms,
            trade_names: row.drug.trade_names,
            disease_id,
            disease_name,
            trial_phase: row.phase,
            trial_status: row.status,
            trial_ids: row.ct_ids,
            approved: row.drug.is_approved,
        }
    }
}

/// Runs `query` for `ensembl_id` and decodes the `target` member
async fn query_target<T: for<'de> Deserialize<'de>>(
    client: &GraphQlClient<'_>,
    query: &str,
    ensembl_id: &str,
) -> Result<T, SourceError> {
    let data = client.query(query, &json!({"ensemblId": ensembl_id})).await?;
    let decoded: TargetData<T> = serde_json::from_value(data).map_err(FetchError::from)?;
    decoded.target.ok_or_else(|| {
        FetchError::EmptyResult(format!("Open Targets target {}", ensembl_id)).into()
    })
}

/// Diseases associated with a target, in API order
pub async fn fetch_diseases(
    client: &GraphQlClient<'_>,
    ensembl_id: &str,
) -> Result<Vec<DiseaseRecord>, SourceError> {
    let target: AssociatedDiseases = query_target(client, DISEASES_QUERY, ensembl_id).await?;
    Ok(target
        .associated_diseases
        .rows
        .into_iter()
        .map(DiseaseRecord::from)
        .collect())
}

/// Known drugs for a target, in API order
pub async fn fetch_drugs(
    client: &GraphQlClient<'_>,
    ensembl_id: &str,
) -> Result<Vec<DrugRecord>, SourceError> {
    let target: KnownDrugs = query_target(client, DRUGS_QUERY, ensembl_id).await?;
    Ok(target
        .known_drugs
        .map(|drugs| drugs.rows.into_iter().map(DrugRecord::from).collect())
        .unwrap_or_default())
}

async fn fetch_target(ctx: SourceContext<'_>, request: &GgetRequest) -> Result<Value, SourceError> {
    let client = ctx.open_targets()?;
    let target = GgetTarget {
        id: request.gene_id.clone(),
        symbol: request.gene_symbol.clone(),
        diseases: fetch_diseases(&client, &request.gene_id).await?,
        drugs: fetch_drugs(&client, &request.gene_id).await?,
    };
    Ok(json!({ "target": target }))
}

/// Fetches and caches `<SYMBOL>-gget.json`
pub async fn run(
    ctx: SourceContext<'_>,
    request: &GgetRequest,
) -> Result<Vec<CacheOutcome>, SourceError> {
    let outcome = ctx
        .cache
        .fetch_json(
            &CacheKey::json(&request.gene_symbol, "gget"),
            &format!("gget data for {}", request.gene_symbol),
            || fetch_target(ctx, request),
        )
        .await?;
    Ok(vec![outcome])
}
