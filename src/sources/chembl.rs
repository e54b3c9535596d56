//! ChEMBL REST API source
//!
//! For a gene symbol, collects the human target, its bioactivities, and the
//! approved (phase 4) molecules among those activities into one document.
//! Separately stores the SVG depiction of one drug.
//!
//! API docs: https://chembl.gitbook.io/chembl-interface-documentation/web-resources/chembl-api

use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{SourceContext, SourceError};
use crate::cache::{CacheKey, CacheOutcome};
use crate::client::{build_url, FetchError};

/// Organism the target search is restricted to
const TARGET_ORGANISM: &str = "Homo sapiens";

/// Target fields kept in the document
const TARGET_FIELDS: &str = "organism,target_chembl_id";

/// Page size for activity and molecule listings; later pages follow `page_meta.next`
const PAGE_LIMIT: &str = "1000";

/// Molecule ids per `molecule_chembl_id__in` request
const MOLECULE_BATCH_SIZE: usize = 50;

/// What to fetch from ChEMBL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChemblRequest {
    pub gene_symbol: String,
    pub gene_id: String,
    pub drug_id: String,
    pub drug_name: String,
}

/// Document written to `<SYMBOL>-chembl.json`
#[derive(Debug, Serialize)]
pub struct ChemblBundle {
    pub gene_symbol: String,
    pub gene_id: String,
    pub target: Value,
    pub activity: Vec<Value>,
    pub molecule: Vec<Value>,
}

/// Thin client over the ChEMBL REST resources used here
pub struct ChemblClient<'a> {
    ctx: SourceContext<'a>,
}

impl<'a> ChemblClient<'a> {
    pub fn new(ctx: SourceContext<'a>) -> Self {
        Self { ctx }
    }

    fn listing_url(&self, resource: &str, params: &[(&str, &str)]) -> Result<Url, SourceError> {
        let path = format!("{}.json", resource);
        Ok(build_url(&self.ctx.endpoints.chembl, &path, params)?)
    }

    /// One page of a listing, plus the `page_meta.next` link if there is one
    async fn page(
        &self,
        url: &Url,
        resource: &str,
        field: &str,
    ) -> Result<(Vec<Value>, Option<String>), SourceError> {
        let mut response = self.ctx.get_json(url).await?;
        let next = response
            .pointer("/page_meta/next")
            .and_then(Value::as_str)
            .map(String::from);
        match response.get_mut(field).map(Value::take) {
            Some(Value::Array(items)) => Ok((items, next)),
            _ => Err(FetchError::MissingField(format!("{}.{}", resource, field)).into()),
        }
    }

    /// Every item of a listing, following `page_meta.next` until it is null
    async fn list_all(
        &self,
        resource: &str,
        params: &[(&str, &str)],
        field: &str,
    ) -> Result<Vec<Value>, SourceError> {
        let mut url = self.listing_url(resource, params)?;
        let mut items = Vec::new();
        loop {
            let (page, next) = self.page(&url, resource, field).await?;
            items.extend(page);
            let Some(next) = next else {
                return Ok(items);
            };
            let next_url = url
                .join(&next)
                .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", next, e)))?;
            if next_url == url {
                return Err(FetchError::InvalidUrl(format!("{} links to itself", next)).into());
            }
            debug!("Following ChEMBL {} page {}", resource, next_url);
            url = next_url;
        }
    }

    /// First human target whose synonyms contain `gene_symbol`
    pub async fn fetch_target(&self, gene_symbol: &str) -> Result<Value, SourceError> {
        let url = self.listing_url(
            "target",
            &[
                ("target_synonym__icontains", gene_symbol),
                ("organism__exact", TARGET_ORGANISM),
                ("only", TARGET_FIELDS),
            ],
        )?;
        let (targets, _) = self.page(&url, "target", "targets").await?;
        targets
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::EmptyResult(format!("ChEMBL target {}", gene_symbol)).into())
    }

    /// Bioactivities recorded against a target
    pub async fn fetch_activities(
        &self,
        target_chembl_id: &str,
    ) -> Result<Vec<Value>, SourceError> {
        self.list_all(
            "activity",
            &[("target_chembl_id", target_chembl_id), ("limit", PAGE_LIMIT)],
            "activities",
        )
        .await
    }

    /// Phase 4 molecules among `molecule_chembl_ids`
    pub async fn fetch_approved_molecules(
        &self,
        molecule_chembl_ids: &[String],
    ) -> Result<Vec<Value>, SourceError> {
        let mut molecules = Vec::new();
        for batch in molecule_chembl_ids.chunks(MOLECULE_BATCH_SIZE) {
            let ids = batch.join(",");
            let page = self
                .list_all(
                    "molecule",
                    &[
                        ("molecule_chembl_id__in", ids.as_str()),
                        ("max_phase", "4"),
                        ("limit", PAGE_LIMIT),
                    ],
                    "molecules",
                )
                .await?;
            molecules.extend(page);
        }
        Ok(molecules)
    }

    /// Target, activities and approved molecules for one gene
    pub async fn fetch_bundle(
        &self,
        gene_symbol: &str,
        gene_id: &str,
    ) -> Result<ChemblBundle, SourceError> {
        info!("Getting ChEMBL target data for {}", gene_symbol);
        let target = self.fetch_target(gene_symbol).await?;
        let target_chembl_id = target
            .get("target_chembl_id")
            .and_then(Value::as_str)
            .ok_or_else(|| FetchError::MissingField("target_chembl_id".to_string()))?
            .to_string();

        info!("Getting ChEMBL activity data for {}", gene_symbol);
        let activity = self.fetch_activities(&target_chembl_id).await?;

        info!("Getting ChEMBL molecule data for {}", gene_symbol);
        let molecule_ids = distinct_molecule_ids(&activity);
        let molecule = self.fetch_approved_molecules(&molecule_ids).await?;

        Ok(ChemblBundle {
            gene_symbol: gene_symbol.to_string(),
            gene_id: gene_id.to_string(),
            target,
            activity,
            molecule,
        })
    }

    /// SVG depiction of a molecule
    pub async fn fetch_image(&self, chembl_id: &str) -> Result<String, SourceError> {
        let url = build_url(
            &self.ctx.endpoints.chembl,
            &format!("image/{}.svg", chembl_id),
            &[],
        )?;
        Ok(self.ctx.transport.get(&url).await?)
    }
}

/// Molecule ids referenced by activities, first occurrence order, no repeats
fn distinct_molecule_ids(activities: &[Value]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in activities
        .iter()
        .filter_map(|a| a.get("molecule_chembl_id").and_then(Value::as_str))
    {
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

/// Fetches and caches the gene bundle and the drug image
pub async fn run(
    ctx: SourceContext<'_>,
    request: &ChemblRequest,
) -> Result<Vec<CacheOutcome>, SourceError> {
    let client = ChemblClient::new(ctx);

    let bundle = ctx
        .cache
        .fetch_json(
            &CacheKey::json(&request.gene_symbol, "chembl"),
            &format!("ChEMBL data for {}", request.gene_symbol),
            || client.fetch_bundle(&request.gene_symbol, &request.gene_id),
        )
        .await?;

    let image = ctx
        .cache
        .fetch_text(
            &CacheKey::svg(&request.drug_name, "chembl"),
            &format!("ChEMBL SVG for {}", request.drug_name),
            || client.fetch_image(&request.drug_id),
        )
        .await?;

    Ok(vec![bundle, image])
}
