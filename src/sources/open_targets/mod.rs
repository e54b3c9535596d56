//! Open Targets Platform GraphQL source
//!
//! Stores the `data` of the target, disease and drug entity queries, then
//! runs the documentation example queries and the extended gget queries,
//! each written as `{purpose, variables, data}`.

pub mod queries;

use serde_json::json;

use super::{SourceContext, SourceError};
use crate::cache::{CacheKey, CacheOutcome};
use crate::graphql::QueryDefinition;

/// What to fetch from Open Targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTargetsRequest {
    pub gene_symbol: String,
    pub gene_id: String,
    pub disease_id: String,
    pub disease_name: String,
    pub drug_id: String,
    pub drug_name: String,
}

/// Fetches and caches every Open Targets document for the request
pub async fn run(
    ctx: SourceContext<'_>,
    request: &OpenTargetsRequest,
) -> Result<Vec<CacheOutcome>, SourceError> {
    let client = ctx.open_targets()?;
    let mut outcomes = Vec::new();

    let entities = [
        (
            CacheKey::json(&request.gene_symbol, "open-targets-target"),
            format!("Open Targets target data for {}", request.gene_symbol),
            queries::TARGET,
            json!({"ensemblId": request.gene_id}),
        ),
        (
            CacheKey::json(&request.disease_name, "open-targets-disease"),
            format!("Open Targets disease data for {}", request.disease_name),
            queries::DISEASE,
            json!({"efoId": request.disease_id}),
        ),
        (
            CacheKey::json(&request.drug_name, "open-targets-drug"),
            format!("Open Targets drug data for {}", request.drug_name),
            queries::DRUG,
            json!({"chemblId": request.drug_id}),
        ),
    ];
    for (key, label, query_string, variables) in &entities {
        let outcome = ctx
            .cache
            .fetch_json(key, label, || async {
                client
                    .query(query_string, variables)
                    .await
                    .map_err(SourceError::from)
            })
            .await?;
        outcomes.push(outcome);
    }

    for definition in queries::example_queries() {
        let key = CacheKey::json("open-targets", format!("example-{}", definition.name));
        let label = format!("Open Targets example query {}", definition.name);
        outcomes.push(run_definition(ctx, &key, &label, &definition).await?);
    }

    for definition in queries::gget_queries(&request.gene_id) {
        let key = CacheKey::json(
            &request.gene_symbol,
            format!("open-targets-gget-{}", definition.name),
        );
        let label = format!(
            "Open Targets gget query {} for {}",
            definition.name, request.gene_symbol
        );
        outcomes.push(run_definition(ctx, &key, &label, &definition).await?);
    }

    Ok(outcomes)
}

async fn run_definition(
    ctx: SourceContext<'_>,
    key: &CacheKey,
    label: &str,
    definition: &QueryDefinition,
) -> Result<CacheOutcome, SourceError> {
    let client = ctx.open_targets()?;
    ctx.cache
        .fetch_json(key, label, || async {
            client.run(definition).await.map_err(SourceError::from)
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheManager, CacheStatus};
    use crate::client::testing::StubTransport;
    use crate::client::Endpoints;
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    fn request() -> OpenTargetsRequest {
        OpenTargetsRequest {
            gene_symbol: "ADRB2".to_string(),
            gene_id: "ENSG00000169252".to_string(),
            disease_id: "MONDO_0004979".to_string(),
            disease_name: "asthma".to_string(),
            drug_id: "CHEMBL714".to_string(),
            drug_name: "ALBUTEROL".to_string(),
        }
    }

    /// Every POST gets the same body; the files differ only by name
    fn stub() -> StubTransport {
        StubTransport::new().on_post("query", r#"{"data": {"answer": 42}}"#)
    }

    fn read(path: &std::path::Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_run_writes_entity_documents() {
        let stub = stub();
        let temp_dir = TempDir::new().unwrap();
        let cache = CacheManager::with_dir(temp_dir.path().to_path_buf());
        let endpoints = Endpoints::default();

        run(SourceContext::new(&stub, &cache, &endpoints), &request())
            .await
            .unwrap();

        for name in [
            "ADRB2-open-targets-target.json",
            "asthma-open-targets-disease.json",
            "ALBUTEROL-open-targets-drug.json",
        ] {
            assert_eq!(read(&temp_dir.path().join(name)), json!({"answer": 42}), "{}", name);
        }
    }

    #[tokio::test]
    async fn test_run_writes_query_envelopes() {
        let stub = stub();
        let temp_dir = TempDir::new().unwrap();
        let cache = CacheManager::with_dir(temp_dir.path().to_path_buf());
        let endpoints = Endpoints::default();

        let outcomes = run(SourceContext::new(&stub, &cache, &endpoints), &request())
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3 + 10 + 8);

        let example = read(
            &temp_dir
                .path()
                .join("open-targets-example-drugApprovalWithdrawnWarningData.json"),
        );
        assert_eq!(
            example["purpose"],
            "Find approval status and withdrawn and black-box warning for a specific drug"
        );
        assert_eq!(example["variables"], json!({"chemblId": "CHEMBL714"}));
        assert_eq!(example["data"], json!({"answer": 42}));

        let gget = read(&temp_dir.path().join("ADRB2-open-targets-gget-depmap.json"));
        assert_eq!(gget["variables"], json!({"ensemblId": "ENSG00000169252"}));
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let stub = stub();
        let temp_dir = TempDir::new().unwrap();
        let cache = CacheManager::with_dir(temp_dir.path().to_path_buf());
        let endpoints = Endpoints::default();
        let ctx = SourceContext::new(&stub, &cache, &endpoints);

        run(ctx, &request()).await.unwrap();
        let calls_after_first = stub.call_count();
        let target_path = temp_dir.path().join("ADRB2-open-targets-target.json");
        let before = fs::read(&target_path).unwrap();

        let outcomes = run(ctx, &request()).await.unwrap();

        assert_eq!(stub.call_count(), calls_after_first);
        assert!(outcomes.iter().all(|o| o.status == CacheStatus::Hit));
        assert_eq!(fs::read(&target_path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_force_reissues_every_query() {
        let stub = stub();
        let temp_dir = TempDir::new().unwrap();
        let endpoints = Endpoints::default();
        let cache = CacheManager::with_dir(temp_dir.path().to_path_buf());
        run(SourceContext::new(&stub, &cache, &endpoints), &request())
            .await
            .unwrap();

        let forced = cache.with_force(true);
        let outcomes = run(SourceContext::new(&stub, &forced, &endpoints), &request())
            .await
            .unwrap();

        assert_eq!(stub.call_count(), 2 * (3 + 10 + 8));
        assert!(outcomes.iter().all(|o| o.status == CacheStatus::Fetched));
    }

    #[tokio::test]
    async fn test_graphql_error_aborts_run() {
        let stub = StubTransport::new().on_post("query", r#"{"errors": [{"message": "boom"}]}"#);
        let temp_dir = TempDir::new().unwrap();
        let cache = CacheManager::with_dir(temp_dir.path().to_path_buf());
        let endpoints = Endpoints::default();

        let err = run(SourceContext::new(&stub, &cache, &endpoints), &request())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("boom"));
        assert_eq!(stub.call_count(), 1, "Run should stop at the first failure");
    }
}
