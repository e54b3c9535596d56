//! Static Open Targets GraphQL documents
//!
//! See: https://api.platform.opentargets.org/api/v4/graphql/browser

use serde_json::json;

use crate::graphql::QueryDefinition;

/// Target attributes, associated diseases and known drugs for `$ensemblId`
pub const TARGET: &str = include_str!("graphql/target.graphql");

/// Disease attributes and associations for `$efoId`
pub const DISEASE: &str = include_str!("graphql/disease.graphql");

/// Drug attributes, warnings and indications for `$chemblId`
pub const DRUG: &str = include_str!("graphql/drug.graphql");

/// Example queries from the Platform documentation, with fixed variables
pub fn example_queries() -> Vec<QueryDefinition> {
    vec![
        QueryDefinition {
            name: "associatedTargets",
            purpose: "Find targets associated with a specific disease or phenotype",
            variables: json!({"efoId": "MONDO_0004979"}),
            query_string: include_str!("graphql/samples/associated_targets.graphql"),
        },
        QueryDefinition {
            name: "associatedDiseases",
            purpose: "Find diseases and phenotypes associated with a specific target",
            variables: json!({"ensemblId": "ENSG00000169252"}),
            query_string: include_str!("graphql/samples/associated_diseases.graphql"),
        },
        QueryDefinition {
            name: "targetDiseaseEvidence",
            purpose: "Explore evidence that supports a specific target-disease association",
            variables: json!({
                "efoId": "MONDO_0004979",
                "datasourceIds": ["chembl"],
                "ensemblIds": ["ENSG00000169252"]
            }),
            query_string: include_str!("graphql/samples/target_disease_evidence.graphql"),
        },
        QueryDefinition {
            name: "targetAnnotation",
            purpose: "Find tractability and safety information for a specific target",
            variables: json!({"ensemblId": "ENSG00000169252"}),
            query_string: include_str!("graphql/samples/target_annotation.graphql"),
        },
        QueryDefinition {
            name: "diseaseAnnotation",
            purpose: "Find clinical signs and symptoms for a specific disease",
            variables: json!({"efoId": "MONDO_0004979"}),
            query_string: include_str!("graphql/samples/disease_annotation.graphql"),
        },
        QueryDefinition {
            name: "GWASStudiesQuery",
            purpose: "GWAS studies associated with a specified disease",
            variables: json!({"diseaseIds": ["MONDO_0004979"]}),
            query_string: include_str!("graphql/samples/gwas_studies_query.graphql"),
        },
        QueryDefinition {
            name: "drugApprovalWithdrawnWarningData",
            purpose: "Find approval status and withdrawn and black-box warning for a specific drug",
            variables: json!({"chemblId": "CHEMBL714"}),
            query_string: include_str!(
                "graphql/samples/drug_approval_withdrawn_warning_data.graphql"
            ),
        },
        QueryDefinition {
            name: "QTLCredibleSetsQuery",
            purpose: "Credible sets from quantitative trait loci associated with molecular traits \
                      containing a specified variant",
            variables: json!({"variantId": "1_152312600_CACTG_C"}),
            query_string: include_str!("graphql/samples/qtl_credible_sets_query.graphql"),
        },
        QueryDefinition {
            name: "SharedTraitStudiesQuery",
            purpose: "Information about a specified study",
            variables: json!({
                "studyId": "gtex_exon_stomach_ensg00000143376_14_1_151693484_151693543"
            }),
            query_string: include_str!("graphql/samples/shared_trait_studies_query.graphql"),
        },
        QueryDefinition {
            name: "GWASColocQuery",
            purpose: "Colocalisation metrics for overlapping credible sets from GWAS studies",
            variables: json!({"studyLocusId": "4fea74b7dcc65149b658a71b5c5fa0f3"}),
            query_string: include_str!("graphql/samples/gwas_coloc_query.graphql"),
        },
    ]
}

/// Extended versions of the `gget opentargets` resources for one target
pub fn gget_queries(ensembl_id: &str) -> Vec<QueryDefinition> {
    let target_query = |name, purpose, query_string| QueryDefinition {
        name,
        purpose,
        variables: json!({"ensemblId": ensembl_id}),
        query_string,
    };

    vec![
        target_query(
            "target",
            "Obtain target attributes",
            include_str!("graphql/gget/target.graphql"),
        ),
        target_query(
            "diseases",
            "Duplicate and extend gget opentargets -r diseases command",
            include_str!("graphql/gget/diseases.graphql"),
        ),
        target_query(
            "drugs",
            "Duplicate and extend gget opentargets -r drugs command",
            include_str!("graphql/gget/drugs.graphql"),
        ),
        target_query(
            "interactions",
            "Duplicate and extend gget opentargets -r interactions command",
            include_str!("graphql/gget/interactions.graphql"),
        ),
        target_query(
            "pharmacogenetics",
            "Duplicate and extend gget opentargets -r pharmacogenetics command",
            include_str!("graphql/gget/pharmacogenetics.graphql"),
        ),
        target_query(
            "tractability",
            "Duplicate and extend gget opentargets -r tractability command",
            include_str!("graphql/gget/tractability.graphql"),
        ),
        target_query(
            "expression",
            "Duplicate and extend gget opentargets -r expression command",
            include_str!("graphql/gget/expression.graphql"),
        ),
        target_query(
            "depmap",
            "Duplicate and extend gget opentargets -r depmap command",
            include_str!("graphql/gget/depmap.graphql"),
        ),
    ]
}
