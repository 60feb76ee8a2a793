//! Shared fixtures: a synthetic loan collection and its schema declaration.

#![allow(dead_code)]

use loanflow_ml::SchemaDeclaration;
use loanflow_ml::config::PipelineConfig;
use loanflow_ml::data::{Document, InMemoryDocumentStore};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

pub const COLLECTION: &str = "Loan-Data";

pub const SCHEMA_YAML: &str = r#"
columns:
  - person_age: float
  - person_gender: category
  - person_education: category
  - person_income: float
  - person_emp_exp: int
  - person_home_ownership: category
  - loan_amnt: float
  - loan_intent: category
  - credit_score: int
  - loan_status: int
numerical_columns:
  - person_age
  - person_income
  - person_emp_exp
  - loan_amnt
  - credit_score
  - loan_status
categorical_columns:
  - person_gender
  - person_education
  - person_home_ownership
  - loan_intent
oh_columns:
  - person_gender
  - person_home_ownership
  - loan_intent
or_columns:
  - person_education
transform_features:
  - person_income
  - loan_amnt
num_features:
  - person_age
  - person_emp_exp
  - credit_score
"#;

pub fn schema() -> SchemaDeclaration {
    SchemaDeclaration::from_yaml(SCHEMA_YAML).unwrap()
}

fn pick<'a>(rng: &mut StdRng, options: &[&'a str]) -> &'a str {
    options[rng.gen_range(0..options.len())]
}

/// `n` loan records; roughly `positive_share` of them are approved (label 1).
/// Approved loans have clearly lower credit scores and incomes.
pub fn loan_documents(n: usize, positive_share: f64, seed: u64) -> Vec<Document> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let approved = rng.gen_range(0.0..1.0) < positive_share;
            let (income, score) = if approved {
                (rng.gen_range(18_000.0..45_000.0), rng.gen_range(450..590))
            } else {
                (rng.gen_range(60_000.0..160_000.0), rng.gen_range(660..820))
            };
            let home = if i % 17 == 0 {
                "na"
            } else {
                pick(&mut rng, &["RENT", "OWN", "MORTGAGE"])
            };
            let status = i32::from(approved);
            let doc = json!({
                "_id": format!("{i:05}"),
                "person_age": rng.gen_range(21.0..65.0),
                "person_gender": pick(&mut rng, &["male", "female"]),
                "person_education": pick(&mut rng, &["High School", "Associate", "Bachelor", "Master"]),
                "person_income": income,
                "person_emp_exp": rng.gen_range(0..30),
                "person_home_ownership": home,
                "loan_amnt": rng.gen_range(1_000.0..30_000.0),
                "loan_intent": pick(&mut rng, &["EDUCATION", "MEDICAL", "VENTURE", "PERSONAL"]),
                "credit_score": score,
                "loan_status": status,
            });
            match doc {
                Value::Object(map) => map,
                _ => unreachable!(),
            }
        })
        .collect()
}

pub fn store_with(documents: Vec<Document>) -> InMemoryDocumentStore {
    let mut store = InMemoryDocumentStore::new();
    store.insert(COLLECTION, documents);
    store
}

/// Default configuration with fixed seeds and artifacts under `root`.
pub fn seeded_config(root: &std::path::Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.artifact_dir = root.to_path_buf();
    config.ingestion.seed = Some(42);
    config.transformation.seed = Some(7);
    config
}
