//! Pipeline configuration, run context and artifact path resolution.
//!
//! Uses `figment` for layered configuration: defaults -> `loanflow.toml` in the
//! workspace -> an explicit config file -> `LOANFLOW_` environment variables.
//! Paths of a run are derived by [`resolve_paths`] from a [`RunContext`] and the
//! configuration alone; nothing here reads global state.

use crate::error::ErrorKind;
use crate::model::knn::{KnnAlgorithm, KnnWeights};
use chrono::{DateTime, Local};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Format of the run identifier, e.g. `03_14_2026_09_26_53`.
pub const RUN_ID_FORMAT: &str = "%m_%d_%Y_%H_%M_%S";

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root directory under which every run gets its own subtree.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
    /// Schema declaration (YAML).
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,
    /// Where raw loan records are read from.
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub transformation: TransformationConfig,
    #[serde(default)]
    pub trainer: TrainerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            schema_path: default_schema_path(),
            store: StoreConfig::default(),
            ingestion: IngestionConfig::default(),
            validation: ValidationConfig::default(),
            transformation: TransformationConfig::default(),
            trainer: TrainerConfig::default(),
        }
    }
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("artifact")
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("config").join("schema.yaml")
}

/// Document store backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Directory holding `<collection>.jsonl` or `<collection>.json` files.
    Jsonl { root: PathBuf },
    /// SQLite database with one table per collection.
    Sqlite { db_path: PathBuf },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Jsonl {
            root: PathBuf::from("data"),
        }
    }
}

/// Data ingestion stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
    /// Fraction of rows held out as the test split.
    #[serde(default = "default_test_split_ratio")]
    pub test_split_ratio: f64,
    /// Raw token that stands for a missing value.
    #[serde(default = "default_missing_token")]
    pub missing_token: String,
    /// Internal identity columns removed before the snapshot is written.
    #[serde(default = "default_drop_columns")]
    pub drop_columns: Vec<String>,
    /// Seed for the train/test shuffle (entropy when unset).
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_dir_name_ingestion")]
    pub dir_name: String,
    #[serde(default = "default_feature_store_dir")]
    pub feature_store_dir: String,
    #[serde(default = "default_ingested_dir")]
    pub ingested_dir: String,
    #[serde(default = "default_feature_store_file")]
    pub feature_store_file: String,
    #[serde(default = "default_train_file")]
    pub train_file: String,
    #[serde(default = "default_test_file")]
    pub test_file: String,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            collection_name: default_collection_name(),
            test_split_ratio: default_test_split_ratio(),
            missing_token: default_missing_token(),
            drop_columns: default_drop_columns(),
            seed: None,
            dir_name: default_dir_name_ingestion(),
            feature_store_dir: default_feature_store_dir(),
            ingested_dir: default_ingested_dir(),
            feature_store_file: default_feature_store_file(),
            train_file: default_train_file(),
            test_file: default_test_file(),
        }
    }
}

fn default_collection_name() -> String {
    "Loan-Data".to_string()
}

fn default_test_split_ratio() -> f64 {
    0.2
}

fn default_missing_token() -> String {
    "na".to_string()
}

fn default_drop_columns() -> Vec<String> {
    vec!["_id".to_string()]
}

fn default_dir_name_ingestion() -> String {
    "data_ingestion".to_string()
}

fn default_feature_store_dir() -> String {
    "feature_store".to_string()
}

fn default_ingested_dir() -> String {
    "ingested".to_string()
}

fn default_feature_store_file() -> String {
    "loan_data.csv".to_string()
}

fn default_train_file() -> String {
    "train.csv".to_string()
}

fn default_test_file() -> String {
    "test.csv".to_string()
}

/// Data validation stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_dir_name_validation")]
    pub dir_name: String,
    #[serde(default = "default_report_file")]
    pub report_file: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            dir_name: default_dir_name_validation(),
            report_file: default_report_file(),
        }
    }
}

fn default_dir_name_validation() -> String {
    "data_validation".to_string()
}

fn default_report_file() -> String {
    "report.yaml".to_string()
}

/// Data transformation stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationConfig {
    /// Also rebalance the test split. Held-out metrics are then computed on
    /// resampled data.
    #[serde(default = "default_true")]
    pub resample_test_split: bool,
    /// Neighbours used by SMOTE to synthesise minority samples.
    #[serde(default = "default_smote_k")]
    pub smote_k_neighbors: usize,
    /// Neighbours used by edited nearest neighbours cleaning.
    #[serde(default = "default_enn_k")]
    pub enn_n_neighbors: usize,
    /// Seed for resampling (entropy when unset).
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_dir_name_transformation")]
    pub dir_name: String,
    #[serde(default = "default_transformed_dir")]
    pub transformed_dir: String,
    #[serde(default = "default_transformed_object_dir")]
    pub transformed_object_dir: String,
    #[serde(default = "default_transformed_train_file")]
    pub train_file: String,
    #[serde(default = "default_transformed_test_file")]
    pub test_file: String,
    #[serde(default = "default_preprocessing_file")]
    pub preprocessing_file: String,
}

impl Default for TransformationConfig {
    fn default() -> Self {
        Self {
            resample_test_split: true,
            smote_k_neighbors: default_smote_k(),
            enn_n_neighbors: default_enn_k(),
            seed: None,
            dir_name: default_dir_name_transformation(),
            transformed_dir: default_transformed_dir(),
            transformed_object_dir: default_transformed_object_dir(),
            train_file: default_transformed_train_file(),
            test_file: default_transformed_test_file(),
            preprocessing_file: default_preprocessing_file(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_smote_k() -> usize {
    5
}

fn default_enn_k() -> usize {
    3
}

fn default_dir_name_transformation() -> String {
    "data_transformation".to_string()
}

fn default_transformed_dir() -> String {
    "transformed".to_string()
}

fn default_transformed_object_dir() -> String {
    "transformed_object".to_string()
}

fn default_transformed_train_file() -> String {
    "train.json".to_string()
}

fn default_transformed_test_file() -> String {
    "test.json".to_string()
}

fn default_preprocessing_file() -> String {
    "preprocessing.json".to_string()
}

/// Model trainer stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Minimum accuracy on the training split for the model to be kept.
    #[serde(default = "default_expected_accuracy")]
    pub expected_accuracy: f64,
    #[serde(default = "default_n_neighbors")]
    pub n_neighbors: usize,
    #[serde(default)]
    pub weights: KnnWeights,
    #[serde(default)]
    pub algorithm: KnnAlgorithm,
    #[serde(default = "default_dir_name_trainer")]
    pub dir_name: String,
    #[serde(default = "default_trained_model_dir")]
    pub trained_model_dir: String,
    #[serde(default = "default_model_file")]
    pub model_file: String,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            expected_accuracy: default_expected_accuracy(),
            n_neighbors: default_n_neighbors(),
            weights: KnnWeights::default(),
            algorithm: KnnAlgorithm::default(),
            dir_name: default_dir_name_trainer(),
            trained_model_dir: default_trained_model_dir(),
            model_file: default_model_file(),
        }
    }
}

fn default_expected_accuracy() -> f64 {
    0.6
}

fn default_n_neighbors() -> usize {
    3
}

fn default_dir_name_trainer() -> String {
    "model_trainer".to_string()
}

fn default_trained_model_dir() -> String {
    "trained_model".to_string()
}

fn default_model_file() -> String {
    "model.json".to_string()
}

impl PipelineConfig {
    /// Reject values no stage can work with.
    pub fn validate(&self) -> Result<(), ErrorKind> {
        let ratio = self.ingestion.test_split_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(ErrorKind::config(format!(
                "ingestion.test_split_ratio must be in (0, 1), got {ratio}"
            )));
        }
        let expected = self.trainer.expected_accuracy;
        if !(0.0..=1.0).contains(&expected) {
            return Err(ErrorKind::config(format!(
                "trainer.expected_accuracy must be in [0, 1], got {expected}"
            )));
        }
        if self.trainer.n_neighbors == 0 {
            return Err(ErrorKind::config("trainer.n_neighbors must be at least 1"));
        }
        if self.transformation.enn_n_neighbors == 0 {
            return Err(ErrorKind::config(
                "transformation.enn_n_neighbors must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Load the layered configuration.
///
/// `workspace` contributes `<workspace>/loanflow.toml` when it exists; `file`
/// is an explicit config file that must exist. Environment variables such as
/// `LOANFLOW_TRAINER__N_NEIGHBORS=5` override both.
pub fn load_config(
    workspace: Option<&Path>,
    file: Option<&Path>,
) -> Result<PipelineConfig, ErrorKind> {
    let mut figment = Figment::from(Serialized::defaults(PipelineConfig::default()));

    if let Some(ws) = workspace {
        let ws_config = ws.join("loanflow.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(file) = file {
        if !file.exists() {
            return Err(ErrorKind::config(format!(
                "configuration file not found: {}",
                file.display()
            )));
        }
        figment = figment.merge(Toml::file(file));
    }

    figment = figment.merge(Env::prefixed("LOANFLOW_").split("__"));

    let config: PipelineConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Identity of one pipeline run, fixed when the run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Local>,
    pub artifact_root: PathBuf,
}

impl RunContext {
    /// Start a run keyed by the current local time.
    pub fn new(artifact_root: impl Into<PathBuf>) -> Self {
        let started_at = Local::now();
        Self {
            run_id: started_at.format(RUN_ID_FORMAT).to_string(),
            started_at,
            artifact_root: artifact_root.into(),
        }
    }

    /// Start a run with a caller-chosen identifier.
    pub fn with_run_id(artifact_root: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Local::now(),
            artifact_root: artifact_root.into(),
        }
    }

    /// Directory holding every artifact of this run.
    pub fn run_dir(&self) -> PathBuf {
        self.artifact_root.join(&self.run_id)
    }
}

/// Every file location used by one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathConfig {
    pub run_dir: PathBuf,
    pub ingestion: IngestionPaths,
    pub validation: ValidationPaths,
    pub transformation: TransformationPaths,
    pub trainer: TrainerPaths,
    pub manifest_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionPaths {
    pub dir: PathBuf,
    pub ingested_dir: PathBuf,
    pub feature_store_path: PathBuf,
    pub training_path: PathBuf,
    pub testing_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPaths {
    pub dir: PathBuf,
    pub report_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationPaths {
    pub dir: PathBuf,
    pub transformed_dir: PathBuf,
    pub transformed_train_path: PathBuf,
    pub transformed_test_path: PathBuf,
    pub transformed_object_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerPaths {
    pub dir: PathBuf,
    pub trained_model_path: PathBuf,
}

/// Derive the artifact layout of a run. Pure: same inputs, same paths.
pub fn resolve_paths(ctx: &RunContext, config: &PipelineConfig) -> PathConfig {
    let run_dir = ctx.run_dir();

    let ing = &config.ingestion;
    let ingestion_dir = run_dir.join(&ing.dir_name);
    let ingested_dir = ingestion_dir.join(&ing.ingested_dir);
    let ingestion = IngestionPaths {
        feature_store_path: ingestion_dir
            .join(&ing.feature_store_dir)
            .join(&ing.feature_store_file),
        training_path: ingested_dir.join(&ing.train_file),
        testing_path: ingested_dir.join(&ing.test_file),
        ingested_dir,
        dir: ingestion_dir,
    };

    let validation_dir = run_dir.join(&config.validation.dir_name);
    let validation = ValidationPaths {
        report_path: validation_dir.join(&config.validation.report_file),
        dir: validation_dir,
    };

    let tr = &config.transformation;
    let transformation_dir = run_dir.join(&tr.dir_name);
    let transformed_dir = transformation_dir.join(&tr.transformed_dir);
    let transformation = TransformationPaths {
        transformed_train_path: transformed_dir.join(&tr.train_file),
        transformed_test_path: transformed_dir.join(&tr.test_file),
        transformed_object_path: transformation_dir
            .join(&tr.transformed_object_dir)
            .join(&tr.preprocessing_file),
        transformed_dir,
        dir: transformation_dir,
    };

    let trainer_dir = run_dir.join(&config.trainer.dir_name);
    let trainer = TrainerPaths {
        trained_model_path: trainer_dir
            .join(&config.trainer.trained_model_dir)
            .join(&config.trainer.model_file),
        dir: trainer_dir,
    };

    PathConfig {
        manifest_path: run_dir.join("run_manifest.json"),
        run_dir,
        ingestion,
        validation,
        transformation,
        trainer,
    }
}
