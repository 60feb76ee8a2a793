//! # loanflow-ml: loan-approval training pipeline
//!
//! A linear, file-driven pipeline that pulls raw loan records from a document
//! store, validates them against a schema declaration, preprocesses and
//! rebalances the features, trains a k-nearest-neighbour classifier and
//! persists a bundled model.
//!
//! ## Stages
//!
//! 1. **Ingestion**: feature-store snapshot plus train/test split
//! 2. **Validation**: column count and declared-column presence report
//! 3. **Transformation**: fitted column transformer and SMOTE-ENN rebalancing
//! 4. **Training**: classifier, accuracy gate, held-out metrics, model bundle
//!
//! Every run writes under `<artifact_dir>/<run_id>/`.

// Foundation
pub mod config;
pub mod error;
pub mod persistence;

// Data access
pub mod data;

// Features and model
pub mod model;
pub mod preprocess;

// Stages and orchestration
pub mod pipeline;

// Re-exports
pub use config::{PathConfig, PipelineConfig, RunContext, load_config, resolve_paths};
pub use data::{DataTable, DocumentStore, SchemaDeclaration, open_store};
pub use error::{ErrorKind, PipelineError, ResultExt, Stage};
pub use model::{ClassificationMetrics, LoanModel};
pub use pipeline::{FailedRun, PipelineRun, PipelineState, TrainingPipeline};
