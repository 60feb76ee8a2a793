//! The four-stage training pipeline and its orchestrator.
//!
//! Stages run strictly in order: ingestion, validation, transformation,
//! training. Each consumes the artifact of the previous stage. A failed
//! validation is reported by the transformation stage, which refuses to run.

pub mod artifact;
pub mod ingestion;
pub mod trainer;
pub mod transformation;
pub mod validation;

pub use artifact::{
    IngestionArtifact, ManifestEntry, ModelTrainerArtifact, RunManifest, TransformationArtifact,
    ValidationArtifact, ValidationReport,
};
pub use ingestion::DataIngestion;
pub use trainer::ModelTrainer;
pub use transformation::DataTransformation;
pub use validation::{
    DataValidation, MissingColumns, all_declared_columns_present, count_columns_match,
    missing_declared_columns,
};

use crate::config::{PipelineConfig, RunContext, resolve_paths};
use crate::data::schema::SchemaDeclaration;
use crate::data::store::DocumentStore;
use crate::error::{ErrorKind, PipelineError, ResultExt, Stage};
use crate::persistence::save_object;
use chrono::Local;
use serde::{Deserialize, Serialize};

/// Progress of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Pending,
    Ingested,
    Validated,
    Transformed,
    Trained,
    Aborted,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub run_id: String,
    /// Every state the run passed through, starting with `Pending`.
    pub states: Vec<PipelineState>,
    pub trainer: ModelTrainerArtifact,
}

/// A run that stopped before producing a model.
#[derive(Debug)]
pub struct FailedRun {
    pub states: Vec<PipelineState>,
    pub error: PipelineError,
}

impl FailedRun {
    pub fn last_state(&self) -> PipelineState {
        self.states.last().copied().unwrap_or(PipelineState::Pending)
    }
}

impl std::fmt::Display for FailedRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (state: {:?})", self.error, self.last_state())
    }
}

impl std::error::Error for FailedRun {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

pub struct TrainingPipeline {
    config: PipelineConfig,
    schema: SchemaDeclaration,
    store: Box<dyn DocumentStore>,
}

impl TrainingPipeline {
    pub fn new(
        config: PipelineConfig,
        schema: SchemaDeclaration,
        store: Box<dyn DocumentStore>,
    ) -> Self {
        Self {
            config,
            schema,
            store,
        }
    }

    /// Execute every stage for the run described by `ctx`. Files written
    /// before a failure are left in place.
    pub fn run(&self, ctx: &RunContext) -> Result<PipelineRun, FailedRun> {
        let mut states = vec![PipelineState::Pending];
        match self.run_stages(ctx, &mut states) {
            Ok(trainer) => Ok(PipelineRun {
                run_id: ctx.run_id.clone(),
                states,
                trainer,
            }),
            Err(error) => {
                if matches!(error.kind(), ErrorKind::ValidationFailed(_)) {
                    states.push(PipelineState::Aborted);
                }
                tracing::error!(run_id = %ctx.run_id, error = %error, "Pipeline run failed");
                Err(FailedRun { states, error })
            }
        }
    }

    fn run_stages(
        &self,
        ctx: &RunContext,
        states: &mut Vec<PipelineState>,
    ) -> Result<ModelTrainerArtifact, PipelineError> {
        tracing::info!(run_id = %ctx.run_id, dir = %ctx.run_dir().display(), "Starting pipeline run");

        let ingestion = DataIngestion::new(ctx, &self.config, self.store.as_ref()).run()?;
        states.push(PipelineState::Ingested);

        let validation = DataValidation::new(ctx, &self.config, &self.schema, &ingestion).run()?;
        states.push(PipelineState::Validated);

        let transformation =
            DataTransformation::new(ctx, &self.config, &self.schema, &ingestion, &validation)
                .run()?;
        states.push(PipelineState::Transformed);

        let trainer = ModelTrainer::new(ctx, &self.config, &transformation).run()?;
        states.push(PipelineState::Trained);

        self.write_manifest(ctx, &ingestion, &validation, &transformation, &trainer)
            .in_stage(Stage::Training)?;
        tracing::info!(
            run_id = %ctx.run_id,
            accuracy = trainer.metrics.accuracy,
            model = %trainer.trained_model_path.display(),
            "Pipeline run complete"
        );
        Ok(trainer)
    }

    fn write_manifest(
        &self,
        ctx: &RunContext,
        ingestion: &IngestionArtifact,
        validation: &ValidationArtifact,
        transformation: &TransformationArtifact,
        trainer: &ModelTrainerArtifact,
    ) -> Result<(), ErrorKind> {
        let files = [
            ("feature_store", &ingestion.feature_store_path),
            ("train", &ingestion.training_path),
            ("test", &ingestion.testing_path),
            ("validation_report", &validation.report_path),
            ("transformed_train", &transformation.transformed_train_path),
            ("transformed_test", &transformation.transformed_test_path),
            ("preprocessing", &transformation.transformed_object_path),
            ("model", &trainer.trained_model_path),
        ]
        .into_iter()
        .map(|(name, path)| ManifestEntry::for_file(name, path))
        .collect::<Result<Vec<_>, _>>()?;

        let manifest = RunManifest {
            run_id: ctx.run_id.clone(),
            started_at: ctx.started_at,
            finished_at: Local::now(),
            metrics: trainer.metrics,
            files,
        };
        let path = resolve_paths(ctx, &self.config).manifest_path;
        save_object(&path, &manifest)?;
        tracing::debug!(path = %path.display(), "Wrote run manifest");
        Ok(())
    }
}
