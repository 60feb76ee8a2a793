//! Model training: fit the classifier, gate it on training accuracy, score
//! it on the held-out split and persist the model bundle.

use crate::config::{PipelineConfig, RunContext, TrainerConfig, TrainerPaths, resolve_paths};
use crate::error::{ErrorKind, PipelineError, ResultExt, Stage};
use crate::model::estimator::LoanModel;
use crate::model::knn::{KnnClassifier, KnnParams};
use crate::model::metrics::{accuracy_score, classification_metrics};
use crate::persistence::load_object;
use crate::pipeline::artifact::{ModelTrainerArtifact, TransformationArtifact};
use crate::pipeline::transformation::split_label_column;
use crate::preprocess::ColumnTransformer;
use ndarray::Array2;

pub struct ModelTrainer<'a> {
    transformation: &'a TransformationArtifact,
    config: TrainerConfig,
    paths: TrainerPaths,
}

impl<'a> ModelTrainer<'a> {
    pub fn new(
        ctx: &RunContext,
        config: &PipelineConfig,
        transformation: &'a TransformationArtifact,
    ) -> Self {
        Self {
            transformation,
            config: config.trainer.clone(),
            paths: resolve_paths(ctx, config).trainer,
        }
    }

    fn params(&self) -> KnnParams {
        KnnParams {
            n_neighbors: self.config.n_neighbors,
            weights: self.config.weights,
            algorithm: self.config.algorithm,
        }
    }

    /// Runs the stage. Each fallible step is tagged where it is called.
    pub fn run(&self) -> Result<ModelTrainerArtifact, PipelineError> {
        const STAGE: Stage = Stage::Training;
        let train: Array2<f64> =
            load_object(&self.transformation.transformed_train_path).in_stage(STAGE)?;
        let test: Array2<f64> =
            load_object(&self.transformation.transformed_test_path).in_stage(STAGE)?;
        let (train_x, train_y) = split_label_column(&train).in_stage(STAGE)?;
        let (test_x, test_y) = split_label_column(&test).in_stage(STAGE)?;

        let params = self.params();
        tracing::info!(
            n_neighbors = params.n_neighbors,
            weights = ?params.weights,
            algorithm = ?params.algorithm,
            rows = train_x.nrows(),
            "Training k-nearest-neighbour classifier"
        );
        let classifier = KnnClassifier::fit(params, &train_x, &train_y).in_stage(STAGE)?;

        let train_pred = classifier.predict(&train_x).in_stage(STAGE)?;
        let train_accuracy = accuracy_score(&train_y, &train_pred).in_stage(STAGE)?;
        if train_accuracy < self.config.expected_accuracy {
            return Err(PipelineError::new(
                STAGE,
                ErrorKind::ThresholdNotMet {
                    accuracy: train_accuracy,
                    expected: self.config.expected_accuracy,
                },
            ));
        }

        let test_pred = classifier.predict(&test_x).in_stage(STAGE)?;
        let metrics = classification_metrics(&test_y, &test_pred).in_stage(STAGE)?;
        tracing::info!(
            train_accuracy,
            accuracy = metrics.accuracy,
            f1 = metrics.f1,
            precision = metrics.precision,
            recall = metrics.recall,
            "Evaluated model on test split"
        );

        let preprocessor: ColumnTransformer =
            load_object(&self.transformation.transformed_object_path).in_stage(STAGE)?;
        LoanModel::new(preprocessor, classifier)
            .save(&self.paths.trained_model_path)
            .in_stage(STAGE)?;
        tracing::info!(
            path = %self.paths.trained_model_path.display(),
            "Saved model bundle"
        );

        Ok(ModelTrainerArtifact {
            trained_model_path: self.paths.trained_model_path.clone(),
            metrics,
        })
    }
}
