//! Data transformation: fit preprocessing on the train split, apply it to
//! both splits, rebalance classes and persist arrays plus the fitted object.

use crate::config::{PipelineConfig, RunContext, TransformationConfig, TransformationPaths, resolve_paths};
use crate::data::schema::SchemaDeclaration;
use crate::data::split::rng_from_seed;
use crate::data::table::DataTable;
use crate::error::{ErrorKind, PipelineError, ResultExt, Stage};
use crate::persistence::save_object;
use crate::pipeline::artifact::{IngestionArtifact, TransformationArtifact, ValidationArtifact};
use crate::preprocess::{ColumnTransformer, SmoteEnn, TargetValueMapping};
use ndarray::{Array1, Array2, Axis};

/// Split a table into its feature part and the mapped target labels.
pub fn split_target(
    table: &DataTable,
    target_column: &str,
) -> Result<(DataTable, Array1<f64>), ErrorKind> {
    let mapping = TargetValueMapping;
    let labels = table
        .column_values(target_column)?
        .into_iter()
        .map(|v| mapping.encode(v))
        .collect::<Result<Array1<f64>, _>>()?;
    let mut features = table.clone();
    features.drop_column(target_column);
    Ok((features, labels))
}

/// Append `y` as the last column of `x`.
pub fn with_label_column(x: &Array2<f64>, y: &Array1<f64>) -> Result<Array2<f64>, ErrorKind> {
    let y_col = y.view().insert_axis(Axis(1));
    ndarray::concatenate(Axis(1), &[x.view(), y_col])
        .map_err(|e| ErrorKind::invalid_data(format!("cannot append label column: {e}")))
}

/// Split an array written by [`with_label_column`] back into features and labels.
pub fn split_label_column(array: &Array2<f64>) -> Result<(Array2<f64>, Array1<f64>), ErrorKind> {
    let width = array.ncols();
    if width < 2 {
        return Err(ErrorKind::invalid_data(format!(
            "expected features plus a label column, got {width} columns"
        )));
    }
    let x = array.slice(ndarray::s![.., ..width - 1]).to_owned();
    let y = array.column(width - 1).to_owned();
    Ok((x, y))
}

pub struct DataTransformation<'a> {
    ingestion: &'a IngestionArtifact,
    validation: &'a ValidationArtifact,
    schema: &'a SchemaDeclaration,
    config: TransformationConfig,
    paths: TransformationPaths,
}

impl<'a> DataTransformation<'a> {
    pub fn new(
        ctx: &RunContext,
        config: &PipelineConfig,
        schema: &'a SchemaDeclaration,
        ingestion: &'a IngestionArtifact,
        validation: &'a ValidationArtifact,
    ) -> Self {
        Self {
            ingestion,
            validation,
            schema,
            config: config.transformation.clone(),
            paths: resolve_paths(ctx, config).transformation,
        }
    }

    /// Runs the stage. Each fallible step is tagged where it is called.
    pub fn run(&self) -> Result<TransformationArtifact, PipelineError> {
        const STAGE: Stage = Stage::Transformation;
        if !self.validation.passed {
            return Err(PipelineError::new(
                STAGE,
                ErrorKind::ValidationFailed(self.validation.message.clone()),
            ));
        }

        let target = self.schema.target_column.as_str();
        let train = DataTable::read_csv(&self.ingestion.training_path).in_stage(STAGE)?;
        let test = DataTable::read_csv(&self.ingestion.testing_path).in_stage(STAGE)?;
        let (train_features, train_y) = split_target(&train, target).in_stage(STAGE)?;
        let (test_features, test_y) = split_target(&test, target).in_stage(STAGE)?;

        let preprocessor = ColumnTransformer::fit(&train_features, self.schema).in_stage(STAGE)?;
        let train_x = preprocessor.transform(&train_features).in_stage(STAGE)?;
        let test_x = preprocessor.transform(&test_features).in_stage(STAGE)?;
        tracing::info!(
            train_rows = train_x.nrows(),
            test_rows = test_x.nrows(),
            features = train_x.ncols(),
            "Applied preprocessing"
        );

        let resampler = SmoteEnn::new(self.config.smote_k_neighbors, self.config.enn_n_neighbors);
        let mut rng = rng_from_seed(self.config.seed);
        let (train_x, train_y) = resampler
            .fit_resample(&train_x, &train_y, &mut rng)
            .in_stage(STAGE)?;
        let (test_x, test_y) = if self.config.resample_test_split {
            resampler
                .fit_resample(&test_x, &test_y, &mut rng)
                .in_stage(STAGE)?
        } else {
            (test_x, test_y)
        };
        tracing::info!(
            train_rows = train_x.nrows(),
            test_rows = test_x.nrows(),
            resample_test = self.config.resample_test_split,
            "Rebalanced classes"
        );

        let train_array = with_label_column(&train_x, &train_y).in_stage(STAGE)?;
        let test_array = with_label_column(&test_x, &test_y).in_stage(STAGE)?;
        save_object(&self.paths.transformed_train_path, &train_array).in_stage(STAGE)?;
        save_object(&self.paths.transformed_test_path, &test_array).in_stage(STAGE)?;
        save_object(&self.paths.transformed_object_path, &preprocessor).in_stage(STAGE)?;
        tracing::info!(
            dir = %self.paths.dir.display(),
            "Saved transformed arrays and preprocessing object"
        );

        Ok(TransformationArtifact {
            transformed_object_path: self.paths.transformed_object_path.clone(),
            transformed_train_path: self.paths.transformed_train_path.clone(),
            transformed_test_path: self.paths.transformed_test_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use serde_json::json;

    #[test]
    fn test_label_column_roundtrip() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![0.0, 1.0];
        let joined = with_label_column(&x, &y).unwrap();
        assert_eq!(joined, array![[1.0, 2.0, 0.0], [3.0, 4.0, 1.0]]);
        let (x2, y2) = split_label_column(&joined).unwrap();
        assert_eq!(x2, x);
        assert_eq!(y2, y);
    }

    #[test]
    fn test_split_target_maps_labels() {
        let table = DataTable::new(
            vec!["age".into(), "loan_status".into()],
            vec![vec![json!(30), json!("yes")], vec![json!(40), json!(0)]],
        );
        let (features, y) = split_target(&table, "loan_status").unwrap();
        assert_eq!(features.columns, vec!["age"]);
        assert_eq!(y, array![1.0, 0.0]);
    }

    #[test]
    fn test_failed_validation_writes_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = RunContext::with_run_id(dir.path(), "r");
        let config = PipelineConfig::default();
        let schema = SchemaDeclaration::from_yaml("columns:\n  - loan_status: int\n").unwrap();
        let ingestion = IngestionArtifact {
            feature_store_path: dir.path().join("a.csv"),
            training_path: dir.path().join("train.csv"),
            testing_path: dir.path().join("test.csv"),
        };
        let validation = ValidationArtifact {
            passed: false,
            message: "Missing categorical columns: intent.".into(),
            report_path: dir.path().join("report.yaml"),
        };
        let err = DataTransformation::new(&ctx, &config, &schema, &ingestion, &validation)
            .run()
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Transformation);
        assert!(matches!(err.kind(), ErrorKind::ValidationFailed(m) if m.contains("intent")));
        assert!(!ctx.run_dir().exists());
    }

    #[test]
    fn test_failures_report_where_they_were_raised() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = RunContext::with_run_id(dir.path(), "r");
        let config = PipelineConfig::default();
        let schema = SchemaDeclaration::from_yaml("columns:\n  - loan_status: int\n").unwrap();
        let ingestion = IngestionArtifact {
            feature_store_path: dir.path().join("a.csv"),
            training_path: dir.path().join("missing_train.csv"),
            testing_path: dir.path().join("missing_test.csv"),
        };
        let validation = |passed: bool| ValidationArtifact {
            passed,
            message: String::new(),
            report_path: dir.path().join("report.yaml"),
        };

        let rejected = validation(false);
        let guard = DataTransformation::new(&ctx, &config, &schema, &ingestion, &rejected)
            .run()
            .unwrap_err();
        let accepted = validation(true);
        let unreadable = DataTransformation::new(&ctx, &config, &schema, &ingestion, &accepted)
            .run()
            .unwrap_err();

        assert!(matches!(guard.kind(), ErrorKind::ValidationFailed(_)));
        assert!(matches!(unreadable.kind(), ErrorKind::Io { .. }));
        assert!(guard.location().file.ends_with("transformation.rs"));
        assert!(unreadable.location().file.ends_with("transformation.rs"));
        assert_ne!(guard.location(), unreadable.location());
    }
}
