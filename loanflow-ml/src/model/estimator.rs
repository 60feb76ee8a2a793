//! The persisted model bundle: fitted preprocessing plus classifier.

use crate::data::table::DataTable;
use crate::error::ErrorKind;
use crate::model::knn::KnnClassifier;
use crate::persistence::{load_object, save_object};
use crate::preprocess::ColumnTransformer;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything needed to score raw loan records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanModel {
    pub preprocessor: ColumnTransformer,
    pub classifier: KnnClassifier,
    pub target_column: String,
}

impl LoanModel {
    pub fn new(preprocessor: ColumnTransformer, classifier: KnnClassifier) -> Self {
        let target_column = preprocessor.target_column().to_string();
        Self {
            preprocessor,
            classifier,
            target_column,
        }
    }

    /// Predict one label per row of raw, untransformed records.
    pub fn predict(&self, table: &DataTable) -> Result<Vec<f64>, ErrorKind> {
        let features = self.preprocessor.transform(table)?;
        tracing::debug!(rows = features.nrows(), "Scoring records");
        Ok(self.classifier.predict(&features)?.to_vec())
    }

    pub fn save(&self, path: &Path) -> Result<(), ErrorKind> {
        save_object(path, self)
    }

    pub fn load(path: &Path) -> Result<Self, ErrorKind> {
        load_object(path)
    }
}
