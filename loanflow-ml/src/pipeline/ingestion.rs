//! Data ingestion: export the collection to a feature-store snapshot and
//! split it into train and test files.

use crate::config::{IngestionConfig, IngestionPaths, PipelineConfig, RunContext, resolve_paths};
use crate::data::split::{rng_from_seed, train_test_split};
use crate::data::store::{DocumentStore, documents_to_table};
use crate::data::table::DataTable;
use crate::error::{ErrorKind, PipelineError, ResultExt, Stage};
use crate::pipeline::artifact::IngestionArtifact;

const STAGE: Stage = Stage::Ingestion;

pub struct DataIngestion<'a> {
    config: IngestionConfig,
    paths: IngestionPaths,
    store: &'a dyn DocumentStore,
}

impl<'a> DataIngestion<'a> {
    pub fn new(ctx: &RunContext, config: &PipelineConfig, store: &'a dyn DocumentStore) -> Self {
        Self {
            config: config.ingestion.clone(),
            paths: resolve_paths(ctx, config).ingestion,
            store,
        }
    }

    /// Fetch the collection, drop identity columns, null out the missing-value
    /// token and write the snapshot CSV.
    pub fn export_into_feature_store(&self) -> Result<DataTable, PipelineError> {
        let collection = &self.config.collection_name;
        tracing::info!(
            collection = %collection,
            store = %self.store.describe(),
            "Exporting collection into feature store"
        );
        let documents = self.store.fetch_all(collection).in_stage(STAGE)?;
        if documents.is_empty() {
            return Err(PipelineError::new(
                STAGE,
                ErrorKind::invalid_data(format!("collection `{collection}` is empty")),
            ));
        }

        let mut table = documents_to_table(&documents);
        for column in &self.config.drop_columns {
            if table.drop_column(column) {
                tracing::debug!(column = %column, "Dropped identity column");
            }
        }
        let replaced = table.replace_token_with_null(&self.config.missing_token);
        tracing::debug!(
            token = %self.config.missing_token,
            replaced,
            "Replaced missing-value tokens"
        );

        table.write_csv(&self.paths.feature_store_path).in_stage(STAGE)?;
        tracing::info!(
            rows = table.row_count(),
            columns = table.column_count(),
            path = %self.paths.feature_store_path.display(),
            "Wrote feature store snapshot"
        );
        Ok(table)
    }

    /// Random split into the train and test files.
    pub fn split_train_test(&self, table: &DataTable) -> Result<(), PipelineError> {
        let mut rng = rng_from_seed(self.config.seed);
        let (train, test) =
            train_test_split(table, self.config.test_split_ratio, &mut rng).in_stage(STAGE)?;
        train.write_csv(&self.paths.training_path).in_stage(STAGE)?;
        test.write_csv(&self.paths.testing_path).in_stage(STAGE)?;
        tracing::info!(
            train_rows = train.row_count(),
            test_rows = test.row_count(),
            dir = %self.paths.ingested_dir.display(),
            "Wrote train and test splits"
        );
        Ok(())
    }

    pub fn run(&self) -> Result<IngestionArtifact, PipelineError> {
        let table = self.export_into_feature_store()?;
        self.split_train_test(&table)?;
        Ok(IngestionArtifact {
            feature_store_path: self.paths.feature_store_path.clone(),
            training_path: self.paths.training_path.clone(),
            testing_path: self.paths.testing_path.clone(),
        })
    }
}
