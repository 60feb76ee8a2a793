//! Data validation: compare the feature-store snapshot against the schema
//! declaration and write a report.

use crate::config::{PipelineConfig, RunContext, ValidationPaths, resolve_paths};
use crate::data::schema::SchemaDeclaration;
use crate::data::table::DataTable;
use crate::error::{PipelineError, ResultExt, Stage};
use crate::persistence::save_yaml;
use crate::pipeline::artifact::{IngestionArtifact, ValidationArtifact, ValidationReport};

/// True when the table has exactly as many columns as the schema declares.
pub fn count_columns_match(table: &DataTable, schema: &SchemaDeclaration) -> bool {
    table.column_count() == schema.columns.len()
}

/// Declared numerical and categorical columns absent from a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingColumns {
    pub numerical: Vec<String>,
    pub categorical: Vec<String>,
}

impl MissingColumns {
    pub fn is_empty(&self) -> bool {
        self.numerical.is_empty() && self.categorical.is_empty()
    }
}

pub fn missing_declared_columns(table: &DataTable, schema: &SchemaDeclaration) -> MissingColumns {
    fn absent(table: &DataTable, cols: &[String]) -> Vec<String> {
        cols.iter()
            .filter(|c| !table.has_column(c))
            .cloned()
            .collect()
    }
    MissingColumns {
        numerical: absent(table, &schema.numerical_columns),
        categorical: absent(table, &schema.categorical_columns),
    }
}

/// Every declared numerical and categorical column is present. Extra columns are allowed.
pub fn all_declared_columns_present(table: &DataTable, schema: &SchemaDeclaration) -> bool {
    missing_declared_columns(table, schema).is_empty()
}

pub struct DataValidation<'a> {
    ingestion: &'a IngestionArtifact,
    schema: &'a SchemaDeclaration,
    paths: ValidationPaths,
}

impl<'a> DataValidation<'a> {
    pub fn new(
        ctx: &RunContext,
        config: &PipelineConfig,
        schema: &'a SchemaDeclaration,
        ingestion: &'a IngestionArtifact,
    ) -> Self {
        Self {
            ingestion,
            schema,
            paths: resolve_paths(ctx, config).validation,
        }
    }

    /// Failure messages for `table`, empty when it conforms.
    fn check(&self, table: &DataTable) -> Vec<String> {
        let mut messages = Vec::new();
        if !count_columns_match(table, self.schema) {
            messages.push(format!(
                "Column count mismatch: expected {}, found {}.",
                self.schema.columns.len(),
                table.column_count()
            ));
        }
        let missing = missing_declared_columns(table, self.schema);
        if !missing.numerical.is_empty() {
            messages.push(format!(
                "Missing numerical columns: {}.",
                missing.numerical.join(", ")
            ));
        }
        if !missing.categorical.is_empty() {
            messages.push(format!(
                "Missing categorical columns: {}.",
                missing.categorical.join(", ")
            ));
        }
        messages
    }

    pub fn run(&self) -> Result<ValidationArtifact, PipelineError> {
        const STAGE: Stage = Stage::Validation;
        let table = DataTable::read_csv(&self.ingestion.feature_store_path).in_stage(STAGE)?;
        let message = self.check(&table).join(" ");
        let passed = message.is_empty();

        let report = ValidationReport {
            validation_status: passed,
            message: message.clone(),
        };
        save_yaml(&self.paths.report_path, &report).in_stage(STAGE)?;

        if passed {
            tracing::info!(
                columns = table.column_count(),
                report = %self.paths.report_path.display(),
                "Data validation passed"
            );
        } else {
            tracing::warn!(
                message = %message,
                report = %self.paths.report_path.display(),
                "Data validation failed"
            );
        }

        Ok(ValidationArtifact {
            passed,
            message,
            report_path: self.paths.report_path.clone(),
        })
    }
}
