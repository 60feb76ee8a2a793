//! Per-column feature preprocessing driven by the schema declaration.
//!
//! Output blocks, in order: one-hot columns, ordinal columns, power-transformed
//! columns, standard-scaled columns, then every remaining feature column
//! passed through in table order. The fitted state is serializable so the
//! same transform can be replayed on the test split and at prediction time.

use crate::data::schema::SchemaDeclaration;
use crate::data::table::{DataTable, as_category, as_f64};
use crate::error::ErrorKind;
use crate::preprocess::encoders::{OneHotEncoder, OrdinalEncoder};
use crate::preprocess::power::PowerTransformer;
use crate::preprocess::scaler::{StandardScaler, mean};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Step {
    OneHot(OneHotEncoder),
    Ordinal(OrdinalEncoder),
    Power { fill: f64, transformer: PowerTransformer },
    Scale { fill: f64, scaler: StandardScaler },
    Passthrough { fill: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Block {
    column: String,
    step: Step,
}

impl Block {
    fn width(&self) -> usize {
        match &self.step {
            Step::OneHot(enc) => enc.width(),
            _ => 1,
        }
    }
}

/// Fitted preprocessing for every feature column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    target_column: String,
    blocks: Vec<Block>,
}

fn numeric_column(table: &DataTable, column: &str) -> Result<Vec<Option<f64>>, ErrorKind> {
    table
        .column_values(column)?
        .into_iter()
        .map(|v| {
            as_f64(v).map_err(|e| ErrorKind::invalid_data(format!("column `{column}`: {e}")))
        })
        .collect()
}

fn categorical_column(table: &DataTable, column: &str) -> Result<Vec<Option<String>>, ErrorKind> {
    Ok(table
        .column_values(column)?
        .into_iter()
        .map(as_category)
        .collect())
}

/// Mean of the present values, used for imputation.
fn fill_value(values: &[Option<f64>]) -> f64 {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    mean(&present)
}

fn imputed(values: &[Option<f64>], fill: f64) -> Vec<f64> {
    values.iter().map(|v| v.unwrap_or(fill)).collect()
}

impl ColumnTransformer {
    /// Learn encoders and statistics from `table`. The target column is never a feature.
    pub fn fit(table: &DataTable, schema: &SchemaDeclaration) -> Result<Self, ErrorKind> {
        if table.is_empty() {
            return Err(ErrorKind::invalid_data("cannot fit preprocessing on an empty table"));
        }
        let target = schema.target_column.as_str();
        let mut blocks = Vec::new();
        let mut assigned: HashSet<&str> = HashSet::from([target]);

        for column in &schema.oh_columns {
            let values = categorical_column(table, column)?;
            let encoder = OneHotEncoder::fit(values.iter().map(|v| v.as_deref()));
            blocks.push(Block {
                column: column.clone(),
                step: Step::OneHot(encoder),
            });
            assigned.insert(column.as_str());
        }

        for column in &schema.or_columns {
            let values = categorical_column(table, column)?;
            let encoder = OrdinalEncoder::fit(values.iter().map(|v| v.as_deref()));
            blocks.push(Block {
                column: column.clone(),
                step: Step::Ordinal(encoder),
            });
            assigned.insert(column.as_str());
        }

        for column in &schema.transform_features {
            let values = numeric_column(table, column)?;
            let fill = fill_value(&values);
            let transformer = PowerTransformer::fit(&imputed(&values, fill));
            tracing::debug!(column = %column, lambda = transformer.lambda, "Fitted power transform");
            blocks.push(Block {
                column: column.clone(),
                step: Step::Power { fill, transformer },
            });
            assigned.insert(column.as_str());
        }

        for column in &schema.num_features {
            let values = numeric_column(table, column)?;
            let fill = fill_value(&values);
            let scaler = StandardScaler::fit(&imputed(&values, fill));
            blocks.push(Block {
                column: column.clone(),
                step: Step::Scale { fill, scaler },
            });
            assigned.insert(column.as_str());
        }

        for column in &table.columns {
            if assigned.contains(column.as_str()) {
                continue;
            }
            let values = numeric_column(table, column).map_err(|e| {
                ErrorKind::invalid_data(format!(
                    "column `{column}` is not assigned to a transformer and is not numeric: {e}"
                ))
            })?;
            blocks.push(Block {
                column: column.clone(),
                step: Step::Passthrough {
                    fill: fill_value(&values),
                },
            });
        }

        let transformer = Self {
            target_column: target.to_string(),
            blocks,
        };
        tracing::debug!(
            blocks = transformer.blocks.len(),
            width = transformer.output_width(),
            "Fitted column transformer"
        );
        Ok(transformer)
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    /// Number of output features.
    pub fn output_width(&self) -> usize {
        self.blocks.iter().map(Block::width).sum()
    }

    pub fn output_feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.output_width());
        for block in &self.blocks {
            match &block.step {
                Step::OneHot(enc) => names.extend(enc.feature_names(&block.column)),
                _ => names.push(block.column.clone()),
            }
        }
        names
    }

    /// Apply the fitted state to `table`. Columns are looked up by name; extra
    /// columns (the target included) are ignored.
    pub fn transform(&self, table: &DataTable) -> Result<Array2<f64>, ErrorKind> {
        let indices = self
            .blocks
            .iter()
            .map(|b| table.require_column(&b.column))
            .collect::<Result<Vec<_>, _>>()?;

        let width = self.output_width();
        let mut data = Vec::with_capacity(table.row_count() * width);
        for row in &table.rows {
            for (block, &idx) in self.blocks.iter().zip(&indices) {
                let cell = row.get(idx).unwrap_or(&serde_json::Value::Null);
                match &block.step {
                    Step::OneHot(enc) => enc.encode_into(as_category(cell).as_deref(), &mut data),
                    Step::Ordinal(enc) => data.push(enc.encode(as_category(cell).as_deref())),
                    Step::Power { fill, transformer } => {
                        data.push(transformer.transform(self.numeric(block, cell)?.unwrap_or(*fill)));
                    }
                    Step::Scale { fill, scaler } => {
                        data.push(scaler.transform(self.numeric(block, cell)?.unwrap_or(*fill)));
                    }
                    Step::Passthrough { fill } => {
                        data.push(self.numeric(block, cell)?.unwrap_or(*fill));
                    }
                }
            }
        }

        Array2::from_shape_vec((table.row_count(), width), data)
            .map_err(|e| ErrorKind::invalid_data(format!("transformed shape mismatch: {e}")))
    }

    fn numeric(&self, block: &Block, cell: &serde_json::Value) -> Result<Option<f64>, ErrorKind> {
        as_f64(cell).map_err(|e| ErrorKind::invalid_data(format!("column `{}`: {e}", block.column)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn schema() -> SchemaDeclaration {
        SchemaDeclaration::from_yaml(
            r#"
columns:
  - age: float
  - home: category
  - education: category
  - income: float
  - score: int
  - loan_status: int
oh_columns: [home]
or_columns: [education]
transform_features: [income]
num_features: [age]
"#,
        )
        .unwrap()
    }

    fn train() -> DataTable {
        DataTable::new(
            ["age", "home", "education", "income", "score", "loan_status"]
                .map(String::from)
                .to_vec(),
            vec![
                vec![json!(22), json!("RENT"), json!("Bachelor"), json!(30000), json!(600), json!(1)],
                vec![json!(35), json!("OWN"), json!("Master"), json!(85000), json!(700), json!(0)],
                vec![json!(41), json!("RENT"), Value::Null, json!(52000), json!(650), json!(0)],
                vec![Value::Null, json!("MORTGAGE"), json!("Bachelor"), json!(120000), json!(720), json!(1)],
            ],
        )
    }

    #[test]
    fn test_output_layout() {
        let ct = ColumnTransformer::fit(&train(), &schema()).unwrap();
        assert_eq!(
            ct.output_feature_names(),
            vec!["home_MORTGAGE", "home_OWN", "home_RENT", "education", "income", "age", "score"]
        );
        let out = ct.transform(&train()).unwrap();
        assert_eq!(out.dim(), (4, 7));
        assert_eq!(out.row(0).to_vec()[..3], [0.0, 0.0, 1.0]);
        // passthrough keeps raw values
        assert_eq!(out[[1, 6]], 700.0);
        // null education was seen at fit as "missing", the last sorted category
        assert_eq!(out[[2, 3]], 2.0);
    }

    #[test]
    fn test_null_numeric_imputed_with_train_mean() {
        let ct = ColumnTransformer::fit(&train(), &schema()).unwrap();
        let out = ct.transform(&train()).unwrap();
        // age mean of present values is the scaler mean, so the imputed cell scales to 0
        assert!(out[[3, 5]].abs() < 1e-12);
    }

    #[test]
    fn test_unknown_categories_at_transform() {
        let ct = ColumnTransformer::fit(&train(), &schema()).unwrap();
        let mut test = train().select_rows(&[0]);
        test.rows[0][1] = json!("OTHER");
        test.rows[0][2] = json!("Doctorate");
        let out = ct.transform(&test).unwrap();
        assert_eq!(out.row(0).to_vec()[..4], [0.0, 0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_missing_column_at_transform() {
        let ct = ColumnTransformer::fit(&train(), &schema()).unwrap();
        let mut test = train();
        test.drop_column("income");
        assert!(matches!(ct.transform(&test), Err(ErrorKind::Schema(_))));
    }

    #[test]
    fn test_non_numeric_passthrough_rejected() {
        let mut table = train();
        table.rows[0][4] = json!("high");
        assert!(matches!(
            ColumnTransformer::fit(&table, &schema()),
            Err(ErrorKind::InvalidData(_))
        ));
    }

    #[test]
    fn test_transform_ignores_target_column() {
        let ct = ColumnTransformer::fit(&train(), &schema()).unwrap();
        let mut without_target = train();
        without_target.drop_column("loan_status");
        assert_eq!(
            ct.transform(&without_target).unwrap(),
            ct.transform(&train()).unwrap()
        );
    }
}
