//! Schema declaration: expected columns and their treatment groups.

use crate::error::ErrorKind;
use crate::persistence::load_yaml;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One declared column, written in YAML as a single-entry map `name: dtype`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct ColumnDecl {
    pub name: String,
    pub dtype: String,
}

impl TryFrom<BTreeMap<String, String>> for ColumnDecl {
    type Error = String;

    fn try_from(map: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        if map.len() != 1 {
            return Err(format!(
                "column declaration must have exactly one `name: dtype` entry, found {}",
                map.len()
            ));
        }
        let (name, dtype) = map.into_iter().next().ok_or("empty column declaration")?;
        Ok(Self { name, dtype })
    }
}

impl From<ColumnDecl> for BTreeMap<String, String> {
    fn from(decl: ColumnDecl) -> Self {
        BTreeMap::from([(decl.name, decl.dtype)])
    }
}

/// Declared layout of the loan dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDeclaration {
    pub columns: Vec<ColumnDecl>,
    #[serde(default)]
    pub numerical_columns: Vec<String>,
    #[serde(default)]
    pub categorical_columns: Vec<String>,
    /// Nominal columns, one-hot encoded.
    #[serde(default)]
    pub oh_columns: Vec<String>,
    /// Ordered categorical columns, ordinal encoded.
    #[serde(default)]
    pub or_columns: Vec<String>,
    /// Skewed numeric columns, Yeo-Johnson transformed.
    #[serde(default)]
    pub transform_features: Vec<String>,
    /// Remaining numeric columns, standard scaled.
    #[serde(default)]
    pub num_features: Vec<String>,
    #[serde(default = "default_target_column")]
    pub target_column: String,
}

fn default_target_column() -> String {
    "loan_status".to_string()
}

impl SchemaDeclaration {
    pub fn load(path: &Path) -> Result<Self, ErrorKind> {
        let schema: Self = load_yaml(path)
            .map_err(|e| ErrorKind::schema(format!("cannot load {}: {e}", path.display())))?;
        schema.check_consistency()?;
        Ok(schema)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ErrorKind> {
        let schema: Self = serde_yaml::from_str(text)?;
        schema.check_consistency()?;
        Ok(schema)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Transformer groups must only reference declared columns, and never the target.
    fn check_consistency(&self) -> Result<(), ErrorKind> {
        let declared: Vec<&str> = self.column_names().collect();
        let groups = [
            ("oh_columns", &self.oh_columns),
            ("or_columns", &self.or_columns),
            ("transform_features", &self.transform_features),
            ("num_features", &self.num_features),
        ];
        for (group, cols) in groups {
            for col in cols {
                if col == &self.target_column {
                    return Err(ErrorKind::schema(format!(
                        "target column `{col}` cannot be listed in {group}"
                    )));
                }
                if !declared.contains(&col.as_str()) {
                    return Err(ErrorKind::schema(format!(
                        "{group} references undeclared column `{col}`"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
columns:
  - person_age: float
  - person_home_ownership: category
  - loan_status: int
numerical_columns: [person_age, loan_status]
categorical_columns: [person_home_ownership]
oh_columns: [person_home_ownership]
num_features: [person_age]
"#;

    #[test]
    fn test_parse_schema() {
        let schema = SchemaDeclaration::from_yaml(YAML).unwrap();
        assert_eq!(schema.columns.len(), 3);
        assert_eq!(schema.columns[0].name, "person_age");
        assert_eq!(schema.columns[0].dtype, "float");
        assert_eq!(schema.target_column, "loan_status");
        assert!(schema.or_columns.is_empty());
    }

    #[test]
    fn test_multi_key_column_rejected() {
        let yaml = "columns:\n  - {a: int, b: int}\n";
        assert!(SchemaDeclaration::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_group_must_reference_declared_column() {
        let yaml = "columns:\n  - a: int\nnum_features: [b]\n";
        let err = SchemaDeclaration::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("undeclared column `b`"));
    }

    #[test]
    fn test_target_cannot_be_a_feature() {
        let yaml = "columns:\n  - loan_status: int\nnum_features: [loan_status]\n";
        assert!(SchemaDeclaration::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_workspace_schema_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/schema.yaml");
        let schema = SchemaDeclaration::load(&path).unwrap();
        assert_eq!(schema.columns.len(), 14);
        assert_eq!(schema.target_column, "loan_status");
        assert_eq!(schema.or_columns, vec!["person_education"]);
    }
}
