//! Property-based tests for the schema checks and the split sizes.

use proptest::prelude::*;

use loanflow_ml::data::split::{rng_from_seed, train_test_split};
use loanflow_ml::data::{ColumnDecl, DataTable, SchemaDeclaration};
use loanflow_ml::pipeline::{
    all_declared_columns_present, count_columns_match, missing_declared_columns,
};
use serde_json::json;

fn schema_with(numerical: usize, categorical: usize) -> SchemaDeclaration {
    let num: Vec<String> = (0..numerical).map(|i| format!("num_{i}")).collect();
    let cat: Vec<String> = (0..categorical).map(|i| format!("cat_{i}")).collect();
    SchemaDeclaration {
        columns: num
            .iter()
            .map(|n| ColumnDecl {
                name: n.clone(),
                dtype: "float".into(),
            })
            .chain(cat.iter().map(|n| ColumnDecl {
                name: n.clone(),
                dtype: "category".into(),
            }))
            .collect(),
        numerical_columns: num,
        categorical_columns: cat,
        oh_columns: Vec::new(),
        or_columns: Vec::new(),
        transform_features: Vec::new(),
        num_features: Vec::new(),
        target_column: "loan_status".into(),
    }
}

fn table_with(columns: Vec<String>) -> DataTable {
    let row = columns.iter().map(|_| json!(0)).collect();
    DataTable::new(columns, vec![row])
}

// --- Column presence ---

proptest! {
    #[test]
    fn presence_iff_nothing_missing(
        numerical in 1usize..6,
        categorical in 1usize..6,
        keep in prop::collection::vec(any::<bool>(), 12),
        extras in 0usize..4,
    ) {
        let schema = schema_with(numerical, categorical);
        let mut columns: Vec<String> = schema
            .column_names()
            .zip(keep.iter())
            .filter(|(_, k)| **k)
            .map(|(c, _)| c.to_string())
            .collect();
        columns.extend((0..extras).map(|i| format!("extra_{i}")));
        let table = table_with(columns.clone());

        let missing = missing_declared_columns(&table, &schema);
        let expected_missing = schema
            .column_names()
            .filter(|c| !columns.iter().any(|t| t.as_str() == *c))
            .count();
        prop_assert_eq!(missing.numerical.len() + missing.categorical.len(), expected_missing);
        prop_assert_eq!(all_declared_columns_present(&table, &schema), expected_missing == 0);
    }

    #[test]
    fn extra_columns_never_cause_missing(
        numerical in 0usize..6,
        categorical in 0usize..6,
        extras in 0usize..6,
    ) {
        let schema = schema_with(numerical, categorical);
        let mut columns: Vec<String> = schema.column_names().map(String::from).collect();
        columns.extend((0..extras).map(|i| format!("extra_{i}")));
        let table = table_with(columns);
        prop_assert!(all_declared_columns_present(&table, &schema));
        prop_assert_eq!(count_columns_match(&table, &schema), extras == 0);
    }

    #[test]
    fn count_match_iff_equal_lengths(
        declared in 0usize..10,
        present in 0usize..10,
    ) {
        let schema = schema_with(declared, 0);
        let table = table_with((0..present).map(|i| format!("c{i}")).collect());
        prop_assert_eq!(count_columns_match(&table, &schema), declared == present);
    }
}

// --- Split sizes ---

proptest! {
    #[test]
    fn split_sizes_follow_ceiling_rule(
        n in 2usize..300,
        ratio in 0.01f64..0.5,
        seed in any::<u64>(),
    ) {
        let table = DataTable::new(
            vec!["id".into()],
            (0..n).map(|i| vec![json!(i)]).collect(),
        );
        let n_test = (n as f64 * ratio).ceil() as usize;
        prop_assume!(n_test < n);
        let (train, test) = train_test_split(&table, ratio, &mut rng_from_seed(Some(seed))).unwrap();
        prop_assert_eq!(test.row_count(), n_test);
        prop_assert_eq!(train.row_count(), n - n_test);
    }
}
