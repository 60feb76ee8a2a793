//! Random, unstratified train/test partitioning.

use crate::data::table::DataTable;
use crate::error::ErrorKind;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// RNG seeded from `seed`, or from OS entropy when unset.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Shuffle the rows of `table` and split off `ceil(n * test_ratio)` rows as the
/// test partition. Returns `(train, test)`.
pub fn train_test_split(
    table: &DataTable,
    test_ratio: f64,
    rng: &mut StdRng,
) -> Result<(DataTable, DataTable), ErrorKind> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(ErrorKind::invalid_data(format!(
            "test ratio must be in (0, 1), got {test_ratio}"
        )));
    }
    let total = table.row_count();
    let n_test = (total as f64 * test_ratio).ceil() as usize;
    if total < 2 || n_test >= total {
        return Err(ErrorKind::invalid_data(format!(
            "cannot split {total} rows with test ratio {test_ratio}"
        )));
    }

    let mut indices: Vec<usize> = (0..total).collect();
    indices.shuffle(rng);
    let (test_idx, train_idx) = indices.split_at(n_test);

    tracing::debug!(
        train = train_idx.len(),
        test = test_idx.len(),
        "Split dataset"
    );
    Ok((table.select_rows(train_idx), table.select_rows(test_idx)))
}
