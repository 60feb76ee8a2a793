//! Classifier, neighbour search, metrics and the model bundle.

pub mod estimator;
pub mod knn;
pub mod metrics;
pub mod neighbors;

pub use estimator::LoanModel;
pub use knn::{KnnAlgorithm, KnnClassifier, KnnParams, KnnWeights};
pub use metrics::{ClassificationMetrics, accuracy_score, classification_metrics};
