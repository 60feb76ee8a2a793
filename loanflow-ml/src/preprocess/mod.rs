//! Feature preprocessing: encoders, scalers, the power transform, the
//! schema-driven column transformer and class rebalancing.

pub mod column_transformer;
pub mod encoders;
pub mod power;
pub mod resample;
pub mod scaler;
pub mod target;

pub use column_transformer::ColumnTransformer;
pub use encoders::{MISSING_CATEGORY, OneHotEncoder, OrdinalEncoder};
pub use power::PowerTransformer;
pub use resample::SmoteEnn;
pub use scaler::StandardScaler;
pub use target::TargetValueMapping;
