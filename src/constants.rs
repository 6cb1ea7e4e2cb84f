//! Hard-coded constants for the clustering engine.

/// Feature value written into every dimension of a dummy (zero-weight)
/// centre, matching the magnitude the source implementation hard-codes.
pub const DUMMY_FEATURE_VALUE: f64 = -1_000_000.0;

/// Index assigned to a dummy centre; never a valid point index.
pub const DUMMY_INDEX: i64 = -1;

/// Number of k-means++ weighted-sample trials attempted per leaf split.
pub const CHOOSE_CENTRE_TRIALS: usize = 3;
