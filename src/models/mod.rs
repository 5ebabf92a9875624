//! Ensemble collaborators: base models, combiners and adjusters.

mod traits;

pub mod adjuster;
pub mod base;
pub mod combiner;

pub use adjuster::ResidualAdjuster;
pub use base::{Drift, LastValue, SeasonalNaive, WindowAverage};
pub use combiner::{CombinationMethod, WeightedCombiner};
pub use traits::{Adjuster, BaseModel, BoxedBaseModel, Combiner, CombinerOutput};
