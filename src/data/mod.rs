//! Data pipeline: raw source, split layout, scaling, windowed datasets,
//! loaders and the memoizing provider that ties them together.

pub mod dataset;
pub mod loader;
pub mod provider;
pub mod scaler;
pub mod source;
pub mod split;
pub mod time_features;

pub use dataset::{AnomalyDataset, ClassificationDataset, Dataset, ForecastDataset, SplitDataset};
pub use loader::{Batches, DataLoader, LoaderOptions};
pub use provider::{CacheKey, DatasetProvider, ProvidedPair};
pub use scaler::FittedScaler;
pub use source::{read_csv, DataSource};
pub use split::{own_rows, split_borders, Split};
pub use time_features::{feature_width, time_features};
