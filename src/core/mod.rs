//! Core data structures: timestamped frames and the windows/batches cut from them.

mod batch;
mod frame;

pub use batch::{Batch, Window};
pub use frame::SeriesFrame;
