pub mod positioning;
pub mod series;
pub mod session;

pub use positioning::{positioning_stats, AlgaeStat, ClimbDistribution, PositioningStats};
pub use series::{metric_series, ChartMetric, Grouping, Series};
pub use session::{Chart, ChartError, ChartSession, Dataset, DEFAULT_PALETTE};
