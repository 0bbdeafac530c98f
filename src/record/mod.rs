pub mod keys;
pub mod normalize;
pub mod types;

pub use normalize::{normalize_record, normalize_records, normalize_team_map, ColumnAliases, RecordError};
pub use types::{MetricValue, TeamRecord};
