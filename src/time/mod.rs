pub mod stamps;

pub use stamps::{
    column_timestamps_ms, datetime_series_from_ms, ms_to_datetime, parse_timestamp_ms,
};
