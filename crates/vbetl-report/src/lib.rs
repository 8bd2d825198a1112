//! Tabular output for the export jobs: the cell/table model, CSV and JSON
//! writers, statistics flattening, reshaping and publication.

pub mod error;
pub mod flatten;
pub mod publish;
pub mod reshape;
pub mod table;

pub use error::ReportError;
pub use flatten::{
    failed_table, group_counts, parse_hms, video_rows, video_table, webcast_row, webcast_table,
    WebcastMaps, VIDEO_COLUMNS, WEBCAST_COLUMNS,
};
pub use publish::publish;
pub use reshape::{
    aggregate_sum, format_numbers, left_join, merge_webcast_video, unpivot, DecimalSeparator,
    MergeOptions,
};
pub use table::{write_json_pretty, Cell, Row, Table};
