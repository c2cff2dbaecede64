pub mod buffer;
pub mod export;
pub mod import;

pub use buffer::{Reading, Series, SeriesSet};
pub use export::{export_to_csv, export_to_json, report_to_json, write_csv};
pub use import::{read_csv, read_csv_file};
