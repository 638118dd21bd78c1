//! Input/Output operations for expression tables and results

mod csv;

pub use self::csv::{
    read_table, read_table_from_reader, write_results, write_results_to_writer, write_summary,
    RESULT_COLUMNS,
};
