//! Delimited-text reading and writing for expression tables and results

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::data::{Cell, Table};
use crate::diffexpr::{DiffResults, DiffSummary};
use crate::error::{BioflowError, Result};

/// Byte-order mark written ahead of outputs so spreadsheet tools pick UTF-8
const UTF8_BOM: &str = "\u{feff}";

/// Header of the result table
pub const RESULT_COLUMNS: [&str; 7] = [
    "gene",
    "ctrl",
    "treat",
    "delta",
    "fold_change",
    "log2FC",
    "direction",
];

/// Read a table from a CSV or TSV file
/// Expected format: first row is the header; delimiter is auto-detected
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let file = File::open(path)?;
    read_table_from_reader(file)
}

/// Read a table from any reader (see [`read_table`])
pub fn read_table_from_reader<R: Read>(mut reader: R) -> Result<Table> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(&content);

    let header_line = content
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or(BioflowError::EmptyInput)?;

    // Detect delimiter
    let delimiter = if header_line.contains('\t') { b'\t' } else { b',' };

    let mut csv_reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = csv_reader.headers()?.iter().map(|h| h.to_string()).collect();
    let width = columns.len();

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        if record.iter().all(|f| f.is_empty()) && record.len() <= 1 {
            continue;
        }
        if record.len() > width {
            let line = record.position().map_or(0, |p| p.line());
            return Err(BioflowError::InvalidTable {
                reason: format!(
                    "Line {} has {} fields, expected at most {}",
                    line,
                    record.len(),
                    width
                ),
            });
        }
        let mut row: Vec<Cell> = record.iter().map(Cell::from_raw).collect();
        row.resize(width, Cell::Missing);
        rows.push(row);
    }

    log::debug!("Read table with {} columns and {} rows", width, rows.len());
    Table::new(columns, rows)
}

/// Format a float the way it is written to result files.
/// NaN becomes an empty field.
fn format_value(x: f64) -> String {
    if x.is_nan() {
        String::new()
    } else {
        format!("{:?}", x)
    }
}

/// Write the result table to any writer (no byte-order mark)
pub fn write_results_to_writer<W: Write>(writer: W, results: &DiffResults) -> Result<()> {
    let mut csv_writer = ::csv::Writer::from_writer(writer);

    let columns: Vec<&str> = if results.gene_ids.is_some() {
        RESULT_COLUMNS.to_vec()
    } else {
        RESULT_COLUMNS[1..].to_vec()
    };
    csv_writer.write_record(&columns)?;

    for row in results.rows() {
        let mut record: Vec<String> = Vec::with_capacity(columns.len());
        if let Some(gene) = row.gene {
            record.push(gene);
        }
        record.extend(
            [
                row.ctrl,
                row.treat,
                row.delta,
                row.fold_change,
                row.log2_fold_change,
            ]
            .into_iter()
            .map(format_value),
        );
        record.push(row.direction.to_string());
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the result table as UTF-8 CSV with a byte-order mark
pub fn write_results<P: AsRef<Path>>(path: P, results: &DiffResults) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(UTF8_BOM.as_bytes())?;
    write_results_to_writer(file, results)
}

/// Write the one-line text summary as a single-column CSV
pub fn write_summary<P: AsRef<Path>>(path: P, summary: &DiffSummary) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(UTF8_BOM.as_bytes())?;
    let mut csv_writer = ::csv::Writer::from_writer(file);
    csv_writer.write_record(["Result"])?;
    csv_writer.write_record([summary.to_string()])?;
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diffexpr::Direction;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_comma_table() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "gene_id,control,treatment").unwrap();
        writeln!(file, "TP53,10,40").unwrap();
        writeln!(file, "\"MYC, iso2\",NA,3").unwrap();

        let table = read_table(file.path()).unwrap();
        assert_eq!(table.columns(), &["gene_id", "control", "treatment"]);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.rows()[1][0], Cell::from("MYC, iso2"));
        assert_eq!(table.rows()[1][1], Cell::Missing);
    }

    #[test]
    fn test_read_tsv_with_bom_and_short_rows() {
        let input = "\u{feff}gene\tctrl\ttreat\nA\t1\t2\n\nB\t3\n";
        let table = read_table_from_reader(input.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["gene", "ctrl", "treat"]);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.rows()[1][2], Cell::Missing);
    }

    #[test]
    fn test_header_only_table_has_no_rows() {
        let table = read_table_from_reader("gene,ctrl,treat\n".as_bytes()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let err = read_table_from_reader("\n  \n".as_bytes()).unwrap_err();
        assert!(matches!(err, BioflowError::EmptyInput));
    }

    #[test]
    fn test_overlong_row_rejected() {
        let err = read_table_from_reader("gene,ctrl\nA,1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, BioflowError::InvalidTable { .. }));
    }

    #[test]
    fn test_write_results() {
        let results = DiffResults {
            gene_ids: Some(vec!["A".to_string(), "B".to_string()]),
            ctrl: vec![2.0, -1.0],
            treat: vec![8.0, 1.0],
            delta: vec![6.0, 2.0],
            fold_change: vec![4.0, -1.0],
            log2_fold_changes: vec![2.0, f64::NAN],
            directions: vec![Direction::Up, Direction::Unchanged],
        };
        let mut buf: Vec<u8> = Vec::new();
        write_results_to_writer(&mut buf, &results).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "gene,ctrl,treat,delta,fold_change,log2FC,direction");
        assert_eq!(lines[1], "A,2.0,8.0,6.0,4.0,2.0,up");
        assert_eq!(lines[2], "B,-1.0,1.0,2.0,-1.0,,unchanged");
    }

    #[test]
    fn test_result_files_carry_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        write_summary(&path, &DiffSummary { total: 3, up: 1, down: 0 }).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(UTF8_BOM));
        assert!(text.contains("Result"));
        assert!(text.contains("共 3 基因；|log2FC|>=1 上調 1、下調 0"));
    }
}
