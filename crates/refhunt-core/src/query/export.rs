/// CSV and plain-text export of query output.
use crate::error::Result;
use crate::model::size::format_size;
use crate::model::AssetRecord;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct CsvRow<'a> {
    path: &'a str,
    #[serde(rename = "type")]
    type_name: &'a str,
    size_bytes: u64,
    size: String,
    references: usize,
    addressable: bool,
    warning: &'a str,
}

impl<'a> From<&'a AssetRecord> for CsvRow<'a> {
    fn from(record: &'a AssetRecord) -> Self {
        Self {
            path: &record.path,
            type_name: &record.type_name,
            size_bytes: record.size_bytes,
            size: format_size(record.size_bytes),
            references: record.references_count,
            addressable: record.is_addressable,
            warning: record.warning.as_deref().unwrap_or_default(),
        }
    }
}

/// Write `records` as CSV, header first.
pub fn write_csv<W: Write>(writer: W, records: &[&AssetRecord]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in records {
        csv.serialize(CsvRow::from(*record))?;
    }
    csv.flush()?;
    Ok(())
}

/// Write `records` to a CSV file at `path`, replacing it.
pub fn export_csv(path: &Path, records: &[&AssetRecord]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(std::io::BufWriter::new(file), records)
}

/// Clipboard-style listing:
///
/// ```text
/// Unreferenced Assets [2]:
/// [Material][1.5 KB] Assets/b.mat
/// [Texture2D][12 KB] Assets/c.png
/// ```
pub fn to_plain_text(records: &[&AssetRecord]) -> String {
    let mut out = format!("Unreferenced Assets [{}]:\n", records.len());
    for record in records {
        let _ = writeln!(
            out,
            "[{}][{}] {}",
            record.type_name,
            format_size(record.size_bytes),
            record.path
        );
    }
    out
}
