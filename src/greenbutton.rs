//! Green Button CSV loading for the command-line front-end.
//!
//! The engine consumes already-split rows; this module only locates the
//! header line in an export and splits the columns.

use std::{fs, path::Path};

use csv::{ReaderBuilder, Trim};

use crate::{prelude::*, usage::RawRow};

pub fn load(path: &Path) -> Result<Vec<RawRow>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;
    parse(&text)
}

/// Split an export into raw rows.
///
/// Green Button files carry a metadata preamble (account, meter, disclaimer
/// lines); data starts at the header line. Unknown columns are carried
/// through on the row.
pub fn parse(text: &str) -> Result<Vec<RawRow>> {
    let header_at = text
        .lines()
        .position(|line| line.trim_start().starts_with("Date,"))
        .context("no `Date` header line found in the CSV")?;
    let data = text.lines().skip(header_at).collect::<Vec<_>>().join("\n");

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data.as_bytes());
    let headers = reader.headers().context("failed to read the CSV header")?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        // Unreadable lines flow into the same silent-skip policy that
        // ingestion applies to malformed fields.
        let Ok(record) = record else { continue };
        let mut row = RawRow::default();
        for (header, value) in headers.iter().zip(record.iter()) {
            match header {
                "Date" => row.date = value.to_owned(),
                "Start Time" => row.start_time = value.to_owned(),
                "Consumption" => row.consumption = value.to_owned(),
                _ => {
                    row.extra.insert(header.to_owned(), value.to_owned());
                }
            }
        }
        rows.push(row);
    }
    info!(n_rows = rows.len(), "loaded usage rows");
    Ok(rows)
}
