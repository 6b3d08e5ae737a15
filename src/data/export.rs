use std::io::Write;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::errors::ExportError;

use super::model::Record;

/// Write `records` as delimited text with exactly the given columns, in that order.
///
/// Every cell is double-quoted with embedded quotes doubled. Lines end in `\n`.
/// A column a record does not have is written as an empty cell.
pub fn write_csv<W, S>(out: W, records: &[Record], columns: &[S]) -> Result<(), ExportError>
where
    W: Write,
    S: AsRef<str>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(out);

    writer.write_record(columns.iter().map(|c| c.as_ref()))?;
    for record in records {
        writer.write_record(columns.iter().map(|c| record.field(c.as_ref())))?;
    }
    writer.flush()?;
    Ok(())
}

/// Same as [`write_csv`], returned as a string.
pub fn export_csv<S: AsRef<str>>(records: &[Record], columns: &[S]) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(&mut buf, records, columns)?;
    Ok(String::from_utf8(buf)?)
}
