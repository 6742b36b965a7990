/// JSON output for extracted breaking changes.
///
/// Records are streamed into a single JSON array as they are produced, using the same
/// two-space indentation as `serde_json::to_string_pretty`.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::ser::{SerializeSeq, Serializer as _};
use serde_json::ser::PrettyFormatter;
use serde_json::Serializer;

use crate::error::AppError;
use crate::model::BreakingChange;

/// Write every record yielded by `records` into one JSON array.
///
/// Stops at the first `Err` and returns it; whatever was written so far stays in
/// `writer`. Returns the number of records written.
pub fn write_records<W, I>(writer: W, records: I) -> Result<usize, AppError>
where
    W: Write,
    I: IntoIterator<Item = Result<BreakingChange, AppError>>,
{
    let mut ser = Serializer::with_formatter(writer, PrettyFormatter::with_indent(b"  "));
    let mut seq = ser.serialize_seq(None)?;
    let mut written = 0;
    for record in records {
        seq.serialize_element(&record?)?;
        written += 1;
    }
    seq.end()?;
    Ok(written)
}

/// Create (or overwrite) `path` and write the records into it.
pub fn write_records_to_path<I>(path: &Path, records: I) -> Result<usize, AppError>
where
    I: IntoIterator<Item = Result<BreakingChange, AppError>>,
{
    let output_error = |source| AppError::Output {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(output_error)?;
    let mut writer = BufWriter::new(file);
    let written = write_records(&mut writer, records).map_err(|e| match e {
        AppError::Json(e) if e.is_io() => output_error(e.into()),
        other => other,
    })?;
    writer.flush().map_err(output_error)?;
    Ok(written)
}
