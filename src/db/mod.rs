pub mod employees;
pub mod locations;
pub mod log;
pub mod migrate;
pub mod pool;
pub mod sessions;
pub mod settings;
pub mod stats;

use crate::errors::{AppError, AppResult};

/// Build the error a row mapper returns when a stored value cannot be parsed
/// into its typed model.
pub(crate) fn malformed(column: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(AppError::MalformedRecord(format!(
            "column '{column}' has unexpected value '{value}'"
        ))),
    )
}

/// Collect mapped rows, surfacing parse failures as `MalformedRecord`.
pub(crate) fn collect_rows<T, I>(rows: I) -> AppResult<Vec<T>>
where
    I: Iterator<Item = rusqlite::Result<T>>,
{
    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(from_row_error)?);
    }
    Ok(out)
}

pub(crate) fn from_row_error(e: rusqlite::Error) -> AppError {
    match e {
        rusqlite::Error::FromSqlConversionFailure(_, _, inner) => {
            AppError::MalformedRecord(inner.to_string())
        }
        other => AppError::Db(other),
    }
}

/// True when the error comes from a UNIQUE constraint (or unique index).
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub(crate) fn is_primary_key_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}
