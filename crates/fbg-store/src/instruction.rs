//! Append instruction builder.
//!
//! The store accepts a single INSERT per write. Column names are restricted to
//! `[A-Za-z0-9_]`; field names that carry anything else are rewritten with
//! underscores so a display label can never break out of the column list.

use fbg_model::AnnotationRecord;

use crate::error::{Result, StoreError};

/// Rewrite a field name into a safe column identifier.
pub fn sanitize_identifier(name: &str) -> String {
    let mut ident: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

/// Validate a table name, which is configuration and never rewritten.
pub fn validate_table(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && !table.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(StoreError::Config(format!("invalid table name '{table}'")))
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Build the INSERT that appends `record` to `table`.
///
/// Metadata columns come first, then the fields in name order, so the same
/// record always yields the same statement.
pub fn insert_statement(table: &str, record: &AnnotationRecord) -> Result<String> {
    validate_table(table)?;

    let mut columns: Vec<String> = [
        "dataset_id",
        "row_key",
        "version",
        "created_by",
        "created_at",
        "modified_by",
        "modified_at",
        "session_id",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    let mut values = vec![
        quote(&record.dataset_id),
        quote(&record.key),
        record.version.to_string(),
        quote(&record.created_by),
        quote(&record.created_at.to_rfc3339()),
        quote(&record.modified_by),
        quote(&record.modified_at.to_rfc3339()),
        quote(&record.session_id),
    ];

    for (name, value) in &record.fields {
        let column = sanitize_identifier(name);
        if column.is_empty() || columns.contains(&column) {
            return Err(StoreError::InvalidInstruction(format!(
                "field '{name}' does not map to a unique column"
            )));
        }
        columns.push(column);
        values.push(quote(value));
    }

    Ok(format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        values.join(", ")
    ))
}
