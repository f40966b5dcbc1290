//! Merging the annotation log onto projected rows.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use fbg_model::{AnnotationRecord, EditBuffer, Row};

/// Current annotation per natural key.
pub type CurrentAnnotations = BTreeMap<String, AnnotationRecord>;

/// Reduce a log to its current record per key.
///
/// The record with the highest version wins; equal versions fall back to
/// the latest `modified_at` and then to [`AnnotationRecord::precedence`], so
/// the result does not depend on the order of `records`.
pub fn select_current<'a, I>(records: I) -> CurrentAnnotations
where
    I: IntoIterator<Item = &'a AnnotationRecord>,
{
    let mut current: CurrentAnnotations = BTreeMap::new();
    for record in records {
        match current.get(&record.key) {
            Some(existing) if existing.precedence(record) != Ordering::Less => {}
            _ => {
                current.insert(record.key.clone(), record.clone());
            }
        }
    }
    current
}

/// [`select_current`] restricted to one dataset.
pub fn select_current_for<'a, I>(records: I, dataset_id: &str) -> CurrentAnnotations
where
    I: IntoIterator<Item = &'a AnnotationRecord>,
{
    let current = select_current(
        records
            .into_iter()
            .filter(|record| record.dataset_id == dataset_id),
    );
    tracing::trace!("{} keys annotated in {}", current.len(), dataset_id);
    current
}

/// Overlay current annotations onto rows.
///
/// Rows whose natural key has a current record get every overlay field
/// replaced by the record's field of the same name (empty when the record
/// lacks it). Read-only fields, keys and positions are untouched. Rows with a
/// synthetic key never match, even if a record carries the same literal text.
/// Rows without a match are returned as they are.
pub fn apply(rows: &[Row], current: &CurrentAnnotations) -> Vec<Row> {
    rows.iter()
        .map(|row| {
            let Some(record) = row.natural_key().and_then(|key| current.get(key)) else {
                return row.clone();
            };

            let mut merged = row.clone();
            for field in &mut merged.overlay {
                field.cell.text = record
                    .field(&field.overlay)
                    .unwrap_or_default()
                    .to_string();
            }
            merged
        })
        .collect()
}

/// Show unsaved edits over merged rows.
///
/// Display-only; the authoritative state is whatever the store returns after
/// the next save and refresh.
pub fn overlay_pending(rows: &[Row], pending: &EditBuffer) -> Vec<Row> {
    rows.iter()
        .map(|row| {
            let Some(edits) = row.natural_key().and_then(|key| pending.edits_for(key)) else {
                return row.clone();
            };

            let mut edited = row.clone();
            for (overlay, value) in edits {
                edited.set_overlay(overlay, value.as_str());
            }
            edited
        })
        .collect()
}
