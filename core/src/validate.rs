//! Batch validation for create and update requests.
//!
//! Both entry points walk the batch in order and stop at the first bad
//! record, so a rejected batch never reaches the store.

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::types::{NewTodo, TodoChanges, TodoInput};

/// Parse an RFC 3339 timestamp and normalize it to UTC.
pub fn parse_due_date(raw: &str, index: usize) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|_| ValidationError::InvalidDueDate {
            index,
            value: raw.to_string(),
        })
}

fn due_date(input: &TodoInput, index: usize) -> Result<Option<DateTime<Utc>>, ValidationError> {
    input
        .due_date
        .as_deref()
        .map(|raw| parse_due_date(raw, index))
        .transpose()
}

/// Validate a create batch: non-empty, every title present, every due date
/// RFC 3339. Ids in the input are ignored.
pub fn validate_new_batch(batch: &[TodoInput]) -> Result<Vec<NewTodo>, ValidationError> {
    if batch.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }

    batch
        .iter()
        .enumerate()
        .map(|(index, input)| {
            let title = match input.title.as_deref() {
                Some(title) if !title.is_empty() => title.to_string(),
                _ => return Err(ValidationError::MissingTitle { index }),
            };
            Ok(NewTodo {
                title,
                description: input.description.clone(),
                due_date: due_date(input, index)?,
                complete: input.complete.unwrap_or(false),
            })
        })
        .collect()
}

/// Validate an update batch: non-empty, every record carries a positive id,
/// every due date RFC 3339.
///
/// Zero values count as "not supplied" and are dropped from the resulting
/// changes: empty `title` and `description`, and `complete: false`. An update
/// can mark a todo done but never reopen it.
pub fn validate_update_batch(
    batch: &[TodoInput],
) -> Result<Vec<(i64, TodoChanges)>, ValidationError> {
    if batch.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }

    batch
        .iter()
        .enumerate()
        .map(|(index, input)| {
            let id = input
                .id
                .filter(|id| *id > 0)
                .ok_or(ValidationError::MissingId { index })?;
            let changes = TodoChanges {
                title: input.title.clone().filter(|title| !title.is_empty()),
                description: input.description.clone().filter(|text| !text.is_empty()),
                due_date: due_date(input, index)?,
                complete: input.complete.filter(|done| *done),
            };
            Ok((id, changes))
        })
        .collect()
}
