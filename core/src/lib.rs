//! Domain model and request rules for the todo service.
//!
//! # Overview
//! Holds everything about a todo that does not touch the network or the
//! database: the wire DTOs, batch validation, pagination arithmetic and the
//! closed set of semantic store-error kinds the persistence layer maps its
//! driver errors into.
//!
//! # Design
//! - `Todo` is the stored record; `TodoInput` is what clients submit. The two
//!   are kept apart so optional wire fields never leak into stored rows.
//! - Validation turns a whole batch into `NewTodo` / `TodoChanges` values or
//!   fails on the first bad record, before anything is written.
//! - The server crate owns the I/O; integration tests there exercise these
//!   types end to end.

pub mod error;
pub mod page;
pub mod types;
pub mod validate;

pub use error::{StoreErrorKind, ValidationError};
pub use page::{PageRequest, PageWindow, Pagination, TodoPage, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use types::{NewTodo, Todo, TodoBatch, TodoChanges, TodoInput};
pub use validate::{parse_due_date, validate_new_batch, validate_update_batch};
