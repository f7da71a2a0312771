//! Notebook aggregation pipeline for steamlib.
//!
//! Lists notebooks from the remote note service, populates each with its
//! notes, and resolves every note's tags. Work fans out concurrently at each
//! level (notebooks, notes within a notebook, tags within a note) and joins
//! before the parent record is returned.
//!
//! The entry point is [`Aggregator`]; [`list_all_notebooks`] and
//! [`get_default_notebook_with_notes`] are one-shot shortcuts using default
//! settings.

mod assembler;
mod context;
pub mod facade;
mod gateway;
mod mapping;
pub mod options;
mod populator;
pub mod progress;
mod tag_cache;

#[cfg(test)]
mod testing;

pub use facade::{
    AccountSnapshot, Aggregator, NotebookFailure, get_default_notebook_with_notes,
    list_all_notebooks,
};
pub use options::{AggregateOptions, RetryPolicy};
pub use progress::{ProgressReporter, SilentProgress};
