//! Shared types, error model, and configuration for steamlib.
//!
//! This crate is the foundation depended on by all other steamlib crates.
//! It provides:
//! - [`SteamError`]: the unified error type, including the aggregation taxonomy
//! - Domain types ([`Notebook`], [`Note`], [`Tag`], [`NoteSummary`], [`NoteFilter`], [`FieldSpec`])
//! - Configuration ([`AppConfig`], [`RemoteConfig`], config loading, token lookup)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AggregateConfig, AppConfig, RemoteConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, load_token,
};
pub use error::{Result, SteamError};
pub use types::{
    DEFAULT_PAGE_SIZE, DEFAULT_TIME_ZONE, Environment, FieldSpec, Note, NoteContent, NoteFilter,
    NoteSummary, Notebook, Resource, Tag,
};
