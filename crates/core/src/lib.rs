//! Shared foundation for the replica bot:
//! - **Configuration** (`config`) - layered config (defaults → file → env → overrides)
//! - **Name generation** (`namegen`) - `<adjective>-<verb>` labels for cloned dashboards

pub mod config;
pub mod namegen;
