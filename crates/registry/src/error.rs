use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by catalog loading and lookup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("resource not found: {name}")]
    ResourceNotFound { name: String },

    #[error("command not found: {name} in resource {resource}")]
    CommandNotFound { resource: String, name: String },

    #[error("cannot read configuration directory {dir}: {source}")]
    ConfigDirUnreadable {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no resources loaded from {dir}")]
    EmptyCatalog { dir: PathBuf },
}
