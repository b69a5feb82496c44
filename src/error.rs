use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;

/// Conditions callers branch on; everything else travels as a plain `anyhow::Error`.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("configuration file {} does not exist", .path.display())]
    ConfigMissing { path: PathBuf },

    #[error("configuration file {} is not valid JSON: {source}", .path.display())]
    ConfigMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("configuration file declares no APIs under `apis`")]
    NoEndpoints,

    #[error("`default_api` refers to `{0}`, which is not listed under `apis`")]
    UnknownDefault(String),

    #[error("interrupted")]
    Interrupted,
}

impl DetectorError {
    /// Whether this error ends the process with a non-zero status and remediation text.
    pub fn is_config(&self) -> bool {
        !matches!(self, DetectorError::Interrupted)
    }
}

/// Returns true when the error chain bottoms out in an operator interrupt.
pub fn is_interrupted(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<DetectorError>(),
        Some(DetectorError::Interrupted)
    )
}
