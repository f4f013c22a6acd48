//! # Error Handling
//!
//! Error taxonomy for the synchronization pass. Key resolution, decryption
//! and configuration-fetch failures abort the run; persistence failures are
//! scoped to a single entry's transaction and only surface in the report.

use thiserror::Error;

use crate::crypto::CryptoError;

/// Errors surfaced by a synchronization run
#[derive(Debug, Error)]
pub enum SyncError {
    /// The symmetric key could not be resolved. Fatal before any entry runs.
    #[error("failed to resolve symmetric key from secret entry '{source_id}': {reason}")]
    KeyResolution { source_id: String, reason: String },

    /// A token ciphertext could not be decrypted under the run key. Aborts
    /// the remainder of the run.
    #[error(transparent)]
    Decryption(#[from] CryptoError),

    /// The configuration record could not be read from the backing store.
    /// An absent record is not an error; this covers storage failures only.
    #[error("failed to fetch configuration record '{key}'")]
    ConfigFetch {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// A single entry's registry transaction failed. Later entries still run.
    #[error("failed to persist connection '{conn_id}'")]
    Persistence {
        conn_id: String,
        #[source]
        source: anyhow::Error,
    },
}
