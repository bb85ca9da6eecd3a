//! Engine error types.

use aegis_core::Id;

/// Errors that prevent an asset manager from functioning. Everything
/// recoverable is handled locally and surfaced as protocol messages
/// instead.
#[derive(Debug, thiserror::Error)]
pub enum C2Error {
    /// The node's own asset record was not present at initialization.
    #[error("own asset {0} is not present in the asset table")]
    OwnAssetMissing(Id),
}
