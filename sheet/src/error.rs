use thiserror::Error;

/// Errors returned by a permission sheet.
#[derive(Error, Debug)]
pub enum SheetError {
    /// The sheet cannot close until every permission is granted.
    #[error("{denied} permission(s) denied and {pending} still pending")]
    NotAllGranted {
        /// Entries the user refused.
        denied: usize,
        /// Entries without an answer yet.
        pending: usize,
    },

    /// The sheet configuration could not be parsed.
    #[error("invalid sheet configuration: {0}")]
    Config(#[from] serde_json::Error),
}
