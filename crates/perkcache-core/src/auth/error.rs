use thiserror::Error;

/// Failures of the token acquisition flow. Cloneable so one result can fan
/// out to every caller queued behind the same attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The user declined the host permission prompt. Fatal for the current
    /// flow; the identity provider asks the host to close the app.
    #[error("identity permissions denied by the user")]
    PermissionDenied,

    /// The host returned an empty display name or phone number.
    #[error("host identity incomplete: missing {0}")]
    IncompleteIdentity(String),

    /// The host SDK failed for a reason other than denial or missing fields.
    #[error("identity provider error: {0}")]
    Provider(String),

    /// The backend rejected or failed the token exchange. The HTTP status is
    /// kept for logging; envelope-level rejections have none.
    #[error("token exchange failed{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Exchange {
        status: Option<u16>,
        message: String,
    },
}
