/// Domain error taxonomy for the session/token lifecycle.
///
/// Every variant maps to exactly one HTTP status at the API boundary
/// (see `keygate-api`'s `AppError`). Store failures are never folded into
/// a domain variant -- they stay as `Internal` so a flaky database cannot
/// masquerade as a failed login.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("User not found.")]
    AccountNotFound,

    #[error("User not active.")]
    AccountNotActive,

    #[error("Invalid login or password.")]
    AuthenticationFailed,

    #[error("Password does not match.")]
    PasswordMismatch,

    #[error("A user with this email already exists.")]
    EmailAlreadyExists,

    #[error("Invalid token or expired.")]
    InvalidToken,

    #[error("Invalid token type {found:?}. Expected {expected:?}")]
    InvalidTokenType { found: String, expected: String },

    /// Registration submitted without a user agent or client ip.
    #[error("Device information is missing.")]
    MissingDeviceInfo,

    /// Refresh presented from a device that does not match the session
    /// record. Treated as a hijack signal; the session is destroyed.
    #[error("Invalid device.")]
    InvalidDevice,

    #[error("Device not found.")]
    DeviceNotFound,

    #[error("User has no registered devices.")]
    NoDevicesFound,

    #[error("Internal error: {0}")]
    Internal(String),
}
