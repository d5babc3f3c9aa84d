//! Credential machinery for the authenticated access policy.
//!
//! - [`session`]: HMAC-signed, time-boxed session tokens and cookie helpers.
//! - [`identity`]: verification of externally issued identity tokens (JWT).
//! - [`otp`]: one-time passcode issuance, delivery and exchange.

pub mod identity;
pub mod otp;
pub mod session;

pub use identity::{IdentityClaims, IdentityVerifier};
pub use otp::{LogOtpSender, OtpSender, OtpStore};
pub use session::{IssuedSession, SessionSigner};

use thiserror::Error;

/// Why a credential was refused.
///
/// Everything except [`Delivery`](CredentialError::Delivery) maps to `401`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("missing credential")]
    Missing,

    #[error("malformed credential: {0}")]
    Malformed(String),

    #[error("credential signature mismatch")]
    BadSignature,

    #[error("credential expired")]
    Expired,

    #[error("invalid passcode")]
    InvalidPasscode,

    #[error("passcode expired")]
    PasscodeExpired,

    #[error("too many incorrect passcode attempts")]
    TooManyAttempts,

    #[error("identity token rejected: {0}")]
    Identity(String),

    /// The out-of-band channel failed to deliver a passcode.
    #[error("passcode delivery failed: {0}")]
    Delivery(String),
}
