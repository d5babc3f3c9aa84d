//! Identity types shared by the credential machinery and request handlers.
//!
//! A session is never stored server-side: everything needed to rebuild the
//! [`Principal`] travels inside the signed [`SessionClaims`]. The only
//! server-side state is a pending one-time passcode, whose lifecycle follows
//! [`SessionState`].

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse authorization role carried in the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => f.write_str("student"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

/// The authenticated identity attached to an admitted request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable user identifier (the phone number for passcode logins).
    pub id: String,
    pub phone: Option<String>,
    pub role: Role,
    /// Subscription plan name, e.g. `"free"`.
    pub plan: String,
    /// Instant after which the carrying credential is rejected.
    pub expires_at: DateTime<Utc>,
}

/// Payload signed into a session credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub plan: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

impl SessionClaims {
    /// Claims for `subject`, valid for `ttl` from `now`.
    pub fn new(
        subject: impl Into<String>,
        phone: Option<String>,
        role: Role,
        plan: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: subject.into(),
            phone,
            role,
            plan: plan.into(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Rebuild the principal. Returns `None` when `exp` is out of range.
    pub fn to_principal(&self) -> Option<Principal> {
        let expires_at = Utc.timestamp_opt(self.exp, 0).single()?;
        Some(Principal {
            id: self.sub.clone(),
            phone: self.phone.clone(),
            role: self.role,
            plan: self.plan.clone(),
            expires_at,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session state machine
// ─────────────────────────────────────────────────────────────────────────────

/// Server-side lifecycle of a passcode login.
///
/// ```text
/// Unauthenticated ──PasscodeRequested──► PendingVerification
/// PendingVerification ──PasscodeRejected──► PendingVerification (attempts+1)
///                                        └─► Unauthenticated (limit reached)
/// ```
///
/// A correct passcode ends the pending state and mints a signed session.
/// From then on the authenticated state lives in the [`SessionClaims`]:
/// expiry is [`SessionClaims::is_expired`], logout clears the cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    PendingVerification { failed_attempts: u32 },
}

/// Input driving a [`SessionState`] transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    PasscodeRequested,
    PasscodeRejected,
}

impl SessionState {
    /// Apply `event`. `max_attempts` caps wrong passcode submissions; `None`
    /// allows unlimited guesses.
    pub fn on(self, event: SessionEvent, max_attempts: Option<u32>) -> Self {
        use SessionEvent as E;
        use SessionState as S;

        match (self, event) {
            // A fresh request always restarts verification.
            (_, E::PasscodeRequested) => S::PendingVerification { failed_attempts: 0 },
            (S::PendingVerification { failed_attempts }, E::PasscodeRejected) => {
                let failed_attempts = failed_attempts.saturating_add(1);
                match max_attempts {
                    Some(limit) if failed_attempts >= limit => S::Unauthenticated,
                    _ => S::PendingVerification { failed_attempts },
                }
            }
            (S::Unauthenticated, E::PasscodeRejected) => S::Unauthenticated,
        }
    }
}
