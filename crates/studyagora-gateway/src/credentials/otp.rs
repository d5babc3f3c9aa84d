//! One-time passcode issuance and exchange.
//!
//! A passcode is bound to a phone number, expires after a fixed TTL and is
//! consumed by the first correct submission. Wrong submissions advance the
//! pending entry's [`SessionState`]; once the attempt limit is reached the
//! entry is dropped and the client must request a new code.
//!
//! **Dev mode** issues the fixed code `123456` (truncated to the configured
//! length). It is a placeholder for local testing and must never be enabled
//! in a deployment reachable by real users.

use super::CredentialError;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use std::time::{Duration, Instant};
use studyagora_kernel::auth::{SessionEvent, SessionState};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

const DEV_CODE_DIGITS: &str = "1234567890";

// ─────────────────────────────────────────────────────────────────────────────
// Delivery
// ─────────────────────────────────────────────────────────────────────────────

/// Out-of-band channel that delivers a passcode to the phone's owner.
#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send(&self, phone: &str, code: &str) -> Result<(), CredentialError>;
}

/// Writes the passcode to the log instead of sending it. Development only.
#[derive(Debug, Default)]
pub struct LogOtpSender;

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn send(&self, phone: &str, code: &str) -> Result<(), CredentialError> {
        info!(phone = %phone, otp = %code, "passcode issued (log delivery)");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

struct PendingPasscode {
    code: String,
    issued_at: Instant,
    state: SessionState,
}

/// In-memory pending passcodes keyed by phone number.
pub struct OtpStore {
    pending: DashMap<String, PendingPasscode>,
    ttl: Duration,
    length: usize,
    dev_mode: bool,
    max_attempts: Option<u32>,
}

impl OtpStore {
    pub fn new(ttl: Duration, length: u32, dev_mode: bool, max_attempts: Option<u32>) -> Self {
        if dev_mode {
            warn!("passcode dev mode is ON: every code is fixed and guessable");
        }
        Self {
            pending: DashMap::new(),
            ttl,
            length: length as usize,
            dev_mode,
            max_attempts,
        }
    }

    pub fn is_dev_mode(&self) -> bool {
        self.dev_mode
    }

    /// Create (or replace) the pending passcode for `phone` and return it.
    pub fn issue(&self, phone: &str) -> String {
        let code = if self.dev_mode {
            DEV_CODE_DIGITS.chars().cycle().take(self.length).collect::<String>()
        } else {
            let mut rng = rand::thread_rng();
            (0..self.length)
                .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
                .collect::<String>()
        };

        self.pending.insert(
            phone.to_string(),
            PendingPasscode {
                code: code.clone(),
                issued_at: Instant::now(),
                state: SessionState::Unauthenticated.on(SessionEvent::PasscodeRequested, self.max_attempts),
            },
        );
        code
    }

    /// Exchange `submitted` for the pending passcode of `phone`.
    ///
    /// The check and the removal happen under the entry lock, so two
    /// concurrent correct submissions cannot both succeed.
    pub fn verify(&self, phone: &str, submitted: &str) -> Result<(), CredentialError> {
        let Entry::Occupied(mut entry) = self.pending.entry(phone.to_string()) else {
            return Err(CredentialError::InvalidPasscode);
        };

        if entry.get().issued_at.elapsed() >= self.ttl {
            entry.remove();
            return Err(CredentialError::PasscodeExpired);
        }

        let matches: bool = entry
            .get()
            .code
            .as_bytes()
            .ct_eq(submitted.trim().as_bytes())
            .into();
        if matches {
            entry.remove();
            return Ok(());
        }

        let next = entry
            .get()
            .state
            .on(SessionEvent::PasscodeRejected, self.max_attempts);
        if next == SessionState::Unauthenticated {
            entry.remove();
            warn!(phone = %phone, "passcode attempt limit reached");
            return Err(CredentialError::TooManyAttempts);
        }
        entry.get_mut().state = next;
        Err(CredentialError::InvalidPasscode)
    }

    /// Drop every expired passcode.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.pending.retain(|_, p| p.issued_at.elapsed() < ttl);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
