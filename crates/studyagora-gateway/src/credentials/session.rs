//! Session credential creation and validation using HMAC-SHA256.
//!
//! Wire format: `<base64url(claims json)>.<hex(hmac-sha256(base64 part))>`.
//!
//! Sessions are stateless. Logout only clears the client's cookie; a copy of
//! the token captured elsewhere stays valid until its `exp`, because the
//! server keeps no revocation list.

use super::CredentialError;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use studyagora_kernel::auth::{Principal, Role, SessionClaims};

type HmacSha256 = Hmac<Sha256>;

/// A freshly signed session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub principal: Principal,
}

/// Issues and verifies session credentials with a single secret key.
pub struct SessionSigner {
    key: Vec<u8>,
    ttl: Duration,
}

impl SessionSigner {
    /// `secret` must be non-empty; length policy is enforced by settings
    /// validation.
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            key: secret.as_ref().to_vec(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a session for `subject`, valid for the configured TTL.
    pub fn issue(
        &self,
        subject: &str,
        phone: Option<String>,
        role: Role,
        plan: &str,
    ) -> Result<IssuedSession, CredentialError> {
        self.issue_at(subject, phone, role, plan, Utc::now())
    }

    fn issue_at(
        &self,
        subject: &str,
        phone: Option<String>,
        role: Role,
        plan: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, CredentialError> {
        if subject.is_empty() {
            return Err(CredentialError::Malformed("subject must not be empty".into()));
        }
        let claims = SessionClaims::new(subject, phone, role, plan, now, self.ttl);
        let principal = claims
            .to_principal()
            .ok_or_else(|| CredentialError::Malformed("expiry out of range".into()))?;

        let json = serde_json::to_vec(&claims)
            .map_err(|e| CredentialError::Malformed(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());

        Ok(IssuedSession {
            token: format!("{payload}.{signature}"),
            principal,
        })
    }

    /// Check signature and expiry, returning the embedded principal.
    pub fn verify(&self, token: &str) -> Result<Principal, CredentialError> {
        self.verify_at(token, Utc::now())
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, CredentialError> {
        let (payload, signature) = token
            .trim()
            .split_once('.')
            .ok_or_else(|| CredentialError::Malformed("expected <payload>.<signature>".into()))?;

        let sig_bytes = hex::decode(signature)
            .map_err(|_| CredentialError::Malformed("signature is not valid hex".into()))?;

        // Constant-time comparison via HMAC verify.
        self.mac(payload)?
            .verify_slice(&sig_bytes)
            .map_err(|_| CredentialError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| CredentialError::Malformed("payload is not valid base64".into()))?;
        let claims: SessionClaims = serde_json::from_slice(&json)
            .map_err(|e| CredentialError::Malformed(format!("invalid claims: {e}")))?;

        if claims.is_expired(now) {
            return Err(CredentialError::Expired);
        }
        claims
            .to_principal()
            .ok_or_else(|| CredentialError::Malformed("expiry out of range".into()))
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256, CredentialError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| CredentialError::Malformed(format!("HMAC error: {e}")))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cookie helpers
// ─────────────────────────────────────────────────────────────────────────────

/// `Set-Cookie` value carrying `token`.
pub fn session_cookie(name: &str, token: &str, ttl: Duration, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{name}={token}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax{secure}",
        ttl.num_seconds().max(0)
    )
}

/// `Set-Cookie` value that removes the session cookie from the client.
pub fn clear_session_cookie(name: &str, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{name}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax{secure}")
}

/// Find cookie `name` in a raw `Cookie` header.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn signer() -> SessionSigner {
        SessionSigner::new(SECRET, Duration::days(7))
    }

    #[test]
    fn issue_and_verify() {
        let issued = signer()
            .issue("+919800000001", Some("+919800000001".into()), Role::Student, "free")
            .unwrap();
        let principal = signer().verify(&issued.token).unwrap();
        assert_eq!(principal.id, "+919800000001");
        assert_eq!(principal.plan, "free");
        assert_eq!(principal, issued.principal);
    }

    #[test]
    fn wrong_key_is_rejected() {
        let issued = signer().issue("user-1", None, Role::Student, "free").unwrap();
        let other = SessionSigner::new("another-secret-another-secret-00", Duration::days(7));
        assert_eq!(other.verify(&issued.token), Err(CredentialError::BadSignature));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let issued = signer().issue("user-1", None, Role::Student, "free").unwrap();
        let (_, sig) = issued.token.split_once('.').unwrap();
        let forged_claims = URL_SAFE_NO_PAD.encode(
            br#"{"sub":"admin","role":"admin","plan":"pro","iat":0,"exp":99999999999}"#,
        );
        let forged = format!("{forged_claims}.{sig}");
        assert_eq!(signer().verify(&forged), Err(CredentialError::BadSignature));
    }

    #[test]
    fn expired_token_is_rejected() {
        let issued_at = Utc::now() - Duration::days(8);
        let issued = signer()
            .issue_at("user-1", None, Role::Student, "free", issued_at)
            .unwrap();
        assert_eq!(signer().verify(&issued.token), Err(CredentialError::Expired));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            signer().verify("not-a-token"),
            Err(CredentialError::Malformed(_))
        ));
        assert!(matches!(
            signer().verify("abc.zz"),
            Err(CredentialError::Malformed(_))
        ));
    }

    #[test]
    fn empty_subject_is_refused() {
        assert!(signer().issue("", None, Role::Student, "free").is_err());
    }

    #[test]
    fn cookie_helpers() {
        let set = session_cookie("session", "tok", Duration::days(7), true);
        assert!(set.starts_with("session=tok;"));
        assert!(set.contains("Max-Age=604800"));
        assert!(set.contains("HttpOnly"));
        assert!(set.ends_with("; Secure"));

        assert!(clear_session_cookie("session", false).contains("Max-Age=0"));

        let header = "theme=dark; session=abc.def ; other=1";
        assert_eq!(cookie_value(header, "session"), Some("abc.def"));
        assert_eq!(cookie_value(header, "missing"), None);
        assert_eq!(cookie_value("session=", "session"), None);
    }
}
