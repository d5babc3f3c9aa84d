//! Verification of identity tokens issued by a trusted third party.
//!
//! The issuer signs a JWT (RS256 with a published public key, or HS256 with
//! a shared secret). A token that verifies against the configured key, has
//! the expected `iss` (and `aud`, when configured) and is unexpired yields
//! [`IdentityClaims`], from which the gateway mints its own session.

use super::CredentialError;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use studyagora_kernel::auth::Role;
use studyagora_kernel::gateway::{GatewayError, IdentitySettings};

/// Claims the gateway reads from an identity token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    #[serde(default, alias = "phone")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    pub iss: String,
    pub exp: i64,
}

pub struct IdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl IdentityVerifier {
    pub fn from_settings(settings: &IdentitySettings) -> Result<Self, GatewayError> {
        let (key, algorithm) = match (&settings.rsa_public_key_pem, &settings.hs256_secret) {
            (Some(pem), None) => {
                let key = DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
                    GatewayError::InvalidAuthConfig(format!("identity public key: {e}"))
                })?;
                (key, Algorithm::RS256)
            }
            (None, Some(secret)) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
            _ => {
                return Err(GatewayError::InvalidAuthConfig(
                    "identity needs exactly one of rsa_public_key_pem or hs256_secret".into(),
                ));
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[settings.issuer.as_str()]);
        match &settings.audience {
            Some(aud) => validation.set_audience(&[aud.as_str()]),
            None => validation.validate_aud = false,
        }
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Ok(Self { key, validation })
    }

    pub fn verify(&self, token: &str) -> Result<IdentityClaims, CredentialError> {
        let data = decode::<IdentityClaims>(token.trim(), &self.key, &self.validation)
            .map_err(|e| CredentialError::Identity(e.to_string()))?;
        if data.claims.sub.trim().is_empty() {
            return Err(CredentialError::Identity("empty subject".into()));
        }
        Ok(data.claims)
    }
}
