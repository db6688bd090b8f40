// src/token/signer.rs

use super::{LogoutTokenClaims, LogoutTokenSigner, LOGOUT_TOKEN_TYPE};
use crate::error::NilaLogoutError;
use base64::engine::{general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{pkcs8::DecodePrivateKey, RsaPrivateKey};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Defines the source for the logout token signing key.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "value")]
#[serde(rename_all = "snake_case")]
pub enum SigningKeyConfig {
    /// A shared secret for symmetric algorithms (e.g., HS256).
    SharedSecret(String),
    /// Path to a PEM-encoded (PKCS#8) RSA private key file.
    RsaPemFile(PathBuf),
}

/// Signs logout tokens with `jsonwebtoken`.
///
/// The encoding key is immutable after construction, so one signer can be
/// shared by every concurrent delivery.
#[derive(Clone)]
pub struct JwtLogoutTokenSigner {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    // Public key in JWK format, only for asymmetric keys.
    public_jwk: Option<serde_json::Value>,
}

impl JwtLogoutTokenSigner {
    /// Creates a signer from the configured key material.
    pub fn new(algorithm: Algorithm, signing_key: &SigningKeyConfig) -> Result<Self, NilaLogoutError> {
        let (encoding_key, public_jwk) = match signing_key {
            SigningKeyConfig::SharedSecret(secret) => {
                if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
                    return Err(NilaLogoutError::InvalidConfiguration(format!(
                        "A shared secret cannot sign {:?} tokens",
                        algorithm
                    )));
                }
                (EncodingKey::from_secret(secret.as_bytes()), None)
            }
            SigningKeyConfig::RsaPemFile(path) => {
                let pem = std::fs::read_to_string(path).map_err(|e| {
                    NilaLogoutError::InvalidKeyFormat(format!(
                        "Failed to read RSA private key file from {:?}: {}",
                        path, e
                    ))
                })?;
                Self::rsa_key_material(algorithm, &pem)?
            }
        };

        Ok(Self {
            algorithm,
            encoding_key,
            public_jwk,
        })
    }

    fn rsa_key_material(
        algorithm: Algorithm,
        pem: &str,
    ) -> Result<(EncodingKey, Option<serde_json::Value>), NilaLogoutError> {
        if !matches!(
            algorithm,
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 | Algorithm::PS256 | Algorithm::PS384 | Algorithm::PS512
        ) {
            return Err(NilaLogoutError::InvalidConfiguration(format!(
                "An RSA key cannot sign {:?} tokens",
                algorithm
            )));
        }

        let private_key = RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| {
            NilaLogoutError::InvalidKeyFormat(format!(
                "Failed to parse RSA private key from PKCS#8 PEM: {}",
                e
            ))
        })?;

        // jsonwebtoken handles PKCS#1 DER more reliably than PKCS#8 PEM.
        let pkcs1_der = private_key.to_pkcs1_der().map_err(|e| {
            NilaLogoutError::InvalidKeyFormat(format!("Failed to convert RSA key to PKCS#1 DER: {}", e))
        })?;
        let key = EncodingKey::from_rsa_der(pkcs1_der.as_bytes());
        let public_key = private_key.to_public_key();

        let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());

        // JWK thumbprint (RFC 7638): members in lexicographic order, no whitespace.
        let canonical_jwk = format!(r#"{{"e":"{}","kty":"RSA","n":"{}"}}"#, e, n);
        let kid = URL_SAFE_NO_PAD.encode(Sha256::digest(canonical_jwk.as_bytes()));

        let jwk = json!({
            "kty": "RSA",
            "n": n,
            "e": e,
            "alg": format!("{:?}", algorithm),
            "use": "sig",
            "kid": kid,
        });

        Ok((key, Some(jwk)))
    }

    /// The `kid` placed in token headers, if the key is asymmetric.
    pub fn kid(&self) -> Option<&str> {
        self.public_jwk.as_ref()?.get("kid")?.as_str()
    }

    /// Returns the public JWKS relying parties use to verify logout tokens.
    /// `None` for shared-secret keys.
    pub fn get_public_jwks(&self) -> Option<serde_json::Value> {
        self.public_jwk.as_ref().map(|jwk| json!({ "keys": [jwk] }))
    }
}

impl LogoutTokenSigner for JwtLogoutTokenSigner {
    fn sign(&self, claims: &LogoutTokenClaims) -> Result<String, NilaLogoutError> {
        let mut header = Header::new(self.algorithm);
        header.typ = Some(LOGOUT_TOKEN_TYPE.to_string());
        header.kid = self.kid().map(str::to_string);

        encode(&header, claims, &self.encoding_key).map_err(|e| {
            tracing::error!(aud = %claims.aud, error = %e, "Failed to sign logout token.");
            NilaLogoutError::from(e)
        })
    }
}
