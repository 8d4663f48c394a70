//! Compact token codec (HS256).
//!
//! Wire format: `base64url(header).base64url(claims).base64url(signature)`.
//! `decode` performs the structural and signature steps; expiry is the
//! validator's job because it needs `now`.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde_json::{Map, Value};
use tracing::error;

use crate::error::AppError;
use crate::services::auth::claims::Claims;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
}

/// HMAC-SHA256 signer/verifier over the process-wide secret.
///
/// Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtCodec")
            .field("algorithm", &ALGORITHM)
            .finish()
    }
}

impl JwtCodec {
    pub fn new(secret: &[u8]) -> Self {
        // Expiry is checked in milliseconds by the validator, so the library's
        // seconds-based claim checks are all switched off.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        let header = Header::new(ALGORITHM);
        jsonwebtoken::encode(&header, claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign token");
            AppError::Internal
        })
    }

    /// Structural decode, then signature check. Does not look at `exp`.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let alg = check_structure(token)?;
        if alg != "HS256" {
            return Err(TokenError::SignatureInvalid);
        }

        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::SignatureInvalid
                }
                _ => TokenError::Malformed,
            })
    }
}

/// Three non-empty base64url segments, a JSON object header with a string
/// `alg`, well-formed claims with a non-empty subject. Returns the header `alg`.
fn check_structure(token: &str) -> Result<String, TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(claims), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed);
    };

    let header = decode_segment(header)?;
    let claims = decode_segment(claims)?;
    let signature = decode_segment(signature)?;
    if signature.is_empty() {
        return Err(TokenError::Malformed);
    }

    let header: Map<String, Value> =
        serde_json::from_slice(&header).map_err(|_| TokenError::Malformed)?;
    let alg = header
        .get("alg")
        .and_then(Value::as_str)
        .ok_or(TokenError::Malformed)?
        .to_string();

    let claims: Claims = serde_json::from_slice(&claims).map_err(|_| TokenError::Malformed)?;
    if claims.subject().trim().is_empty() {
        return Err(TokenError::Malformed);
    }

    Ok(alg)
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, TokenError> {
    if segment.is_empty() {
        return Err(TokenError::Malformed);
    }
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)
}
