//! Google service-account authentication (OAuth2 JWT-bearer grant).
//!
//! A short-lived RS256 assertion is signed with the service account's
//! PKCS#8 key and exchanged at the token endpoint for an access token.
//! [`TokenSource`] is the seam the Sheets sender depends on.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bytes::Bytes;
use ring::rand::SystemRandom;
use ring::signature::{RsaKeyPair, RSA_PKCS1_SHA256};
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::PrivatePkcs8KeyDer;
use serde::{Deserialize, Serialize};

use super::{post, Post};
use crate::error::DeliveryError;
use crate::server::HttpClient;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, DeliveryError>;
}

#[derive(Serialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct TokenError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, DeliveryError> {
    let json =
        serde_json::to_vec(value).map_err(|e| DeliveryError::Credentials(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Build and sign the RS256 assertion for `claims`.
pub fn sign_assertion(claims: &Claims, private_key_pem: &str) -> Result<String, DeliveryError> {
    let der = PrivatePkcs8KeyDer::from_pem_slice(private_key_pem.as_bytes()).map_err(|e| {
        DeliveryError::Credentials(format!("private key is not a PKCS#8 PEM block: {e:?}"))
    })?;
    let key_pair = RsaKeyPair::from_pkcs8(der.secret_pkcs8_der())
        .map_err(|e| DeliveryError::Credentials(format!("private key rejected: {e}")))?;

    let header = Header {
        alg: "RS256",
        typ: "JWT",
    };
    let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(claims)?);

    let mut signature = vec![0; key_pair.public().modulus_len()];
    key_pair
        .sign(
            &RSA_PKCS1_SHA256,
            &SystemRandom::new(),
            signing_input.as_bytes(),
            &mut signature,
        )
        .map_err(|_| DeliveryError::Credentials("signing the assertion failed".into()))?;

    Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
}

pub struct ServiceAccount {
    client: HttpClient,
    email: String,
    private_key_pem: String,
    token_uri: String,
}

impl ServiceAccount {
    #[must_use]
    pub const fn new(
        client: HttpClient,
        email: String,
        private_key_pem: String,
        token_uri: String,
    ) -> Self {
        Self {
            client,
            email,
            private_key_pem,
            token_uri,
        }
    }

    #[must_use]
    pub fn claims(&self, issued_at: i64) -> Claims {
        Claims {
            iss: self.email.clone(),
            scope: SHEETS_SCOPE.into(),
            aud: self.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        }
    }
}

#[async_trait]
impl TokenSource for ServiceAccount {
    async fn access_token(&self) -> Result<String, DeliveryError> {
        let claims = self.claims(chrono::Utc::now().timestamp());
        let assertion = sign_assertion(&claims, &self.private_key_pem)?;

        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", JWT_BEARER_GRANT)
            .append_pair("assertion", &assertion)
            .finish();

        let (status, body) = post(
            &self.client,
            Post {
                uri: &self.token_uri,
                content_type: "application/x-www-form-urlencoded",
                bearer: None,
                body: Bytes::from(form),
            },
        )
        .await?;

        if !status.is_success() {
            let reason = serde_json::from_slice::<TokenError>(&body).map_or_else(
                |_| String::from_utf8_lossy(&body).into_owned(),
                |e| match e.error_description {
                    Some(d) => format!("{}: {d}", e.error),
                    None => e.error,
                },
            );
            return Err(DeliveryError::Credentials(format!(
                "token exchange rejected ({}): {reason}",
                status.as_u16()
            )));
        }

        serde_json::from_slice::<TokenResponse>(&body)
            .map(|t| t.access_token)
            .map_err(|e| DeliveryError::InvalidResponse(format!("token response: {e}")))
    }
}

/// A fixed token, for deployments that mint tokens out of band.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, DeliveryError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::build_http_client;

    #[test]
    fn claims_cover_one_hour() {
        let account = ServiceAccount::new(
            build_http_client(),
            "relay@project.iam.gserviceaccount.com".into(),
            String::new(),
            "https://oauth2.googleapis.com/token".into(),
        );
        let claims = account.claims(1_700_000_000);
        assert_eq!(claims.iss, "relay@project.iam.gserviceaccount.com");
        assert_eq!(claims.scope, SHEETS_SCOPE);
        assert_eq!(claims.aud, "https://oauth2.googleapis.com/token");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn assertion_verifies_against_public_key() {
        use ring::signature::{UnparsedPublicKey, RSA_PKCS1_2048_8192_SHA256};

        let pem = include_str!("../../tests/fixtures/service_account_key.pem");
        let claims = Claims {
            iss: "relay@project.iam.gserviceaccount.com".into(),
            scope: SHEETS_SCOPE.into(),
            aud: "https://oauth2.googleapis.com/token".into(),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
        };
        let jwt = sign_assertion(&claims, pem).unwrap();

        let parts: Vec<&str> = jwt.split('.').collect();
        assert_eq!(parts.len(), 3);
        let decoded: Claims =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        assert_eq!(decoded, claims);

        let der = PrivatePkcs8KeyDer::from_pem_slice(pem.as_bytes()).unwrap();
        let key_pair = RsaKeyPair::from_pkcs8(der.secret_pkcs8_der()).unwrap();
        let public = UnparsedPublicKey::new(&RSA_PKCS1_2048_8192_SHA256, key_pair.public().as_ref());
        let signature = URL_SAFE_NO_PAD.decode(parts[2]).unwrap();
        public
            .verify(format!("{}.{}", parts[0], parts[1]).as_bytes(), &signature)
            .unwrap();
    }

    #[test]
    fn escaped_key_from_env_still_signs() {
        let pem = include_str!("../../tests/fixtures/service_account_key.pem");
        let escaped = pem.replace('\n', "\\n");
        let normalized = crate::config::normalize_private_key(&escaped);
        let claims = Claims {
            iss: "a".into(),
            scope: SHEETS_SCOPE.into(),
            aud: "b".into(),
            iat: 0,
            exp: 3600,
        };
        assert!(sign_assertion(&claims, &normalized).is_ok());
    }

    #[test]
    fn garbage_key_is_a_credentials_error() {
        let claims = Claims {
            iss: "a".into(),
            scope: SHEETS_SCOPE.into(),
            aud: "b".into(),
            iat: 0,
            exp: 3600,
        };
        let err = sign_assertion(&claims, "not a key").unwrap_err();
        assert!(matches!(err, DeliveryError::Credentials(_)));
    }

    #[test]
    fn header_segment_is_rs256() {
        let header = encode_segment(&Header {
            alg: "RS256",
            typ: "JWT",
        })
        .unwrap();
        let decoded = URL_SAFE_NO_PAD.decode(header).unwrap();
        assert_eq!(decoded, br#"{"alg":"RS256","typ":"JWT"}"#);
    }
}
