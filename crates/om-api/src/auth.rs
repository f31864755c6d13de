use axum::async_trait;
use axum::extract::FromRef;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use clap::ValueEnum;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use crate::error::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const ADMIN_ROLE: &str = "admin";

const SERVICE_SUBJECT: &str = "api_key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum AuthMode {
    ApiKey,
    Jwt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lower")]
pub enum JwtAlgorithm {
    Hs256,
    Hs384,
    Hs512,
    Rs256,
    Es256,
}

/// Which kind of key material an algorithm verifies with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtKeyKind {
    Secret,
    RsaPublicKey,
    EcPublicKey,
}

impl JwtAlgorithm {
    pub fn algorithm(self) -> Algorithm {
        match self {
            Self::Hs256 => Algorithm::HS256,
            Self::Hs384 => Algorithm::HS384,
            Self::Hs512 => Algorithm::HS512,
            Self::Rs256 => Algorithm::RS256,
            Self::Es256 => Algorithm::ES256,
        }
    }

    pub fn key_kind(self) -> JwtKeyKind {
        match self {
            Self::Hs256 | Self::Hs384 | Self::Hs512 => JwtKeyKind::Secret,
            Self::Rs256 => JwtKeyKind::RsaPublicKey,
            Self::Es256 => JwtKeyKind::EcPublicKey,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub api_key: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_public_key: Option<String>,
    pub jwt_algorithm: JwtAlgorithm,
}

impl AuthConfig {
    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            mode: AuthMode::ApiKey,
            api_key: Some(key.into()),
            jwt_secret: None,
            jwt_public_key: None,
            jwt_algorithm: JwtAlgorithm::Hs512,
        }
    }

    pub fn jwt_secret(secret: impl Into<String>, algorithm: JwtAlgorithm) -> Self {
        Self {
            mode: AuthMode::Jwt,
            api_key: None,
            jwt_secret: Some(secret.into()),
            jwt_public_key: None,
            jwt_algorithm: algorithm,
        }
    }

    /// Startup check that the selected mode has its key material.
    pub fn validate(&self) -> Result<(), String> {
        match self.mode {
            AuthMode::ApiKey if self.api_key.as_deref().is_none_or(str::is_empty) => {
                Err("OM_API_KEY is required when AUTH_MODE=api_key".into())
            }
            AuthMode::ApiKey => Ok(()),
            AuthMode::Jwt => match self.jwt_algorithm.key_kind() {
                JwtKeyKind::Secret if self.jwt_secret.as_deref().is_none_or(str::is_empty) => Err(
                    "JWT_SECRET is required when AUTH_MODE=jwt with HMAC algorithms".into(),
                ),
                JwtKeyKind::Secret => Ok(()),
                _ if self.jwt_public_key.as_deref().is_none_or(str::is_empty) => Err(
                    "JWT_PUBLIC_KEY is required when AUTH_MODE=jwt with RS256/ES256".into(),
                ),
                _ => Ok(()),
            },
        }
    }

    fn decoding_key(&self) -> Result<DecodingKey, ApiError> {
        match self.jwt_algorithm.key_kind() {
            JwtKeyKind::Secret => {
                let secret = self
                    .jwt_secret
                    .as_deref()
                    .ok_or_else(|| ApiError::Internal("JWT_SECRET is not configured".into()))?;
                Ok(DecodingKey::from_secret(secret.as_bytes()))
            }
            kind => {
                let pem = self
                    .jwt_public_key
                    .as_deref()
                    .map(|raw| raw.replace("\\n", "\n"))
                    .ok_or_else(|| ApiError::Internal("JWT_PUBLIC_KEY is not configured".into()))?;
                let key = if kind == JwtKeyKind::RsaPublicKey {
                    DecodingKey::from_rsa_pem(pem.as_bytes())
                } else {
                    DecodingKey::from_ec_pem(pem.as_bytes())
                };
                key.map_err(|err| ApiError::Internal(format!("invalid JWT_PUBLIC_KEY: {err}")))
            }
        }
    }
}

/// Who is calling. API-key callers are trusted backend services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Service,
    User { role: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub subject: String,
    pub principal: Principal,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        matches!(&self.principal, Principal::User { role: Some(role) } if role.eq_ignore_ascii_case(ADMIN_ROLE))
    }

    /// Services and admins see every job; users only the jobs they own.
    pub fn can_manage_job(&self, employer_id: Option<&str>) -> bool {
        match &self.principal {
            Principal::Service => true,
            Principal::User { .. } if self.is_admin() => true,
            Principal::User { .. } => employer_id.is_some_and(|owner| owner == self.subject),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    role: Option<String>,
    #[allow(dead_code)]
    exp: usize,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AuthConfig::from_ref(state);

        match config.mode {
            AuthMode::ApiKey => authorize_api_key(parts, &config),
            AuthMode::Jwt => authorize_jwt(parts, &config),
        }
    }
}

fn authorize_api_key(parts: &Parts, config: &AuthConfig) -> Result<AuthUser, ApiError> {
    let expected = config
        .api_key
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("OM_API_KEY is not configured".into()))?;

    let provided = parts
        .headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing X-API-Key header".into()))?;

    if provided != expected {
        return Err(ApiError::Unauthorized("invalid API key".into()));
    }

    Ok(AuthUser {
        subject: SERVICE_SUBJECT.to_string(),
        principal: Principal::Service,
    })
}

fn authorize_jwt(parts: &Parts, config: &AuthConfig) -> Result<AuthUser, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("expected Bearer token".into()))?;

    let mut validation = Validation::new(config.jwt_algorithm.algorithm());
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<Claims>(token, &config.decoding_key()?, &validation)
        .map_err(|err| ApiError::Unauthorized(format!("invalid token: {err}")))?;

    Ok(AuthUser {
        subject: data.claims.sub,
        principal: Principal::User {
            role: data.claims.role,
        },
    })
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        role: Option<&'a str>,
        exp: u64,
    }

    fn token(secret: &str, algorithm: Algorithm, sub: &str, role: Option<&str>, exp: u64) -> String {
        encode(
            &Header::new(algorithm),
            &TestClaims { sub, role, exp },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn far_future() -> u64 {
        jsonwebtoken::get_current_timestamp() + 3600
    }

    fn parts_with(header: Option<(&str, String)>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn api_key_grants_service_principal() {
        let config = AuthConfig::api_key("k1");
        let user =
            authorize_api_key(&parts_with(Some((API_KEY_HEADER, "k1".into()))), &config).unwrap();

        assert_eq!(user.principal, Principal::Service);
        assert!(user.can_manage_job(Some("anyone")));
        assert!(user.can_manage_job(None));
    }

    #[test]
    fn wrong_or_missing_api_key_is_unauthorized() {
        let config = AuthConfig::api_key("k1");
        assert!(matches!(
            authorize_api_key(&parts_with(Some((API_KEY_HEADER, "nope".into()))), &config),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize_api_key(&parts_with(None), &config),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn hmac_jwt_yields_user_with_role() {
        let config = AuthConfig::jwt_secret("s3cret", JwtAlgorithm::Hs256);
        let bearer = format!(
            "Bearer {}",
            token("s3cret", Algorithm::HS256, "emp-1", Some("employer"), far_future())
        );

        let user = authorize_jwt(&parts_with(Some(("authorization", bearer))), &config).unwrap();
        assert_eq!(user.subject, "emp-1");
        assert!(!user.is_admin());
        assert!(user.can_manage_job(Some("emp-1")));
        assert!(!user.can_manage_job(Some("emp-2")));
        assert!(!user.can_manage_job(None));
    }

    #[test]
    fn admin_role_manages_any_job() {
        let user = AuthUser {
            subject: "ops".into(),
            principal: Principal::User {
                role: Some("Admin".into()),
            },
        };
        assert!(user.can_manage_job(Some("emp-9")));
    }

    #[test]
    fn expired_or_mis_signed_tokens_are_rejected() {
        let config = AuthConfig::jwt_secret("s3cret", JwtAlgorithm::Hs512);

        let expired = token("s3cret", Algorithm::HS512, "u", None, 1_000);
        let wrong_key = token("other", Algorithm::HS512, "u", None, far_future());
        let wrong_alg = token("s3cret", Algorithm::HS256, "u", None, far_future());

        for bad in [expired, wrong_key, wrong_alg] {
            let parts = parts_with(Some(("authorization", format!("Bearer {bad}"))));
            assert!(matches!(
                authorize_jwt(&parts, &config),
                Err(ApiError::Unauthorized(_))
            ));
        }
    }

    #[test]
    fn non_bearer_header_is_rejected() {
        let config = AuthConfig::jwt_secret("s3cret", JwtAlgorithm::Hs256);
        let parts = parts_with(Some(("authorization", "Basic abc".into())));
        assert!(matches!(
            authorize_jwt(&parts, &config),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn validate_requires_key_material_per_mode() {
        assert!(AuthConfig::api_key("k").validate().is_ok());
        assert!(AuthConfig::api_key("").validate().is_err());
        assert!(
            AuthConfig::jwt_secret("s", JwtAlgorithm::Hs384)
                .validate()
                .is_ok()
        );

        let mut rsa = AuthConfig::jwt_secret("s", JwtAlgorithm::Rs256);
        assert!(rsa.validate().is_err());
        rsa.jwt_public_key = Some("-----BEGIN PUBLIC KEY-----".into());
        assert!(rsa.validate().is_ok());
    }

    #[test]
    fn malformed_public_key_is_an_internal_error() {
        let mut config = AuthConfig::jwt_secret("unused", JwtAlgorithm::Es256);
        config.jwt_public_key = Some("not a pem".into());
        assert!(matches!(config.decoding_key(), Err(ApiError::Internal(_))));
    }
}
