//! Bearer token authentication for every monitored route

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{ContentType, HeaderValue, AUTHORIZATION};
use actix_web::http::StatusCode;
use actix_web::{Error, HttpMessage, HttpResponse, ResponseError};
use futures::future::{ready, LocalBoxFuture, Ready};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use log::{debug, warn};
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use crate::errors::AgentError;
use crate::models::Claims;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Auth header not received")]
    MissingCredential,

    #[error("Malformed Authorization header")]
    MalformedCredential,

    #[error("Invalid JWT signature")]
    InvalidSignature,

    #[error("Error parsing JWT: {0}")]
    InvalidOrExpiredToken(String),
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(self.to_string())
    }
}

/// Verifies bearer tokens against the shared secret
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &[u8], algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn from_config(config: &Config) -> crate::errors::Result<Self> {
        let algorithm = config.algorithm().map_err(AgentError::Config)?;
        Ok(Self::new(config.secret_key.as_bytes(), algorithm))
    }

    /// Check the raw `Authorization` header of a request
    pub fn authorize(&self, header: Option<&HeaderValue>) -> Result<Claims, AuthError> {
        let value = match header {
            None => return Err(AuthError::MissingCredential),
            Some(value) if value.is_empty() => return Err(AuthError::MissingCredential),
            Some(value) => value.to_str().map_err(|_| AuthError::MalformedCredential)?,
        };

        let token = value
            .strip_prefix(BEARER_PREFIX)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MalformedCredential)?;

        self.verify(token)
    }

    /// Validate signature, shape and expiry of a token
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::InvalidOrExpiredToken(e.to_string()),
            })
    }
}

/// Middleware rejecting requests without a valid bearer token.
///
/// Accepted requests are forwarded unchanged, with the token claims
/// available through the request extensions.
#[derive(Clone)]
pub struct AuthGate {
    verifier: Arc<TokenVerifier>,
}

impl AuthGate {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateMiddleware {
            service,
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct AuthGateMiddleware<S> {
    service: S,
    verifier: Arc<TokenVerifier>,
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.verifier.authorize(req.headers().get(AUTHORIZATION)) {
            Ok(claims) => {
                debug!("Authorized {} {} for {} ({})", req.method(), req.path(), claims.sub, claims.role);
                req.extensions_mut().insert(claims);

                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(e) => {
                warn!("Rejected {} {}: {}", req.method(), req.path(), e);
                let response = req.into_response(e.error_response()).map_into_right_body();
                Box::pin(ready(Ok(response)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, get_current_timestamp, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &[u8] = b"test-secret";

    fn token(secret: &[u8], exp: u64) -> String {
        let claims = Claims {
            sub: "jilo-web".to_string(),
            role: "admin".to_string(),
            exp,
            iat: Some(get_current_timestamp()),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).unwrap()
    }

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(SECRET, Algorithm::HS256)
    }

    #[test]
    fn test_valid_token() {
        let bearer = format!("Bearer {}", token(SECRET, get_current_timestamp() + 600));
        let claims = verifier().authorize(Some(&header(&bearer))).unwrap();

        assert_eq!(claims.sub, "jilo-web");
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(verifier().authorize(None), Err(AuthError::MissingCredential));
        assert_eq!(
            verifier().authorize(Some(&header(""))),
            Err(AuthError::MissingCredential)
        );
    }

    #[test]
    fn test_malformed_header() {
        let raw = token(SECRET, get_current_timestamp() + 600);
        for value in [raw.as_str(), "Bearer ", "bearer abc", "Basic dXNlcjpwYXNz"] {
            assert_eq!(
                verifier().authorize(Some(&header(value))),
                Err(AuthError::MalformedCredential),
                "{value}"
            );
        }
    }

    #[test]
    fn test_wrong_secret() {
        let bearer = format!("Bearer {}", token(b"other-secret", get_current_timestamp() + 600));
        assert_eq!(
            verifier().authorize(Some(&header(&bearer))),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_expired_token() {
        let bearer = format!("Bearer {}", token(SECRET, get_current_timestamp() - 3600));
        let err = verifier().authorize(Some(&header(&bearer))).unwrap_err();

        assert!(matches!(err, AuthError::InvalidOrExpiredToken(_)));
        assert!(err.to_string().starts_with("Error parsing JWT: "));
    }

    #[test]
    fn test_token_without_expiry_rejected() {
        let claims = json!({"sub": "jilo-web", "role": "admin"});
        let raw = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap();
        let err = verifier()
            .authorize(Some(&header(&format!("Bearer {}", raw))))
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidOrExpiredToken(_)));
    }

    #[test]
    fn test_garbage_token() {
        let err = verifier().authorize(Some(&header("Bearer not.a.jwt"))).unwrap_err();
        assert!(matches!(err, AuthError::InvalidOrExpiredToken(_)));
    }

    #[test]
    fn test_error_response_is_plain_text_401() {
        let response = AuthError::InvalidSignature.error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/plain; charset=utf-8"
        );
    }
}
