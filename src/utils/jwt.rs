// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError, models::role::Role};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID.
    pub sub: String,
    /// Role claim as issued by the sign-in service (e.g., 'student', 'admin').
    pub role: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// The authenticated caller, resolved once per request by `auth_middleware`.
/// Handlers read it with `Extension<Session>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
}

impl Session {
    /// Rejects callers whose role cannot author quizzes.
    pub fn require_author(&self) -> Result<(), AppError> {
        if self.role.can_author_quizzes() {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Role '{}' cannot manage quizzes",
                self.role
            )))
        }
    }
}

impl TryFrom<Claims> for Session {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        if claims.sub.trim().is_empty() {
            return Err(AppError::AuthError("Token has no subject".to_string()));
        }
        let role = claims.role.parse::<Role>().map_err(AppError::AuthError)?;

        Ok(Session {
            user_id: claims.sub,
            role,
        })
    }
}

/// Signs a new JWT for the user.
///
/// Production tokens come from the sign-in service sharing `JWT_SECRET`.
/// This produces the same claims and is what the test suites use to act as a caller.
pub fn sign_jwt(
    user_id: &str,
    role: Role,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    // Calculate expiration: current time + expiration_seconds
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: user_id.to_owned(),
        role: role.as_str().to_owned(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Axum Middleware: Authentication.
///
/// Validates the 'Authorization: Bearer <token>' header and injects a `Session`
/// into the request extensions. Any failure short-circuits with 401.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return Err(AppError::AuthError("Missing bearer token".to_string())),
    };

    let session = Session::try_from(verify_jwt(token, &config.jwt_secret)?)?;
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit_test_secret";

    #[test]
    fn signed_token_resolves_to_session() {
        let token = sign_jwt("user-42", Role::Mentor, SECRET, 60).unwrap();
        let session = Session::try_from(verify_jwt(&token, SECRET).unwrap()).unwrap();
        assert_eq!(
            session,
            Session {
                user_id: "user-42".to_string(),
                role: Role::Mentor
            }
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = sign_jwt("user-42", Role::Student, SECRET, 60).unwrap();
        assert!(matches!(
            verify_jwt(&token, "other_secret"),
            Err(AppError::AuthError(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            sub: "user-42".to_string(),
            role: "student".to_string(),
            exp: 1_000,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(verify_jwt(&token, SECRET).is_err());
    }

    #[test]
    fn unknown_role_claim_is_unauthorized() {
        let claims = Claims {
            sub: "user-42".to_string(),
            role: "superuser".to_string(),
            exp: usize::MAX,
        };
        assert!(matches!(
            Session::try_from(claims),
            Err(AppError::AuthError(_))
        ));
    }

    #[test]
    fn students_cannot_author() {
        let session = Session {
            user_id: "s".to_string(),
            role: Role::Student,
        };
        assert!(matches!(
            session.require_author(),
            Err(AppError::Forbidden(_))
        ));
    }
}
