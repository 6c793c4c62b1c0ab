//! Bearer-token validation.
//!
//! Access tokens come from the plant's sign-in service, signed HS256 with a
//! secret shared with this service. Nothing here issues tokens: the API only
//! checks the signature and expiry and reads who the caller is.

use inspecta_core::types::DbId;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// The claims this service reads from an access token. Other claims the
/// issuer adds are ignored.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// The caller's id in `users`.
    pub sub: DbId,
    /// `"worker"` or `"supervisor"`. Parsed by the auth extractor.
    pub role: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret shared with the token issuer.
    pub secret: String,
    /// Clock skew tolerated when checking `exp`.
    pub leeway_secs: u64,
}

const DEFAULT_LEEWAY_SECS: u64 = 60;

impl JwtConfig {
    /// Load token settings from the environment.
    ///
    /// | Env Var            | Required | Default |
    /// |--------------------|----------|---------|
    /// | `JWT_SECRET`       | **yes**  | --      |
    /// | `JWT_LEEWAY_SECS`  | no       | `60`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is missing or empty, or if `JWT_LEEWAY_SECS`
    /// is not a whole number of seconds.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let leeway_secs: u64 = std::env::var("JWT_LEEWAY_SECS")
            .unwrap_or_else(|_| DEFAULT_LEEWAY_SECS.to_string())
            .parse()
            .expect("JWT_LEEWAY_SECS must be a non-negative integer");

        Self {
            secret,
            leeway_secs,
        }
    }
}

/// Check an access token and return its claims.
///
/// Only HS256 is accepted; a token signed with any other algorithm is
/// rejected even if the secret matches.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = config.leeway_secs;
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::*;

    const SECRET: &str = "shift-b-signing-secret";

    fn config() -> JwtConfig {
        JwtConfig {
            secret: SECRET.to_string(),
            leeway_secs: 60,
        }
    }

    fn sign(header: Header, secret: &str, sub: DbId, role: &str, exp_offset: i64) -> String {
        let claims = Claims {
            sub,
            role: role.to_string(),
            exp: chrono::Utc::now().timestamp() + exp_offset,
        };
        encode(&header, &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn valid_token_yields_caller_and_role() {
        let token = sign(Header::default(), SECRET, 9, "supervisor", 900);
        let claims = validate_token(&token, &config()).unwrap();
        assert_eq!(claims.sub, 9);
        assert_eq!(claims.role, "supervisor");
    }

    #[test]
    fn expiry_is_checked_with_leeway() {
        let just_expired = sign(Header::default(), SECRET, 1, "worker", -30);
        assert!(validate_token(&just_expired, &config()).is_ok());

        let long_expired = sign(Header::default(), SECRET, 1, "worker", -300);
        assert!(validate_token(&long_expired, &config()).is_err());

        let strict = JwtConfig {
            leeway_secs: 0,
            ..config()
        };
        assert!(validate_token(&just_expired, &strict).is_err());
    }

    #[test]
    fn token_from_another_issuer_is_rejected() {
        let token = sign(Header::default(), "someone-elses-secret", 1, "worker", 900);
        assert!(validate_token(&token, &config()).is_err());
    }

    #[test]
    fn only_hs256_is_accepted() {
        let token = sign(Header::new(Algorithm::HS512), SECRET, 1, "worker", 900);
        assert!(validate_token(&token, &config()).is_err());
    }
}
