//! JWT session resolver (feature `auth-jwt`).
//!
//! HS256 tokens carrying the same `(sub, name, role)` claims as the signed
//! session token, for deployments whose auth service already issues JWTs.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use domains::{Identity, IdentityResolver};

use crate::token::capabilities_for_role;

#[derive(Debug, Deserialize)]
struct JwtClaims {
    sub: Uuid,
    name: String,
    role: String,
    #[allow(dead_code)]
    exp: usize,
}

pub struct JwtResolver {
    key: DecodingKey,
    validation: Validation,
}

impl JwtResolver {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl IdentityResolver for JwtResolver {
    fn resolve(&self, token: Option<&str>) -> Identity {
        let Some(token) = token else {
            return Identity::anonymous();
        };
        match decode::<JwtClaims>(token, &self.key, &self.validation) {
            Ok(data) => Identity::new(
                data.claims.sub,
                data.claims.name,
                capabilities_for_role(&data.claims.role),
            ),
            Err(err) => {
                tracing::debug!(%err, "rejected bearer token");
                Identity::anonymous()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Claims<'a> {
        sub: Uuid,
        name: &'a str,
        role: &'a str,
        exp: i64,
    }

    fn token(secret: &[u8], role: &str, exp: i64) -> String {
        encode(
            &Header::default(),
            &Claims {
                sub: Uuid::now_v7(),
                name: "dane",
                role,
                exp,
            },
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn decodes_valid_tokens() {
        let resolver = JwtResolver::new(b"local-secret");
        let exp = chrono::Utc::now().timestamp() + 3600;
        let identity = resolver.resolve(Some(&token(b"local-secret", "care", exp)));
        assert!(!identity.is_anonymous());
        assert!(identity.can_moderate());
    }

    #[test]
    fn expired_or_foreign_tokens_resolve_to_anonymous() {
        let resolver = JwtResolver::new(b"local-secret");
        let future = chrono::Utc::now().timestamp() + 3600;
        let past = chrono::Utc::now().timestamp() - 3600;

        assert!(resolver
            .resolve(Some(&token(b"local-secret", "care", past)))
            .is_anonymous());
        assert!(resolver
            .resolve(Some(&token(b"other-secret", "care", future)))
            .is_anonymous());
        assert!(resolver.resolve(None).is_anonymous());
    }
}
