use std::time::Duration;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::{BackendError, StoreResult};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

/// Signs and verifies session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SessionKeys {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_ttl: Duration::from_secs((config.ttl_minutes.max(0) as u64) * 60),
            refresh_ttl: Duration::from_secs((config.refresh_ttl_minutes.max(0) as u64) * 60),
        }
    }

    fn sign_with_kind(&self, uid: Uuid, kind: TokenKind) -> StoreResult<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: uid,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| BackendError::new("auth/internal-error", e.to_string()))?;
        debug!(uid = %uid, kind = ?kind, "session token signed");
        Ok(token)
    }

    pub fn sign_access(&self, uid: Uuid) -> StoreResult<String> {
        self.sign_with_kind(uid, TokenKind::Access)
    }

    pub fn sign_refresh(&self, uid: Uuid) -> StoreResult<String> {
        self.sign_with_kind(uid, TokenKind::Refresh)
    }

    pub fn verify(&self, token: &str) -> StoreResult<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| BackendError::new("auth/user-token-expired", e.to_string()))?;
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> StoreResult<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            return Err(
                BackendError::new("auth/invalid-refresh-token", "not a refresh token").into(),
            );
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod token_tests {
    use super::*;
    use crate::config::AppConfig;

    fn make_keys() -> SessionKeys {
        SessionKeys::from_config(&AppConfig::for_tests().session)
    }

    #[test]
    fn sign_and_verify_access_token() {
        let keys = make_keys();
        let uid = Uuid::new_v4();
        let token = keys.sign_access(uid).expect("sign access");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, uid);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn verify_refresh_rejects_access_token() {
        let keys = make_keys();
        let token = keys.sign_access(Uuid::new_v4()).expect("sign access");
        let err = keys.verify_refresh(&token).unwrap_err();
        assert_eq!(err.code(), Some("auth/invalid-refresh-token"));

        let refresh = keys.sign_refresh(Uuid::new_v4()).expect("sign refresh");
        assert_eq!(keys.verify_refresh(&refresh).unwrap().kind, TokenKind::Refresh);
    }

    #[test]
    fn verify_rejects_other_audience() {
        let keys = make_keys();
        let mut config = AppConfig::for_tests().session;
        config.audience = "someone-else".into();
        let other = SessionKeys::from_config(&config);
        let token = keys.sign_access(Uuid::new_v4()).expect("sign access");
        assert!(other.verify(&token).is_err());
    }
}
