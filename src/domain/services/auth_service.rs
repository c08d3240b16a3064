use std::sync::Arc;
use crate::domain::{
    models::{auth::{Claims, RefreshTokenRecord, TokenPair}, role::RoleName, user::User},
    ports::AuthRepository,
};
use crate::error::AppError;
use crate::config::Config;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;
use chrono::{Utc, Duration};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Sha256, Digest};
use tracing::debug;

pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;
const AUDIENCE: &str = "rsvp-frontend";

pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    config: Config,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(repo: Arc<dyn AuthRepository>, config: Config) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        Self { repo, config, encoding_key, decoding_key }
    }

    /// Starts a new session family. Expired tokens of the user are dropped on the way.
    pub async fn login(&self, user: &User, roles: &[RoleName]) -> Result<TokenPair, AppError> {
        let purged = self.repo.purge_expired(&user.id, Utc::now()).await?;
        if purged > 0 {
            debug!(user_id = %user.id, purged, "Dropped expired refresh tokens");
        }
        self.issue_token_pair(user, roles, Uuid::new_v4(), 1).await
    }

    /// Consumes a refresh token. A token that is unknown, already used or expired is rejected.
    pub async fn redeem_refresh_token(&self, raw_refresh_token: &str) -> Result<RefreshTokenRecord, AppError> {
        let record = self.repo.take_refresh_token(&hash_token(raw_refresh_token)).await?
            .ok_or(AppError::Unauthorized)?;
        if record.expires_at <= Utc::now() {
            return Err(AppError::Unauthorized);
        }
        Ok(record)
    }

    /// Issues the next generation of a redeemed token's family.
    pub async fn rotate(&self, redeemed: &RefreshTokenRecord, user: &User, roles: &[RoleName]) -> Result<TokenPair, AppError> {
        if redeemed.user_id != user.id {
            return Err(AppError::Unauthorized);
        }
        self.issue_token_pair(user, roles, redeemed.family_id, redeemed.generation_id + 1).await
    }

    /// Ends the whole session family the token belongs to and returns the token's record.
    pub async fn logout(&self, raw_refresh_token: &str) -> Result<Option<RefreshTokenRecord>, AppError> {
        let Some(record) = self.repo.find_refresh_token(&hash_token(raw_refresh_token)).await? else {
            return Ok(None);
        };
        let revoked = self.repo.revoke_family(record.family_id).await?;
        debug!(user_id = %record.user_id, revoked, "Session family revoked");
        Ok(Some(record))
    }

    /// Drops every refresh token of the user, e.g. after a password change or deactivation.
    pub async fn revoke_all(&self, user_id: &str) -> Result<(), AppError> {
        let revoked = self.repo.revoke_user(user_id).await?;
        debug!(user_id, revoked, "All sessions revoked");
        Ok(())
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUDIENCE]);
        validation.set_issuer(&[self.config.auth_issuer.as_str()]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }

    async fn issue_token_pair(&self, user: &User, roles: &[RoleName], family_id: Uuid, generation_id: i32) -> Result<TokenPair, AppError> {
        let now = Utc::now();
        let exp = (now + Duration::minutes(ACCESS_TOKEN_TTL_MINUTES)).timestamp() as usize;

        let claims = Claims {
            iss: self.config.auth_issuer.clone(),
            sub: user.id.clone(),
            aud: AUDIENCE.to_string(),
            exp,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            roles: roles.to_vec(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("JWT encoding failed: {}", e);
                AppError::Internal
            })?;

        let refresh_token = random_token(64);

        let refresh_record = RefreshTokenRecord {
            token_hash: hash_token(&refresh_token),
            user_id: user.id.clone(),
            family_id,
            generation_id,
            expires_at: now + Duration::days(REFRESH_TOKEN_TTL_DAYS),
            created_at: now,
        };

        self.repo.store_refresh_token(&refresh_record).await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: ACCESS_TOKEN_TTL_MINUTES * 60,
        })
    }
}

pub fn random_token(len: usize) -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppEnv;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryAuthRepo {
        tokens: Mutex<Vec<RefreshTokenRecord>>,
    }

    impl MemoryAuthRepo {
        fn live(&self) -> usize {
            self.tokens.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AuthRepository for MemoryAuthRepo {
        async fn store_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError> {
            self.tokens.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError> {
            Ok(self.tokens.lock().unwrap().iter().find(|t| t.token_hash == token_hash).cloned())
        }

        async fn take_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError> {
            let mut tokens = self.tokens.lock().unwrap();
            let position = tokens.iter().position(|t| t.token_hash == token_hash);
            Ok(position.map(|i| tokens.remove(i)))
        }

        async fn revoke_family(&self, family_id: Uuid) -> Result<u64, AppError> {
            let mut tokens = self.tokens.lock().unwrap();
            let before = tokens.len();
            tokens.retain(|t| t.family_id != family_id);
            Ok((before - tokens.len()) as u64)
        }

        async fn revoke_user(&self, user_id: &str) -> Result<u64, AppError> {
            let mut tokens = self.tokens.lock().unwrap();
            let before = tokens.len();
            tokens.retain(|t| t.user_id != user_id);
            Ok((before - tokens.len()) as u64)
        }

        async fn purge_expired(&self, user_id: &str, now: DateTime<Utc>) -> Result<u64, AppError> {
            let mut tokens = self.tokens.lock().unwrap();
            let before = tokens.len();
            tokens.retain(|t| t.user_id != user_id || t.expires_at > now);
            Ok((before - tokens.len()) as u64)
        }
    }

    fn test_config() -> Config {
        Config {
            app_env: AppEnv::Test,
            database_path: ":memory:".to_string(),
            port: 0,
            jwt_secret: "unit-test-secret".to_string(),
            auth_issuer: "unit-test".to_string(),
            frontend_url: "http://localhost".to_string(),
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: String::new(),
            allow_registration: false,
            bootstrap_admin: None,
        }
    }

    fn ada() -> User {
        User::new("ada".into(), "ada@example.com".into(), "hash".into())
    }

    #[tokio::test]
    async fn access_token_round_trips_claims() {
        let service = AuthService::new(Arc::new(MemoryAuthRepo::default()), test_config());
        let user = ada();

        let pair = service.login(&user, &[RoleName::EventHost]).await.unwrap();
        let claims = service.verify_access_token(&pair.access_token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.roles, vec![RoleName::EventHost]);
        assert!(service.verify_access_token("garbage").is_err());
    }

    #[tokio::test]
    async fn refresh_rotates_and_consumes_token() {
        let repo = Arc::new(MemoryAuthRepo::default());
        let service = AuthService::new(repo.clone(), test_config());
        let user = ada();

        let first = service.login(&user, &[]).await.unwrap();
        let redeemed = service.redeem_refresh_token(&first.refresh_token).await.unwrap();
        assert_eq!(redeemed.generation_id, 1);
        assert_eq!(repo.live(), 0);

        let second = service.rotate(&redeemed, &user, &[]).await.unwrap();
        let rotated = repo.find_refresh_token(&hash_token(&second.refresh_token)).await.unwrap().unwrap();
        assert_eq!(rotated.family_id, redeemed.family_id);
        assert_eq!(rotated.generation_id, 2);

        let reused = service.redeem_refresh_token(&first.refresh_token).await;
        assert!(matches!(reused, Err(AppError::Unauthorized)));

        let stranger = ada();
        let redeemed = service.redeem_refresh_token(&second.refresh_token).await.unwrap();
        assert!(matches!(service.rotate(&redeemed, &stranger, &[]).await, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn expired_tokens_are_rejected_and_purged_on_login() {
        let repo = Arc::new(MemoryAuthRepo::default());
        let service = AuthService::new(repo.clone(), test_config());
        let user = ada();

        let stale = "stale-refresh-token";
        repo.store_refresh_token(&RefreshTokenRecord {
            token_hash: hash_token(stale),
            user_id: user.id.clone(),
            family_id: Uuid::new_v4(),
            generation_id: 3,
            expires_at: Utc::now() - Duration::minutes(1),
            created_at: Utc::now() - Duration::days(8),
        }).await.unwrap();

        assert!(matches!(service.redeem_refresh_token(stale).await, Err(AppError::Unauthorized)));

        repo.store_refresh_token(&RefreshTokenRecord {
            token_hash: hash_token(stale),
            user_id: user.id.clone(),
            family_id: Uuid::new_v4(),
            generation_id: 3,
            expires_at: Utc::now() - Duration::minutes(1),
            created_at: Utc::now() - Duration::days(8),
        }).await.unwrap();
        service.login(&user, &[]).await.unwrap();
        assert_eq!(repo.live(), 1);
    }

    #[tokio::test]
    async fn logout_revokes_the_family_only() {
        let repo = Arc::new(MemoryAuthRepo::default());
        let service = AuthService::new(repo.clone(), test_config());
        let user = ada();

        let laptop = service.login(&user, &[]).await.unwrap();
        let phone = service.login(&user, &[]).await.unwrap();

        let record = service.logout(&laptop.refresh_token).await.unwrap().unwrap();
        assert_eq!(record.user_id, user.id);
        assert!(service.logout(&laptop.refresh_token).await.unwrap().is_none());
        assert_eq!(repo.live(), 1);

        service.revoke_all(&user.id).await.unwrap();
        assert!(matches!(service.redeem_refresh_token(&phone.refresh_token).await, Err(AppError::Unauthorized)));
    }
}
