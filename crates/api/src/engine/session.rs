//! Session lifecycle engine: login, registration, refresh, logout.
//!
//! Refresh-token validity is bound to a live device row rather than to the
//! token alone. Each row's `jti` column names the one refresh token that
//! is currently valid for that device; every successful refresh rotates
//! it in place (single conditional UPDATE, so concurrent refreshes of the
//! same token serialize to exactly one winner) and the old jti goes into
//! the revocation ledger for the remainder of its natural lifetime.

use std::sync::Arc;
use std::time::Duration;

use keygate_core::error::AuthError;
use keygate_core::revocation::RevocationLedger;
use keygate_core::types::DbId;
use keygate_db::models::device::{CreateDevice, Device, DeviceSummary};
use keygate_db::models::user::{CreateUser, User};
use keygate_db::repositories::{DeviceRepo, UserRepo};
use keygate_db::DbPool;
use uuid::Uuid;

use crate::auth::jwt::{decode_token, issue_access_token, issue_refresh_token, Claims, TokenKind};
use crate::auth::password::{hash_password, verify_password};
use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::geo::GeoClient;
use crate::response::TokenPair;

/// Orchestrates the token/session state machine over the account store,
/// device store, and revocation ledger. Cheap to clone; shares the pool,
/// config, and ledger with the rest of the application.
#[derive(Clone)]
pub struct SessionEngine {
    pool: DbPool,
    config: Arc<ServerConfig>,
    ledger: Arc<RevocationLedger>,
    geo: GeoClient,
}

impl SessionEngine {
    pub fn new(pool: DbPool, config: Arc<ServerConfig>, ledger: Arc<RevocationLedger>) -> Self {
        let geo = GeoClient::new(config.geo.clone());
        Self {
            pool,
            config,
            ledger,
            geo,
        }
    }

    /// Authenticate by email + password and open a new device session.
    ///
    /// A lookup miss is `AccountNotFound`, a bad password is
    /// `AuthenticationFailed`; neither leaves a device row behind.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        user_agent: &str,
        ip: &str,
    ) -> AppResult<TokenPair> {
        let user = UserRepo::find_by_email(&self.pool, email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        if !self.verify_password_blocking(password, &user.password_hash).await? {
            return Err(AuthError::AuthenticationFailed.into());
        }

        let (pair, jti) = self.issue_pair(user.id)?;
        let device = self.register_device(user.id, user_agent, ip, jti).await?;

        tracing::info!(user_id = %user.id, device_id = %device.id, "User logged in");
        Ok(pair)
    }

    /// Create a new account and open its first device session.
    ///
    /// Email uniqueness is enforced by the `uq_users_email` index; the
    /// duplicate-key violation is translated here rather than guarded by
    /// a racy read-then-insert.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        re_password: &str,
        ip: &str,
        user_agent: &str,
    ) -> AppResult<TokenPair> {
        if password != re_password {
            return Err(AuthError::PasswordMismatch.into());
        }

        if user_agent.is_empty() || ip.is_empty() {
            return Err(AuthError::MissingDeviceInfo.into());
        }

        let password_hash = self.hash_password_blocking(password).await?;
        let input = CreateUser {
            email: email.to_string(),
            password_hash,
        };
        let user = UserRepo::create(&self.pool, &input)
            .await
            .map_err(classify_user_insert_error)?;

        // Account insert and device insert are separate store operations
        // with no cross-store transaction. If the second fails, the
        // account exists without a session; the next login recovers it.
        let (pair, jti) = self.issue_pair(user.id)?;
        let device = self.register_device(user.id, user_agent, ip, jti).await?;

        tracing::info!(user_id = %user.id, device_id = %device.id, "User registered");
        Ok(pair)
    }

    /// Exchange a valid refresh token for a new pair, rotating the device
    /// row's session id.
    ///
    /// A presented token whose jti no longer maps to a row -- already
    /// rotated, logged out, or forged -- fails `InvalidToken`. A
    /// user-agent mismatch is treated as a hijack signal: the device row
    /// is destroyed and the whole lineage becomes permanently invalid.
    pub async fn refresh(&self, refresh_token: &str, user_agent: &str) -> AppResult<TokenPair> {
        let claims = decode_token(refresh_token, &self.config.jwt)?;
        claims.require_kind(TokenKind::Refresh)?;
        let jti = claims.jti.ok_or(AuthError::InvalidToken)?;

        // Ledgered jtis are spent; reject before touching the store.
        if self.ledger.is_revoked(&jti) {
            return Err(AuthError::InvalidToken.into());
        }

        let user = UserRepo::find_by_id(&self.pool, claims.sub)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        if !user.is_active {
            return Err(AuthError::AccountNotActive.into());
        }

        let device = DeviceRepo::find_by_user_and_jti(&self.pool, user.id, jti)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if device.user_agent != user_agent {
            DeviceRepo::delete_by_user_and_jti(&self.pool, user.id, jti).await?;
            self.ledger.revoke(jti, remaining_ttl(&claims));
            tracing::warn!(
                user_id = %user.id,
                device_id = %device.id,
                "Refresh from mismatched user agent; session destroyed"
            );
            return Err(AuthError::InvalidDevice.into());
        }

        let (pair, new_jti) = self.issue_pair(user.id)?;

        // Compare-and-swap on the old jti. A concurrent refresh that got
        // here first has already rotated the row; this caller loses and
        // must treat the token as spent.
        let rotated = DeviceRepo::rotate_jti(&self.pool, user.id, jti, new_jti).await?;
        if !rotated {
            return Err(AuthError::InvalidToken.into());
        }

        self.ledger.revoke(jti, remaining_ttl(&claims));
        tracing::debug!(user_id = %user.id, device_id = %device.id, "Session rotated");
        Ok(pair)
    }

    /// Close the session named by a refresh token.
    ///
    /// Fails `InvalidToken` if no matching device row exists (already
    /// logged out, already rotated, or forged).
    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        let claims = decode_token(refresh_token, &self.config.jwt)?;
        let jti = claims.jti.ok_or(AuthError::InvalidToken)?;

        let deleted = DeviceRepo::delete_by_user_and_jti(&self.pool, claims.sub, jti).await?;
        if !deleted {
            return Err(AuthError::InvalidToken.into());
        }

        self.ledger.revoke(jti, remaining_ttl(&claims));
        tracing::info!(user_id = %claims.sub, "User logged out");
        Ok(())
    }

    /// Close one of the user's sessions by device row id. Scoped to the
    /// owning account: a foreign device id reads as absent.
    pub async fn logout_device(&self, user: &User, device_id: DbId) -> AppResult<()> {
        let deleted = DeviceRepo::delete_by_user_and_id(&self.pool, user.id, device_id).await?;
        if !deleted {
            return Err(AuthError::DeviceNotFound.into());
        }

        tracing::info!(user_id = %user.id, %device_id, "Device logged out");
        Ok(())
    }

    /// Close every session the user has. Zero rows is an error here
    /// (nothing to delete), while the read side tolerates an empty list.
    pub async fn logout_all_devices(&self, user: &User) -> AppResult<()> {
        let deleted = DeviceRepo::delete_all_for_user(&self.pool, user.id).await?;
        if deleted == 0 {
            return Err(AuthError::NoDevicesFound.into());
        }

        tracing::info!(user_id = %user.id, deleted, "All devices logged out");
        Ok(())
    }

    /// List the user's sessions for display. The raw jti never leaves
    /// the engine.
    pub async fn list_devices(&self, user: &User) -> AppResult<Vec<DeviceSummary>> {
        let devices = DeviceRepo::list_for_user(&self.pool, user.id).await?;
        Ok(devices.iter().map(DeviceSummary::from).collect())
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    /// Issue an access/refresh pair for the user, returning the refresh
    /// token's session id for device binding.
    fn issue_pair(&self, user_id: DbId) -> AppResult<(TokenPair, Uuid)> {
        let access = issue_access_token(user_id, &self.config.jwt)?;
        let (refresh, jti) = issue_refresh_token(user_id, &self.config.jwt)?;
        Ok((TokenPair::new(access, refresh), jti))
    }

    /// Persist a device row for a fresh session. Location resolution is
    /// best-effort and never blocks the flow.
    async fn register_device(
        &self,
        user_id: DbId,
        user_agent: &str,
        ip: &str,
        jti: Uuid,
    ) -> AppResult<Device> {
        let location = self.geo.lookup(ip).await;

        let input = CreateDevice {
            user_id,
            user_agent: user_agent.to_string(),
            ip: ip.to_string(),
            location,
            jti,
        };
        let device = DeviceRepo::create(&self.pool, &input).await?;
        Ok(device)
    }

    /// Argon2 verification is CPU-bound; run it off the async worker.
    async fn verify_password_blocking(&self, password: &str, hash: &str) -> AppResult<bool> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::InternalError(format!("Password verification task: {e}")))?
            .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))
    }

    /// Argon2 hashing is CPU-bound; run it off the async worker.
    async fn hash_password_blocking(&self, password: &str) -> AppResult<String> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::InternalError(format!("Password hashing task: {e}")))?
            .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))
    }
}

/// Ledger entries live no longer than the refresh token itself.
fn remaining_ttl(claims: &Claims) -> Duration {
    Duration::from_secs(claims.remaining_secs())
}

/// Translate the email unique-violation into its domain error; everything
/// else stays a store failure.
fn classify_user_insert_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505")
            && db_err.constraint() == Some("uq_users_email")
        {
            return AuthError::EmailAlreadyExists.into();
        }
    }
    AppError::Database(err)
}
