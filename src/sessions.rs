use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthError,
    db::{
        models::{AuthenticatedUser, UserStatus},
        Store,
    },
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Session {
    pub token: Uuid,
    pub user: AuthenticatedUser,
    pub started_at: DateTime<Utc>,
    /// Last successful authentication with this token.
    pub last_seen: DateTime<Utc>,
}

impl Session {
    fn is_idle(&self, now: DateTime<Utc>, timeout: TimeDelta) -> bool {
        now - self.last_seen > timeout
    }
}

pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 3600;

/// Bearer-token sessions, shared across request handlers.
///
/// A user is `active` while at least one of their sessions is open. A session
/// not used for the idle timeout is closed.
#[derive(Clone)]
pub struct SessionStore {
    store: Store,
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    idle_timeout: TimeDelta,
}

impl SessionStore {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            sessions: Arc::default(),
            idle_timeout: idle_timeout(DEFAULT_IDLE_TIMEOUT_SECS),
        }
    }

    pub fn with_idle_timeout(mut self, secs: u64) -> Self {
        self.idle_timeout = idle_timeout(secs);
        self
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let Some(mut user) = self.store.check_user(username, password).await? else {
            warn!(username = %username, "Login rejected");
            return Err(AuthError::InvalidCredentials.into());
        };

        self.store
            .update_user_status_by_id(user.id, UserStatus::Active)
            .await?;
        user.status = UserStatus::Active;

        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4(),
            user,
            started_at: now,
            last_seen: now,
        };
        self.sessions
            .write()
            .await
            .insert(session.token, session.clone());

        info!(user_id = session.user.id, username = %session.user.username, "User logged in");
        Ok(session)
    }

    /// Close one session; the account goes back to `disconnected` once its
    /// last session is closed.
    pub async fn logout(&self, token: Uuid) -> Result<()> {
        let (session, others_open) = {
            let mut sessions = self.sessions.write().await;
            let session = sessions.remove(&token).ok_or(AuthError::UnknownSession)?;
            let others_open = sessions.values().any(|s| s.user.id == session.user.id);
            (session, others_open)
        };

        if !others_open {
            self.store
                .update_user_status_by_id(session.user.id, UserStatus::Disconnected)
                .await?;
        }
        info!(user_id = session.user.id, "User logged out");
        Ok(())
    }

    /// Look up `token` and mark it used. An idle token is refused and left
    /// for [`Self::purge_idle`] to close.
    pub async fn authenticate(&self, token: Uuid) -> Result<Session, AuthError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&token)
            .filter(|s| !s.is_idle(now, self.idle_timeout))
            .ok_or(AuthError::UnknownSession)?;
        session.last_seen = now;
        Ok(session.clone())
    }

    /// Close sessions idle at `now` and disconnect users left without one.
    /// Returns the number of sessions closed.
    pub async fn purge_idle(&self, now: DateTime<Utc>) -> Result<usize> {
        let (closed, disconnected) = {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            let mut touched = HashSet::new();
            sessions.retain(|_, s| {
                let idle = s.is_idle(now, self.idle_timeout);
                if idle {
                    touched.insert(s.user.id);
                }
                !idle
            });
            for s in sessions.values() {
                touched.remove(&s.user.id);
            }
            (before - sessions.len(), touched)
        };

        for user_id in disconnected {
            self.store
                .update_user_status_by_id(user_id, UserStatus::Disconnected)
                .await?;
        }
        if closed > 0 {
            info!(sessions = closed, "Idle sessions closed");
        }
        Ok(closed)
    }

    /// Drop every session and mark all accounts disconnected.
    pub async fn logout_all(&self) -> Result<u64> {
        self.sessions.write().await.clear();
        Ok(self.store.logout_all_users().await?)
    }
}

fn idle_timeout(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use sqlx::SqlitePool;

    use super::*;
    use crate::auth::MIN_COST;

    async fn sessions(pool: SqlitePool) -> (Store, SessionStore) {
        let store = Store::new(pool).with_password_cost(MIN_COST);
        store.seed_admin("admin", "admin").await.unwrap();
        (store.clone(), SessionStore::new(store))
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn login_activates_and_logout_disconnects(pool: SqlitePool) {
        let (store, sessions) = sessions(pool).await;

        let session = sessions.login("admin", "admin").await.unwrap();
        assert_eq!(session.user.status, UserStatus::Active);
        assert_eq!(
            store.get_user_by_id(session.user.id).await.unwrap().status,
            UserStatus::Active
        );
        let authed = sessions.authenticate(session.token).await.unwrap();
        assert_eq!(authed.user.id, session.user.id);

        sessions.logout(session.token).await.unwrap();
        assert_eq!(
            store.get_user_by_id(session.user.id).await.unwrap().status,
            UserStatus::Disconnected
        );
        assert!(matches!(
            sessions.authenticate(session.token).await,
            Err(AuthError::UnknownSession)
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn wrong_password_is_invalid_credentials(pool: SqlitePool) {
        let (_, sessions) = sessions(pool).await;
        let err = sessions.login("admin", "nope").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AuthError>(),
            Some(AuthError::InvalidCredentials)
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn concurrent_sessions_keep_user_active(pool: SqlitePool) {
        let (store, sessions) = sessions(pool).await;
        let first = sessions.login("admin", "admin").await.unwrap();
        let second = sessions.login("admin", "admin").await.unwrap();
        assert_ne!(first.token, second.token);

        sessions.logout(first.token).await.unwrap();
        assert_eq!(
            store.get_user_by_id(first.user.id).await.unwrap().status,
            UserStatus::Active
        );
        sessions.logout(second.token).await.unwrap();
        assert_eq!(
            store.get_user_by_id(first.user.id).await.unwrap().status,
            UserStatus::Disconnected
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn logout_all_clears_sessions(pool: SqlitePool) {
        let (_, sessions) = sessions(pool).await;
        let session = sessions.login("admin", "admin").await.unwrap();

        assert_eq!(sessions.logout_all().await.unwrap(), 1);
        assert!(sessions.authenticate(session.token).await.is_err());
        assert!(sessions.logout(session.token).await.is_err());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn idle_sessions_are_purged_and_users_disconnected(pool: SqlitePool) {
        let (store, sessions) = sessions(pool).await;
        let sessions = sessions.with_idle_timeout(60);
        let session = sessions.login("admin", "admin").await.unwrap();

        let soon = session.last_seen + TimeDelta::seconds(30);
        assert_eq!(sessions.purge_idle(soon).await.unwrap(), 0);
        assert!(sessions.authenticate(session.token).await.is_ok());

        let later = Utc::now() + TimeDelta::minutes(5);
        assert_eq!(sessions.purge_idle(later).await.unwrap(), 1);
        assert!(matches!(
            sessions.authenticate(session.token).await,
            Err(AuthError::UnknownSession)
        ));
        assert_eq!(
            store.get_user_by_id(session.user.id).await.unwrap().status,
            UserStatus::Disconnected
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn idle_token_is_refused_until_swept(pool: SqlitePool) {
        let (store, sessions) = sessions(pool).await;
        let sessions = sessions.with_idle_timeout(0);
        let session = sessions.login("admin", "admin").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert!(matches!(
            sessions.authenticate(session.token).await,
            Err(AuthError::UnknownSession)
        ));
        assert_eq!(
            store.get_user_by_id(session.user.id).await.unwrap().status,
            UserStatus::Active
        );
        assert_eq!(sessions.purge_idle(Utc::now()).await.unwrap(), 1);
        assert_eq!(
            store.get_user_by_id(session.user.id).await.unwrap().status,
            UserStatus::Disconnected
        );
    }

    #[test]
    fn huge_timeouts_saturate() {
        assert_eq!(idle_timeout(u64::MAX), TimeDelta::MAX);
        assert_eq!(idle_timeout(90), TimeDelta::seconds(90));
    }
}
