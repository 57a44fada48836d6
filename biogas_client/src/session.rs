use std::{fmt, sync::Arc};

use biogas_core::UserProfile;

use crate::{
    ClientResult, RefreshFailure,
    token_store::{StorageKey, TokenStore},
};

/// Keys dropped when the session ends. The institution is a preference, not a credential.
const CREDENTIAL_KEYS: [StorageKey; 3] = [
    StorageKey::AccessToken,
    StorageKey::RefreshToken,
    StorageKey::User,
];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
}

/// Credentials handed out by a successful login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginTokens {
    pub access: String,
    pub refresh: Option<String>,
    pub user: Option<UserProfile>,
}

/// Typed view over the injected [`TokenStore`].
///
/// Cloning is cheap and every clone shares the same underlying store, so the
/// composition root builds one and hands it to everything that needs it.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn TokenStore>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}

impl SessionContext {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn from_store<S: TokenStore + 'static>(store: S) -> Self {
        Self::new(Arc::new(store))
    }

    pub fn access_token(&self) -> ClientResult<Option<String>> {
        self.non_empty(StorageKey::AccessToken)
    }

    pub fn refresh_token(&self) -> ClientResult<Option<String>> {
        self.non_empty(StorageKey::RefreshToken)
    }

    pub fn user(&self) -> ClientResult<Option<UserProfile>> {
        let Some(raw) = self.non_empty(StorageKey::User)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                log::warn!("ignoring stored user profile that failed to decode: {err}");
                Ok(None)
            }
        }
    }

    pub fn institution(&self) -> ClientResult<Option<String>> {
        self.non_empty(StorageKey::CurrentInstitution)
    }

    pub fn is_authenticated(&self) -> ClientResult<bool> {
        Ok(self.access_token()?.is_some())
    }

    pub fn snapshot(&self) -> ClientResult<Session> {
        Ok(Session {
            access_token: self.access_token()?,
            refresh_token: self.refresh_token()?,
            user: self.user()?,
        })
    }

    /// Stores the credentials of a fresh login, replacing whatever was there.
    pub fn begin(&self, tokens: &LoginTokens) -> ClientResult<()> {
        self.store.clear(&CREDENTIAL_KEYS)?;
        self.store.set(StorageKey::AccessToken, &tokens.access)?;
        if let Some(refresh) = &tokens.refresh {
            self.store.set(StorageKey::RefreshToken, refresh)?;
        }
        if let Some(user) = &tokens.user {
            self.set_user(user)?;
        }
        Ok(())
    }

    pub fn set_access_token(&self, token: &str) -> ClientResult<()> {
        self.store.set(StorageKey::AccessToken, token)
    }

    pub fn set_refresh_token(&self, token: &str) -> ClientResult<()> {
        self.store.set(StorageKey::RefreshToken, token)
    }

    pub fn set_user(&self, user: &UserProfile) -> ClientResult<()> {
        self.store
            .set(StorageKey::User, &serde_json::to_string(user)?)
    }

    pub fn set_institution(&self, institution: &str) -> ClientResult<()> {
        self.store.set(StorageKey::CurrentInstitution, institution)
    }

    pub fn clear_institution(&self) -> ClientResult<()> {
        self.store.remove(StorageKey::CurrentInstitution)
    }

    /// Drops access token, refresh token and user.
    pub fn clear(&self) -> ClientResult<()> {
        self.store.clear(&CREDENTIAL_KEYS)
    }

    fn non_empty(&self, key: StorageKey) -> ClientResult<Option<String>> {
        Ok(self
            .store
            .get(key)?
            .filter(|value| !value.trim().is_empty()))
    }
}

/// Told when the session is gone for good so the user can be sent back to login.
pub trait SessionObserver: Send + Sync {
    fn on_session_expired(&self, reason: &RefreshFailure);
}

#[derive(Clone, Debug)]
pub struct LoggingObserver {
    login_entry_point: String,
}

impl LoggingObserver {
    pub fn new(login_entry_point: impl Into<String>) -> Self {
        Self {
            login_entry_point: login_entry_point.into(),
        }
    }
}

impl SessionObserver for LoggingObserver {
    fn on_session_expired(&self, reason: &RefreshFailure) {
        log::warn!(
            "session expired ({reason}); sign in again at {}",
            self.login_entry_point
        );
    }
}

#[cfg(test)]
mod tests {
    use biogas_core::{Profile, UserId, UserProfile};

    use super::{LoginTokens, SessionContext};
    use crate::token_store::{MemoryTokenStore, StorageKey, TokenStore};

    fn user() -> UserProfile {
        UserProfile {
            id: UserId(3),
            username: "operador".to_owned(),
            email: "op@example.org".to_owned(),
            first_name: "Op".to_owned(),
            last_name: "Erador".to_owned(),
            profile: Profile {
                approved: true,
                role: None,
                permissions: None,
            },
        }
    }

    #[test]
    fn begin_persists_all_credentials() {
        let session = SessionContext::from_store(MemoryTokenStore::new());
        session
            .begin(&LoginTokens {
                access: "A1".to_owned(),
                refresh: Some("R1".to_owned()),
                user: Some(user()),
            })
            .expect("begin");

        let snapshot = session.snapshot().expect("snapshot");
        assert_eq!(snapshot.access_token.as_deref(), Some("A1"));
        assert_eq!(snapshot.refresh_token.as_deref(), Some("R1"));
        assert_eq!(snapshot.user, Some(user()));
        assert!(session.is_authenticated().expect("auth check"));
    }

    #[test]
    fn begin_drops_stale_refresh_token() {
        let session = SessionContext::from_store(MemoryTokenStore::new());
        session
            .begin(&LoginTokens {
                access: "A1".to_owned(),
                refresh: Some("R1".to_owned()),
                user: None,
            })
            .expect("begin");
        session
            .begin(&LoginTokens {
                access: "B1".to_owned(),
                refresh: None,
                user: None,
            })
            .expect("begin");

        assert!(session.refresh_token().expect("refresh").is_none());
    }

    #[test]
    fn clear_keeps_institution() {
        let session = SessionContext::from_store(MemoryTokenStore::new());
        session
            .begin(&LoginTokens {
                access: "A1".to_owned(),
                refresh: Some("R1".to_owned()),
                user: Some(user()),
            })
            .expect("begin");
        session.set_institution("unal").expect("institution");

        session.clear().expect("clear");

        let snapshot = session.snapshot().expect("snapshot");
        assert!(snapshot.access_token.is_none());
        assert!(snapshot.refresh_token.is_none());
        assert!(snapshot.user.is_none());
        assert_eq!(
            session.institution().expect("institution").as_deref(),
            Some("unal")
        );
    }

    #[test]
    fn undecodable_user_reads_as_none() {
        let store = MemoryTokenStore::new();
        store.set(StorageKey::User, "{not json").expect("set");
        let session = SessionContext::from_store(store);

        assert!(session.user().expect("user").is_none());
    }

    #[test]
    fn blank_tokens_count_as_absent() {
        let store = MemoryTokenStore::new();
        store.set(StorageKey::AccessToken, "  ").expect("set");
        let session = SessionContext::from_store(store);

        assert!(!session.is_authenticated().expect("auth check"));
    }
}
