use std::collections::HashMap;

/// Authenticated identity used for every meal plan API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub token: String,
}

/// Read-only key/value store holding the persisted session.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
}

impl SessionStore for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Authenticated(Session),
    Unauthenticated,
}

#[derive(Debug, Clone)]
pub struct SessionGuard {
    pub user_id_key: String,
    pub token_key: String,
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self::new("userId", "token")
    }
}

impl SessionGuard {
    pub fn new(user_id_key: impl Into<String>, token_key: impl Into<String>) -> Self {
        Self {
            user_id_key: user_id_key.into(),
            token_key: token_key.into(),
        }
    }

    /// The query string user wins over the persisted one; the token only ever
    /// comes from the store. Empty values count as missing.
    pub fn resolve(&self, query_user_id: Option<&str>, store: &impl SessionStore) -> Guard {
        let user_id = query_user_id
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
            .or_else(|| store.get(&self.user_id_key).filter(|v| !v.is_empty()));

        let token = store.get(&self.token_key).filter(|v| !v.is_empty());

        match (user_id, token) {
            (Some(user_id), Some(token)) => Guard::Authenticated(Session { user_id, token }),
            _ => Guard::Unauthenticated,
        }
    }
}
