//! The session: per-association credentials, back-end token, and the named map of result
//! sets it exclusively owns.

use std::collections::HashMap;

use z2folio_backend::BackendClient;
use z2folio_core::config::Config;
use z2folio_core::diagnostic::Diagnostic;
use z2folio_query::ResultSetLookup;

use crate::result_set::ResultSet;

/// Per-association state. Created on init, destroyed when the framework tears the
/// association down. Owns its result sets exclusively, as no other session ever observes
/// them: there is no cross-session visibility and no shared mutable state.
pub struct Session {
    config: Config,
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
    result_sets: HashMap<String, ResultSet>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("result_sets", &self.result_sets)
            .finish()
    }
}

impl Session {
    /// Construct a session around a freshly loaded configuration; each init re-reads
    /// configuration from disk rather than reusing a cached value. Credentials and token are
    /// unset until [`Session::login`] succeeds.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            username: None,
            password: None,
            token: None,
            result_sets: HashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Resolve effective credentials (init-supplied credentials override configured
    /// defaults; missing either is fatal) and log in via the back-end client, storing the
    /// token on success.
    pub async fn login(
        &mut self,
        backend: &BackendClient,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<(), Diagnostic> {
        let username = username
            .or_else(|| self.config.credentials.username.clone())
            .ok_or_else(Diagnostic::missing_credentials)?;
        let password = password
            .or_else(|| self.config.credentials.password.clone())
            .ok_or_else(Diagnostic::missing_credentials)?;

        tracing::info!(tenant = %self.config.tenant, username, "authenticating session");

        let token = backend
            .login(&self.config.base_url, &self.config.tenant, &username, &password)
            .await
            .map_err(|e| Diagnostic::backend_login_failed(e.to_string()))?;

        self.username = Some(username);
        self.password = Some(password);
        self.token = Some(token);
        Ok(())
    }

    /// Replace any prior result set of the same name.
    pub fn put_result_set(&mut self, result_set: ResultSet) {
        self.result_sets.insert(result_set.name().to_string(), result_set);
    }

    pub fn result_set(&self, name: &str) -> Option<&ResultSet> {
        self.result_sets.get(name)
    }

    pub fn result_set_mut(&mut self, name: &str) -> Option<&mut ResultSet> {
        self.result_sets.get_mut(name)
    }

    /// Discard the named result set. Returns `true` if one existed.
    pub fn remove_result_set(&mut self, name: &str) -> bool {
        self.result_sets.remove(name).is_some()
    }
}

impl ResultSetLookup for Session {
    fn has_result_set(&self, name: &str) -> bool {
        self.result_sets.contains_key(name)
    }
}
