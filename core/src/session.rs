//! Per-client session and authentication state.
//!
//! # Design
//! A `Session` is owned by exactly one `Client`. It starts anonymous, and
//! only a successful login replaces its credentials, all at once. The device
//! id is derived lazily and cached; login clears the cache so the id is
//! rebound to the new username on next use.

use std::sync::OnceLock;

use url::Url;

use crate::identity;

/// What a successful login hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub user_id: String,
    pub server_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

#[derive(Debug)]
pub struct Session {
    base_url: Url,
    client_name: String,
    client_version: String,
    username: String,
    credentials: Option<Credentials>,
    device_id: OnceLock<String>,
}

impl Session {
    pub fn new(base_url: Url, client_name: &str, client_version: &str) -> Self {
        Self {
            base_url,
            client_name: client_name.to_string(),
            client_version: client_version.to_string(),
            username: String::new(),
            credentials: None,
            device_id: OnceLock::new(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn client_version(&self) -> &str {
        &self.client_version
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn state(&self) -> AuthState {
        if self.credentials.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Empty until a login succeeds.
    pub fn token(&self) -> &str {
        self.credentials.as_ref().map_or("", |c| c.token.as_str())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.user_id.as_str())
    }

    /// The cached device id, derived on first use.
    pub fn device_id(&self) -> &str {
        self.device_id
            .get_or_init(|| identity::device_identity(&self.username))
    }

    /// Value of the `X-Emby-Authorization` header sent before a token exists.
    pub fn auth_header(&self) -> String {
        format!(
            "MediaBrowser Client=\"{}\", Device=\"{}\", DeviceId=\"{}\", Version=\"{}\"",
            self.client_name,
            identity::device_name(),
            self.device_id(),
            self.client_version
        )
    }

    /// Replace the previous session, if any, with a fresh login.
    pub(crate) fn establish(&mut self, username: &str, credentials: Credentials) {
        self.username = username.to_string();
        self.credentials = Some(credentials);
        self.device_id = OnceLock::new();
    }
}
