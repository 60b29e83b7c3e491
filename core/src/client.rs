//! Request dispatcher and login flow.
//!
//! # Design
//! Every API call funnels through `Client::execute`: resolve the path against
//! the base URL, merge the call's `ParameterBag` into the query string, attach
//! the session token, run the request on the `Transport`, and classify the
//! status. The body comes back as a scoped `Body` the caller decodes and
//! drops. Nothing is retried.
//!
//! `login` takes `&mut self`, so it cannot overlap another login or any
//! in-flight call on the same client. Data calls only read the session and
//! take `&self`.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::{classify, Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::params::{keys, ParameterBag};
use crate::session::{Credentials, Session};
use crate::types::PublicSystemInfo;

pub(crate) const TOKEN_HEADER: &str = "X-Emby-Token";
pub(crate) const AUTHORIZATION_HEADER: &str = "X-Emby-Authorization";
const CONTENT_TYPE_HEADER: &str = "Content-Type";
const JSON_CONTENT_TYPE: &str = "application/json";

const fn default_timeout() -> Duration {
    UreqTransport::DEFAULT_TIMEOUT
}

/// Settings for one client instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    pub client_name: String,
    pub client_version: String,
    /// Per-request ceiling. Deserialized from whole seconds.
    #[serde(default = "default_timeout", with = "seconds")]
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str, client_name: &str, client_version: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            client_name: client_name.to_string(),
            client_version: client_version.to_string(),
            timeout: default_timeout(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    #[serde(rename = "Username")]
    username: &'a str,
    #[serde(rename = "PW")]
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LoginResponse {
    access_token: String,
    server_id: String,
    user: LoginUser,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LoginUser {
    id: String,
}

/// Blocking client for one media-server account.
pub struct Client {
    transport: Box<dyn Transport>,
    session: Session,
}

impl Client {
    /// Create a client using the default blocking transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = UreqTransport::new(config.timeout);
        Self::with_transport(config, transport)
    }

    /// Create a client that executes requests on `transport`.
    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;
        Ok(Self {
            transport: Box::new(transport),
            session: Session::new(base_url, &config.client_name, &config.client_version),
        })
    }

    pub fn base_url(&self) -> &Url {
        self.session.base_url()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.credentials().is_some()
    }

    pub fn logged_in_user(&self) -> &str {
        self.session.username()
    }

    /// Authenticate and store the session token for later calls.
    ///
    /// On any failure the previous session is left exactly as it was.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.try_login(username, password)
            .map_err(|e| e.context("login failed"))
    }

    fn try_login(&mut self, username: &str, password: &str) -> Result<()> {
        let body = serde_json::to_vec(&LoginBody { username, password }).map_err(Error::Encode)?;
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: self.resolve("/Users/authenticatebyname").to_string(),
            headers: vec![
                (AUTHORIZATION_HEADER.to_string(), self.session.auth_header()),
                (CONTENT_TYPE_HEADER.to_string(), JSON_CONTENT_TYPE.to_string()),
            ],
            body: Some(body),
        };

        let response = self.dispatch(request)?;
        let dto: LoginResponse = response.body.json()?;

        self.session.establish(
            username,
            Credentials {
                token: dto.access_token,
                user_id: dto.user.id,
                server_id: dto.server_id,
            },
        );
        info!(username, "logged in");
        Ok(())
    }

    /// Public server information. Needs no login.
    pub fn ping(&self) -> Result<PublicSystemInfo> {
        let response = self
            .get("/System/Info/Public", &ParameterBag::new())
            .map_err(|e| e.context("ping"))?;
        response.body.json().map_err(|e| e.context("ping"))
    }

    /// `UserId` (once logged in) and `DeviceId`.
    pub(crate) fn default_params(&self) -> ParameterBag {
        let mut params = ParameterBag::new();
        if let Some(user_id) = self.session.user_id() {
            params.set(keys::USER_ID, user_id);
        }
        params.set(keys::DEVICE_ID, self.session.device_id());
        params
    }

    /// The logged-in user's id, for user-scoped paths.
    pub(crate) fn user_id(&self) -> Result<&str> {
        self.session.user_id().ok_or(Error::NotAuthenticated)
    }

    pub(crate) fn get(&self, path: &str, params: &ParameterBag) -> Result<HttpResponse> {
        self.execute::<()>(HttpMethod::Get, path, None, params)
    }

    pub(crate) fn delete(&self, path: &str, params: &ParameterBag) -> Result<HttpResponse> {
        self.execute::<()>(HttpMethod::Delete, path, None, params)
    }

    pub(crate) fn post<B: Serialize>(
        &self,
        path: &str,
        params: &ParameterBag,
        body: &B,
    ) -> Result<HttpResponse> {
        self.execute(HttpMethod::Post, path, Some(body), params)
    }

    /// Build, send and classify one request.
    pub fn execute<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        params: &ParameterBag,
    ) -> Result<HttpResponse> {
        let request = self.build_request(method, path, body, params)?;
        self.dispatch(request)
    }

    /// The request `execute` would send, without sending it.
    pub fn build_request<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        params: &ParameterBag,
    ) -> Result<HttpRequest> {
        let mut headers = Vec::with_capacity(2);
        let body = match body {
            Some(body) => {
                headers.push((CONTENT_TYPE_HEADER.to_string(), JSON_CONTENT_TYPE.to_string()));
                Some(serde_json::to_vec(body).map_err(Error::Encode)?)
            }
            None => None,
        };
        headers.push((TOKEN_HEADER.to_string(), self.session.token().to_string()));

        Ok(HttpRequest {
            method,
            url: self.encode_url(path, params),
            headers,
            body,
        })
    }

    /// Fully qualified URL for `path` with `params` as its query string.
    /// Issues no request.
    pub fn encode_url(&self, path: &str, params: &ParameterBag) -> String {
        let mut url = self.resolve(path);
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        url.to_string()
    }

    fn resolve(&self, path: &str) -> Url {
        let mut url = self.session.base_url().clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url
    }

    fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method;
        let path = request_path(&request.url);
        let start = Instant::now();

        let response = self.transport.execute(request)?;
        debug!(
            "{method} {path}: {} ({} ms)",
            response.status,
            start.elapsed().as_millis()
        );
        classify(response)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut normalized = base_url.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let url = Url::parse(&normalized)?;
    // "host:8096" parses with "host" as its scheme.
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(Error::UnsupportedScheme(base_url.trim().to_string()));
    }
    Ok(url)
}

/// Escape `id` so it is sent as exactly one path segment.
///
/// Everything outside the unreserved set is percent-encoded, so `/`, `?`
/// and `#` cannot split the id. A bare `.` or `..` is rejected because URL
/// parsing would collapse it into the surrounding path.
pub(crate) fn segment(id: &str) -> Result<String> {
    if matches!(id, "" | "." | "..") {
        return Err(Error::InvalidId(id.to_string()));
    }
    let mut out = String::with_capacity(id.len());
    for &b in id.as_bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    Ok(out)
}

fn request_path(url: &str) -> String {
    Url::parse(url).map_or_else(|_| url.to_string(), |u| u.path().to_string())
}
