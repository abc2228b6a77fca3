//! Session lifecycle: login, logout, refresh, persistence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::models::UserProfile;

use super::refresh::{RefreshCoordinator, RefreshTicket};
use super::store::SessionStore;
use super::{PersistedSession, Session, CSRF_COOKIE, LOGIN_PATH, REFRESH_PATH};

/// Fallback message when the backend gives no detail on a login failure
const LOGIN_FALLBACK_ERROR: &str = "login rejected";

/// Shape shared by the login and refresh endpoints: `{access, user}`.
/// Both fields are required; optionality here only exists so a missing
/// field surfaces as a protocol violation instead of a parse error.
#[derive(Debug, Deserialize)]
struct AuthPayload {
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    user: Option<UserProfile>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    detail: Option<String>,
}

/// Sole owner of `Session` mutation.
///
/// Shares its `reqwest::Client` (and therefore its cookie store, which
/// carries the durable refresh session) with the `ApiClient`. Concurrent
/// refresh attempts collapse into one network call through the
/// `RefreshCoordinator`.
pub struct SessionManager {
    http: Client,
    base_url: String,
    state: Mutex<Session>,
    coordinator: RefreshCoordinator,
    store: Box<dyn SessionStore>,
    remember_me: AtomicBool,
}

impl SessionManager {
    pub fn new(http: Client, base_url: &str, store: Box<dyn SessionStore>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            state: Mutex::new(Session::default()),
            coordinator: RefreshCoordinator::default(),
            store,
            remember_me: AtomicBool::new(false),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut self.state.lock().expect("session state poisoned"))
    }

    /// Snapshot of the current session state
    pub fn snapshot(&self) -> Session {
        self.with_state(|s| s.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        self.with_state(|s| s.access_token.clone())
    }

    pub fn csrf_token(&self) -> Option<String> {
        self.with_state(|s| s.csrf_token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.with_state(|s| s.is_authenticated)
    }

    /// Whether a token refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.coordinator.is_refreshing()
    }

    pub fn remember_me(&self) -> bool {
        self.remember_me.load(Ordering::Relaxed)
    }

    pub fn set_remember_me(&self, remember: bool) {
        self.remember_me.store(remember, Ordering::Relaxed);
        self.persist();
    }

    /// Synchronously clear the session to the Anonymous state. Idempotent,
    /// never fails; durable state is only touched by `logout`.
    pub fn reset(&self) {
        self.with_state(|s| s.reset());
    }

    /// Rehydrate the partial session from the store at startup. Returns
    /// true when the persisted state claims an authenticated session, in
    /// which case the caller should revalidate with `refresh_session`.
    pub fn hydrate(&self) -> bool {
        let persisted = match self.store.load() {
            Ok(Some(persisted)) => persisted,
            Ok(None) => return false,
            Err(err) => {
                warn!(error = %err, "failed to load persisted session");
                return false;
            }
        };
        self.remember_me
            .store(persisted.remember_me, Ordering::Relaxed);
        self.with_state(|s| {
            s.user = persisted.user;
            s.is_authenticated = persisted.is_authenticated;
        });
        self.is_authenticated()
    }

    /// Write the durable subset of the session. Persistence failures are
    /// logged, not propagated; the in-memory session stays authoritative.
    fn persist(&self) {
        let persisted = self.with_state(|s| PersistedSession {
            user: s.user.clone(),
            is_authenticated: s.is_authenticated,
            remember_me: self.remember_me(),
        });
        if let Err(err) = self.store.save(&persisted) {
            warn!(error = %err, "failed to persist session");
        }
    }

    /// Pull the anti-forgery token out of any `Set-Cookie` headers
    fn capture_csrf(&self, response: &reqwest::Response) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            if let Some(csrf) = value.to_str().ok().and_then(csrf_from_set_cookie) {
                self.with_state(|s| s.csrf_token = Some(csrf));
            }
        }
    }

    /// Authenticate with email and password.
    ///
    /// On success the session holds the new token and user. On failure the
    /// session drops to Anonymous with the backend's `detail` message (or a
    /// fallback) recorded in `last_error`.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        self.with_state(|s| {
            s.is_loading = true;
            s.last_error = None;
        });

        match self.request_login(email, password).await {
            Ok(user) => {
                self.with_state(|s| s.is_loading = false);
                self.persist();
                Ok(user)
            }
            Err(err) => {
                let message = match &err {
                    ApiError::Auth(detail) => detail.clone(),
                    other => other.to_string(),
                };
                self.with_state(|s| {
                    s.access_token = None;
                    s.user = None;
                    s.is_authenticated = false;
                    s.is_loading = false;
                    s.last_error = Some(message);
                });
                Err(err)
            }
        }
    }

    async fn request_login(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        let response = self
            .http
            .post(self.url(LOGIN_PATH))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        self.capture_csrf(&response);

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorDetail>(&body)
                .ok()
                .and_then(|e| e.detail)
                .unwrap_or_else(|| LOGIN_FALLBACK_ERROR.to_string());
            return Err(ApiError::Auth(detail));
        }

        let payload: AuthPayload = response.json().await?;
        let (Some(access), Some(user)) = (payload.access, payload.user) else {
            return Err(ApiError::Protocol(
                "login response missing access token or user".to_string(),
            ));
        };

        self.with_state(|s| {
            s.access_token = Some(access);
            s.user = Some(user.clone());
            s.is_authenticated = true;
            s.last_error = None;
        });
        debug!(email = %user.email, "login succeeded");
        Ok(user)
    }

    /// Clear local and persisted session state after a logout attempt.
    /// The network side of logout lives on `ApiClient::logout` so the 401
    /// handling of the response hook applies to it.
    pub(crate) fn finish_logout(&self) {
        self.reset();
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear persisted session");
        }
    }

    /// Exchange the durable session cookie for a fresh access token.
    ///
    /// Returns `Ok(false)` immediately if a refresh is already running
    /// (no answer yet, not "unauthenticated") or if this attempt failed
    /// without invalidating the durable session. A 401 from the refresh
    /// endpoint resets the session; a response missing `access` or `user`
    /// is a protocol violation and also resets.
    pub async fn refresh_session(&self) -> Result<bool, ApiError> {
        if !self.coordinator.try_begin() {
            debug!("refresh already in progress");
            return Ok(false);
        }

        self.with_state(|s| s.is_loading = true);
        let result = self.drive_refresh().await;
        self.with_state(|s| s.is_loading = false);

        match result {
            Ok(token) => {
                self.coordinator.finish(Some(token));
                Ok(true)
            }
            Err(err) => {
                self.coordinator.finish(None);
                match err {
                    ApiError::Protocol(_) => Err(err),
                    _ => Ok(false),
                }
            }
        }
    }

    /// Alias for `refresh_session`, for callers phrasing it as a check
    pub async fn check_auth(&self) -> Result<bool, ApiError> {
        self.refresh_session().await
    }

    /// Refresh on behalf of a request that hit a 401.
    ///
    /// The first caller drives the network call; concurrent callers park on
    /// the coordinator and share its outcome. Leaders surface the original
    /// refresh error, waiters get `RefreshFailed`. Any failure here forces
    /// the Anonymous state.
    pub(crate) async fn refresh_for_retry(&self) -> Result<String, ApiError> {
        match self.coordinator.begin() {
            RefreshTicket::Leader => match self.drive_refresh().await {
                Ok(token) => {
                    self.coordinator.finish(Some(token.clone()));
                    Ok(token)
                }
                Err(err) => {
                    self.coordinator.finish(None);
                    self.reset();
                    Err(err)
                }
            },
            RefreshTicket::Waiter(receiver) => match receiver.await {
                Ok(Some(token)) => Ok(token),
                _ => Err(ApiError::RefreshFailed),
            },
        }
    }

    /// The actual refresh network call. Caller must hold coordinator
    /// leadership. No bearer token: the refresh endpoint authenticates with
    /// the durable session cookie.
    async fn drive_refresh(&self) -> Result<String, ApiError> {
        debug!("refreshing session");
        let response = match self.http.post(self.url(REFRESH_PATH)).send().await {
            Ok(response) => response,
            Err(err) => {
                self.with_state(|s| s.last_error = Some(err.to_string()));
                return Err(ApiError::Network(err));
            }
        };
        self.capture_csrf(&response);

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::http(status, &body);
            if status == StatusCode::UNAUTHORIZED {
                warn!("durable session rejected, dropping to anonymous");
                self.reset();
            } else {
                self.with_state(|s| s.last_error = Some(err.to_string()));
            }
            return Err(err);
        }

        let payload: AuthPayload = match response.json().await {
            Ok(payload) => payload,
            Err(err) => {
                self.reset();
                return Err(ApiError::Protocol(format!(
                    "unparseable refresh response: {err}"
                )));
            }
        };
        let (Some(access), Some(user)) = (payload.access, payload.user) else {
            self.reset();
            return Err(ApiError::Protocol(
                "refresh response missing access token or user".to_string(),
            ));
        };

        self.with_state(|s| {
            s.access_token = Some(access.clone());
            s.user = Some(user);
            s.is_authenticated = true;
            s.last_error = None;
        });
        self.persist();
        debug!("session refreshed");
        Ok(access)
    }
}

/// Extract the CSRF token from a raw `Set-Cookie` header value
fn csrf_from_set_cookie(raw: &str) -> Option<String> {
    let first_pair = raw.split(';').next()?;
    let (name, value) = first_pair.split_once('=')?;
    if name.trim() == CSRF_COOKIE && !value.trim().is_empty() {
        Some(value.trim().to_string())
    } else {
        None
    }
}
