//! API client for communicating with the Booky REST backend.
//!
//! This module provides the `ApiClient` struct, the single point of egress
//! for backend calls. It attaches credentials on the way out and drives the
//! 401-refresh-replay protocol on the way back in.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::{
    SessionManager, SessionStore, CSRF_HEADER, LOGIN_PATH, LOGOUT_PATH, REFRESH_PATH,
    REGISTER_PATH,
};
use crate::models::{Book, Category, LikeStatus, NewThread, Thread, ThreadUpdate};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// An outbound call captured as data so it can be rebuilt and replayed
/// after a session refresh.
#[derive(Debug, Clone)]
struct RequestSpec {
    method: Method,
    path: String,
    body: Option<Value>,
}

impl RequestSpec {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    fn with_body(method: Method, path: impl Into<String>, body: Value) -> Self {
        Self {
            method,
            path: path.into(),
            body: Some(body),
        }
    }
}

/// API client for the Booky backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl ApiClient {
    /// Create a new API client against a base URL, with the given session
    /// store for durable state. The session manager shares this client's
    /// connection pool and cookie store.
    pub fn new(base_url: &str, store: Box<dyn SessionStore>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .cookie_store(true)
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let session = Arc::new(SessionManager::new(client.clone(), &base_url, store));
        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    /// The session manager owning authentication state
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Request hook: build and send one attempt of a request.
    ///
    /// Attaches the bearer token (the replayed one if a refresh just
    /// supplied it) except on the refresh endpoint, which authenticates
    /// with the durable cookie. Mutating methods carry the anti-forgery
    /// header when a CSRF token is known.
    async fn send_raw(
        &self,
        spec: &RequestSpec,
        token_override: Option<&str>,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, spec.path);
        let mut request = self.client.request(spec.method.clone(), &url);

        if spec.path != REFRESH_PATH {
            let token = match token_override {
                Some(token) => Some(token.to_string()),
                None => self.session.access_token(),
            };
            if let Some(token) = token {
                request = request.bearer_auth(token);
            }
        }

        if is_mutating(&spec.method) {
            if let Some(csrf) = self.session.csrf_token() {
                request = request.header(CSRF_HEADER, csrf);
            }
        }

        if let Some(ref body) = spec.body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Response hook: send a request and resolve token expiry.
    ///
    /// A 401 on an authenticated session triggers one shared refresh and
    /// one replay of this request; the logout and refresh endpoints are
    /// exempt so the protocol cannot recurse. An unrecoverable 401 from a
    /// non-auth endpoint drops the session before the error propagates.
    async fn dispatch(&self, spec: RequestSpec) -> Result<Response, ApiError> {
        let mut retried = false;
        let mut replacement_token: Option<String> = None;

        loop {
            let response = self.send_raw(&spec, replacement_token.as_deref()).await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }
            if status != StatusCode::UNAUTHORIZED {
                return Err(Self::http_error(response).await);
            }

            if spec.path == LOGOUT_PATH {
                // terminate the logout flow cleanly, never retry it
                self.session.reset();
                return Err(Self::http_error(response).await);
            }

            let recoverable =
                !retried && spec.path != REFRESH_PATH && self.session.is_authenticated();
            if !recoverable {
                if !is_auth_endpoint(&spec.path) {
                    // stale credential: drop the session, still surface the error
                    warn!(path = %spec.path, "unrecoverable 401, resetting session");
                    self.session.reset();
                }
                return Err(Self::http_error(response).await);
            }

            retried = true;
            debug!(path = %spec.path, "401 received, refreshing session before replay");
            let token = self.session.refresh_for_retry().await?;
            replacement_token = Some(token);
        }
    }

    /// Turn a non-2xx response into an `Http` error with its body
    async fn http_error(response: Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        ApiError::http(status, &body)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.dispatch(RequestSpec::new(Method::GET, path)).await?;
        Ok(response.json().await?)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, ApiError> {
        let response = self
            .dispatch(RequestSpec::with_body(Method::POST, path, body))
            .await?;
        Ok(response.json().await?)
    }

    async fn put<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, ApiError> {
        let response = self
            .dispatch(RequestSpec::with_body(Method::PUT, path, body))
            .await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.dispatch(RequestSpec::new(Method::DELETE, path))
            .await?;
        Ok(())
    }

    /// Best-effort logout through the interceptor pipeline, then clear
    /// local and persisted session state regardless of the backend's
    /// answer.
    pub async fn logout(&self) {
        let spec = RequestSpec::new(Method::POST, LOGOUT_PATH);
        match self.dispatch(spec).await {
            Ok(_) => debug!("logout acknowledged by backend"),
            Err(err) => warn!(error = %err, "logout request failed"),
        }
        self.session.finish_logout();
    }

    /// Register a new account. Plain pass-through to the backend; the
    /// caller logs in separately afterwards.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        username: Option<&str>,
    ) -> Result<(), ApiError> {
        let mut body = serde_json::json!({
            "email": email,
            "password1": password,
            "password2": password,
        });
        if let Some(username) = username {
            body["username"] = Value::String(username.to_string());
        }
        self.dispatch(RequestSpec::with_body(Method::POST, REGISTER_PATH, body))
            .await?;
        Ok(())
    }

    // ===== Books =====

    /// Fetch the book catalog
    pub async fn fetch_books(&self) -> Result<Vec<Book>, ApiError> {
        self.get("/books/").await
    }

    /// Fetch one book with its detail fields
    pub async fn fetch_book(&self, book_id: i64) -> Result<Book, ApiError> {
        self.get(&format!("/books/{book_id}/")).await
    }

    /// Fetch the category list
    pub async fn fetch_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get("/api/accounts/categories/").await
    }

    /// Fetch a book and its discussion threads concurrently
    pub async fn fetch_book_with_threads(
        &self,
        book_id: i64,
    ) -> Result<(Book, Vec<Thread>), ApiError> {
        let (book, threads) = futures::try_join!(self.fetch_book(book_id), self.fetch_threads())?;
        let threads = threads
            .into_iter()
            .filter(|thread| thread.book == Some(book_id))
            .collect();
        Ok((book, threads))
    }

    // ===== Discussion threads =====

    /// Fetch all discussion threads
    pub async fn fetch_threads(&self) -> Result<Vec<Thread>, ApiError> {
        self.get("/books/threads/").await
    }

    /// Fetch a single thread
    pub async fn fetch_thread(&self, thread_id: i64) -> Result<Thread, ApiError> {
        self.get(&format!("/books/threads/{thread_id}/")).await
    }

    /// Create a discussion thread on a book
    pub async fn create_thread(&self, new_thread: &NewThread) -> Result<Thread, ApiError> {
        let body = serde_json::json!({
            "book": new_thread.book,
            "title": new_thread.title,
            "content": new_thread.content,
        });
        self.post("/books/threads/create/", body).await
    }

    /// Update a thread's title and content
    pub async fn update_thread(
        &self,
        thread_id: i64,
        update: &ThreadUpdate,
    ) -> Result<Thread, ApiError> {
        let body = serde_json::json!({
            "title": update.title,
            "content": update.content,
        });
        self.put(&format!("/books/threads/{thread_id}/update/"), body)
            .await
    }

    /// Delete a thread
    pub async fn delete_thread(&self, thread_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/books/threads/{thread_id}/delete/"))
            .await
    }

    /// Toggle the like on a thread
    pub async fn like_thread(&self, thread_id: i64) -> Result<LikeStatus, ApiError> {
        self.post(
            &format!("/books/threads/{thread_id}/like/"),
            serde_json::json!({}),
        )
        .await
    }
}

/// State-mutating methods carry the anti-forgery header
fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Auth endpoints are exempt from the stale-credential reset: their 401s
/// already have dedicated handling.
fn is_auth_endpoint(path: &str) -> bool {
    path == LOGIN_PATH || path == LOGOUT_PATH || path == REFRESH_PATH || path == REGISTER_PATH
}
