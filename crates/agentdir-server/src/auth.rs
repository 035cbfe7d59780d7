// ABOUTME: Single-administrator authentication: Argon2 credential check and the `auth` session cookie.
// ABOUTME: SessionLayer rejects mutating /agents requests that do not carry an active session.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, Response, header};
use axum::response::IntoResponse;
use rand::RngCore;
use thiserror::Error;
use tower::{Layer, Service};

use crate::error::ApiError;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "auth";

/// Value carried by the session cookie after a successful login.
pub const SESSION_VALUE: &str = "authenticated";

/// Session lifetime: 7 days.
pub const SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 7;

const SALT_LEN: usize = 16;

/// Errors raised by the credential hashing machinery. A wrong password is
/// never an error; `verify` returns `Ok(false)` for that.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("password verification task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(e: argon2::password_hash::Error) -> Self {
        AuthError::Hash(e.to_string())
    }
}

/// Holds the salted hash of the administrator secret, computed once at
/// startup, and issues/clears the session cookie. Cheap to clone.
#[derive(Clone)]
pub struct AuthGate {
    hash: Arc<String>,
    secure_cookies: bool,
}

impl AuthGate {
    /// Hash `secret` with Argon2id under a fresh random salt.
    /// `secure_cookies` adds the `Secure` attribute to issued cookies.
    pub fn new(secret: &str, secure_cookies: bool) -> Result<Self, AuthError> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt)?;

        let hash = Argon2::default()
            .hash_password(secret.as_bytes(), &salt)?
            .to_string();

        Ok(Self {
            hash: Arc::new(hash),
            secure_cookies,
        })
    }

    /// Check a candidate password against the stored hash. Runs on the
    /// blocking pool since Argon2 is deliberately slow.
    pub async fn verify(&self, password: &str) -> Result<bool, AuthError> {
        let hash = Arc::clone(&self.hash);
        let password = password.to_string();

        tokio::task::spawn_blocking(move || -> Result<bool, AuthError> {
            let parsed = PasswordHash::new(hash.as_str())?;
            Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok())
        })
        .await?
    }

    /// True iff the request carries the session cookie with the expected value.
    pub fn is_session_active(&self, headers: &HeaderMap) -> bool {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .any(|(name, value)| name == SESSION_COOKIE && value == SESSION_VALUE)
    }

    /// `Set-Cookie` value that starts a 7-day session.
    pub fn start_session(&self) -> String {
        self.cookie(SESSION_VALUE, SESSION_MAX_AGE_SECS)
    }

    /// `Set-Cookie` value that tells the client to discard the session.
    pub fn end_session(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: u64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            SESSION_COOKIE, value, max_age
        );
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// A tower Layer that requires an active session for mutating requests
/// under /agents. Reads stay public.
#[derive(Clone)]
pub struct SessionLayer {
    gate: AuthGate,
}

impl SessionLayer {
    pub fn new(gate: AuthGate) -> Self {
        Self { gate }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionMiddleware {
            inner,
            gate: self.gate.clone(),
        }
    }
}

/// The middleware service that checks the session cookie.
#[derive(Clone)]
pub struct SessionMiddleware<S> {
    inner: S,
    gate: AuthGate,
}

fn requires_session(method: &Method, path: &str) -> bool {
    let is_agents = path == "/agents" || path.starts_with("/agents/");
    is_agents && !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

impl<S> Service<Request<Body>> for SessionMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        if !requires_session(req.method(), req.uri().path())
            || self.gate.is_session_active(req.headers())
        {
            let mut inner = self.inner.clone();
            return Box::pin(async move { inner.call(req).await });
        }

        tracing::warn!(
            method = %req.method(),
            path = %req.uri().path(),
            "rejected mutating request without an active session"
        );
        Box::pin(async move { Ok(ApiError::Unauthorized.into_response()) })
    }
}
