use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::services::navigation::Screen;

pub const DEFAULT_USERNAME: &str = "pstu";
pub const DEFAULT_PASSWORD: &str = "pstu";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials. Please try again.";

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Claims handed back by an authenticator. Callers treat it as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub subject: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError>;
}

/// Accepts exactly one username/password pair. A stand-in until a real
/// identity provider sits behind `Authenticator`.
pub struct FixedCredentialAuthenticator {
    username: String,
    password: String,
    clock: Arc<dyn Clock>,
}

impl FixedCredentialAuthenticator {
    pub fn new(username: &str, password: &str, clock: Arc<dyn Clock>) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            clock,
        }
    }

    pub fn with_defaults(clock: Arc<dyn Clock>) -> Self {
        Self::new(DEFAULT_USERNAME, DEFAULT_PASSWORD, clock)
    }
}

#[async_trait]
impl Authenticator for FixedCredentialAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        if credentials.username == self.username && credentials.password == self.password {
            Ok(Session {
                subject: credentials.username.clone(),
                issued_at: self.clock.now(),
            })
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Login screen state: where the user is and what error is showing.
pub struct SessionGate {
    authenticator: Arc<dyn Authenticator>,
    delay: Duration,
    route: Screen,
    error: Option<String>,
}

impl SessionGate {
    pub fn new(authenticator: Arc<dyn Authenticator>, delay: Duration) -> Self {
        Self {
            authenticator,
            delay,
            route: Screen::Login,
            error: None,
        }
    }

    pub fn route(&self) -> Screen {
        self.route
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn submit(&mut self, credentials: &Credentials) -> Option<Session> {
        // cosmetic pause so the form does not flash
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.authenticator.authenticate(credentials).await {
            Ok(session) => {
                info!("login accepted for {}", credentials.username);
                self.error = None;
                self.route = Screen::Dashboard;
                Some(session)
            }
            Err(e) => {
                warn!("login rejected for {}: {}", credentials.username, e);
                self.error = Some(INVALID_CREDENTIALS.to_string());
                self.route = Screen::Login;
                None
            }
        }
    }

    pub fn logout(&mut self) {
        self.error = None;
        self.route = Screen::Login;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn gate() -> SessionGate {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        SessionGate::new(
            Arc::new(FixedCredentialAuthenticator::with_defaults(clock)),
            Duration::ZERO,
        )
    }

    fn creds(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn accepted_login_moves_to_dashboard() {
        let mut gate = gate();
        let session = gate.submit(&creds("pstu", "pstu")).await;

        assert_eq!(session.map(|s| s.subject), Some("pstu".to_string()));
        assert_eq!(gate.route(), Screen::Dashboard);
        assert_eq!(gate.error(), None);
    }

    #[tokio::test]
    async fn rejected_login_stays_with_error() {
        let mut gate = gate();
        for (user, pass) in [("pstu", "wrong"), ("admin", "pstu"), ("", "")] {
            assert!(gate.submit(&creds(user, pass)).await.is_none());
            assert_eq!(gate.route(), Screen::Login);
            assert!(!gate.error().unwrap_or_default().is_empty());
        }
    }

    #[tokio::test]
    async fn success_after_failure_clears_error() {
        let mut gate = gate();
        gate.submit(&creds("pstu", "nope")).await;
        gate.submit(&creds("pstu", "pstu")).await;
        assert_eq!(gate.error(), None);

        gate.logout();
        assert_eq!(gate.route(), Screen::Login);
    }

    #[tokio::test]
    async fn submit_waits_for_configured_delay() {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        let mut gate = SessionGate::new(
            Arc::new(FixedCredentialAuthenticator::with_defaults(clock)),
            Duration::from_millis(50),
        );

        let started = tokio::time::Instant::now();
        gate.submit(&creds("pstu", "pstu")).await;
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", creds("pstu", "hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
