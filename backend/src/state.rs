use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::services::Authenticator;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub clock: Arc<dyn Clock>,
    pub authenticator: Arc<dyn Authenticator>,
    pub login_delay: Duration,
}
