use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is asking: the browser session, plus the login name once the visitor
/// has signed in. Authentication itself happens upstream of this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requester {
    pub session_id: String,
    pub username: Option<String>,
}

impl Requester {
    pub fn anonymous(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            username: None,
        }
    }

    pub fn authenticated(session_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            username: Some(username.into()),
        }
    }

    /// The login name, treating a blank header value as anonymous.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|name| !name.is_empty())
    }
}

/// Account record as the checkout path sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}
