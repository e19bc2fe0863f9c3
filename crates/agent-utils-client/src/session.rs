/// Credential context threaded through every remote call.
///
/// A 401 from the service moves the session to the invalidated state, so the
/// next call goes out without a token and the operator has to sign in again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    invalidated: bool,
}

impl Session {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
            invalidated: false,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// True once a call was rejected as unauthorized.
    pub fn was_invalidated(&self) -> bool {
        self.invalidated
    }

    pub fn invalidate(&mut self) {
        self.token = None;
        self.invalidated = true;
    }
}
