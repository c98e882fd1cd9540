/// Fallback identity when the session carries no email.
pub const DEFAULT_USER_EMAIL: &str = "demo@groww.in";

/// Read-only view of the externally managed login session.
///
/// The core may ask whether the session is authenticated but never sets it.
pub trait SessionState: Send + Sync {
    fn is_authenticated(&self) -> bool;

    fn user_email(&self) -> Option<String>;

    /// Display name derived from the email's local part, first letter uppercased.
    fn display_name(&self) -> String {
        let email = self
            .user_email()
            .unwrap_or_else(|| DEFAULT_USER_EMAIL.to_string());
        display_name_from_email(&email)
    }
}

pub fn display_name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let mut chars = local.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Fixed session values, for embedding hosts that resolve the login up front.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    pub authenticated: bool,
    pub email: Option<String>,
}

impl StaticSession {
    pub fn authenticated(email: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            email: Some(email.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl SessionState for StaticSession {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn user_email(&self) -> Option<String> {
        self.email.clone()
    }
}
