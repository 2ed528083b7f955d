use std::fmt;

use crate::core::config::IdentitySettings;

/// Who is taking the test. Handed to the API client and the session controller
/// instead of being looked up from process-wide state.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub display_name: String,
    session_cookie: Option<String>,
}

impl Identity {
    pub fn new(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self { username: username.into(), display_name: display_name.into(), session_cookie: None }
    }

    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn session_cookie(&self) -> Option<&str> {
        self.session_cookie.as_deref()
    }

    /// `Display Name (@username)`, falling back to whichever part is present.
    pub fn banner_label(&self) -> String {
        match (self.display_name.is_empty(), self.username.is_empty()) {
            (false, false) => format!("{} (@{})", self.display_name, self.username),
            (false, true) => self.display_name.clone(),
            (true, false) => format!("@{}", self.username),
            (true, true) => String::new(),
        }
    }

    pub(crate) fn from_settings(settings: &IdentitySettings) -> Self {
        Self {
            username: settings.username.clone(),
            display_name: settings.display_name.clone(),
            session_cookie: settings.session_cookie.clone(),
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .field("session_cookie", &self.session_cookie.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_label_variants() {
        assert_eq!(Identity::new("jdoe", "Jane Doe").banner_label(), "Jane Doe (@jdoe)");
        assert_eq!(Identity::new("jdoe", "").banner_label(), "@jdoe");
        assert_eq!(Identity::new("", "Jane Doe").banner_label(), "Jane Doe");
        assert_eq!(Identity::default().banner_label(), "");
    }

    #[test]
    fn debug_redacts_cookie() {
        let identity = Identity::new("jdoe", "Jane").with_session_cookie("JSESSIONID=abc");
        let printed = format!("{identity:?}");
        assert!(!printed.contains("abc"));
        assert!(printed.contains("<redacted>"));
    }
}
