/// Identity of the caller on whose behalf requests are dispatched.
///
/// Read once per dispatch when the request context is created.
pub trait UserContext: Send + Sync {
    /// Identifier recorded on each request context. Empty when anonymous.
    fn user_id(&self) -> String;

    /// Display name of the caller.
    fn user_name(&self) -> String;

    /// Roles assigned to the caller for authorization checks.
    fn roles(&self) -> Vec<String>;
}

/// Fixed identity for processes without an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultUserContext {
    pub user_id: String,
    pub user_name: String,
    pub roles: Vec<String>,
}

impl DefaultUserContext {
    /// A named user with no roles.
    #[must_use]
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            roles: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }
}

impl Default for DefaultUserContext {
    fn default() -> Self {
        Self::new(String::new(), "system")
    }
}

impl UserContext for DefaultUserContext {
    fn user_id(&self) -> String {
        self.user_id.clone()
    }

    fn user_name(&self) -> String {
        self.user_name.clone()
    }

    fn roles(&self) -> Vec<String> {
        self.roles.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_anonymous_system_user() {
        let user = DefaultUserContext::default();
        assert_eq!(user.user_id(), "");
        assert_eq!(user.user_name(), "system");
        assert!(user.roles().is_empty());
    }

    #[test]
    fn named_user_with_roles() {
        let user = DefaultUserContext::new("u-42", "alice").with_roles(vec!["admin".to_string()]);
        assert_eq!(user.user_id(), "u-42");
        assert_eq!(user.roles(), vec!["admin"]);
    }
}
