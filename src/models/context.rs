use crate::error::{AppError, AppResult};

/// Identity of the caller, resolved by the authentication layer before the
/// request reaches this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

/// Per-request context passed explicitly into every service call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    user: Option<AuthenticatedUser>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user: Some(AuthenticatedUser {
                user_id: user_id.into(),
            }),
        }
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    pub fn require_user(&self) -> AppResult<&AuthenticatedUser> {
        match self.user.as_ref() {
            Some(user) if !user.user_id.trim().is_empty() => Ok(user),
            _ => Err(AppError::unauthenticated()),
        }
    }
}
