use crate::models::{Role, UserId};

/// Verified identity of the caller, built once per request from the
/// session claims and passed explicitly into every service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: UserId,
    pub role: Role,
}

impl RequestContext {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: UserId::new(user_id),
            role,
        }
    }

    pub fn student(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Student)
    }

    pub fn faculty(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Faculty)
    }

    pub fn hod(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Hod)
    }
}
