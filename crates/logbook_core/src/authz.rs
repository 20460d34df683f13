//! Role and ownership checks.
//!
//! Every service operation calls [`authorize`] before touching the store.
//! The caller's role always comes from the verified [`RequestContext`].

use crate::context::RequestContext;
use crate::error::{LogbookError, Result};
use crate::models::{Role, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateEntry,
    EditEntry,
    DeleteEntry,
    SubmitEntry,
    ViewEntry,
    ReviewEntry,
    /// Read a student's aggregate data (progress, export).
    ViewStudent,
    CountPending,
}

impl Action {
    /// Actions reserved to the student who owns the record.
    #[inline]
    pub fn is_authoring(&self) -> bool {
        matches!(
            self,
            Action::CreateEntry | Action::EditEntry | Action::DeleteEntry | Action::SubmitEntry
        )
    }
}

/// The record (or student) an action targets.
#[derive(Debug, Clone, Copy)]
pub struct Resource<'a> {
    pub owner_id: Option<&'a UserId>,
    /// Whether the acting faculty member is assigned to the owner.
    pub reviewer_assigned: bool,
}

impl<'a> Resource<'a> {
    pub fn owned_by(owner_id: &'a UserId, reviewer_assigned: bool) -> Self {
        Self {
            owner_id: Some(owner_id),
            reviewer_assigned,
        }
    }

    pub fn unscoped() -> Self {
        Self {
            owner_id: None,
            reviewer_assigned: false,
        }
    }
}

pub fn authorize(action: Action, actor: &RequestContext, resource: &Resource<'_>) -> Result<()> {
    let is_owner = resource.owner_id == Some(&actor.user_id);

    let allowed = match actor.role {
        Role::Student => match action {
            Action::ReviewEntry | Action::CountPending => false,
            _ => is_owner,
        },
        Role::Faculty => match action {
            Action::CountPending => true,
            Action::ViewEntry | Action::ReviewEntry | Action::ViewStudent => resource.reviewer_assigned,
            _ => false,
        },
        Role::Hod => !action.is_authoring(),
    };

    if allowed {
        return Ok(());
    }

    Err(LogbookError::forbidden(denial_reason(action, actor.role)))
}

fn denial_reason(action: Action, role: Role) -> String {
    match (role, action) {
        (Role::Student, Action::ReviewEntry) => "students cannot sign or reject entries".to_string(),
        (Role::Student, Action::CountPending) => "pending review counts are for reviewers".to_string(),
        (Role::Student, _) => "students may only act on their own records".to_string(),
        (_, a) if a.is_authoring() => "only the owning student may author entries".to_string(),
        (Role::Faculty, _) => "student is not assigned to this faculty member".to_string(),
        (Role::Hod, _) => "action not permitted".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> UserId {
        UserId::new("student_alice")
    }

    #[test]
    fn test_student_owns_only_their_records() {
        let owner = alice();
        let ctx = RequestContext::student("student_alice");
        let other = RequestContext::student("student_bob");

        for action in [Action::CreateEntry, Action::EditEntry, Action::SubmitEntry, Action::ViewEntry] {
            assert!(authorize(action, &ctx, &Resource::owned_by(&owner, false)).is_ok());
            let err = authorize(action, &other, &Resource::owned_by(&owner, false)).unwrap_err();
            assert!(matches!(err, LogbookError::Forbidden(_)));
        }
    }

    #[test]
    fn test_student_can_never_review() {
        let owner = alice();
        let ctx = RequestContext::student("student_alice");
        assert!(authorize(Action::ReviewEntry, &ctx, &Resource::owned_by(&owner, true)).is_err());
        assert!(authorize(Action::CountPending, &ctx, &Resource::unscoped()).is_err());
    }

    #[test]
    fn test_faculty_scoped_by_assignment() {
        let owner = alice();
        let ctx = RequestContext::faculty("dr_rao");

        assert!(authorize(Action::ReviewEntry, &ctx, &Resource::owned_by(&owner, true)).is_ok());
        assert!(authorize(Action::ViewEntry, &ctx, &Resource::owned_by(&owner, true)).is_ok());
        assert!(authorize(Action::ReviewEntry, &ctx, &Resource::owned_by(&owner, false)).is_err());
        assert!(authorize(Action::ViewStudent, &ctx, &Resource::owned_by(&owner, false)).is_err());
        // Assignment never grants authoring.
        assert!(authorize(Action::EditEntry, &ctx, &Resource::owned_by(&owner, true)).is_err());
        assert!(authorize(Action::CountPending, &ctx, &Resource::unscoped()).is_ok());
    }

    #[test]
    fn test_hod_reviews_anything_but_authors_nothing() {
        let owner = alice();
        let ctx = RequestContext::hod("hod_iyer");

        for action in [Action::ViewEntry, Action::ReviewEntry, Action::ViewStudent, Action::CountPending] {
            assert!(authorize(action, &ctx, &Resource::owned_by(&owner, false)).is_ok());
        }
        for action in [Action::CreateEntry, Action::EditEntry, Action::DeleteEntry, Action::SubmitEntry] {
            assert!(authorize(action, &ctx, &Resource::owned_by(&owner, false)).is_err());
        }
    }
}
