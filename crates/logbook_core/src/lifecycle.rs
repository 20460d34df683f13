//! Review lifecycle of a log entry.
//!
//! ```text
//! DRAFT ──submit──▶ SUBMITTED ──sign──▶ SIGNED
//!                    │   ▲
//!            reject  │   │ submit
//!                    ▼   │
//!          REJECTED   NEEDS_REVISION
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{LogbookError, Result};
use crate::models::EntryStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Submit,
    Sign,
    Reject,
    RequestRevision,
}

impl Transition {
    pub fn sources(&self) -> &'static [EntryStatus] {
        match self {
            Transition::Submit => &[EntryStatus::Draft, EntryStatus::NeedsRevision],
            Transition::Sign | Transition::Reject | Transition::RequestRevision => {
                &[EntryStatus::Submitted]
            }
        }
    }

    pub fn target(&self) -> EntryStatus {
        match self {
            Transition::Submit => EntryStatus::Submitted,
            Transition::Sign => EntryStatus::Signed,
            Transition::Reject => EntryStatus::Rejected,
            Transition::RequestRevision => EntryStatus::NeedsRevision,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Transition::Submit => "submit",
            Transition::Sign => "sign",
            Transition::Reject => "reject",
            Transition::RequestRevision => "return for revision",
        }
    }
}

/// How a reviewer closes a review without signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectOutcome {
    /// Closed for good.
    Rejected,
    /// Back to the student for edits and resubmission.
    NeedsRevision,
}

impl RejectOutcome {
    pub fn transition(&self) -> Transition {
        match self {
            RejectOutcome::Rejected => Transition::Reject,
            RejectOutcome::NeedsRevision => Transition::RequestRevision,
        }
    }
}

impl EntryStatus {
    /// Applies `transition`, failing with `Conflict` when it is not allowed
    /// from the current status.
    pub fn apply(self, transition: Transition) -> Result<EntryStatus> {
        if transition.sources().contains(&self) {
            return Ok(transition.target());
        }
        Err(match self {
            EntryStatus::Signed => LogbookError::conflict("entry is already signed"),
            EntryStatus::Rejected => LogbookError::conflict("entry has been rejected"),
            other => LogbookError::conflict(format!(
                "cannot {} an entry in status {}",
                transition.verb(),
                other
            )),
        })
    }

    /// The owner may only change the entry before submission or after a
    /// revision request.
    pub fn ensure_editable(self) -> Result<()> {
        match self {
            EntryStatus::Draft | EntryStatus::NeedsRevision => Ok(()),
            EntryStatus::Signed => Err(LogbookError::conflict("cannot edit signed entry")),
            EntryStatus::Submitted => Err(LogbookError::conflict("cannot edit entry awaiting review")),
            EntryStatus::Rejected => Err(LogbookError::conflict("cannot edit rejected entry")),
        }
    }

    pub fn ensure_deletable(self) -> Result<()> {
        match self {
            EntryStatus::Draft | EntryStatus::NeedsRevision => Ok(()),
            EntryStatus::Signed => Err(LogbookError::conflict("cannot delete signed entry")),
            other => Err(LogbookError::conflict(format!(
                "cannot delete entry in status {}",
                other
            ))),
        }
    }

    pub fn is_editable(self) -> bool {
        self.ensure_editable().is_ok()
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, EntryStatus::Signed | EntryStatus::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let submitted = EntryStatus::Draft.apply(Transition::Submit).unwrap();
        assert_eq!(submitted, EntryStatus::Submitted);
        assert_eq!(submitted.apply(Transition::Sign).unwrap(), EntryStatus::Signed);
    }

    #[test]
    fn test_revision_is_the_only_cycle() {
        let back = EntryStatus::Submitted.apply(Transition::RequestRevision).unwrap();
        assert_eq!(back, EntryStatus::NeedsRevision);
        assert!(back.is_editable());
        assert_eq!(back.apply(Transition::Submit).unwrap(), EntryStatus::Submitted);

        for status in [EntryStatus::Signed, EntryStatus::Rejected] {
            assert!(status.is_terminal());
            for t in [Transition::Submit, Transition::Sign, Transition::Reject, Transition::RequestRevision] {
                assert!(status.apply(t).is_err(), "{} must not accept {:?}", status, t);
            }
        }
    }

    #[test]
    fn test_drafts_cannot_be_reviewed() {
        for t in [Transition::Sign, Transition::Reject, Transition::RequestRevision] {
            let err = EntryStatus::Draft.apply(t).unwrap_err();
            assert!(matches!(err, LogbookError::Conflict(_)));
        }
    }

    #[test]
    fn test_signed_entry_edit_message() {
        match EntryStatus::Signed.ensure_editable() {
            Err(LogbookError::Conflict(msg)) => assert_eq!(msg, "cannot edit signed entry"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(EntryStatus::Submitted.ensure_editable().is_err());
        assert!(EntryStatus::Signed.ensure_deletable().is_err());
        assert!(EntryStatus::Draft.ensure_deletable().is_ok());
    }

    #[test]
    fn test_reject_outcome_wire_format() {
        let outcome: RejectOutcome = serde_json::from_str("\"NEEDS_REVISION\"").unwrap();
        assert_eq!(outcome.transition(), Transition::RequestRevision);
    }
}
