use serde::{Deserialize, Serialize};

use crate::catalog::LogKind;
use crate::error::{LogbookError, Result};
use crate::models::EntryFields;

pub mod rules;

// The structure of a failure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,   // e.g. "diagnosis", or "category"
    pub message: String, // "Diagnosis is required"
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Drafts may be incomplete; submissions must be complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Draft,
    Submission,
}

/// What a rule looks at: one entry's category and fields, in context.
#[derive(Debug, Clone, Copy)]
pub struct EntryCandidate<'a> {
    pub kind: LogKind,
    pub category: &'a str,
    pub fields: &'a EntryFields,
    pub stage: Stage,
}

// The contract every rule must fulfill
pub trait FieldRule: Send + Sync {
    fn check(&self, candidate: &EntryCandidate<'_>) -> Vec<FieldIssue>;
    fn rule_id(&self) -> &'static str;
}

// The engine that holds the registry of all rules
#[derive(Default)]
pub struct FieldValidator {
    rules: Vec<Box<dyn FieldRule>>,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add_rule<R: FieldRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn run(&self, candidate: &EntryCandidate<'_>) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        for rule in &self.rules {
            let mut rule_issues = rule.check(candidate);
            issues.append(&mut rule_issues);
        }
        issues
    }

    /// Like [`run`](Self::run) but folds any issue into `LogbookError::Validation`.
    pub fn validate(&self, candidate: &EntryCandidate<'_>) -> Result<()> {
        let issues = self.run(candidate);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(LogbookError::Validation(issues))
        }
    }
}
