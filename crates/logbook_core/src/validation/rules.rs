use serde_json::Value;
use time::macros::format_description;
use time::Date;

use crate::catalog::FieldKind;
use crate::validation::{EntryCandidate, FieldIssue, FieldRule, Stage};

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

// =========================================================================
// RULE: category
// "Category must be one of the kind's configured categories"
// =========================================================================
pub struct CategoryRule;

impl FieldRule for CategoryRule {
    fn rule_id(&self) -> &'static str { "category" }

    fn check(&self, candidate: &EntryCandidate<'_>) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        if !candidate.kind.has_category(candidate.category) {
            issues.push(FieldIssue::new(
                "category",
                format!(
                    "'{}' is not a {} category",
                    candidate.category,
                    candidate.kind.label()
                ),
            ));
        }
        issues
    }
}

// =========================================================================
// RULE: unknown-field
// "Only fields declared for the kind may be stored"
// =========================================================================
pub struct UnknownFieldRule;

impl FieldRule for UnknownFieldRule {
    fn rule_id(&self) -> &'static str { "unknown-field" }

    fn check(&self, candidate: &EntryCandidate<'_>) -> Vec<FieldIssue> {
        candidate
            .fields
            .keys()
            .filter(|name| candidate.kind.field(name).is_none())
            .map(|name| FieldIssue::new(name.as_str(), "Unknown field"))
            .collect()
    }
}

// =========================================================================
// RULE: field-type
// "Values must match the declared field kind"
// =========================================================================
pub struct FieldTypeRule;

impl FieldRule for FieldTypeRule {
    fn rule_id(&self) -> &'static str { "field-type" }

    fn check(&self, candidate: &EntryCandidate<'_>) -> Vec<FieldIssue> {
        let mut issues = Vec::new();

        for spec in candidate.kind.fields() {
            let Some(value) = candidate.fields.get(spec.name) else { continue };
            if value.is_null() {
                continue;
            }

            let problem = match spec.kind {
                FieldKind::Text | FieldKind::LongText => {
                    (!value.is_string()).then(|| "must be text".to_string())
                }
                FieldKind::Number => (!value.is_number()).then(|| "must be a number".to_string()),
                FieldKind::Date => match value.as_str() {
                    Some(s) if s.trim().is_empty() => None,
                    Some(s) => Date::parse(s, format_description!("[year]-[month]-[day]"))
                        .err()
                        .map(|_| format!("'{}' is not a date (YYYY-MM-DD)", s)),
                    None => Some("must be a date string (YYYY-MM-DD)".to_string()),
                },
                FieldKind::Choice(options) => match value.as_str() {
                    Some(s) if s.trim().is_empty() || options.contains(&s) => None,
                    _ => Some(format!("must be one of: {}", options.join(", "))),
                },
            };

            if let Some(message) = problem {
                issues.push(FieldIssue::new(spec.name, format!("{} {}", spec.label, message)));
            }
        }
        issues
    }
}

// =========================================================================
// RULE: max-length
// "Text fields are bounded (500 chars; narrative 10 000 chars)"
// =========================================================================
pub struct MaxLengthRule;

impl FieldRule for MaxLengthRule {
    fn rule_id(&self) -> &'static str { "max-length" }

    fn check(&self, candidate: &EntryCandidate<'_>) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        for spec in candidate.kind.fields() {
            let (Some(limit), Some(text)) = (
                spec.kind.max_len(),
                candidate.fields.get(spec.name).and_then(Value::as_str),
            ) else {
                continue;
            };
            let len = text.chars().count();
            if len > limit {
                issues.push(FieldIssue::new(
                    spec.name,
                    format!("{} is {} characters long (limit {})", spec.label, len, limit),
                ));
            }
        }
        issues
    }
}

// =========================================================================
// RULE: required
// "Required fields must be populated before submission"
// =========================================================================
pub struct RequiredFieldRule;

impl FieldRule for RequiredFieldRule {
    fn rule_id(&self) -> &'static str { "required" }

    fn check(&self, candidate: &EntryCandidate<'_>) -> Vec<FieldIssue> {
        if candidate.stage == Stage::Draft {
            return Vec::new();
        }

        candidate
            .kind
            .fields()
            .iter()
            .filter(|spec| spec.required)
            .filter(|spec| candidate.fields.get(spec.name).map_or(true, is_blank))
            .map(|spec| FieldIssue::new(spec.name, format!("{} is required", spec.label)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LogKind;
    use crate::standard_validator;
    use serde_json::json;

    fn fields(value: Value) -> crate::models::EntryFields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_draft_may_be_incomplete() {
        let f = fields(json!({ "patient_id": "MRN-001" }));
        let candidate = EntryCandidate {
            kind: LogKind::CasePresentation,
            category: "chest",
            fields: &f,
            stage: Stage::Draft,
        };
        assert!(standard_validator().run(&candidate).is_empty());
    }

    #[test]
    fn test_submission_reports_every_missing_field() {
        let f = fields(json!({ "patient_id": "MRN-001", "diagnosis": "   " }));
        let candidate = EntryCandidate {
            kind: LogKind::CasePresentation,
            category: "chest",
            fields: &f,
            stage: Stage::Submission,
        };
        let issues = standard_validator().run(&candidate);
        let missing: Vec<_> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(missing, vec!["date", "findings", "diagnosis"]);
    }

    #[test]
    fn test_types_choices_and_unknown_fields() {
        let f = fields(json!({
            "date": "2024-13-40",
            "patient_id": 42,
            "participation": "supervised",
            "bogus": "x"
        }));
        let candidate = EntryCandidate {
            kind: LogKind::Procedure,
            category: "pleural-tap",
            fields: &f,
            stage: Stage::Draft,
        };
        let issues = standard_validator().run(&candidate);
        let flagged: Vec<_> = issues.iter().map(|i| i.field.as_str()).collect();
        assert!(flagged.contains(&"bogus"));
        assert!(flagged.contains(&"date"));
        assert!(flagged.contains(&"patient_id"));
        assert!(flagged.contains(&"participation"));
    }

    #[test]
    fn test_category_must_belong_to_kind() {
        let f = fields(json!({}));
        let candidate = EntryCandidate {
            kind: LogKind::Imaging,
            category: "pleural-tap",
            fields: &f,
            stage: Stage::Draft,
        };
        let issues = CategoryRule.check(&candidate);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "category");
    }

    #[test]
    fn test_long_text_limit() {
        let f = fields(json!({ "study": "x".repeat(501) }));
        let candidate = EntryCandidate {
            kind: LogKind::Imaging,
            category: "ct",
            fields: &f,
            stage: Stage::Draft,
        };
        let issues = MaxLengthRule.check(&candidate);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("limit 500"));
    }
}
