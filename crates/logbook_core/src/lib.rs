pub mod authz;
pub mod catalog;
pub mod context;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod validation;

pub use context::RequestContext;
pub use error::{LogbookError, Result};

use validation::{rules, FieldValidator};

/// The rule set every entry passes through before it is stored.
pub fn standard_validator() -> FieldValidator {
    FieldValidator::new()
        .add_rule(rules::CategoryRule)
        .add_rule(rules::UnknownFieldRule)
        .add_rule(rules::FieldTypeRule)
        .add_rule(rules::MaxLengthRule)
        .add_rule(rules::RequiredFieldRule)
}
