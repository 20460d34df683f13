pub mod assign;
pub mod batch;
pub mod catalog;
pub mod export;
pub mod rebuild;
pub mod token;
pub mod validate;

use logbook_core::RequestContext;

/// Identity the CLI acts under when it calls guarded service operations.
pub fn operator() -> RequestContext {
    RequestContext::hod("cli-operator")
}
