//! One module per engine REST resource. Every public method maps to exactly
//! one endpoint; mandatory ids are checked before any request is issued.

pub mod case_instance;
pub mod deployment;
pub mod filter;
pub mod history;
pub mod process_definition;
pub mod process_instance;
pub mod task;
pub mod tenant;

pub use case_instance::CaseInstances;
pub use deployment::Deployments;
pub use filter::Filters;
pub use history::History;
pub use process_definition::ProcessDefinitions;
pub use process_instance::ProcessInstances;
pub use task::Tasks;
pub use tenant::Tenants;

use crate::error::EngineError;

pub(crate) fn to_query(params: &[(&str, &str)]) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

pub(crate) fn require(what: &str, value: &str) -> Result<(), EngineError> {
    if value.is_empty() {
        return Err(EngineError::InvalidRequest(format!("{what} is mandatory")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_rejects_empty() {
        let err = require("task id", "").unwrap_err();
        assert_eq!(err.to_string(), "invalid request: task id is mandatory");
        assert!(require("task id", "t1").is_ok());
    }
}
