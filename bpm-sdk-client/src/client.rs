//! The client facade — the sole entry point for engine access.

use crate::config::ClientConfig;
use crate::error::EngineError;
use crate::http::HttpClient;
use crate::resources::{
    CaseInstances, Deployments, Filters, History, ProcessDefinitions, ProcessInstances, Tasks,
    Tenants,
};
use std::sync::Arc;

/// One configured connection to the engine, shared by every resource
/// accessor. Cloning is cheap; all clones talk through the same
/// [`HttpClient`].
#[derive(Clone)]
pub struct EngineClient {
    http: Arc<HttpClient>,
}

impl EngineClient {
    pub fn new(config: ClientConfig) -> Result<Self, EngineError> {
        Ok(Self {
            http: Arc::new(HttpClient::new(config)?),
        })
    }

    /// Shortcut for an unauthenticated client against a REST root.
    pub fn from_base_url(base_url: &str) -> Result<Self, EngineError> {
        Self::new(ClientConfig::builder(base_url).build()?)
    }

    pub fn http(&self) -> Arc<HttpClient> {
        Arc::clone(&self.http)
    }

    pub fn tasks(&self) -> Tasks {
        Tasks::new(self.http())
    }

    pub fn process_definitions(&self) -> ProcessDefinitions {
        ProcessDefinitions::new(self.http())
    }

    pub fn process_instances(&self) -> ProcessInstances {
        ProcessInstances::new(self.http())
    }

    pub fn case_instances(&self) -> CaseInstances {
        CaseInstances::new(self.http())
    }

    pub fn history(&self) -> History {
        History::new(self.http())
    }

    pub fn filters(&self) -> Filters {
        Filters::new(self.http())
    }

    pub fn tenants(&self) -> Tenants {
        Tenants::new(self.http())
    }

    pub fn deployments(&self) -> Deployments {
        Deployments::new(self.http())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_connection() {
        let client = EngineClient::from_base_url("http://localhost:8080/engine-rest").unwrap();
        let other = client.clone();
        assert!(Arc::ptr_eq(&client.http(), &other.http()));
    }

    #[test]
    fn accessors_build_against_the_same_root() {
        let client = EngineClient::from_base_url("http://host/rest").unwrap();
        let url = client.http().url_for(&["task"]).unwrap();
        assert_eq!(url.as_str(), "http://host/rest/task");
    }
}
