use api_client::ApiClient;
use api_types::{
    Incident, IncidentsMetadata, PaginatedAlerts, PaginatedIncidents, PaginatedWorkflowExecutions,
};
use fetch::{FetchCache, Resource, ResourceKey};
use serde::{Serialize, de::DeserializeOwned};

use crate::query::{self, IncidentsQuery};

/// Typed read models over the incident API.
///
/// Each method computes a cache key from its parameters, binds a resource to
/// it, and returns the typed handle. While the API client is not ready, or a
/// required identifier is missing, the key resolves to nothing and the
/// returned resource is detached: it reports loading and issues no request.
#[derive(Clone, Debug)]
pub struct IncidentStore {
    api: ApiClient,
    cache: FetchCache,
}

impl IncidentStore {
    /// Create a store over `api`, caching into `cache`.
    pub fn new(api: ApiClient, cache: FetchCache) -> Self {
        Self { api, cache }
    }

    /// The underlying fetch cache.
    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    /// The underlying API client.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Paginated incident listing.
    pub fn incidents(&self, query: &IncidentsQuery) -> Resource<PaginatedIncidents> {
        self.resource_at(self.api.is_ready().then(|| query.to_path()))
    }

    /// A single incident.
    pub fn incident(&self, incident_id: &str) -> Resource<Incident> {
        self.resource_at(self.keyed(incident_id, query::incident_path(incident_id)))
    }

    /// The alerts attached to an incident.
    pub fn incident_alerts(
        &self,
        incident_id: &str,
        limit: u64,
        offset: u64,
    ) -> Resource<PaginatedAlerts> {
        self.resource_at(
            self.keyed(incident_id, query::incident_alerts_path(incident_id, limit, offset)),
        )
    }

    /// Incidents predicted to follow an incident.
    pub fn future_incidents(&self, incident_id: &str) -> Resource<PaginatedIncidents> {
        self.resource_at(self.keyed(incident_id, query::future_incidents_path(incident_id)))
    }

    /// Workflow executions triggered by an incident.
    pub fn workflow_executions(
        &self,
        incident_id: &str,
        limit: u64,
        offset: u64,
    ) -> Resource<PaginatedWorkflowExecutions> {
        self.resource_at(
            self.keyed(incident_id, query::incident_workflows_path(incident_id, limit, offset)),
        )
    }

    /// Aggregate metadata across all incidents.
    pub fn metadata(&self) -> Resource<IncidentsMetadata> {
        self.resource_at(self.api.is_ready().then(|| query::INCIDENTS_META_PATH.to_owned()))
    }

    /// Gate `path` on readiness and a present identifier.
    fn keyed(&self, incident_id: &str, path: String) -> Option<String> {
        (self.api.is_ready() && !incident_id.is_empty()).then_some(path)
    }

    fn resource_at<T>(&self, path: Option<String>) -> Resource<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        let key = path.clone().map(ResourceKey::new);
        let api = self.api.clone();
        let path = path.unwrap_or_default();
        self.cache.resource(key, move || {
            let api = api.clone();
            let path = path.clone();
            async move { api.get_json::<T>(&path).await }
        })
    }
}
