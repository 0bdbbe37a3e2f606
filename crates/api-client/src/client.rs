use std::{sync::Arc, time::Duration};

use api_types::Session;
use eyre::Result;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::info;
use url::Url;

use crate::retry::retry_op;

/// Client for the incident management REST API.
///
/// The client is not ready until a session has been established; resource
/// layers consult [`ApiClient::is_ready`] before issuing any request.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: HttpClient,
    base_url: Url,
    api_key: String,
    session: Arc<watch::Sender<Option<Session>>>,
}

impl ApiClient {
    /// Create a new API client. No network traffic happens until
    /// [`ApiClient::establish_session`] is called.
    pub fn new(base_url: Url, api_key: String) -> Self {
        Self {
            http: HttpClient::new(),
            base_url,
            api_key,
            session: Arc::new(watch::channel(None).0),
        }
    }

    /// Create a new API client with a request timeout.
    pub fn with_timeout(base_url: Url, api_key: String, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url, api_key, session: Arc::new(watch::channel(None).0) })
    }

    /// Authenticate the request.
    fn auth(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        rb.bearer_auth(&self.api_key)
    }

    /// Build a full endpoint URL from a path-and-query suffix.
    fn endpoint(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path_and_query)
    }

    /// Perform the session handshake, marking the client ready on success.
    pub async fn establish_session(&self) -> Result<Session> {
        let session: Session = self.get_json("/auth/session").await?;
        info!(user = %session.user, role = ?session.role, "Established API session");
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    /// Whether a session is held and requests may be issued.
    pub fn is_ready(&self) -> bool {
        self.session.borrow().is_some()
    }

    /// The current session, if one is held.
    pub fn session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    /// Subscribe to readiness transitions.
    pub fn subscribe_ready(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }

    /// Issue an authenticated GET and deserialize the JSON response.
    ///
    /// Transient transport failures (timeouts, connect errors, 5xx, 429) are
    /// retried with exponential backoff before the error is returned.
    pub async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let url = self.endpoint(path_and_query);
        retry_op(|| async {
            let resp = self.auth(self.http.get(url.as_str())).send().await?.error_for_status()?;
            Ok(resp.json::<T>().await?)
        })
        .await
    }
}
