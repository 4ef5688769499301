use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::{eq, Backend, BackendError};
use crate::config::ClientConfig;
use crate::identity::{Identity, RoleProvider, RoleRecord, SessionStore};

/// PostgREST-style backend client. Requests carry the project `apikey` and the
/// signed-in user's access token (falling back to the anon key when signed out).
#[derive(Clone)]
pub struct RestBackend {
    base: Url,
    client: reqwest::Client,
    anon_key: String,
    profiles_table: String,
    session: Arc<SessionStore>,
}

impl RestBackend {
    pub fn new(cfg: &ClientConfig, session: Arc<SessionStore>) -> Result<Self, BackendError> {
        let mut raw = cfg.base_url.trim().to_string();
        if !raw.ends_with('/') { raw.push('/'); }
        let base = Url::parse(&raw).map_err(|e| BackendError::Config(format!("invalid base URL '{}': {}", cfg.base_url, e)))?;
        let client = reqwest::Client::builder()
            .timeout(cfg.http_timeout)
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;
        Ok(Self { base, client, anon_key: cfg.anon_key.clone(), profiles_table: cfg.profiles_table.clone(), session })
    }

    fn table_url(&self, table: &str) -> Result<Url, BackendError> {
        self.base
            .join(&format!("rest/v1/{}", urlencoding::encode(table)))
            .map_err(|e| BackendError::Config(e.to_string()))
    }

    fn rpc_url(&self, name: &str) -> Result<Url, BackendError> {
        self.base
            .join(&format!("rest/v1/rpc/{}", urlencoding::encode(name)))
            .map_err(|e| BackendError::Config(e.to_string()))
    }

    fn headers(&self) -> Result<HeaderMap, BackendError> {
        let bearer = self.session.access_token().unwrap_or_else(|| self.anon_key.clone());
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(&self.anon_key).map_err(|e| BackendError::Config(e.to_string()))?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", bearer)).map_err(|e| BackendError::Config(e.to_string()))?,
        );
        Ok(headers)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, BackendError> {
        let resp = req.headers(self.headers()?).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status { status: status.as_u16(), body });
        }
        Ok(resp)
    }

    async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, BackendError> {
        let text = resp.text().await?;
        // rpc functions returning void answer with an empty body
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(text)?)
    }
}

#[async_trait]
impl RoleProvider for RestBackend {
    async fn fetch_role(&self, identity: &Identity) -> Result<Option<RoleRecord>, BackendError> {
        let url = self.table_url(&self.profiles_table)?;
        let params = [("select".to_string(), "role".to_string()), eq("id", identity), ("limit".to_string(), "1".to_string())];
        debug!(user = %identity, table = %self.profiles_table, "rest.fetch_role");
        let resp = self.send(self.client.get(url).query(&params)).await?;
        let rows: Vec<RoleRecord> = Self::read_json(resp).await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn select(&self, table: &str, params: &[(String, String)]) -> Result<Vec<Value>, BackendError> {
        let url = self.table_url(table)?;
        debug!(table, params = params.len(), "rest.select");
        let resp = self.send(self.client.get(url).query(params)).await?;
        Self::read_json(resp).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, BackendError> {
        let url = self.table_url(table)?;
        debug!(table, "rest.insert");
        let req = self.client.post(url).header("Prefer", "return=representation").json(&row);
        let rows: Vec<Value> = Self::read_json(self.send(req).await?).await?;
        rows.into_iter().next().ok_or_else(|| BackendError::Decode(format!("insert into {} returned no row", table)))
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, BackendError> {
        let url = self.table_url(table)?;
        debug!(table, id, "rest.update");
        let req = self
            .client
            .patch(url)
            .query(&[eq("id", id)])
            .header("Prefer", "return=representation")
            .json(&patch);
        let rows: Vec<Value> = Self::read_json(self.send(req).await?).await?;
        rows.into_iter().next().ok_or_else(|| BackendError::NotFound(format!("{} {}", table, id)))
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), BackendError> {
        let url = self.table_url(table)?;
        debug!(table, id, "rest.delete");
        self.send(self.client.delete(url).query(&[eq("id", id)])).await?;
        Ok(())
    }

    async fn rpc(&self, name: &str, args: Value) -> Result<Value, BackendError> {
        let url = self.rpc_url(name)?;
        debug!(name, "rest.rpc");
        let resp = self.send(self.client.post(url).json(&args)).await?;
        Self::read_json(resp).await
    }
}
