//! Backend client for the manage API.
//!
//! [`Backend`] is the seam between the console and the retrieval platform:
//! the wizard and the command modules only see the trait, so submission
//! flows are testable against an in-memory fake. [`HttpBackend`] is the
//! real JSON-over-HTTP implementation.
//!
//! Every non-2xx response is decoded into [`ApiError::Rejected`] carrying
//! the server's `detail` (or `message`) verbatim; nothing is retried
//! automatically.

use async_trait::async_trait;
use reqwest::multipart;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::ApiConfig;
use crate::models::{
    AccessType, AutoSyncOptions, CcPairStatus, Connector, ConnectorBase, ConnectorIndexingStatus,
    Credential, CredentialBase, SourceType,
};

/// Errors produced by backend interaction.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend rejected the request; `detail` is the server's message.
    #[error("backend rejected request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("could not read file {path}: {message}")]
    FileRead { path: PathBuf, message: String },
}

/// The manage-API surface the console depends on.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn create_connector(&self, connector: &ConnectorBase) -> Result<Connector, ApiError>;

    async fn update_connector(
        &self,
        connector_id: i64,
        connector: &ConnectorBase,
    ) -> Result<Connector, ApiError>;

    /// Create a connector with a backend-side placeholder credential, used
    /// when the source needs no secret or a real credential is linked later.
    async fn create_connector_with_mock_credential(
        &self,
        connector: &ConnectorBase,
    ) -> Result<Connector, ApiError>;

    async fn link_credential(
        &self,
        connector_id: i64,
        credential_id: i64,
        name: &str,
        access_type: AccessType,
        groups: &[i64],
        auto_sync_options: Option<&AutoSyncOptions>,
    ) -> Result<(), ApiError>;

    async fn create_credential(&self, credential: &CredentialBase) -> Result<Credential, ApiError>;

    async fn delete_credential(&self, credential_id: i64) -> Result<(), ApiError>;

    /// Credentials matching a source type; `editable_only` restricts to
    /// those the current user may modify.
    async fn list_credentials(
        &self,
        source: SourceType,
        editable_only: bool,
    ) -> Result<Vec<Credential>, ApiError>;

    /// CC-pair indexing-status snapshots, all-visible or editable-only.
    async fn indexing_statuses(
        &self,
        editable_only: bool,
    ) -> Result<Vec<ConnectorIndexingStatus>, ApiError>;

    /// Prepare an OAuth authorization request; returns the URL the operator
    /// should open. `params` carries provider-specific extras.
    async fn oauth_authorization_url(
        &self,
        source: SourceType,
        return_url: &str,
        params: &[(String, String)],
    ) -> Result<String, ApiError>;

    /// Plain redirect URL for sources whose OAuth flow needs no extra
    /// parameters; `None` when redirect is not supported.
    async fn oauth_redirect_url(&self, source: SourceType) -> Result<Option<String>, ApiError>;

    /// Upload local files; returns the backend-side file locations.
    async fn upload_files(&self, paths: &[PathBuf]) -> Result<Vec<String>, ApiError>;

    async fn set_cc_pair_status(
        &self,
        cc_pair_id: i64,
        status: CcPairStatus,
    ) -> Result<(), ApiError>;

    async fn trigger_reindex(
        &self,
        connector_id: i64,
        credential_id: i64,
        from_beginning: bool,
    ) -> Result<(), ApiError>;

    async fn delete_cc_pair(&self, cc_pair_id: i64) -> Result<(), ApiError>;
}

/// JSON-over-HTTP implementation of [`Backend`].
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &ApiConfig, api_token: Option<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        debug!(%method, path, "backend request");
        let mut builder = self.client.request(method, self.url(path));
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Convert a non-2xx response into `Rejected`, surfacing the server's
    /// `detail` (or `message`) field when the body carries one.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("detail")
                    .or_else(|| v.get("message"))
                    .and_then(|d| d.as_str().map(str::to_string))
            })
            .unwrap_or(body);

        Err(ApiError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }

    /// Check the response, then decode its body. Decode failures carry the
    /// serde error rather than a bare network error.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let body = Self::check(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn create_connector(&self, connector: &ConnectorBase) -> Result<Connector, ApiError> {
        let response = self
            .request(reqwest::Method::POST, "/api/manage/admin/connector")
            .json(connector)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn update_connector(
        &self,
        connector_id: i64,
        connector: &ConnectorBase,
    ) -> Result<Connector, ApiError> {
        let path = format!("/api/manage/admin/connector/{}", connector_id);
        let response = self
            .request(reqwest::Method::PATCH, &path)
            .json(connector)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn create_connector_with_mock_credential(
        &self,
        connector: &ConnectorBase,
    ) -> Result<Connector, ApiError> {
        let response = self
            .request(
                reqwest::Method::POST,
                "/api/manage/admin/connector-with-mock-credential",
            )
            .json(connector)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn link_credential(
        &self,
        connector_id: i64,
        credential_id: i64,
        name: &str,
        access_type: AccessType,
        groups: &[i64],
        auto_sync_options: Option<&AutoSyncOptions>,
    ) -> Result<(), ApiError> {
        let path = format!(
            "/api/manage/connector/{}/credential/{}",
            connector_id, credential_id
        );
        let body = serde_json::json!({
            "name": name,
            "access_type": access_type,
            "groups": groups,
            "auto_sync_options": auto_sync_options,
        });
        let response = self
            .request(reqwest::Method::PUT, &path)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn create_credential(&self, credential: &CredentialBase) -> Result<Credential, ApiError> {
        let response = self
            .request(reqwest::Method::POST, "/api/manage/credential")
            .json(credential)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn delete_credential(&self, credential_id: i64) -> Result<(), ApiError> {
        let path = format!("/api/manage/credential/{}", credential_id);
        let response = self.request(reqwest::Method::DELETE, &path).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_credentials(
        &self,
        source: SourceType,
        editable_only: bool,
    ) -> Result<Vec<Credential>, ApiError> {
        let mut path = format!("/api/manage/admin/similar-credentials/{}", source);
        if editable_only {
            path.push_str("?get_editable=true");
        }
        let response = self.request(reqwest::Method::GET, &path).send().await?;
        Self::decode(response).await
    }

    async fn indexing_statuses(
        &self,
        editable_only: bool,
    ) -> Result<Vec<ConnectorIndexingStatus>, ApiError> {
        let mut path = "/api/manage/admin/connector/indexing-status".to_string();
        if editable_only {
            path.push_str("?get_editable=true");
        }
        let response = self.request(reqwest::Method::GET, &path).send().await?;
        Self::decode(response).await
    }

    async fn oauth_authorization_url(
        &self,
        source: SourceType,
        return_url: &str,
        params: &[(String, String)],
    ) -> Result<String, ApiError> {
        let mut body = serde_json::json!({
            "connector": source,
            "redirect_on_success": return_url,
        });
        if let Some(map) = body.as_object_mut() {
            let extras: serde_json::Map<String, Value> = params
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            if !extras.is_empty() {
                map.insert("additional_kwargs".to_string(), Value::Object(extras));
            }
        }
        let response = self
            .request(
                reqwest::Method::POST,
                "/api/oauth/prepare-authorization-request",
            )
            .json(&body)
            .send()
            .await?;
        let payload: Value = Self::decode(response).await?;
        payload
            .get("url")
            .and_then(|u| u.as_str().map(str::to_string))
            .ok_or(ApiError::Rejected {
                status: 200,
                detail: "authorization response missing url".to_string(),
            })
    }

    async fn oauth_redirect_url(&self, source: SourceType) -> Result<Option<String>, ApiError> {
        let path = format!("/api/connector/oauth/authorize/{}", source);
        let response = self.request(reqwest::Method::GET, &path).send().await?;
        let payload: Value = Self::decode(response).await?;
        Ok(payload
            .get("redirect_url")
            .and_then(|u| u.as_str().map(str::to_string)))
    }

    async fn upload_files(&self, paths: &[PathBuf]) -> Result<Vec<String>, ApiError> {
        let mut form = multipart::Form::new();
        for path in paths {
            let bytes = tokio::fs::read(path).await.map_err(|e| ApiError::FileRead {
                path: path.clone(),
                message: e.to_string(),
            })?;
            let file_name = file_name_of(path);
            form = form.part("files", multipart::Part::bytes(bytes).file_name(file_name));
        }

        let response = self
            .request(reqwest::Method::POST, "/api/manage/admin/connector/file/upload")
            .multipart(form)
            .send()
            .await?;
        let payload: Value = Self::decode(response).await?;
        let file_paths = payload
            .get("file_paths")
            .and_then(|p| p.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Ok(file_paths)
    }

    async fn set_cc_pair_status(
        &self,
        cc_pair_id: i64,
        status: CcPairStatus,
    ) -> Result<(), ApiError> {
        let path = format!("/api/manage/admin/cc-pair/{}/status", cc_pair_id);
        let body = serde_json::json!({ "status": status });
        let response = self
            .request(reqwest::Method::PUT, &path)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn trigger_reindex(
        &self,
        connector_id: i64,
        credential_id: i64,
        from_beginning: bool,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "connector_id": connector_id,
            "credential_ids": [credential_id],
            "from_beginning": from_beginning,
        });
        let response = self
            .request(reqwest::Method::POST, "/api/manage/admin/connector/run-once")
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_cc_pair(&self, cc_pair_id: i64) -> Result<(), ApiError> {
        let path = format!("/api/manage/admin/cc-pair/{}", cc_pair_id);
        let response = self.request(reqwest::Method::DELETE, &path).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}
