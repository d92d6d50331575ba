//! Upload-backed submission paths.
//!
//! File and Google Sites connectors are configured from files the operator
//! pushes to the backend first; the connector payload then references the
//! server-side paths the upload returned, not the local ones.

use serde_json::{json, Map, Value};
use std::path::PathBuf;

use crate::api::Backend;
use crate::models::{Connector, ConnectorBase, InputType, SourceType};
use crate::schema::FieldError;
use crate::wizard::{ConnectorSchedule, SubmitError, WizardSession};

/// Pull local paths out of a form value. Accepts an array of strings or a
/// single string.
fn local_paths(value: Option<&Value>, field: &str) -> Result<Vec<PathBuf>, SubmitError> {
    let entries: Vec<PathBuf> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![PathBuf::from(s)],
        _ => Vec::new(),
    };
    if entries.is_empty() {
        return Err(SubmitError::Validation(vec![FieldError {
            field: field.to_string(),
            message: format!("at least one path is required in '{}'", field),
        }]));
    }
    Ok(entries)
}

/// Upload the selected files, then create a one-shot file connector whose
/// config points at the stored copies. File connectors never refresh.
pub async fn submit_files(
    backend: &dyn Backend,
    session: &WizardSession,
    values: &Map<String, Value>,
) -> Result<Connector, SubmitError> {
    let paths = local_paths(values.get("file_locations"), "file_locations")?;
    let stored = backend.upload_files(&paths).await?;

    let mut config = Map::new();
    config.insert("file_locations".to_string(), json!(stored));

    let payload = ConnectorBase {
        name: session.name.clone(),
        source: SourceType::File,
        input_type: InputType::LoadState,
        connector_specific_config: config,
        refresh_freq: None,
        prune_freq: None,
        indexing_start: None,
        access_type: session.access_type,
        groups: session.groups.clone(),
    };
    Ok(backend.create_connector_with_mock_credential(&payload).await?)
}

/// Upload the site export zip, then create a Google Sites connector that
/// combines the stored zip with the site's base URL.
pub async fn submit_google_site(
    backend: &dyn Backend,
    session: &WizardSession,
    values: &Map<String, Value>,
    schedule: &ConnectorSchedule,
) -> Result<Connector, SubmitError> {
    let paths = local_paths(values.get("zip_path"), "zip_path")?;
    let stored = backend.upload_files(&paths).await?;
    let zip_path = stored.into_iter().next().unwrap_or_default();

    let base_url = values
        .get("base_url")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut config = Map::new();
    config.insert("zip_path".to_string(), json!(zip_path));
    config.insert("base_url".to_string(), json!(base_url));

    let payload = ConnectorBase {
        name: session.name.clone(),
        source: SourceType::GoogleSites,
        input_type: InputType::LoadState,
        connector_specific_config: config,
        refresh_freq: schedule.refresh_freq,
        prune_freq: schedule.prune_freq,
        indexing_start: schedule.indexing_start,
        access_type: session.access_type,
        groups: session.groups.clone(),
    };
    Ok(backend.create_connector_with_mock_credential(&payload).await?)
}
