//! Credential management commands.
//!
//! Listing goes through the fetch cache so that a wizard run and a
//! follow-up list within the refresh interval reuse one round trip;
//! every mutation invalidates both cached variants for its source.

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

use crate::api::Backend;
use crate::cache::{CacheEntry, CacheKey, FetchCache};
use crate::models::{Credential, CredentialBase, SourceType};
use crate::schema;

pub async fn fetch_credentials_cached(
    backend: &dyn Backend,
    cache: &mut FetchCache,
    source: SourceType,
    editable_only: bool,
) -> Result<Vec<Credential>> {
    let key = CacheKey::CredentialsFor {
        source,
        editable: editable_only,
    };
    if let Some(CacheEntry::Credentials(credentials)) = cache.get(&key) {
        return Ok(credentials.clone());
    }
    let credentials = backend.list_credentials(source, editable_only).await?;
    cache.insert(key, CacheEntry::Credentials(credentials.clone()));
    Ok(credentials)
}

/// List credentials for a source. Both listings are fetched; rows the
/// caller may edit are marked with `*`.
pub async fn run_list(
    backend: &dyn Backend,
    cache: &mut FetchCache,
    source: SourceType,
    editable_only: bool,
) -> Result<()> {
    let all = fetch_credentials_cached(backend, cache, source, false).await?;
    let editable = fetch_credentials_cached(backend, cache, source, true).await?;
    let editable_ids: Vec<i64> = editable.iter().map(|c| c.id).collect();

    let rows: Vec<&Credential> = if editable_only {
        all.iter().filter(|c| editable_ids.contains(&c.id)).collect()
    } else {
        all.iter().collect()
    };
    if rows.is_empty() {
        println!("no credentials for source '{}'", source);
        return Ok(());
    }
    println!("  {:<6} {:<30} {:<8} {}", "ID", "NAME", "PUBLIC", "CREATED");
    for credential in rows {
        let marker = if editable_ids.contains(&credential.id) {
            "*"
        } else {
            " "
        };
        println!(
            " {}{:<6} {:<30} {:<8} {}",
            marker,
            credential.id,
            credential.name.as_deref().unwrap_or("(unnamed)"),
            if credential.admin_public { "yes" } else { "no" },
            credential
                .time_created
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    Ok(())
}

/// Create a credential from `key=value` pairs against the source's
/// template. Blank-valued fields are dropped before the payload is built.
pub async fn run_create(
    backend: &dyn Backend,
    cache: &mut FetchCache,
    source: SourceType,
    name: String,
    fields: Vec<(String, String)>,
    admin_public: bool,
    groups: Vec<i64>,
) -> Result<()> {
    let Some(template) = schema::credential_template(source) else {
        bail!("source '{}' does not take credentials", source);
    };

    let mut credential_json: Map<String, Value> = Map::new();
    for (key, value) in fields {
        if !template.iter().any(|f| f.name == key) {
            bail!("unknown credential field '{}' for source '{}'", key, source);
        }
        if schema::is_blank(&Value::String(value.clone())) {
            continue;
        }
        credential_json.insert(key, Value::String(value));
    }

    for field in &template {
        if field.required && !credential_json.contains_key(field.name) {
            bail!("credential field '{}' is required", field.name);
        }
    }

    let payload = CredentialBase {
        name,
        source,
        credential_json,
        admin_public,
        curator_public: false,
        groups,
    };
    let created = backend
        .create_credential(&payload)
        .await
        .context("credential create was rejected")?;
    cache.invalidate_credentials(source);
    println!("created credential {} for '{}'", created.id, source);
    Ok(())
}

pub async fn run_delete(
    backend: &dyn Backend,
    cache: &mut FetchCache,
    source: SourceType,
    credential_id: i64,
) -> Result<()> {
    backend
        .delete_credential(credential_id)
        .await
        .with_context(|| format!("could not delete credential {}", credential_id))?;
    cache.invalidate_credentials(source);
    println!("deleted credential {}", credential_id);
    Ok(())
}

/// Print the URL to authorize a source. Prefers the no-parameter redirect
/// URL when the provider exposes one; otherwise asks the backend to
/// prepare a full authorization request.
pub async fn run_oauth(
    backend: &dyn Backend,
    source: SourceType,
    return_url: &str,
    params: Vec<(String, String)>,
) -> Result<()> {
    if !schema::oauth_supported(source) {
        bail!("source '{}' does not support OAuth authorization", source);
    }
    // The plain redirect only works when no extra parameters are needed.
    if params.is_empty() {
        if let Some(url) = backend.oauth_redirect_url(source).await? {
            println!("{}", url);
            return Ok(());
        }
    }
    let url = backend
        .oauth_authorization_url(source, return_url, &params)
        .await?;
    println!("{}", url);
    println!("open the URL above, authorize, then re-run your command");
    Ok(())
}
