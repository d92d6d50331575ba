//! Connector/credential pair lifecycle commands.
//!
//! Pausing, resuming, re-indexing, and deleting operate on the pair the
//! backend schedules, not on the connector alone. Each mutation
//! invalidates both cached status listings so the next `status` run
//! reflects it immediately instead of waiting out the refresh interval.

use anyhow::{bail, Context, Result};

use crate::api::Backend;
use crate::cache::{CacheKey, FetchCache};
use crate::models::{CcPairStatus, ConnectorIndexingStatus};
use crate::status::fetch_statuses_cached;
use crate::wizard::freq_to_secs;

fn invalidate_statuses(cache: &mut FetchCache) {
    cache.invalidate(&CacheKey::IndexingStatus { editable: false });
    cache.invalidate(&CacheKey::IndexingStatus { editable: true });
}

/// Look up a pair in the editable listing; mutations require edit rights.
async fn find_editable_pair(
    backend: &dyn Backend,
    cache: &mut FetchCache,
    cc_pair_id: i64,
) -> Result<ConnectorIndexingStatus> {
    let editable = fetch_statuses_cached(backend, cache, true).await?;
    editable
        .into_iter()
        .find(|s| s.cc_pair_id == cc_pair_id)
        .ok_or_else(|| anyhow::anyhow!("no editable connector pair with id {}", cc_pair_id))
}

pub async fn run_pause(
    backend: &dyn Backend,
    cache: &mut FetchCache,
    cc_pair_id: i64,
) -> Result<()> {
    let pair = find_editable_pair(backend, cache, cc_pair_id).await?;
    if pair.cc_pair_status == CcPairStatus::Deleting {
        bail!("pair {} is being deleted and cannot be paused", cc_pair_id);
    }
    backend
        .set_cc_pair_status(cc_pair_id, CcPairStatus::Paused)
        .await
        .with_context(|| format!("could not pause pair {}", cc_pair_id))?;
    invalidate_statuses(cache);
    println!("paused '{}' ({})", pair.display_name(), cc_pair_id);
    Ok(())
}

pub async fn run_resume(
    backend: &dyn Backend,
    cache: &mut FetchCache,
    cc_pair_id: i64,
) -> Result<()> {
    let pair = find_editable_pair(backend, cache, cc_pair_id).await?;
    backend
        .set_cc_pair_status(cc_pair_id, CcPairStatus::Active)
        .await
        .with_context(|| format!("could not resume pair {}", cc_pair_id))?;
    invalidate_statuses(cache);
    println!("resumed '{}' ({})", pair.display_name(), cc_pair_id);
    Ok(())
}

/// Kick off a new index attempt, optionally from the beginning of the
/// source rather than from the last successful poll window.
pub async fn run_reindex(
    backend: &dyn Backend,
    cache: &mut FetchCache,
    cc_pair_id: i64,
    from_beginning: bool,
) -> Result<()> {
    let pair = find_editable_pair(backend, cache, cc_pair_id).await?;
    let credential_id = match &pair.credential {
        Some(credential) => credential.id,
        None => bail!(
            "pair {} has no credential attached; cannot trigger indexing",
            cc_pair_id
        ),
    };
    backend
        .trigger_reindex(pair.connector.id, credential_id, from_beginning)
        .await
        .with_context(|| format!("could not trigger indexing for pair {}", cc_pair_id))?;
    invalidate_statuses(cache);
    println!(
        "indexing queued for '{}' ({}){}",
        pair.display_name(),
        cc_pair_id,
        if from_beginning {
            ", from the beginning"
        } else {
            ""
        }
    );
    Ok(())
}

/// Change a pair's schedule after creation. Rebuilds the connector
/// payload from the current snapshot with the new wire-unit values and
/// PATCHes it; the same explicit-zero-means-never rule as `dock add`.
pub async fn run_schedule(
    backend: &dyn Backend,
    cache: &mut FetchCache,
    cc_pair_id: i64,
    refresh_minutes: Option<u64>,
    prune_days: Option<u64>,
) -> Result<()> {
    if refresh_minutes.is_none() && prune_days.is_none() {
        bail!("nothing to change; pass --refresh-minutes and/or --prune-days");
    }
    let pair = find_editable_pair(backend, cache, cc_pair_id).await?;

    let mut base = pair.connector.base.clone();
    if let Some(minutes) = refresh_minutes {
        let secs = freq_to_secs(minutes, 60)
            .with_context(|| format!("refresh frequency out of range: {} minutes", minutes))?;
        base.refresh_freq = (secs > 0).then_some(secs);
    }
    if let Some(days) = prune_days {
        let secs = freq_to_secs(days, 60 * 60 * 24)
            .with_context(|| format!("prune frequency out of range: {} days", days))?;
        base.prune_freq = (secs > 0).then_some(secs);
    }

    backend
        .update_connector(pair.connector.id, &base)
        .await
        .with_context(|| format!("could not update schedule for pair {}", cc_pair_id))?;
    invalidate_statuses(cache);
    println!(
        "schedule updated for '{}' ({}): refresh {}, prune {}",
        pair.display_name(),
        cc_pair_id,
        describe_freq(base.refresh_freq),
        describe_freq(base.prune_freq)
    );
    Ok(())
}

fn describe_freq(freq: Option<i64>) -> String {
    match freq {
        None => "never".to_string(),
        Some(secs) => format!("every {}s", secs),
    }
}

pub async fn run_delete(
    backend: &dyn Backend,
    cache: &mut FetchCache,
    cc_pair_id: i64,
) -> Result<()> {
    let pair = find_editable_pair(backend, cache, cc_pair_id).await?;
    if pair.cc_pair_status == CcPairStatus::Active {
        bail!(
            "pair {} is active; pause it before deleting",
            cc_pair_id
        );
    }
    backend
        .delete_cc_pair(cc_pair_id)
        .await
        .with_context(|| format!("could not delete pair {}", cc_pair_id))?;
    invalidate_statuses(cache);
    println!("deletion started for '{}' ({})", pair.display_name(), cc_pair_id);
    Ok(())
}
