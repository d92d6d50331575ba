//! Indexing status aggregation.
//!
//! Takes the two connector/credential pair listings the backend exposes
//! (everything visible, and the subset the caller may edit), merges them
//! into per-source groups, summarizes each group, and applies the ordered
//! filter pipeline. [`aggregate`] is a pure function of its inputs; the
//! command layer fetches, aggregates, then renders.
//!
//! Search is deliberately separate from filtering: filters shape which
//! groups exist, search only decides which rows of an existing view get
//! printed.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::str::FromStr;

use crate::api::Backend;
use crate::cache::{CacheEntry, CacheKey, FetchCache};
use crate::config::Config;
use crate::models::{
    AccessType, CcPairStatus, ConnectorIndexingStatus, IndexAttemptStatus, SourceType,
};
use crate::prefs::TogglePrefs;

/// Comparison operator for the docs-count filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Gt,
    Lt,
    Eq,
}

impl FromStr for CmpOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" | "gt" => Ok(Self::Gt),
            "<" | "lt" => Ok(Self::Lt),
            "=" | "eq" => Ok(Self::Eq),
            other => Err(format!("unknown comparison operator '{}'", other)),
        }
    }
}

/// Numeric filter on documents indexed. An unset operator disables the
/// stage; an operator with no value passes everything through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocsCountFilter {
    pub operator: Option<CmpOp>,
    pub value: Option<i64>,
}

impl DocsCountFilter {
    fn passes(&self, docs_indexed: i64) -> bool {
        let Some(op) = self.operator else {
            return true;
        };
        let Some(value) = self.value else {
            return true;
        };
        match op {
            CmpOp::Gt => docs_indexed > value,
            CmpOp::Lt => docs_indexed < value,
            CmpOp::Eq => docs_indexed == value,
        }
    }
}

/// The three filter dimensions, applied in declaration order. Empty sets
/// skip their stage entirely.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub access_types: Vec<AccessType>,
    pub last_statuses: Vec<IndexAttemptStatus>,
    pub docs_count: DocsCountFilter,
}

impl FilterOptions {
    pub fn any_active(&self) -> bool {
        !self.access_types.is_empty()
            || !self.last_statuses.is_empty()
            || self.docs_count.operator.is_some()
    }

    fn passes(&self, status: &ConnectorIndexingStatus) -> bool {
        if !self.access_types.is_empty() && !self.access_types.contains(&status.access_type) {
            return false;
        }
        if !self.last_statuses.is_empty() {
            match status.last_finished_status {
                Some(finished) if self.last_statuses.contains(&finished) => {}
                _ => return false,
            }
        }
        self.docs_count.passes(status.docs_indexed)
    }
}

/// Per-source rollup of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSummary {
    pub count: usize,
    pub active: usize,
    pub public: usize,
    pub total_docs_indexed: i64,
    pub errors: usize,
}

/// The derived view the status command renders from.
#[derive(Debug)]
pub struct StatusView {
    /// All groups, sources in lexicographic order, editable rows first.
    pub grouped: BTreeMap<SourceType, Vec<ConnectorIndexingStatus>>,
    pub summaries: BTreeMap<SourceType, SourceSummary>,
    /// Groups that survived the filters; absent when a group emptied out.
    pub filtered: BTreeMap<SourceType, Vec<ConnectorIndexingStatus>>,
    pub editable_ids: BTreeSet<i64>,
    filters_active: bool,
}

impl StatusView {
    /// Which sources the renderer should show: the filtered keys when any
    /// filter is active, otherwise every group.
    pub fn display_sources(&self) -> Vec<SourceType> {
        if self.filters_active {
            self.filtered.keys().copied().collect()
        } else {
            self.grouped.keys().copied().collect()
        }
    }

    /// The rows to render for one source.
    pub fn rows(&self, source: SourceType) -> &[ConnectorIndexingStatus] {
        let group = if self.filters_active {
            self.filtered.get(&source)
        } else {
            self.grouped.get(&source)
        };
        group.map(Vec::as_slice).unwrap_or_default()
    }
}

fn summarize(statuses: &[ConnectorIndexingStatus]) -> SourceSummary {
    SourceSummary {
        count: statuses.len(),
        active: statuses
            .iter()
            .filter(|s| s.cc_pair_status == CcPairStatus::Active)
            .count(),
        public: statuses
            .iter()
            .filter(|s| s.access_type == AccessType::Public)
            .count(),
        total_docs_indexed: statuses.iter().map(|s| s.docs_indexed).sum(),
        errors: statuses
            .iter()
            .filter(|s| s.last_finished_status == Some(IndexAttemptStatus::Failed))
            .count(),
    }
}

/// Build the full view from the two listings and the filter state.
///
/// Editable pairs are inserted first and win the dedup: a cc_pair_id seen
/// in both listings keeps its editable entry only.
pub fn aggregate(
    all: &[ConnectorIndexingStatus],
    editable: &[ConnectorIndexingStatus],
    filters: &FilterOptions,
) -> StatusView {
    let mut grouped: BTreeMap<SourceType, Vec<ConnectorIndexingStatus>> = BTreeMap::new();
    let mut seen: HashSet<i64> = HashSet::new();
    let editable_ids: BTreeSet<i64> = editable.iter().map(|s| s.cc_pair_id).collect();

    for status in editable.iter().chain(all.iter()) {
        if !seen.insert(status.cc_pair_id) {
            continue;
        }
        grouped
            .entry(status.connector.base.source)
            .or_default()
            .push(status.clone());
    }

    let summaries = grouped
        .iter()
        .map(|(source, statuses)| (*source, summarize(statuses)))
        .collect();

    let mut filtered: BTreeMap<SourceType, Vec<ConnectorIndexingStatus>> = BTreeMap::new();
    for (source, statuses) in &grouped {
        let surviving: Vec<_> = statuses
            .iter()
            .filter(|s| filters.passes(s))
            .cloned()
            .collect();
        if !surviving.is_empty() {
            filtered.insert(*source, surviving);
        }
    }

    StatusView {
        grouped,
        summaries,
        filtered,
        editable_ids,
        filters_active: filters.any_active(),
    }
}

/// Search decision for one source group, made at render time.
///
/// `None` hides the group. A source-name match shows every row; otherwise
/// only the connectors whose names match are shown.
pub fn search_rows<'a>(
    source: SourceType,
    rows: &'a [ConnectorIndexingStatus],
    query: &str,
) -> Option<Vec<&'a ConnectorIndexingStatus>> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Some(rows.iter().collect());
    }
    let source_matches = source.display_name().to_lowercase().contains(&query)
        || source.as_str().contains(&query);
    if source_matches {
        return Some(rows.iter().collect());
    }
    let matching: Vec<_> = rows
        .iter()
        .filter(|s| s.display_name().to_lowercase().contains(&query))
        .collect();
    if matching.is_empty() {
        None
    } else {
        Some(matching)
    }
}

fn status_glyph(status: CcPairStatus) -> &'static str {
    match status {
        CcPairStatus::Active => "active",
        CcPairStatus::Paused => "paused",
        CcPairStatus::Deleting => "deleting",
        CcPairStatus::Invalid => "invalid",
    }
}

fn last_status_label(status: Option<IndexAttemptStatus>) -> &'static str {
    match status {
        None => "-",
        Some(IndexAttemptStatus::NotStarted) => "not started",
        Some(IndexAttemptStatus::InProgress) => "in progress",
        Some(IndexAttemptStatus::Success) => "success",
        Some(IndexAttemptStatus::Failed) => "failed",
    }
}

/// Flags for the `dock status` command.
#[derive(Debug, Default)]
pub struct StatusRequest {
    pub filters: FilterOptions,
    pub search: Option<String>,
    pub toggle: Option<SourceType>,
    pub toggle_all: bool,
}

/// Fetch, aggregate, maintain the expand/collapse map, render.
pub async fn run_status(
    config: &Config,
    backend: &dyn Backend,
    cache: &mut FetchCache,
    request: StatusRequest,
) -> anyhow::Result<()> {
    let all = fetch_statuses_cached(backend, cache, false).await?;
    let editable = fetch_statuses_cached(backend, cache, true).await?;
    let view = aggregate(&all, &editable, &request.filters);

    let mut prefs = TogglePrefs::load(&config.prefs.path);
    let mut dirty = false;

    if let Some(source) = request.toggle {
        let expanded = prefs.toggle(source);
        println!(
            "{} {}",
            if expanded { "expanded" } else { "collapsed" },
            source
        );
        dirty = true;
    }

    let display = view.display_sources();
    if request.toggle_all {
        let expand = prefs.should_expand_all(&display);
        prefs.set_all(&display, expand);
        println!(
            "{} all {} sources",
            if expand { "expanded" } else { "collapsed" },
            display.len()
        );
        dirty = true;
    }

    if request.filters.any_active() && !view.filtered.is_empty() {
        let matched: Vec<SourceType> = view.filtered.keys().copied().collect();
        prefs.expand_matching(&matched);
        dirty = true;
    }

    if dirty {
        prefs.save()?;
    }

    if display.is_empty() {
        println!("no connectors match the current filters");
        return Ok(());
    }

    let query = request.search.as_deref().unwrap_or("");
    let mut shown = 0usize;
    for source in display {
        let rows = view.rows(source);
        let Some(visible) = search_rows(source, rows, query) else {
            continue;
        };
        shown += 1;

        // Summaries always describe the unfiltered group.
        let summary = view.summaries[&source];
        println!(
            "{} ({} connectors, {} active, {} public, {} docs, {} errors)",
            source.display_name(),
            summary.count,
            summary.active,
            summary.public,
            summary.total_docs_indexed,
            summary.errors
        );

        if !prefs.is_expanded(source) {
            println!("  (collapsed; run 'dock status --toggle {}')", source);
            continue;
        }

        println!(
            "  {:<6} {:<30} {:<10} {:<12} {:>10}  {}",
            "PAIR", "NAME", "STATUS", "LAST RUN", "DOCS", "ACCESS"
        );
        for row in visible {
            let marker = if view.editable_ids.contains(&row.cc_pair_id) {
                "*"
            } else {
                " "
            };
            println!(
                " {}{:<6} {:<30} {:<10} {:<12} {:>10}  {}",
                marker,
                row.cc_pair_id,
                truncate(row.display_name(), 30),
                status_glyph(row.cc_pair_status),
                last_status_label(row.last_finished_status),
                row.docs_indexed,
                row.access_type
            );
        }
    }

    if shown == 0 {
        println!("no connectors match '{}'", query);
    }
    Ok(())
}

pub async fn fetch_statuses_cached(
    backend: &dyn Backend,
    cache: &mut FetchCache,
    editable: bool,
) -> anyhow::Result<Vec<ConnectorIndexingStatus>> {
    let key = CacheKey::IndexingStatus { editable };
    if let Some(CacheEntry::Statuses(statuses)) = cache.get(&key) {
        return Ok(statuses.clone());
    }
    let statuses = backend.indexing_statuses(editable).await?;
    cache.insert(key, CacheEntry::Statuses(statuses.clone()));
    Ok(statuses)
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        name.to_string()
    } else {
        let kept: String = name.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Connector, ConnectorBase, InputType};
    use serde_json::Map;

    fn snapshot(
        cc_pair_id: i64,
        source: SourceType,
        name: &str,
        docs_indexed: i64,
        access_type: AccessType,
        last_finished: Option<IndexAttemptStatus>,
        cc_pair_status: CcPairStatus,
    ) -> ConnectorIndexingStatus {
        ConnectorIndexingStatus {
            cc_pair_id,
            name: Some(name.to_string()),
            cc_pair_status,
            connector: Connector {
                id: cc_pair_id * 10,
                base: ConnectorBase {
                    name: name.to_string(),
                    source,
                    input_type: InputType::Poll,
                    connector_specific_config: Map::new(),
                    refresh_freq: None,
                    prune_freq: None,
                    indexing_start: None,
                    access_type,
                    groups: vec![],
                },
                credential_ids: vec![],
                time_created: None,
                time_updated: None,
            },
            credential: None,
            access_type,
            docs_indexed,
            last_success: None,
            last_status: None,
            last_finished_status: last_finished,
            latest_index_attempt: None,
            groups: vec![],
        }
    }

    fn web_pair() -> Vec<ConnectorIndexingStatus> {
        vec![
            snapshot(
                1,
                SourceType::Web,
                "Docs Crawl",
                10,
                AccessType::Public,
                Some(IndexAttemptStatus::Success),
                CcPairStatus::Active,
            ),
            snapshot(
                2,
                SourceType::Web,
                "Blog Crawl",
                0,
                AccessType::Private,
                Some(IndexAttemptStatus::Failed),
                CcPairStatus::Paused,
            ),
        ]
    }

    #[test]
    fn test_empty_filters_summary() {
        let view = aggregate(&web_pair(), &[], &FilterOptions::default());
        let summary = view.summaries[&SourceType::Web];
        assert_eq!(summary.count, 2);
        assert_eq!(summary.active, 1);
        assert_eq!(summary.public, 1);
        assert_eq!(summary.total_docs_indexed, 10);
        assert_eq!(summary.errors, 1);
        assert_eq!(view.display_sources(), vec![SourceType::Web]);
    }

    #[test]
    fn test_docs_filter_narrows_group() {
        let filters = FilterOptions {
            docs_count: DocsCountFilter {
                operator: Some(CmpOp::Gt),
                value: Some(5),
            },
            ..FilterOptions::default()
        };
        let view = aggregate(&web_pair(), &[], &filters);
        assert_eq!(view.display_sources(), vec![SourceType::Web]);
        let rows = view.rows(SourceType::Web);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cc_pair_id, 1);
    }

    #[test]
    fn test_docs_filter_excluding_all_drops_source() {
        let filters = FilterOptions {
            docs_count: DocsCountFilter {
                operator: Some(CmpOp::Gt),
                value: Some(100),
            },
            ..FilterOptions::default()
        };
        let view = aggregate(&web_pair(), &[], &filters);
        assert!(view.filtered.is_empty());
        assert!(view.display_sources().is_empty());
    }

    #[test]
    fn test_docs_filter_null_value_passes_everything() {
        let filters = FilterOptions {
            docs_count: DocsCountFilter {
                operator: Some(CmpOp::Gt),
                value: None,
            },
            ..FilterOptions::default()
        };
        let view = aggregate(&web_pair(), &[], &filters);
        assert_eq!(view.rows(SourceType::Web).len(), 2);
    }

    #[test]
    fn test_dedup_keeps_editable_entry() {
        let all = web_pair();
        let mut editable_row = all[0].clone();
        editable_row.name = Some("Docs Crawl (editable)".to_string());
        let view = aggregate(&all, &[editable_row], &FilterOptions::default());

        let rows = view.rows(SourceType::Web);
        assert_eq!(rows.len(), 2);
        // Editable pass came first and its version of pair 1 won.
        assert_eq!(rows[0].cc_pair_id, 1);
        assert_eq!(rows[0].display_name(), "Docs Crawl (editable)");
        assert!(view.editable_ids.contains(&1));
        assert!(!view.editable_ids.contains(&2));
    }

    #[test]
    fn test_sources_sorted_lexicographically() {
        let statuses = vec![
            snapshot(
                1,
                SourceType::Zendesk,
                "Tickets",
                5,
                AccessType::Public,
                None,
                CcPairStatus::Active,
            ),
            snapshot(
                2,
                SourceType::Confluence,
                "Wiki",
                5,
                AccessType::Public,
                None,
                CcPairStatus::Active,
            ),
            snapshot(
                3,
                SourceType::Github,
                "Repos",
                5,
                AccessType::Public,
                None,
                CcPairStatus::Active,
            ),
        ];
        let view = aggregate(&statuses, &[], &FilterOptions::default());
        assert_eq!(
            view.display_sources(),
            vec![SourceType::Confluence, SourceType::Github, SourceType::Zendesk]
        );
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let filters = FilterOptions {
            access_types: vec![AccessType::Public],
            ..FilterOptions::default()
        };
        let all = web_pair();
        let a = aggregate(&all, &[], &filters);
        let b = aggregate(&all, &[], &filters);
        assert_eq!(a.display_sources(), b.display_sources());
        assert_eq!(a.summaries, b.summaries);
        assert_eq!(a.rows(SourceType::Web).len(), b.rows(SourceType::Web).len());
    }

    #[test]
    fn test_filter_monotonicity() {
        let base = FilterOptions {
            access_types: vec![AccessType::Public, AccessType::Private],
            ..FilterOptions::default()
        };
        let tighter = FilterOptions {
            access_types: vec![AccessType::Public, AccessType::Private],
            last_statuses: vec![IndexAttemptStatus::Success],
            ..FilterOptions::default()
        };
        let all = web_pair();
        let wide = aggregate(&all, &[], &base);
        let narrow = aggregate(&all, &[], &tighter);
        assert!(narrow.rows(SourceType::Web).len() <= wide.rows(SourceType::Web).len());
    }

    #[test]
    fn test_last_status_filter_requires_finished_attempt() {
        let mut statuses = web_pair();
        statuses[0].last_finished_status = None;
        let filters = FilterOptions {
            last_statuses: vec![IndexAttemptStatus::Success],
            ..FilterOptions::default()
        };
        let view = aggregate(&statuses, &[], &filters);
        // Neither row has a finished success; the group disappears.
        assert!(view.display_sources().is_empty());
    }

    #[test]
    fn test_search_source_name_shows_all_rows() {
        let all = web_pair();
        let view = aggregate(&all, &[], &FilterOptions::default());
        let rows = view.rows(SourceType::Web);
        let visible = search_rows(SourceType::Web, rows, "web").unwrap();
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_search_connector_name_shows_subset() {
        let all = web_pair();
        let view = aggregate(&all, &[], &FilterOptions::default());
        let rows = view.rows(SourceType::Web);
        let visible = search_rows(SourceType::Web, rows, "blog").unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].display_name(), "Blog Crawl");

        assert!(search_rows(SourceType::Web, rows, "zzz").is_none());
    }

    #[test]
    fn test_cmp_op_parsing() {
        assert_eq!(CmpOp::from_str(">").unwrap(), CmpOp::Gt);
        assert_eq!(CmpOp::from_str("lt").unwrap(), CmpOp::Lt);
        assert_eq!(CmpOp::from_str("=").unwrap(), CmpOp::Eq);
        assert!(CmpOp::from_str(">=").is_err());
    }
}
