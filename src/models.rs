//! Wire types shared with the retrieval backend.
//!
//! These mirror the JSON shapes of the manage API: connectors, credentials,
//! and the read-only CC-pair indexing-status snapshots. The console never
//! mutates a snapshot directly; mutations go through the action endpoints
//! and the snapshot is refetched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Category tag identifying which external system a connector talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    File,
    Web,
    GoogleSites,
    GoogleDrive,
    Gmail,
    Slack,
    Github,
    Notion,
    Jira,
    Confluence,
    S3,
    Zendesk,
}

impl SourceType {
    pub const ALL: [SourceType; 12] = [
        SourceType::File,
        SourceType::Web,
        SourceType::GoogleSites,
        SourceType::GoogleDrive,
        SourceType::Gmail,
        SourceType::Slack,
        SourceType::Github,
        SourceType::Notion,
        SourceType::Jira,
        SourceType::Confluence,
        SourceType::S3,
        SourceType::Zendesk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Web => "web",
            Self::GoogleSites => "google_sites",
            Self::GoogleDrive => "google_drive",
            Self::Gmail => "gmail",
            Self::Slack => "slack",
            Self::Github => "github",
            Self::Notion => "notion",
            Self::Jira => "jira",
            Self::Confluence => "confluence",
            Self::S3 => "s3",
            Self::Zendesk => "zendesk",
        }
    }

    /// Human-readable name for table output.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::File => "File",
            Self::Web => "Web",
            Self::GoogleSites => "Google Sites",
            Self::GoogleDrive => "Google Drive",
            Self::Gmail => "Gmail",
            Self::Slack => "Slack",
            Self::Github => "GitHub",
            Self::Notion => "Notion",
            Self::Jira => "Jira",
            Self::Confluence => "Confluence",
            Self::S3 => "S3",
            Self::Zendesk => "Zendesk",
        }
    }
}

// Sources sort by wire key, not declaration order, so grouped listings
// come out alphabetically.
impl Ord for SourceType {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for SourceType {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| format!("unknown source type: '{}'", s))
    }
}

/// Visibility scope of a connector or credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    Public,
    Private,
    Sync,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Sync => "sync",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "sync" => Ok(Self::Sync),
            other => Err(format!("unknown access type: '{}'", other)),
        }
    }
}

/// Lifecycle status of a connector-credential pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CcPairStatus {
    Active,
    Paused,
    Deleting,
    Invalid,
}

impl CcPairStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::Deleting => "DELETING",
            Self::Invalid => "INVALID",
        }
    }
}

/// Outcome of an indexing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexAttemptStatus {
    NotStarted,
    InProgress,
    Success,
    Failed,
}

impl IndexAttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for IndexAttemptStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown attempt status: '{}'", other)),
        }
    }
}

/// How the backend pulls from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    LoadState,
    Poll,
}

/// Connector definition as sent to the create/update endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorBase {
    pub name: String,
    pub source: SourceType,
    pub input_type: InputType,
    pub connector_specific_config: Map<String, Value>,
    pub refresh_freq: Option<i64>,
    pub prune_freq: Option<i64>,
    pub indexing_start: Option<DateTime<Utc>>,
    pub access_type: AccessType,
    pub groups: Vec<i64>,
}

/// Connector as returned by the backend after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connector {
    pub id: i64,
    #[serde(flatten)]
    pub base: ConnectorBase,
    #[serde(default)]
    pub credential_ids: Vec<i64>,
    pub time_created: Option<DateTime<Utc>>,
    pub time_updated: Option<DateTime<Utc>>,
}

/// Credential create payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialBase {
    pub name: String,
    pub source: SourceType,
    pub credential_json: Map<String, Value>,
    pub admin_public: bool,
    pub curator_public: bool,
    pub groups: Vec<i64>,
}

/// A stored secret bundle usable by connectors of a matching source type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: i64,
    pub name: Option<String>,
    pub source: SourceType,
    pub credential_json: Map<String, Value>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub admin_public: bool,
    #[serde(default)]
    pub curator_public: bool,
    #[serde(default)]
    pub groups: Vec<i64>,
    pub time_created: Option<DateTime<Utc>>,
    pub time_updated: Option<DateTime<Utc>>,
}

/// Latest indexing attempt embedded in a status snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexAttemptSnapshot {
    pub status: Option<IndexAttemptStatus>,
    pub error_msg: Option<String>,
}

/// Read-only snapshot of one connector-credential pair's indexing state.
///
/// Produced by the status listing endpoint; the CC pair is the unit the
/// backend actually schedules for indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorIndexingStatus {
    pub cc_pair_id: i64,
    pub name: Option<String>,
    pub cc_pair_status: CcPairStatus,
    pub connector: Connector,
    pub credential: Option<Credential>,
    pub access_type: AccessType,
    pub docs_indexed: i64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_status: Option<IndexAttemptStatus>,
    pub last_finished_status: Option<IndexAttemptStatus>,
    pub latest_index_attempt: Option<IndexAttemptSnapshot>,
    #[serde(default)]
    pub groups: Vec<i64>,
}

impl ConnectorIndexingStatus {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unnamed)")
    }
}

/// Extra options forwarded to the link endpoint for group-synced sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoSyncOptions {
    #[serde(flatten)]
    pub options: Map<String, Value>,
}
