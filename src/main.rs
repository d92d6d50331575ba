//! # SourceDock CLI (`dock`)
//!
//! The `dock` binary is the admin interface to an indexing backend. It
//! provides commands for credential management, connector setup, and
//! monitoring per-source indexing health.
//!
//! ## Usage
//!
//! ```bash
//! dock --config ./config/dock.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dock init` | Write a starter configuration file |
//! | `dock sources` | List connectable source types and their schemas |
//! | `dock credential list <source>` | List credentials for a source |
//! | `dock credential create <source>` | Create a credential from field pairs |
//! | `dock credential oauth <source>` | Print the OAuth authorization URL |
//! | `dock add <source>` | Run the connector setup flow end to end |
//! | `dock status` | Grouped, filterable indexing status table |
//! | `dock pair pause/resume/reindex/schedule/delete <id>` | Manage a connector pair |
//!
//! ## Examples
//!
//! ```bash
//! # First-time setup
//! dock init
//!
//! # Create a Slack credential, then connect a workspace
//! dock credential create slack --name eng-bot --field slack_bot_token=xoxb-...
//! dock add slack --name "Eng Slack" --credential 3 --field workspace=acme
//!
//! # Crawl a docs site (no credential needed)
//! dock add web --name "Docs" --field base_url=https://docs.example.com
//!
//! # Watch indexing, only failed runs
//! dock status --last-status failed
//! ```

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

use sourcedock::api::HttpBackend;
use sourcedock::cache::FetchCache;
use sourcedock::ccpair;
use sourcedock::config::{self, Config};
use sourcedock::credentials;
use sourcedock::models::{AccessType, IndexAttemptStatus, SourceType};
use sourcedock::sources;
use sourcedock::status::{self, CmpOp, DocsCountFilter, FilterOptions, StatusRequest};
use sourcedock::wizard::{self, AddRequest};

/// SourceDock CLI — connector and indexing administration for a
/// retrieval backend.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/dock.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "dock",
    about = "SourceDock — connector, credential, and indexing-status administration",
    version,
    long_about = "SourceDock manages the connector lifecycle on an indexing backend: \
    create credentials (or authorize via OAuth), walk the three-step connector setup \
    flow, and monitor per-source indexing health with grouping, filtering, and search."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/dock.toml`. The API base URL, preference file
    /// location, and scheduling defaults are read from this file.
    #[arg(long, global = true, default_value = "./config/dock.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Write a starter configuration file.
    ///
    /// Creates the file at the `--config` path with commented defaults.
    /// Refuses to overwrite an existing file.
    Init,

    /// List connectable source types.
    ///
    /// Shows each source's credential requirement, OAuth support, and
    /// configuration field count. With `--verbose`, prints every field.
    Sources {
        /// Also print each source's configuration fields.
        #[arg(long, short)]
        verbose: bool,
    },

    /// Manage credentials.
    Credential {
        #[command(subcommand)]
        action: CredentialAction,
    },

    /// Connect a new source.
    ///
    /// Runs the full setup flow non-interactively: credential selection,
    /// source configuration from `--field` pairs, and scheduling. File and
    /// Google Sites sources upload their local files first and reference
    /// the stored copies.
    Add {
        /// Source type to connect (see `dock sources`).
        source: SourceType,

        /// Display name for the new connector.
        #[arg(long)]
        name: String,

        /// Who can see indexed documents: `public`, `private`, or `sync`.
        #[arg(long, default_value = "public")]
        access_type: AccessType,

        /// Restrict to a user group id. Repeatable. Not valid with
        /// `--access-type public`.
        #[arg(long = "group")]
        groups: Vec<i64>,

        /// Id of an existing credential to link.
        #[arg(long)]
        credential: Option<i64>,

        /// Source configuration as `key=value` pairs. Repeatable.
        /// List-valued fields take comma-separated values.
        #[arg(long = "field", value_parser = parse_key_val)]
        fields: Vec<(String, String)>,

        /// Minutes between refresh runs. `0` disables refreshing.
        /// Defaults from config when omitted.
        #[arg(long)]
        refresh_minutes: Option<u64>,

        /// Days between prune runs. `0` disables pruning.
        /// Defaults from config when omitted.
        #[arg(long)]
        prune_days: Option<u64>,

        /// Only index content newer than this date (YYYY-MM-DD).
        #[arg(long)]
        indexing_start: Option<String>,
    },

    /// Show indexing status grouped by source.
    ///
    /// Prints one block per source with a summary line and, when the
    /// source is expanded, a row per connector pair. Editable pairs are
    /// marked with `*`. Filters narrow the visible groups; search narrows
    /// rows at render time.
    Status {
        /// Keep only pairs with this access type. Repeatable.
        #[arg(long = "access-type")]
        access_types: Vec<AccessType>,

        /// Keep only pairs whose last finished run had this status
        /// (`not_started`, `in_progress`, `success`, `failed`). Repeatable.
        #[arg(long = "last-status")]
        last_statuses: Vec<IndexAttemptStatus>,

        /// Docs-count comparison operator: `>`, `<`, or `=` (also
        /// `gt`/`lt`/`eq`).
        #[arg(long)]
        docs_op: Option<CmpOp>,

        /// Docs-count comparison value. An operator without a value
        /// matches everything.
        #[arg(long)]
        docs_value: Option<i64>,

        /// Show only sources or connector names matching this text.
        #[arg(long)]
        search: Option<String>,

        /// Flip the expanded/collapsed state of one source.
        #[arg(long)]
        toggle: Option<SourceType>,

        /// Expand all sources if fewer than half are expanded, else
        /// collapse all.
        #[arg(long)]
        toggle_all: bool,
    },

    /// Manage connector/credential pairs.
    Pair {
        #[command(subcommand)]
        action: PairAction,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

/// Credential management subcommands.
#[derive(Subcommand)]
enum CredentialAction {
    /// List credentials for a source.
    List {
        /// Source type the credentials belong to.
        source: SourceType,

        /// Only show credentials you can edit.
        #[arg(long)]
        editable: bool,
    },

    /// Create a credential from field pairs.
    ///
    /// Field names come from the source's credential template (see the
    /// backend docs for each source). Blank values are dropped.
    Create {
        /// Source type the credential is for.
        source: SourceType,

        /// Display name for the credential.
        #[arg(long)]
        name: String,

        /// Secret fields as `key=value` pairs. Repeatable.
        #[arg(long = "field", value_parser = parse_key_val)]
        fields: Vec<(String, String)>,

        /// Make the credential usable by all admins.
        #[arg(long)]
        public: bool,

        /// Share with a user group id. Repeatable.
        #[arg(long = "group")]
        groups: Vec<i64>,
    },

    /// Delete a credential.
    Delete {
        /// Source type the credential belongs to.
        source: SourceType,

        /// Credential id.
        id: i64,
    },

    /// Print the OAuth authorization URL for a source.
    ///
    /// Open the printed URL in a browser; after authorizing, the backend
    /// stores the resulting credential.
    Oauth {
        /// Source type to authorize (`google_drive`, `gmail`, `slack`,
        /// `confluence`).
        source: SourceType,

        /// Where the provider should send the user back to.
        #[arg(long, default_value = "http://localhost:3000/admin/connectors")]
        return_url: String,

        /// Provider-specific extras as `key=value` pairs. Repeatable.
        /// Forces the prepared-request flow even when a plain redirect
        /// exists.
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
}

/// Pair lifecycle subcommands.
#[derive(Subcommand)]
enum PairAction {
    /// Pause indexing for a pair.
    Pause {
        /// Connector pair id (first column of `dock status`).
        id: i64,
    },
    /// Resume indexing for a paused pair.
    Resume {
        /// Connector pair id.
        id: i64,
    },
    /// Queue a new index attempt.
    Reindex {
        /// Connector pair id.
        id: i64,

        /// Re-index from the beginning of the source instead of the last
        /// successful window.
        #[arg(long)]
        from_beginning: bool,
    },
    /// Change a pair's refresh/prune schedule.
    Schedule {
        /// Connector pair id.
        id: i64,

        /// Minutes between refresh runs. `0` disables refreshing.
        #[arg(long)]
        refresh_minutes: Option<u64>,

        /// Days between prune runs. `0` disables pruning.
        #[arg(long)]
        prune_days: Option<u64>,
    },
    /// Delete a pair and its indexed documents.
    ///
    /// The pair must be paused first.
    Delete {
        /// Connector pair id.
        id: i64,
    },
}

/// Parse a `key=value` pair for `--field` arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn backend_and_cache(cfg: &Config) -> anyhow::Result<(HttpBackend, FetchCache)> {
    let backend = HttpBackend::new(&cfg.api, cfg.api_token())?;
    let cache = FetchCache::new(Duration::from_secs(cfg.api.refresh_interval_secs));
    Ok((backend, cache))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    match &cli.command {
        Commands::Init => {
            config::write_starter_config(&cli.config)?;
            println!("wrote starter config to {}", cli.config.display());
            return Ok(());
        }
        Commands::Sources { verbose } => {
            sources::run_sources(*verbose)?;
            return Ok(());
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "dock", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;
    let (backend, mut cache) = backend_and_cache(&cfg)?;

    match cli.command {
        Commands::Credential { action } => match action {
            CredentialAction::List { source, editable } => {
                credentials::run_list(&backend, &mut cache, source, editable).await?;
            }
            CredentialAction::Create {
                source,
                name,
                fields,
                public,
                groups,
            } => {
                credentials::run_create(&backend, &mut cache, source, name, fields, public, groups)
                    .await?;
            }
            CredentialAction::Delete { source, id } => {
                credentials::run_delete(&backend, &mut cache, source, id).await?;
            }
            CredentialAction::Oauth {
                source,
                return_url,
                params,
            } => {
                credentials::run_oauth(&backend, source, &return_url, params).await?;
            }
        },
        Commands::Add {
            source,
            name,
            access_type,
            groups,
            credential,
            fields,
            refresh_minutes,
            prune_days,
            indexing_start,
        } => {
            let request = AddRequest {
                source,
                name,
                access_type,
                groups,
                credential_id: credential,
                fields,
                refresh_freq_minutes: refresh_minutes,
                prune_freq_days: prune_days,
                indexing_start,
            };
            wizard::run_add(&cfg, &backend, &mut cache, request).await?;
        }
        Commands::Status {
            access_types,
            last_statuses,
            docs_op,
            docs_value,
            search,
            toggle,
            toggle_all,
        } => {
            let request = StatusRequest {
                filters: FilterOptions {
                    access_types,
                    last_statuses,
                    docs_count: DocsCountFilter {
                        operator: docs_op,
                        value: docs_value,
                    },
                },
                search,
                toggle,
                toggle_all,
            };
            status::run_status(&cfg, &backend, &mut cache, request).await?;
        }
        Commands::Pair { action } => match action {
            PairAction::Pause { id } => {
                ccpair::run_pause(&backend, &mut cache, id).await?;
            }
            PairAction::Resume { id } => {
                ccpair::run_resume(&backend, &mut cache, id).await?;
            }
            PairAction::Reindex { id, from_beginning } => {
                ccpair::run_reindex(&backend, &mut cache, id, from_beginning).await?;
            }
            PairAction::Schedule {
                id,
                refresh_minutes,
                prune_days,
            } => {
                ccpair::run_schedule(&backend, &mut cache, id, refresh_minutes, prune_days).await?;
            }
            PairAction::Delete { id } => {
                ccpair::run_delete(&backend, &mut cache, id).await?;
            }
        },
        Commands::Init | Commands::Sources { .. } | Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
