//! Connector setup wizard.
//!
//! A three-step flow: credential selection, source-specific configuration,
//! advanced scheduling. The step the user *requested* and the step that is
//! *effective* are kept separate: [`effective_step`] re-applies the gating
//! rules after every fact change, because credential activation can flip
//! asynchronously (an OAuth flow completes, a live credential shows up in a
//! background refresh).
//!
//! Submission happens only from the final step and follows the backend's
//! protocol: validate locally, branch on upload-backed sources, create the
//! connector, then link the credential. A link failure after a successful
//! create is reported as a distinct partial-success error; the created
//! connector is left in place for the operator to link or delete.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::api::{ApiError, Backend};
use crate::cache::{CacheKey, FetchCache};
use crate::config::{Config, ScheduleDefaults};
use crate::credentials::fetch_credentials_cached;
use crate::models::{
    AccessType, AutoSyncOptions, Connector, ConnectorBase, Credential, SourceType,
};
use crate::schema::{self, FieldError, FieldType};
use crate::upload;

/// Steps of the setup wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Credential,
    SourceConfig,
    Advanced,
}

impl WizardStep {
    pub fn index(&self) -> usize {
        match self {
            Self::Credential => 0,
            Self::SourceConfig => 1,
            Self::Advanced => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Credential => "credential",
            Self::SourceConfig => "configuration",
            Self::Advanced => "advanced",
        }
    }

    fn next(&self) -> WizardStep {
        match self {
            Self::Credential => Self::SourceConfig,
            Self::SourceConfig | Self::Advanced => Self::Advanced,
        }
    }

    fn prev(&self) -> WizardStep {
        match self {
            Self::Credential | Self::SourceConfig => Self::Credential,
            Self::Advanced => Self::SourceConfig,
        }
    }
}

/// External facts the gating rules depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardFacts {
    /// The source type has no credential template; it needs no secret.
    pub no_credentials: bool,
    /// A credential has been selected, freshly created, or resolved live.
    pub credential_activated: bool,
}

/// The correction loop: the step that actually applies, given the facts.
///
/// Credential-less sources can never sit on the credential step, and a
/// source that still needs a credential can never move past it. Otherwise
/// the requested step stands.
pub fn effective_step(requested: WizardStep, facts: WizardFacts) -> WizardStep {
    if facts.no_credentials {
        return requested.max(WizardStep::SourceConfig);
    }
    if !facts.credential_activated {
        return WizardStep::Credential;
    }
    requested
}

/// Advanced scheduling overrides, in user-facing units.
#[derive(Debug, Clone, Default)]
pub struct AdvancedOptions {
    pub refresh_freq_minutes: Option<u64>,
    pub prune_freq_days: Option<u64>,
    /// `YYYY-MM-DD`; blank means "index everything".
    pub indexing_start: Option<String>,
}

/// Schedule in the backend's wire units (seconds, UTC datetime).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorSchedule {
    pub refresh_freq: Option<i64>,
    pub prune_freq: Option<i64>,
    pub indexing_start: Option<DateTime<Utc>>,
}

impl AdvancedOptions {
    /// Convert to wire units, applying defaults for blank fields only.
    ///
    /// An explicit zero survives the default and then collapses to `None`
    /// ("never"), which is how the backend encodes a disabled schedule.
    pub fn schedule(&self, defaults: &ScheduleDefaults) -> Result<ConnectorSchedule, SubmitError> {
        let refresh_minutes = self.refresh_freq_minutes.unwrap_or(defaults.refresh_freq_minutes);
        let refresh_secs = freq_to_secs(refresh_minutes, 60).ok_or_else(|| {
            SubmitError::Schedule(format!("refresh frequency out of range: {} minutes", refresh_minutes))
        })?;
        let prune_days = self.prune_freq_days.unwrap_or(defaults.prune_freq_days);
        let prune_secs = freq_to_secs(prune_days, 60 * 60 * 24).ok_or_else(|| {
            SubmitError::Schedule(format!("prune frequency out of range: {} days", prune_days))
        })?;

        let indexing_start = match self.indexing_start.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                    SubmitError::Schedule(format!(
                        "invalid indexing start date '{}': expected YYYY-MM-DD",
                        raw
                    ))
                })?;
                Some(date.and_time(chrono::NaiveTime::MIN).and_utc())
            }
        };

        Ok(ConnectorSchedule {
            refresh_freq: (refresh_secs > 0).then_some(refresh_secs),
            prune_freq: (prune_secs > 0).then_some(prune_secs),
            indexing_start,
        })
    }
}

/// Checked conversion from a user-facing interval to wire seconds.
/// `None` when the value does not fit in the backend's signed field.
pub fn freq_to_secs(value: u64, secs_per_unit: i64) -> Option<i64> {
    i64::try_from(value).ok()?.checked_mul(secs_per_unit)
}

/// Why a submit attempt was blocked or failed.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Gating refused the final step: a credential is still required.
    #[error("a credential must be selected or created before submitting")]
    CredentialRequired,

    /// Required-field or option validation failed; no network call was made.
    #[error("configuration is invalid: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// A cross-field business rule failed; no network call was made.
    #[error("{0}")]
    CrossField(String),

    #[error("{0}")]
    Schedule(String),

    /// The backend rejected the create (or an upload step).
    #[error(transparent)]
    Backend(#[from] ApiError),

    /// The connector was created but linking the credential failed. The
    /// connector is left in place; it must be linked or deleted manually.
    #[error("connector {connector_id} was created, but linking credential failed: {source}")]
    LinkFailed {
        connector_id: i64,
        #[source]
        source: ApiError,
    },
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Successful submission result.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub connector: Connector,
    /// Whether a real credential was linked (as opposed to a mock one).
    pub linked: bool,
}

/// Transient, client-only state for one wizard run.
///
/// Created when the flow starts, discarded after a successful submit.
#[derive(Debug)]
pub struct WizardSession {
    pub source: SourceType,
    pub name: String,
    pub access_type: AccessType,
    pub groups: Vec<i64>,
    requested: WizardStep,
    credential: Option<Credential>,
    values: Map<String, Value>,
    pub advanced: AdvancedOptions,
    pub auto_sync_options: Option<AutoSyncOptions>,
}

impl WizardSession {
    pub fn new(source: SourceType, name: String, access_type: AccessType, groups: Vec<i64>) -> Self {
        Self {
            source,
            name,
            access_type,
            groups,
            requested: WizardStep::Credential,
            credential: None,
            values: Map::new(),
            advanced: AdvancedOptions::default(),
            auto_sync_options: None,
        }
    }

    pub fn facts(&self) -> WizardFacts {
        WizardFacts {
            no_credentials: schema::credential_template(self.source).is_none(),
            credential_activated: self.credential.is_some(),
        }
    }

    /// The step currently in effect, after the correction pass.
    pub fn step(&self) -> WizardStep {
        effective_step(self.requested, self.facts())
    }

    /// File uploads have no schedule; their flow ends at the config step.
    pub fn last_step(&self) -> WizardStep {
        if self.source == SourceType::File {
            WizardStep::SourceConfig
        } else {
            WizardStep::Advanced
        }
    }

    /// Navigate forward. The requested step moves; gating may hold it
    /// back, and the correction is written into the stored step so a
    /// later fact change resumes from the corrected position.
    pub fn advance(&mut self) -> WizardStep {
        self.requested = self.step().next().min(self.last_step());
        self.requested = self.step();
        self.requested
    }

    /// Navigate backward.
    pub fn back(&mut self) -> WizardStep {
        self.requested = self.step().prev();
        self.requested = self.step();
        self.requested
    }

    /// Select an existing credential (the "swap" path). Marks the
    /// credential activated; gating re-evaluates on the next `step()`.
    pub fn select_credential(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }

    /// Adopt a cached live credential (e.g. a previously authorized
    /// Drive/Gmail account resolved by a background fetch).
    pub fn take_live_credential(&mut self, credential: Credential) {
        if self.credential.is_none() {
            self.credential = Some(credential);
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn set_value(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Submit the whole form. Only legal from the final step.
    pub async fn submit(
        &self,
        backend: &dyn Backend,
        defaults: &ScheduleDefaults,
    ) -> Result<SubmitOutcome, SubmitError> {
        let facts = self.facts();
        if effective_step(self.last_step(), facts) < self.last_step() {
            return Err(SubmitError::CredentialRequired);
        }

        let connection = schema::schema_for(self.source);
        let errors = schema::validate_values(&connection.fields, &self.values);
        if !errors.is_empty() {
            return Err(SubmitError::Validation(errors));
        }

        // Cross-field rules run before any network call.
        if self.access_type == AccessType::Public && !self.groups.is_empty() {
            return Err(SubmitError::CrossField(
                "groups can only be assigned to non-public connectors".to_string(),
            ));
        }
        if self.auto_sync_options.is_some() && self.access_type != AccessType::Sync {
            return Err(SubmitError::CrossField(
                "auto-sync options require access type 'sync'".to_string(),
            ));
        }

        let schedule = self.advanced.schedule(defaults)?;
        let values = schema::apply_transforms(&connection, &self.values);

        // Upload-backed sources derive their config from uploaded file
        // references, not form fields; they have dedicated submit paths.
        match self.source {
            SourceType::File => {
                let connector = upload::submit_files(backend, self, &values).await?;
                return Ok(SubmitOutcome {
                    connector,
                    linked: false,
                });
            }
            SourceType::GoogleSites => {
                let connector =
                    upload::submit_google_site(backend, self, &values, &schedule).await?;
                return Ok(SubmitOutcome {
                    connector,
                    linked: false,
                });
            }
            _ => {}
        }

        let payload = ConnectorBase {
            name: self.name.clone(),
            source: self.source,
            input_type: schema::input_type_for(self.source),
            connector_specific_config: values,
            refresh_freq: schedule.refresh_freq,
            prune_freq: schedule.prune_freq,
            indexing_start: schedule.indexing_start,
            access_type: self.access_type,
            groups: self.groups.clone(),
        };

        match self.credential() {
            None => {
                // No secret needed: the backend attaches a placeholder.
                let connector = backend
                    .create_connector_with_mock_credential(&payload)
                    .await?;
                Ok(SubmitOutcome {
                    connector,
                    linked: false,
                })
            }
            Some(credential) => {
                let connector = backend.create_connector(&payload).await?;
                backend
                    .link_credential(
                        connector.id,
                        credential.id,
                        &self.name,
                        self.access_type,
                        &self.groups,
                        self.auto_sync_options.as_ref(),
                    )
                    .await
                    .map_err(|source| SubmitError::LinkFailed {
                        connector_id: connector.id,
                        source,
                    })?;
                Ok(SubmitOutcome {
                    connector,
                    linked: true,
                })
            }
        }
    }
}

/// Parameters for the non-interactive `dock add` command.
#[derive(Debug)]
pub struct AddRequest {
    pub source: SourceType,
    pub name: String,
    pub access_type: AccessType,
    pub groups: Vec<i64>,
    pub credential_id: Option<i64>,
    /// `key=value` pairs for the source config step.
    pub fields: Vec<(String, String)>,
    pub refresh_freq_minutes: Option<u64>,
    pub prune_freq_days: Option<u64>,
    pub indexing_start: Option<String>,
}

/// Drive a full wizard session from CLI flags.
pub async fn run_add(
    config: &Config,
    backend: &dyn Backend,
    cache: &mut FetchCache,
    request: AddRequest,
) -> anyhow::Result<()> {
    let mut session = WizardSession::new(
        request.source,
        request.name,
        request.access_type,
        request.groups,
    );

    println!("add {} connector '{}'", session.source, session.name);

    // Step 0: credential, unless the source needs none.
    if schema::credential_template(session.source).is_some() {
        let credential_id = match request.credential_id {
            Some(id) => id,
            None => {
                let editable =
                    fetch_credentials_cached(backend, cache, session.source, true).await?;
                eprintln!(
                    "source '{}' requires a credential; pass --credential <id>",
                    session.source
                );
                if editable.is_empty() {
                    eprintln!(
                        "no editable credentials exist yet; create one with \
                         'dock credential create {}'",
                        session.source
                    );
                    if schema::oauth_supported(session.source) {
                        eprintln!(
                            "or authorize via 'dock credential oauth {}'",
                            session.source
                        );
                    }
                } else {
                    for credential in &editable {
                        eprintln!(
                            "  {:<6} {}",
                            credential.id,
                            credential.name.as_deref().unwrap_or("(unnamed)")
                        );
                    }
                }
                anyhow::bail!("no credential selected");
            }
        };

        let all = fetch_credentials_cached(backend, cache, session.source, false).await?;
        let chosen = all
            .into_iter()
            .find(|c| c.id == credential_id)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "credential {} not found for source '{}'",
                    credential_id,
                    session.source
                )
            })?;
        session.select_credential(chosen);
        println!("  credential {} selected", credential_id);
    }

    if session.step() == WizardStep::Credential {
        session.advance();
    }
    let step = session.step();
    println!("  step {}/3: {}", step.index() + 1, step.label());

    // Step 1: source-specific configuration.
    let connection = schema::schema_for(session.source);
    for (key, raw) in &request.fields {
        let spec = connection
            .fields
            .iter()
            .find(|f| f.name == key.as_str())
            .ok_or_else(|| {
                anyhow::anyhow!("unknown field '{}' for source '{}'", key, session.source)
            })?;
        session.set_value(key, coerce_field_value(spec.field_type, raw));
    }

    if session.step() < session.last_step() {
        let step = session.advance();
        println!("  step {}/3: {}", step.index() + 1, step.label());
    }

    // Step 2: advanced scheduling.
    session.advanced = AdvancedOptions {
        refresh_freq_minutes: request.refresh_freq_minutes,
        prune_freq_days: request.prune_freq_days,
        indexing_start: request.indexing_start,
    };

    match session.submit(backend, &config.defaults).await {
        Ok(outcome) => {
            println!(
                "created connector {} ({}){}",
                outcome.connector.id,
                session.source,
                if outcome.linked {
                    " and linked credential"
                } else {
                    ""
                }
            );
            cache.invalidate(&CacheKey::IndexingStatus { editable: false });
            cache.invalidate(&CacheKey::IndexingStatus { editable: true });
            Ok(())
        }
        Err(SubmitError::LinkFailed {
            connector_id,
            source,
        }) => {
            eprintln!(
                "connector {} was created, but the credential link failed: {}",
                connector_id, source
            );
            eprintln!("link it manually or delete the connector before retrying");
            anyhow::bail!("credential link failed");
        }
        Err(err) => Err(err.into()),
    }
}

/// Interpret a raw CLI value according to the field type. List and file
/// fields split on commas; everything else passes through as a string.
fn coerce_field_value(field_type: FieldType, raw: &str) -> Value {
    match field_type {
        FieldType::List | FieldType::File => Value::Array(
            raw.split(',')
                .map(|part| Value::String(part.trim().to_string()))
                .collect(),
        ),
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CcPairStatus, ConnectorIndexingStatus, CredentialBase};
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn facts(no_credentials: bool, credential_activated: bool) -> WizardFacts {
        WizardFacts {
            no_credentials,
            credential_activated,
        }
    }

    #[test]
    fn test_step_gating_invariant() {
        let steps = [
            WizardStep::Credential,
            WizardStep::SourceConfig,
            WizardStep::Advanced,
        ];
        for no_credentials in [false, true] {
            for credential_activated in [false, true] {
                for requested in steps {
                    let effective =
                        effective_step(requested, facts(no_credentials, credential_activated));
                    if no_credentials {
                        assert!(effective >= WizardStep::SourceConfig);
                    }
                    if !no_credentials && !credential_activated {
                        assert_eq!(effective, WizardStep::Credential);
                    }
                }
            }
        }
    }

    #[test]
    fn test_credential_less_source_skips_step_zero() {
        // A source with no credential template starting at step 0 lands
        // on the config step without user action.
        let session = WizardSession::new(
            SourceType::File,
            "Uploads".to_string(),
            AccessType::Public,
            vec![],
        );
        assert_eq!(session.step(), WizardStep::SourceConfig);
    }

    #[test]
    fn test_retreat_when_credential_deactivated() {
        let mut session = WizardSession::new(
            SourceType::Slack,
            "Eng Slack".to_string(),
            AccessType::Private,
            vec![],
        );
        assert_eq!(session.step(), WizardStep::Credential);

        // Advancing without a credential is held at step 0.
        assert_eq!(session.advance(), WizardStep::Credential);

        session.select_credential(sample_credential(9, SourceType::Slack));
        assert_eq!(session.advance(), WizardStep::SourceConfig);
        assert_eq!(session.advance(), WizardStep::Advanced);
        assert_eq!(session.back(), WizardStep::SourceConfig);
    }

    #[test]
    fn test_live_credential_never_replaces_a_selection() {
        let mut session = WizardSession::new(
            SourceType::GoogleDrive,
            "Drive".to_string(),
            AccessType::Sync,
            vec![],
        );
        // A background-resolved credential activates the session.
        session.take_live_credential(sample_credential(1, SourceType::GoogleDrive));
        assert_eq!(session.credential().unwrap().id, 1);
        assert!(session.facts().credential_activated);

        // But it does not override one already in place.
        session.take_live_credential(sample_credential(2, SourceType::GoogleDrive));
        assert_eq!(session.credential().unwrap().id, 1);

        // An explicit swap does.
        session.select_credential(sample_credential(2, SourceType::GoogleDrive));
        assert_eq!(session.credential().unwrap().id, 2);
    }

    #[test]
    fn test_advance_is_bounded() {
        let mut session = WizardSession::new(
            SourceType::Web,
            "Docs".to_string(),
            AccessType::Public,
            vec![],
        );
        session.advance();
        session.advance();
        assert_eq!(session.advance(), WizardStep::Advanced);
        session.back();
        session.back();
        assert_eq!(session.step(), WizardStep::SourceConfig); // web needs no credential
    }

    #[test]
    fn test_file_flow_ends_at_config_step() {
        let mut session = WizardSession::new(
            SourceType::File,
            "Uploads".to_string(),
            AccessType::Public,
            vec![],
        );
        assert_eq!(session.advance(), WizardStep::SourceConfig);
        assert_eq!(session.advance(), WizardStep::SourceConfig);
    }

    #[test]
    fn test_schedule_defaults_applied_when_blank() {
        let defaults = ScheduleDefaults {
            refresh_freq_minutes: 30,
            prune_freq_days: 30,
        };
        let schedule = AdvancedOptions::default().schedule(&defaults).unwrap();
        assert_eq!(schedule.refresh_freq, Some(30 * 60));
        assert_eq!(schedule.prune_freq, Some(30 * 60 * 60 * 24));
        assert_eq!(schedule.indexing_start, None);
    }

    #[test]
    fn test_schedule_explicit_zero_means_never() {
        let defaults = ScheduleDefaults {
            refresh_freq_minutes: 30,
            prune_freq_days: 30,
        };
        let advanced = AdvancedOptions {
            refresh_freq_minutes: Some(0),
            prune_freq_days: Some(0),
            indexing_start: None,
        };
        let schedule = advanced.schedule(&defaults).unwrap();
        // Zero is not defaulted away; it collapses to "never".
        assert_eq!(schedule.refresh_freq, None);
        assert_eq!(schedule.prune_freq, None);
    }

    #[test]
    fn test_schedule_parses_start_date() {
        let defaults = ScheduleDefaults::default();
        let advanced = AdvancedOptions {
            refresh_freq_minutes: Some(60),
            prune_freq_days: None,
            indexing_start: Some("2024-05-01".to_string()),
        };
        let schedule = advanced.schedule(&defaults).unwrap();
        let start = schedule.indexing_start.unwrap();
        assert_eq!(start.to_rfc3339(), "2024-05-01T00:00:00+00:00");
    }

    #[test]
    fn test_schedule_rejects_bad_date() {
        let advanced = AdvancedOptions {
            refresh_freq_minutes: None,
            prune_freq_days: None,
            indexing_start: Some("May 1st".to_string()),
        };
        assert!(advanced.schedule(&ScheduleDefaults::default()).is_err());
    }

    #[test]
    fn test_schedule_rejects_out_of_range_interval() {
        let advanced = AdvancedOptions {
            refresh_freq_minutes: Some(u64::MAX),
            prune_freq_days: None,
            indexing_start: None,
        };
        let err = advanced.schedule(&ScheduleDefaults::default()).unwrap_err();
        assert!(matches!(err, SubmitError::Schedule(_)));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_freq_to_secs_checked() {
        assert_eq!(freq_to_secs(30, 60), Some(1800));
        assert_eq!(freq_to_secs(0, 60), Some(0));
        assert_eq!(freq_to_secs(u64::MAX, 60), None);
        assert_eq!(freq_to_secs(u64::MAX / 2, 60 * 60 * 24), None);
    }

    #[test]
    fn test_coerce_field_value() {
        assert_eq!(
            coerce_field_value(FieldType::Text, "https://example.com"),
            json!("https://example.com")
        );
        assert_eq!(
            coerce_field_value(FieldType::List, "general, eng ,ops"),
            json!(["general", "eng", "ops"])
        );
    }

    // ── submission protocol against a fake backend ──────────────────────

    fn sample_credential(id: i64, source: SourceType) -> Credential {
        Credential {
            id,
            name: Some(format!("cred-{}", id)),
            source,
            credential_json: Map::new(),
            user_id: None,
            admin_public: true,
            curator_public: false,
            groups: vec![],
            time_created: None,
            time_updated: None,
        }
    }

    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<String>>,
        fail_link: bool,
    }

    impl FakeBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn connector_from(&self, base: &ConnectorBase) -> Connector {
            Connector {
                id: 42,
                base: base.clone(),
                credential_ids: vec![],
                time_created: None,
                time_updated: None,
            }
        }
    }

    #[async_trait::async_trait]
    impl Backend for FakeBackend {
        async fn create_connector(&self, connector: &ConnectorBase) -> Result<Connector, ApiError> {
            self.record("create");
            Ok(self.connector_from(connector))
        }

        async fn update_connector(
            &self,
            _connector_id: i64,
            connector: &ConnectorBase,
        ) -> Result<Connector, ApiError> {
            self.record("update");
            Ok(self.connector_from(connector))
        }

        async fn create_connector_with_mock_credential(
            &self,
            connector: &ConnectorBase,
        ) -> Result<Connector, ApiError> {
            self.record("create_mock");
            Ok(self.connector_from(connector))
        }

        async fn link_credential(
            &self,
            connector_id: i64,
            credential_id: i64,
            _name: &str,
            _access_type: AccessType,
            _groups: &[i64],
            _auto_sync_options: Option<&AutoSyncOptions>,
        ) -> Result<(), ApiError> {
            self.record(&format!("link {} {}", connector_id, credential_id));
            if self.fail_link {
                return Err(ApiError::Rejected {
                    status: 400,
                    detail: "credential does not match connector".to_string(),
                });
            }
            Ok(())
        }

        async fn create_credential(
            &self,
            _credential: &CredentialBase,
        ) -> Result<Credential, ApiError> {
            unimplemented!()
        }

        async fn delete_credential(&self, _credential_id: i64) -> Result<(), ApiError> {
            unimplemented!()
        }

        async fn list_credentials(
            &self,
            _source: SourceType,
            _editable_only: bool,
        ) -> Result<Vec<Credential>, ApiError> {
            Ok(vec![])
        }

        async fn indexing_statuses(
            &self,
            _editable_only: bool,
        ) -> Result<Vec<ConnectorIndexingStatus>, ApiError> {
            Ok(vec![])
        }

        async fn oauth_authorization_url(
            &self,
            _source: SourceType,
            _return_url: &str,
            _params: &[(String, String)],
        ) -> Result<String, ApiError> {
            unimplemented!()
        }

        async fn oauth_redirect_url(
            &self,
            _source: SourceType,
        ) -> Result<Option<String>, ApiError> {
            Ok(None)
        }

        async fn upload_files(&self, paths: &[PathBuf]) -> Result<Vec<String>, ApiError> {
            self.record("upload");
            Ok(paths
                .iter()
                .map(|p| format!("stored/{}", p.display()))
                .collect())
        }

        async fn set_cc_pair_status(
            &self,
            _cc_pair_id: i64,
            _status: CcPairStatus,
        ) -> Result<(), ApiError> {
            unimplemented!()
        }

        async fn trigger_reindex(
            &self,
            _connector_id: i64,
            _credential_id: i64,
            _from_beginning: bool,
        ) -> Result<(), ApiError> {
            unimplemented!()
        }

        async fn delete_cc_pair(&self, _cc_pair_id: i64) -> Result<(), ApiError> {
            unimplemented!()
        }
    }

    fn slack_session() -> WizardSession {
        let mut session = WizardSession::new(
            SourceType::Slack,
            "Eng Slack".to_string(),
            AccessType::Private,
            vec![],
        );
        session.select_credential(sample_credential(5, SourceType::Slack));
        session.set_value("workspace", json!("acme"));
        session
    }

    #[tokio::test]
    async fn test_submit_creates_then_links() {
        let backend = FakeBackend::default();
        let session = slack_session();

        let outcome = session
            .submit(&backend, &ScheduleDefaults::default())
            .await
            .unwrap();
        assert!(outcome.linked);
        assert_eq!(backend.calls(), vec!["create", "link 42 5"]);
    }

    #[tokio::test]
    async fn test_submit_without_credential_uses_mock_endpoint() {
        let backend = FakeBackend::default();
        let mut session = WizardSession::new(
            SourceType::Web,
            "Docs".to_string(),
            AccessType::Public,
            vec![],
        );
        session.set_value("base_url", json!("https://docs.example.com"));

        let outcome = session
            .submit(&backend, &ScheduleDefaults::default())
            .await
            .unwrap();
        assert!(!outcome.linked);
        assert_eq!(backend.calls(), vec!["create_mock"]);
    }

    #[tokio::test]
    async fn test_submit_blocked_without_required_credential() {
        let backend = FakeBackend::default();
        let mut session = WizardSession::new(
            SourceType::Slack,
            "Eng Slack".to_string(),
            AccessType::Private,
            vec![],
        );
        session.set_value("workspace", json!("acme"));

        let err = session
            .submit(&backend, &ScheduleDefaults::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::CredentialRequired));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_blocked_by_validation_before_network() {
        let backend = FakeBackend::default();
        let mut session = slack_session();
        session.values.remove("workspace");

        let err = session
            .submit(&backend, &ScheduleDefaults::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Validation(_)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_blocked_by_cross_field_rule() {
        let backend = FakeBackend::default();
        let mut session = slack_session();
        session.access_type = AccessType::Public;
        session.groups = vec![3];

        let err = session
            .submit(&backend, &ScheduleDefaults::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::CrossField(_)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_partial_success_leaves_connector_in_place() {
        let backend = FakeBackend {
            fail_link: true,
            ..FakeBackend::default()
        };
        let session = slack_session();

        let err = session
            .submit(&backend, &ScheduleDefaults::default())
            .await
            .unwrap_err();
        match err {
            SubmitError::LinkFailed { connector_id, .. } => assert_eq!(connector_id, 42),
            other => panic!("expected LinkFailed, got {:?}", other),
        }
        // The create happened and nothing rolled it back.
        assert_eq!(backend.calls(), vec!["create", "link 42 5"]);
    }

    #[tokio::test]
    async fn test_file_submission_uploads_then_creates() {
        let backend = FakeBackend::default();
        let mut session = WizardSession::new(
            SourceType::File,
            "Uploads".to_string(),
            AccessType::Public,
            vec![],
        );
        session.set_value("file_locations", json!(["./report.pdf"]));

        let outcome = session
            .submit(&backend, &ScheduleDefaults::default())
            .await
            .unwrap();
        assert!(!outcome.linked);
        assert_eq!(backend.calls(), vec!["upload", "create_mock"]);
        assert_eq!(
            outcome
                .connector
                .base
                .connector_specific_config
                .get("file_locations")
                .unwrap(),
            &json!(["stored/./report.pdf"])
        );
    }
}
