//! Per-source-type configuration schemas.
//!
//! Every source type maps to a static schema describing its config fields,
//! its credential template, and how the backend ingests it. The wizard
//! renders, validates, and transforms form values against these schemas
//! instead of branching on source names at each call site.

use serde_json::{Map, Value};

use crate::models::{InputType, SourceType};

/// Kind of value a configuration field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Select,
    List,
    File,
    Zip,
}

/// Declarative transform applied to a raw field value before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Remove empty and whitespace-only entries from a list value.
    DropBlankEntries,
}

/// One configuration or credential field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub default: Option<&'static str>,
    /// Allowed values for `Select` fields.
    pub options: &'static [&'static str],
    pub transform: Option<Transform>,
}

impl FieldSpec {
    const fn text(name: &'static str, label: &'static str, description: &'static str) -> Self {
        Self {
            name,
            label,
            description,
            field_type: FieldType::Text,
            required: true,
            default: None,
            options: &[],
            transform: None,
        }
    }

    const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    const fn list(name: &'static str, label: &'static str, description: &'static str) -> Self {
        Self {
            name,
            label,
            description,
            field_type: FieldType::List,
            required: false,
            default: None,
            options: &[],
            transform: Some(Transform::DropBlankEntries),
        }
    }

    const fn select(
        name: &'static str,
        label: &'static str,
        options: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        Self {
            name,
            label,
            description: "",
            field_type: FieldType::Select,
            required: false,
            default: Some(default),
            options,
            transform: None,
        }
    }
}

/// Schema describing how to configure connectors of one source type.
#[derive(Debug, Clone)]
pub struct ConnectionSchema {
    pub source: SourceType,
    pub fields: Vec<FieldSpec>,
}

/// A single failed field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Look up the configuration schema for a source type.
pub fn schema_for(source: SourceType) -> ConnectionSchema {
    let fields = match source {
        SourceType::Web => vec![
            FieldSpec::text("base_url", "Base URL", "Root URL to crawl."),
            FieldSpec::select(
                "web_connector_type",
                "Crawl mode",
                &["recursive", "single", "sitemap"],
                "recursive",
            ),
        ],
        SourceType::File => vec![FieldSpec {
            name: "file_locations",
            label: "Files",
            description: "Local files to upload and index.",
            field_type: FieldType::File,
            required: true,
            default: None,
            options: &[],
            transform: None,
        }],
        SourceType::GoogleSites => vec![
            FieldSpec {
                name: "zip_path",
                label: "Site export",
                description: "Zip export of the Google Site.",
                field_type: FieldType::Zip,
                required: true,
                default: None,
                options: &[],
                transform: None,
            },
            FieldSpec::text("base_url", "Base URL", "Public URL of the site."),
        ],
        SourceType::GoogleDrive => vec![
            FieldSpec::list(
                "shared_drive_urls",
                "Shared drive URLs",
                "Shared drives to index; blank for all accessible drives.",
            ),
            FieldSpec::list(
                "shared_folder_urls",
                "Shared folder URLs",
                "Specific folders to index.",
            ),
            FieldSpec::list(
                "my_drive_emails",
                "My Drive emails",
                "Index the My Drive of these accounts.",
            ),
        ],
        SourceType::Gmail => vec![],
        SourceType::Slack => vec![
            FieldSpec::text("workspace", "Workspace", "Slack workspace name."),
            FieldSpec::list(
                "channels",
                "Channels",
                "Channels to index; blank for all public channels.",
            ),
        ],
        SourceType::Github => vec![
            FieldSpec::text("repo_owner", "Repository owner", "User or organization."),
            FieldSpec::list(
                "repositories",
                "Repositories",
                "Repositories to index; blank for all.",
            ),
        ],
        SourceType::Notion => vec![FieldSpec::text(
            "root_page_id",
            "Root page ID",
            "Restrict indexing to this page and its children.",
        )
        .optional()],
        SourceType::Jira => vec![
            FieldSpec::text("jira_base_url", "Jira base URL", "e.g. https://acme.atlassian.net"),
            FieldSpec::text("project_key", "Project key", "Restrict to one project.").optional(),
            FieldSpec::list(
                "comment_email_blacklist",
                "Comment email blacklist",
                "Skip comments authored by these emails.",
            ),
        ],
        SourceType::Confluence => vec![
            FieldSpec::text("wiki_base", "Wiki base URL", "e.g. https://acme.atlassian.net/wiki"),
            FieldSpec::text("space", "Space key", "Restrict to one space.").optional(),
        ],
        SourceType::S3 => vec![
            FieldSpec::text("bucket_name", "Bucket", "S3 bucket to index."),
            FieldSpec::text("prefix", "Prefix", "Key prefix to restrict indexing.").optional(),
        ],
        SourceType::Zendesk => vec![FieldSpec::select(
            "content_type",
            "Content type",
            &["articles", "tickets"],
            "articles",
        )],
    };

    ConnectionSchema { source, fields }
}

/// Credential fields required by a source type.
///
/// `None` means the source needs no secret at all (e.g. local file upload);
/// the wizard skips the credential step entirely for these.
pub fn credential_template(source: SourceType) -> Option<Vec<FieldSpec>> {
    let fields = match source {
        SourceType::File | SourceType::GoogleSites | SourceType::Web => return None,
        SourceType::GoogleDrive | SourceType::Gmail => vec![FieldSpec::text(
            "google_tokens",
            "Google tokens",
            "OAuth token bundle obtained via authorization.",
        )],
        SourceType::Slack => vec![FieldSpec::text(
            "slack_bot_token",
            "Bot token",
            "Bot token with channel read scopes.",
        )],
        SourceType::Github => vec![FieldSpec::text(
            "github_access_token",
            "Access token",
            "Personal access token with repo read scope.",
        )],
        SourceType::Notion => vec![FieldSpec::text(
            "notion_integration_token",
            "Integration token",
            "Internal integration token.",
        )],
        SourceType::Jira => vec![
            FieldSpec::text("jira_user_email", "User email", "Account the token belongs to."),
            FieldSpec::text("jira_api_token", "API token", "Atlassian API token."),
        ],
        SourceType::Confluence => vec![
            FieldSpec::text("confluence_username", "Username", "Account the token belongs to."),
            FieldSpec::text("confluence_access_token", "Access token", "Atlassian API token."),
        ],
        SourceType::S3 => vec![
            FieldSpec::text("aws_access_key_id", "Access key ID", ""),
            FieldSpec::text("aws_secret_access_key", "Secret access key", ""),
        ],
        SourceType::Zendesk => vec![
            FieldSpec::text("zendesk_email", "Email", "Account the token belongs to."),
            FieldSpec::text("zendesk_token", "API token", ""),
        ],
    };
    Some(fields)
}

/// Whether the source supports OAuth-based credential creation.
pub fn oauth_supported(source: SourceType) -> bool {
    matches!(
        source,
        SourceType::GoogleDrive | SourceType::Gmail | SourceType::Slack | SourceType::Confluence
    )
}

/// How the backend ingests this source.
///
/// File-backed sources submit their full state on each run; everything
/// else is polled incrementally.
pub fn input_type_for(source: SourceType) -> InputType {
    match source {
        SourceType::File | SourceType::GoogleSites => InputType::LoadState,
        _ => InputType::Poll,
    }
}

/// Blank means null, empty/whitespace string, or a list of only blanks.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.iter().all(is_blank),
        _ => false,
    }
}

/// Validate raw values against a field list: required fields must be
/// present and non-blank, select fields must use a known option.
pub fn validate_values(fields: &[FieldSpec], values: &Map<String, Value>) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for field in fields {
        let value = values.get(field.name);
        let missing = value.map(is_blank).unwrap_or(true);

        if field.required && missing {
            errors.push(FieldError {
                field: field.name.to_string(),
                message: format!("{} is required", field.label),
            });
            continue;
        }

        if field.field_type == FieldType::Select && !missing {
            if let Some(Value::String(chosen)) = value {
                if !field.options.contains(&chosen.as_str()) {
                    errors.push(FieldError {
                        field: field.name.to_string(),
                        message: format!(
                            "{} must be one of: {}",
                            field.label,
                            field.options.join(", ")
                        ),
                    });
                }
            }
        }
    }

    errors
}

/// Apply schema defaults and per-field transforms to raw values.
///
/// List values always have blank entries stripped; declared transforms run
/// on top of that. Fields absent from the schema pass through unchanged.
pub fn apply_transforms(
    schema: &ConnectionSchema,
    values: &Map<String, Value>,
) -> Map<String, Value> {
    let mut out = Map::new();

    // Defaults for fields the caller never set.
    for field in &schema.fields {
        if let Some(default) = field.default {
            if !values.contains_key(field.name) {
                out.insert(field.name.to_string(), Value::String(default.to_string()));
            }
        }
    }

    for (key, value) in values {
        // Blank entries never survive in list values, declared or not.
        let mut value = strip_blank_entries(value.clone());

        let spec = schema.fields.iter().find(|f| f.name == key.as_str());
        if let Some(transform) = spec.and_then(|f| f.transform) {
            value = match transform {
                Transform::DropBlankEntries => strip_blank_entries(value),
            };
        }

        out.insert(key.clone(), value);
    }

    out
}

fn strip_blank_entries(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|item| match item {
                    Value::String(s) => !s.trim().is_empty(),
                    _ => true,
                })
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_source_has_schema() {
        for source in SourceType::ALL {
            let schema = schema_for(source);
            assert_eq!(schema.source, source);
        }
    }

    #[test]
    fn test_credential_free_sources() {
        assert!(credential_template(SourceType::File).is_none());
        assert!(credential_template(SourceType::GoogleSites).is_none());
        assert!(credential_template(SourceType::Web).is_none());
        assert!(credential_template(SourceType::Slack).is_some());
    }

    #[test]
    fn test_required_field_missing() {
        let schema = schema_for(SourceType::Jira);
        let values = Map::new();
        let errors = validate_values(&schema.fields, &values);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "jira_base_url");
    }

    #[test]
    fn test_blank_string_counts_as_missing() {
        let schema = schema_for(SourceType::Web);
        let mut values = Map::new();
        values.insert("base_url".to_string(), json!("   "));
        let errors = validate_values(&schema.fields, &values);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_select_rejects_unknown_option() {
        let schema = schema_for(SourceType::Web);
        let mut values = Map::new();
        values.insert("base_url".to_string(), json!("https://example.com"));
        values.insert("web_connector_type".to_string(), json!("spider"));
        let errors = validate_values(&schema.fields, &values);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "web_connector_type");
    }

    #[test]
    fn test_optional_fields_may_be_absent() {
        let schema = schema_for(SourceType::S3);
        let mut values = Map::new();
        values.insert("bucket_name".to_string(), json!("my-bucket"));
        assert!(validate_values(&schema.fields, &values).is_empty());
    }

    #[test]
    fn test_transform_strips_blank_list_entries() {
        let schema = schema_for(SourceType::Slack);
        let mut values = Map::new();
        values.insert("workspace".to_string(), json!("acme"));
        values.insert("channels".to_string(), json!(["general", "  ", "", "eng"]));

        let out = apply_transforms(&schema, &values);
        assert_eq!(out.get("channels").unwrap(), &json!(["general", "eng"]));
        // Non-list values untouched.
        assert_eq!(out.get("workspace").unwrap(), &json!("acme"));
    }

    #[test]
    fn test_transform_applies_select_default() {
        let schema = schema_for(SourceType::Web);
        let mut values = Map::new();
        values.insert("base_url".to_string(), json!("https://example.com"));

        let out = apply_transforms(&schema, &values);
        assert_eq!(out.get("web_connector_type").unwrap(), &json!("recursive"));
    }

    #[test]
    fn test_transform_keeps_explicit_select_value() {
        let schema = schema_for(SourceType::Web);
        let mut values = Map::new();
        values.insert("base_url".to_string(), json!("https://example.com"));
        values.insert("web_connector_type".to_string(), json!("sitemap"));

        let out = apply_transforms(&schema, &values);
        assert_eq!(out.get("web_connector_type").unwrap(), &json!("sitemap"));
    }
}
