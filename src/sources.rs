//! The `sources` command: what can be connected and what each source
//! needs, derived entirely from the schema registry.

use anyhow::Result;

use crate::models::{InputType, SourceType};
use crate::schema;

pub fn run_sources(verbose: bool) -> Result<()> {
    println!(
        "{:<15} {:<15} {:<12} {:<8} {:<12} {}",
        "SOURCE", "NAME", "CREDENTIAL", "OAUTH", "INPUT", "FIELDS"
    );
    for source in SourceType::ALL {
        let connection = schema::schema_for(source);
        let credential = if schema::credential_template(source).is_some() {
            "required"
        } else {
            "none"
        };
        let oauth = if schema::oauth_supported(source) {
            "yes"
        } else {
            "no"
        };
        let input = match schema::input_type_for(source) {
            InputType::LoadState => "load_state",
            InputType::Poll => "poll",
        };
        println!(
            "{:<15} {:<15} {:<12} {:<8} {:<12} {}",
            source,
            source.display_name(),
            credential,
            oauth,
            input,
            connection.fields.len()
        );
        if verbose {
            for field in &connection.fields {
                println!(
                    "    {:<24} {}{}",
                    field.name,
                    field.label,
                    if field.required { " (required)" } else { "" }
                );
            }
        }
    }
    Ok(())
}
