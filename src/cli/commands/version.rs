//! `hub version`.

use serde::Serialize;

use super::print_json;
use crate::error::Result;
use crate::storage::schema::CURRENT_SCHEMA_VERSION;

#[derive(Serialize)]
struct VersionOutput {
    name: &'static str,
    version: &'static str,
    schema_version: i32,
    debug: bool,
}

/// Print the binary version and the database schema it writes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let output = VersionOutput {
        name: "hub",
        version: env!("CARGO_PKG_VERSION"),
        schema_version: CURRENT_SCHEMA_VERSION,
        debug: cfg!(debug_assertions),
    };
    if json {
        return print_json(&output);
    }

    print!("{} {} (schema v{})", output.name, output.version, output.schema_version);
    if output.debug {
        print!(" [debug]");
    }
    println!();
    Ok(())
}
