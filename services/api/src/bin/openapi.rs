//! services/api/src/bin/openapi.rs
//!
//! Writes the chat API's OpenAPI document to disk so clients can be generated
//! without running the server.
//!
//! Usage: `openapi [OUTPUT]`, where `OUTPUT` defaults to `openapi.json`.

use chat_api_lib::web::rest::ApiDoc;
use std::path::PathBuf;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let document = ApiDoc::openapi();
    std::fs::write(&output, document.to_pretty_json()?)?;
    println!(
        "Wrote {} paths to {}",
        document.paths.paths.len(),
        output.display()
    );
    Ok(())
}
