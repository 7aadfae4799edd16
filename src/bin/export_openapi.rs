//! Write the OpenAPI document as JSON
//!
//! Usage:
//!   export_openapi                       # stdout
//!   export_openapi --output openapi.json

use anyhow::Context;
use payment_system::gateway::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("Failed to serialize OpenAPI document")?;

    let args: Vec<String> = std::env::args().collect();
    match args.iter().position(|a| a == "--output") {
        Some(i) => {
            let path = args.get(i + 1).context("--output needs a path")?;
            std::fs::write(path, &json).with_context(|| format!("Failed to write {}", path))?;
            eprintln!("OpenAPI document written to {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
