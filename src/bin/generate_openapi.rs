//! Writes the OpenAPI document of the HTTP API.
//!
//! Usage:
//!   cargo run --bin generate_openapi > openapi.json
//!   cargo run --bin generate_openapi -- --output openapi.json

use std::{
    env, fs,
    io::{self, Write},
    path::PathBuf,
};

use fishhub::api::handlers::ApiDoc;
use utoipa::OpenApi;

fn main() {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .expect("Failed to serialise OpenAPI document");

    let args: Vec<String> = env::args().collect();
    let output_path: Option<PathBuf> = args
        .windows(2)
        .find(|w| w[0] == "--output")
        .map(|w| PathBuf::from(&w[1]));

    let Some(path) = output_path else {
        io::stdout()
            .write_all(json.as_bytes())
            .expect("Failed to write to stdout");
        return;
    };

    if let Err(e) = fs::write(&path, &json) {
        eprintln!("Error writing to {}: {e}", path.display());
        std::process::exit(1);
    }
    eprintln!("OpenAPI document written to {}", path.display());
}
