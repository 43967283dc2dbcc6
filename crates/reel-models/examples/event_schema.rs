//! Print the JSON schemas of the notifications a presentation layer consumes.
//!
//! Run with: cargo run -p reel-models --example event_schema

use reel_models::{Scene, SceneEvent};

fn main() {
    let schemas = [
        ("SceneEvent", schemars::schema_for!(SceneEvent)),
        ("Scene", schemars::schema_for!(Scene)),
    ];

    for (name, schema) in schemas {
        println!("\n{}", "=".repeat(60));
        println!("{}", name);
        println!("{}", "=".repeat(60));
        match serde_json::to_string_pretty(&schema) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize schema for {}: {}", name, e),
        }
    }
}
