//! Print the JSON Schema that schema documents are validated against.

fn main() {
    let schema = mocksmith_core::schema_json_schema();
    match serde_json::to_string_pretty(&schema) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to serialize json schema: {err}");
            std::process::exit(1);
        }
    }
}
