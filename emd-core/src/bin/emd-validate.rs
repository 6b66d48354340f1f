/// CLI: validates an EMD document against a schema document.
///
/// Usage:
///   emd-validate --schema schema.json document.json
///   emd-validate --schema schema.json < document.json
///
/// Exit codes: 0 valid, 1 invalid, 2 usage or input failure.
use std::io::Read;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut schema_path: Option<&str> = None;
    let mut document_path: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--schema" | "-s" => {
                i += 1;
                if i < args.len() {
                    schema_path = Some(&args[i]);
                }
            }
            "--help" | "-h" => {
                eprintln!("Usage: emd-validate --schema schema.json [document.json]");
                eprintln!("  Reads the document from file or stdin, prints diagnostics.");
                std::process::exit(0);
            }
            path => {
                document_path = Some(path);
            }
        }
        i += 1;
    }

    let Some(schema_path) = schema_path else {
        eprintln!("Missing --schema. Usage: emd-validate --schema schema.json [document.json]");
        std::process::exit(2);
    };

    let schema_str = std::fs::read_to_string(schema_path).unwrap_or_else(|e| {
        eprintln!("Cannot read {schema_path}: {e}");
        std::process::exit(2);
    });
    let schema_json: serde_json::Value = serde_json::from_str(&schema_str).unwrap_or_else(|e| {
        eprintln!("Invalid JSON in {schema_path}: {e}");
        std::process::exit(2);
    });
    let schema = emd_core::compile(&schema_json).unwrap_or_else(|e| {
        eprintln!("Invalid EMD schema: {e}");
        std::process::exit(2);
    });

    let document_str = match document_path {
        Some(path) => std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Cannot read {path}: {e}");
            std::process::exit(2);
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .unwrap_or_else(|e| {
                    eprintln!("Cannot read stdin: {e}");
                    std::process::exit(2);
                });
            buf
        }
    };

    let report = match emd_core::validate_json(&document_str, &schema) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    for diagnostic in &report.diagnostics {
        let path = if diagnostic.path.is_empty() {
            "root"
        } else {
            diagnostic.path.as_str()
        };
        eprintln!("{}: {}: {}", diagnostic.severity.as_str(), path, diagnostic.message);
    }

    if report.is_valid() {
        println!("valid ({} warnings)", report.warnings().count());
    } else {
        println!("invalid ({} errors)", report.errors().count());
        std::process::exit(1);
    }
}
