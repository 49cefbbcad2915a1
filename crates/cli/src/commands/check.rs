use std::path::Path;
use std::process;

use cascade_syntax::DiagnosticCollection;

use crate::{read_source, DiagnosticFormat, OutputFormat};

pub(crate) fn cmd_check(file: &Path, format: DiagnosticFormat, output: OutputFormat, quiet: bool) {
    let (text, name) = read_source(file, output, quiet);
    let diagnostics = cascade_syntax::validate(&text, &name);

    if diagnostics.is_empty() {
        match output {
            OutputFormat::Json => println!("{}", serde_json::json!({ "valid": true })),
            OutputFormat::Text => {
                if !quiet {
                    println!("valid");
                }
            }
        }
        return;
    }

    tracing::debug!(file = %name, count = diagnostics.count(), "check failed");
    match (output, format) {
        (OutputFormat::Text, DiagnosticFormat::Records) => {
            if !quiet {
                for d in &diagnostics {
                    println!("{}:{}", name, d);
                }
            }
        }
        (OutputFormat::Json, DiagnosticFormat::Records) => {
            let value = serde_json::json!({
                "valid": false,
                "diagnostics": diagnostics.to_json(),
            });
            print_json(&value);
        }
        (_, DiagnosticFormat::Monaco | DiagnosticFormat::Codemirror) => {
            print_json(&projection(&diagnostics, format))
        }
    }
    process::exit(1);
}

fn projection(diagnostics: &DiagnosticCollection, format: DiagnosticFormat) -> serde_json::Value {
    let value = match format {
        DiagnosticFormat::Records => return diagnostics.to_json(),
        DiagnosticFormat::Monaco => serde_json::to_value(diagnostics.to_monaco()),
        DiagnosticFormat::Codemirror => serde_json::to_value(diagnostics.to_codemirror()),
    };
    value.unwrap_or_else(|e| serde_json::json!({ "error": format!("serialization: {}", e) }))
}

fn print_json(value: &serde_json::Value) {
    let pretty = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
    println!("{}", pretty);
}
