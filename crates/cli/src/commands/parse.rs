use std::path::Path;

use crate::{fail_with_syntax_error, read_source, OutputFormat};

/// The syntax tree is always printed as JSON; `--output` only shapes errors.
pub(crate) fn cmd_parse(file: &Path, output: OutputFormat, quiet: bool) {
    let (text, name) = read_source(file, output, quiet);
    match cascade_syntax::parse(&text, &name) {
        Ok(root) => {
            let pretty = serde_json::to_string_pretty(&root)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        Err(e) => fail_with_syntax_error(&e, output, quiet),
    }
}
