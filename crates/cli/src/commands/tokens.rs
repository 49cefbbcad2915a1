use std::path::Path;

use cascade_syntax::TokenKind;

use crate::{fail_with_syntax_error, read_source, OutputFormat};

pub(crate) fn cmd_tokens(file: &Path, output: OutputFormat, quiet: bool) {
    let (text, name) = read_source(file, output, quiet);
    let tokens = match cascade_syntax::tokenize(&text, &name) {
        Ok(t) => t,
        Err(e) => fail_with_syntax_error(&e, output, quiet),
    };

    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&tokens)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", json);
        }
        OutputFormat::Text => {
            for token in &tokens {
                if token.kind == TokenKind::Eof {
                    println!("{:>8}  {:?}", token.location.to_string(), token.kind);
                    continue;
                }
                println!(
                    "{:>8}  {:<12} {}",
                    token.location.to_string(),
                    format!("{:?}", token.kind),
                    token.raw
                );
            }
        }
    }
}
