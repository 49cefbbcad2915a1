mod commands;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Diagnostic projection for the check subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DiagnosticFormat {
    Records,
    Monaco,
    Codemirror,
}

/// Cascade schema language frontend.
#[derive(Parser)]
#[command(name = "cascade", version, about = "Cascade schema language frontend")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log frontend activity to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the token stream of a schema file
    Tokens {
        /// Path to the .cascade source file, or - for stdin
        file: PathBuf,
    },

    /// Parse a schema file and print its syntax tree as JSON
    Parse {
        /// Path to the .cascade source file, or - for stdin
        file: PathBuf,
    },

    /// Check a schema file for syntax errors
    Check {
        /// Path to the .cascade source file, or - for stdin
        file: PathBuf,
        /// Diagnostic shape printed on failure
        #[arg(long, default_value = "records", value_enum)]
        format: DiagnosticFormat,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Tokens { file } => {
            commands::tokens::cmd_tokens(&file, cli.output, cli.quiet);
        }
        Commands::Parse { file } => {
            commands::parse::cmd_parse(&file, cli.output, cli.quiet);
        }
        Commands::Check { file, format } => {
            commands::check::cmd_check(&file, format, cli.output, cli.quiet);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read a source file, or stdin when the path is `-`. Returns the text and
/// the name diagnostics should attribute it to.
pub(crate) fn read_source(file: &Path, output: OutputFormat, quiet: bool) -> (String, String) {
    if file == Path::new("-") {
        let mut text = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut text) {
            report_error(&format!("error reading stdin: {}", e), output, quiet);
            process::exit(1);
        }
        return (text, cascade_syntax::frontend::DEFAULT_SOURCE_NAME.to_owned());
    }
    match std::fs::read_to_string(file) {
        Ok(text) => (text, file.display().to_string()),
        Err(e) => {
            let msg = format!("error reading file '{}': {}", file.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

/// Print a syntax error to stderr in the chosen format and exit 1.
pub(crate) fn fail_with_syntax_error(
    err: &cascade_syntax::SyntaxError,
    output: OutputFormat,
    quiet: bool,
) -> ! {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::to_string_pretty(&err.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", err));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("{}", err);
            }
        }
    }
    process::exit(1);
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
