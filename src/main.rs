//! Lexscope CLI - inspect the scopes and bindings of JavaScript sources

mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use lexscope::config::{self, LexscopeConfig};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "lexscope")]
#[command(version)]
#[command(about = "Lexical scope analysis for JavaScript")]
#[command(long_about = r#"
Lexscope parses JavaScript, builds its scope tree and answers binding questions:
  • Which names does a file use without declaring them?
  • Where is the variable at this position declared?
  • Which identifiers refer to the same binding?
  • What does a module import and export?

Example usage:
  lexscope globals src/
  lexscope decl app.js foo --line 12 --column 8
  lexscope refs app.js foo --offset 240
  lexscope exports lib.mjs --format json
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    format: OutputMode,

    /// Path to the config file (defaults to ./lexscope.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Analyse files containing syntax errors instead of rejecting them
    #[arg(long, global = true)]
    allow_syntax_errors: bool,

    #[command(subcommand)]
    command: Commands,
}

/// A source position, either as a byte offset or as line and column
#[derive(Args, Debug, Clone)]
pub struct Position {
    /// Byte offset into the file
    #[arg(long, conflicts_with_all = ["line", "column"])]
    pub offset: Option<usize>,

    /// 1-based line
    #[arg(long, requires = "column")]
    pub line: Option<usize>,

    /// 1-based column
    #[arg(long, requires = "line")]
    pub column: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the scope tree of a file
    Scopes {
        file: PathBuf,
    },

    /// List references to undeclared names across files and directories
    Globals {
        /// Files or directories to analyse
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Also report well-known host globals (Object, console, ...)
        #[arg(long)]
        all: bool,

        /// Number of worker threads (defaults to the number of CPUs)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// List the import bindings of a module
    Imports {
        file: PathBuf,
    },

    /// List the export bindings of a module
    Exports {
        file: PathBuf,

        /// Leave out `export ... from` re-exports
        #[arg(long)]
        no_re_exports: bool,
    },

    /// Find the declaration a name resolves to at a position
    Decl {
        file: PathBuf,
        name: String,
        #[command(flatten)]
        position: Position,
    },

    /// Find all declarations and references of the binding a name resolves to
    Refs {
        file: PathBuf,
        name: String,
        #[command(flatten)]
        position: Position,
    },

    /// Show the statement enclosing a position
    Statement {
        file: PathBuf,
        #[command(flatten)]
        position: Position,
    },

    /// Show the nodes spanning all of the given lines
    Lines {
        file: PathBuf,

        /// 1-based line numbers
        #[arg(required = true, num_args = 1.., value_delimiter = ',')]
        lines: Vec<usize>,
    },

    /// Write a default lexscope.toml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    Text,
    Json,
}

impl OutputMode {
    pub fn is_human(self) -> bool {
        self == OutputMode::Text
    }
}

/// Print `data` wrapped in the JSON envelope; no-op in text mode
pub fn emit_success(
    mode: OutputMode,
    command: &str,
    data: serde_json::Value,
) -> anyhow::Result<()> {
    if mode == OutputMode::Json {
        let envelope = serde_json::json!({
            "ok": true,
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

fn emit_error(mode: OutputMode, error: &anyhow::Error) {
    if mode == OutputMode::Json {
        let envelope = serde_json::json!({
            "ok": false,
            "error": format!("{:#}", error),
        });
        println!("{}", envelope);
    } else {
        lexscope::ui::error(&format!("{:#}", error));
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mode = cli.format;
    if let Err(e) = run(cli) {
        emit_error(mode, &e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    if cli.allow_syntax_errors {
        settings.analysis.allow_syntax_errors = true;
    }
    let ctx = commands::Context {
        mode: cli.format,
        config: settings,
    };

    match cli.command {
        Commands::Scopes { file } => commands::run_scopes(&ctx, &file),
        Commands::Globals { paths, all, jobs } => commands::run_globals(&ctx, &paths, all, jobs),
        Commands::Imports { file } => commands::run_imports(&ctx, &file),
        Commands::Exports {
            file,
            no_re_exports,
        } => commands::run_exports(&ctx, &file, !no_re_exports),
        Commands::Decl {
            file,
            name,
            position,
        } => commands::run_decl(&ctx, &file, &name, &position),
        Commands::Refs {
            file,
            name,
            position,
        } => commands::run_refs(&ctx, &file, &name, &position),
        Commands::Statement { file, position } => commands::run_statement(&ctx, &file, &position),
        Commands::Lines { file, lines } => commands::run_lines(&ctx, &file, &lines),
        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            commands::run_init(&ctx, &path, &LexscopeConfig::default(), force)
        }
    }
}
