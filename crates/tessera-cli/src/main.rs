//! Tessera CLI
//!
//! Command-line interface for inspecting document flattening and primary keys.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use tessera_cli::cli::{Cli, Command, PkAction};
use tessera_cli::handlers;
use tessera_fts::AnalyzerRegistry;

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize logging; library `log` records are bridged into tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,tessera_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let registry = AnalyzerRegistry::new();
    if let Some(path) = &args.analyzers {
        let names = handlers::load_analyzers(&registry, path)
            .with_context(|| format!("loading analyzers from {}", path.display()))?;
        tracing::info!(count = names.len(), "Loaded analyzer definitions");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.command {
        Command::Fields {
            config,
            document,
            terms,
        } => {
            let count =
                handlers::cmd_fields(&registry, config.as_deref(), &document, terms, &mut out)?;
            tracing::info!(count, document = %document.display(), "Flattened document");
        }
        Command::Pk { action } => match action {
            PkAction::Encode { id } => handlers::cmd_pk_encode(id, &mut out)?,
            PkAction::Decode { key } => handlers::cmd_pk_decode(&key, &mut out)?,
        },
    }

    Ok(())
}
