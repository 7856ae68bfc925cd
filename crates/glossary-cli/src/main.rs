//! Glossary CLI - ingest SKOS taxonomies and query them

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use glossary_core::config::Config;
use glossary_core::domain::glossary::{
    ConceptView, EntityView, GlossaryRepository, GlossaryService, GraphGate,
};
use glossary_core::domain::ingestion::{DatasetOrchestrator, InitDatasetsReport};
use glossary_core::infrastructure::glossary::SqliteGlossaryRepository;
use glossary_core::infrastructure::source::HttpSourceFetcher;
use glossary_core::storage::{Database, DatabaseConfig};
use serde::Serialize;
use tracing::warn;

#[derive(Parser)]
#[command(name = "glossary")]
#[command(author, version, about = "SKOS taxonomy ingestion and query tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Label language (falls back to English)
    #[arg(short, long, global = true)]
    lang: Option<String>,

    /// Database file (overrides storage.database_path)
    #[arg(long, global = true)]
    database: Option<PathBuf>,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the glossary from the configured datasets
    Init {
        /// Download every dataset again instead of using cached copies
        #[arg(long)]
        reload: bool,
        /// API key (must match GLOSSARY_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// List concept schemes
    Schemes,

    /// Show a concept scheme with its collections and concepts
    Scheme { iri: String },

    /// List the collections of a concept scheme
    Collections { scheme_iri: String },

    /// List the concepts of a concept scheme
    Concepts { scheme_iri: String },

    /// Show a collection with its members
    Collection { iri: String },

    /// Show a concept with its schemes and relations
    Concept { iri: String },

    /// Search concepts by prefLabel and altLabels
    Search { term: String },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show configuration file path
    Path,
}

/// Everything a glossary command needs, opened once per invocation
struct App {
    config: Config,
    db: Database,
    repository: Arc<SqliteGlossaryRepository>,
    gate: GraphGate,
}

impl App {
    async fn open(database: Option<PathBuf>) -> anyhow::Result<Self> {
        let config = Config::load()?;
        let path = database.unwrap_or_else(|| config.storage.database_path.clone());
        let db = Database::new(
            DatabaseConfig::with_path(path).max_connections(config.storage.max_connections),
        )
        .await?;
        let repository = Arc::new(SqliteGlossaryRepository::new(db.pool().clone()));

        Ok(Self {
            config,
            db,
            repository,
            gate: GraphGate::new(),
        })
    }

    fn service(&self) -> GlossaryService<SqliteGlossaryRepository> {
        GlossaryService::new(self.repository.clone(), self.gate.clone())
            .with_case_sensitive(self.config.search.case_sensitive)
    }

    fn orchestrator(&self) -> anyhow::Result<DatasetOrchestrator<SqliteGlossaryRepository>> {
        let fetcher = HttpSourceFetcher::new(self.config.ingestion.timeout_secs)?;
        Ok(DatasetOrchestrator::new(
            self.repository.clone(),
            Arc::new(fetcher),
            self.config.ingestion.datasets.clone(),
            self.gate.clone(),
            self.config.ingestion.data_dir.clone(),
        ))
    }
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("glossary=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        if let Some(core) = e.downcast_ref::<glossary_core::Error>() {
            eprintln!("  Code: {}", core.code());
            if let Some(suggestion) = core.suggestion() {
                eprintln!("  Suggestion: {}", suggestion);
            }
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let out = Output {
        format: cli.format,
        quiet: cli.quiet,
    };
    let lang = cli.lang.as_deref();

    match cli.command {
        Commands::Config { action } => return cmd_config(action, out.quiet),
        Commands::Doctor => return cmd_doctor(cli.database, out.quiet).await,
        _ => {}
    }

    let app = App::open(cli.database).await?;
    let result = match cli.command {
        Commands::Init { reload, api_key } => cmd_init(&app, reload, api_key.as_deref(), out).await,
        Commands::Schemes => cmd_schemes(&app, lang, out).await,
        Commands::Scheme { iri } => cmd_scheme(&app, &iri, lang, out).await,
        Commands::Collections { scheme_iri } => {
            let collections = app.service().get_collections(&scheme_iri, lang).await?;
            out.emit(&collections, |c| print_entities("Collections", c))
        }
        Commands::Concepts { scheme_iri } => {
            let concepts = app.service().get_concepts(&scheme_iri, lang).await?;
            out.emit(&concepts, |c| print_concepts("Concepts", c))
        }
        Commands::Collection { iri } => cmd_collection(&app, &iri, lang, out).await,
        Commands::Concept { iri } => cmd_concept(&app, &iri, lang, out).await,
        Commands::Search { term } => cmd_search(&app, &term, lang, out).await,
        Commands::Config { .. } | Commands::Doctor => Ok(()),
    };

    app.db.close().await;
    result
}

// ============================================================================
// Output
// ============================================================================

#[derive(Clone, Copy)]
struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    /// Print `value` as JSON, or hand it to `text` for the text format
    fn emit<T: Serialize + ?Sized>(&self, value: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => text(value),
        }
        Ok(())
    }
}

fn print_entities(title: &str, entities: &[EntityView]) {
    println!("{} ({}):", title, entities.len());
    for e in entities {
        println!("  {}  {}  {}", e.iri, e.notation, e.pref_label);
    }
}

fn print_concepts(title: &str, concepts: &[ConceptView]) {
    println!("{} ({}):", title, concepts.len());
    for c in concepts {
        println!("  {}  {}  {}", c.iri, c.notation, c.pref_label);
    }
}

fn print_concept_details(concept: &ConceptView) {
    println!("IRI: {}", concept.iri);
    println!("Identifier: {}", concept.identifier);
    println!("Notation: {}", concept.notation);
    println!("Label: {}", concept.pref_label);
    if !concept.alt_labels.is_empty() {
        println!("Alternative labels: {}", concept.alt_labels.join("; "));
    }
    if !concept.scope_note.is_empty() {
        println!("Scope note: {}", concept.scope_note);
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_init(
    app: &App,
    reload: bool,
    api_key: Option<&str>,
    out: Output,
) -> anyhow::Result<()> {
    app.config.api.authorize(api_key)?;

    let orchestrator = app.orchestrator()?;
    if !out.quiet && out.format == OutputFormat::Text {
        println!(
            "Loading {} dataset(s){}...",
            orchestrator.datasets().len(),
            if reload { " (reload)" } else { "" }
        );
    }

    let report = orchestrator.init_datasets(reload).await?;
    out.emit(&report, |r| print_report(r, out.quiet))
}

fn print_report(report: &InitDatasetsReport, quiet: bool) {
    if quiet {
        return;
    }
    println!("Saved datasets ({}):", report.saved.len());
    for d in &report.saved {
        println!("  [OK] {} ({})", d.name, d.url);
    }
    if !report.failed.is_empty() {
        println!("Failed datasets ({}):", report.failed.len());
        for f in &report.failed {
            println!("  [!!] {} ({}): {}", f.name, f.url, f.error);
        }
    }
    println!("Completed at {}", report.completed_at.to_rfc3339());
}

async fn cmd_schemes(app: &App, lang: Option<&str>, out: Output) -> anyhow::Result<()> {
    let schemes = app.service().get_concept_schemes(lang).await?;
    out.emit(&schemes, |schemes| {
        if schemes.is_empty() {
            if !out.quiet {
                println!("No concept schemes found.");
                println!("\nLoad datasets with: glossary init --api-key <key>");
            }
            return;
        }
        if !out.quiet {
            println!("Concept schemes:");
        }
        for s in schemes {
            println!("  {}  {}  {}", s.iri, s.notation, s.pref_label);
        }
    })
}

async fn cmd_scheme(app: &App, iri: &str, lang: Option<&str>, out: Output) -> anyhow::Result<()> {
    let scheme = app.service().get_concept_scheme(iri, lang).await?;
    out.emit(&scheme, |s| {
        println!("IRI: {}", s.scheme.iri);
        println!("Notation: {}", s.scheme.notation);
        println!("Label: {}", s.scheme.pref_label);
        if !s.scheme.scope_note.is_empty() {
            println!("Scope note: {}", s.scheme.scope_note);
        }
        print_entities("Collections", &s.collections);
        print_concepts("Concepts", &s.concepts);
    })
}

async fn cmd_collection(
    app: &App,
    iri: &str,
    lang: Option<&str>,
    out: Output,
) -> anyhow::Result<()> {
    let collection = app.service().get_collection(iri, lang).await?;
    out.emit(&collection, |c| {
        println!("IRI: {}", c.collection.iri);
        println!("Notation: {}", c.collection.notation);
        println!("Label: {}", c.collection.pref_label);
        print_entities("Collections", &c.collections);
        print_concepts("Concepts", &c.concepts);
    })
}

async fn cmd_concept(app: &App, iri: &str, lang: Option<&str>, out: Output) -> anyhow::Result<()> {
    let concept = app.service().get_concept(iri, lang).await?;
    out.emit(&concept, |c| {
        print_concept_details(&c.concept);
        println!("Concept schemes: {}", c.concept_schemes.join(", "));
        println!("Relations ({}):", c.relations.len());
        for r in &c.relations {
            println!(
                "  {} {} {}",
                r.source_concept_iri, r.relation_type, r.target_concept_iri
            );
        }
    })
}

async fn cmd_search(app: &App, term: &str, lang: Option<&str>, out: Output) -> anyhow::Result<()> {
    let results = app.service().search(term, lang).await?;
    out.emit(&results, |results| {
        if results.is_empty() {
            if !out.quiet {
                println!("No concepts match '{}'.", term);
            }
            return;
        }
        print_concepts("Matches", results);
    })
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(database: Option<PathBuf>, quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("Glossary Health Check");
        println!("=====================");
        println!();
    }

    let mut all_ok = true;

    // Check configuration
    match Config::load() {
        Ok(config) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
                println!("     Datasets: {}", config.ingestion.datasets.len());
            }

            match config.api.redacted_api_key() {
                Ok(Some(redacted)) => {
                    if !quiet {
                        println!("[OK] API Key: Configured ({})", redacted);
                    }
                }
                Ok(None) => {
                    all_ok = false;
                    if !quiet {
                        warn!("API Key: Not configured");
                        println!("[!!] API Key: Not configured");
                        println!("     Set the GLOSSARY_API_KEY environment variable");
                    }
                }
                Err(e) => {
                    all_ok = false;
                    if !quiet {
                        println!("[!!] API Key: Error - {}", e);
                    }
                }
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Configuration: Error - {}", e);
            }
        }
    }

    // Check config file location
    if !quiet {
        match Config::config_path() {
            Ok(path) => {
                if path.exists() {
                    println!("[OK] Config file: {}", path.display());
                } else {
                    println!("[--] Config file: {} (using defaults)", path.display());
                }
            }
            Err(e) => {
                println!("[!!] Config file: Error - {}", e);
            }
        }
    }

    // Check database
    match App::open(database).await {
        Ok(app) => match app.db.health_check().await {
            Ok(()) => {
                if !quiet {
                    println!("[OK] Database: Connected");
                    println!("     Path: {}", app.db.path().display());

                    match app.db.migration_status().await {
                        Ok(status) if status.needs_migration => println!(
                            "[!!] Database: Migrations pending (v{} -> v{})",
                            status.current_version, status.target_version
                        ),
                        Ok(status) => println!("[OK] Database: Schema v{}", status.current_version),
                        Err(e) => println!("[!!] Database: Migration check failed - {}", e),
                    }

                    match app.repository.stats().await {
                        Ok(stats) => {
                            println!("     Concept schemes: {}", stats.concept_schemes);
                            println!("     Concepts: {}", stats.concepts);
                            println!("     Collections: {}", stats.collections);
                            println!("     Relations: {}", stats.semantic_relations);
                        }
                        Err(e) => println!("[!!] Database: Stats unavailable - {}", e),
                    }
                }
                app.db.close().await;
            }
            Err(e) => {
                all_ok = false;
                if !quiet {
                    println!("[!!] Database: Health check failed - {}", e);
                }
            }
        },
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Database: Failed to initialize - {}", e);
            }
        }
    }

    // Summary
    if !quiet {
        println!();
        if all_ok {
            println!("All checks passed!");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }

    Ok(())
}
