use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::debug;

use crate::api::{AppState, run_http_server};
use crate::catalog::{Catalog, SortKey, search_categories};
use crate::config::AppConfig;
use crate::core::{CalculatorRegistry, FieldKind, FormSession};
use crate::error::AppError;
use crate::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "calcdeck",
    about = "Run everyday calculators and browse the calculator catalog",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// List the built-in calculators and their fields
    List,
    /// Run one calculator
    Calc(CalcArgs),
    /// Browse catalog categories
    Catalog(CatalogArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Override the configured host
    #[arg(long)]
    pub host: Option<String>,
    /// Override the configured port
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug)]
pub struct CalcArgs {
    /// Calculator slug, e.g. pet-boarding-cost
    pub slug: String,
    /// Field value as key=value; repeat for each field
    #[arg(long = "set", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,
    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum CliSortKey {
    #[default]
    Alphabetical,
    MostCalculators,
    MostPopular,
}

impl From<CliSortKey> for SortKey {
    fn from(value: CliSortKey) -> Self {
        match value {
            CliSortKey::Alphabetical => SortKey::Alphabetical,
            CliSortKey::MostCalculators => SortKey::MostCalculators,
            CliSortKey::MostPopular => SortKey::MostPopular,
        }
    }
}

#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Catalog text file; defaults to CALCDECK_CATALOG or the built-in catalog
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Case-insensitive filter over names, descriptions and tags
    #[arg(long, short)]
    pub query: Option<String>,
    #[arg(long, value_enum, default_value_t = CliSortKey::Alphabetical)]
    pub sort: CliSortKey,
    /// Print matches as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in `{raw}`"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => serve(config, args).await,
        Command::List => {
            print!("{}", list_calculators(&CalculatorRegistry::standard()?));
            Ok(())
        }
        Command::Calc(args) => {
            print!("{}", run_calculator(&CalculatorRegistry::standard()?, &args)?);
            Ok(())
        }
        Command::Catalog(args) => {
            let path = args.file.clone().or(config.catalog_path);
            let catalog = match path {
                Some(path) => Catalog::load(&path)?,
                None => Catalog::builtin()?,
            };
            print!("{}", browse_catalog(&catalog, &args)?);
            Ok(())
        }
    }
}

async fn serve(mut config: AppConfig, mut args: ServeArgs) -> Result<(), AppError> {
    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    let addr = config.server.socket_addr()?;
    let state = AppState::from_config(&config)?;
    run_http_server(addr, state).await
}

fn list_calculators(registry: &CalculatorRegistry) -> String {
    let mut out = String::new();
    for schema in registry.schemas() {
        out.push_str(&format!("{}  {}\n", schema.slug, schema.name));
        for field in &schema.fields {
            let hint = match &field.kind {
                FieldKind::Number { min, max, integer } => {
                    let kind = if *integer { "integer" } else { "number" };
                    format!("{kind} {min}..={max}")
                }
                FieldKind::Choice { options } => options
                    .iter()
                    .map(|o| o.value)
                    .collect::<Vec<_>>()
                    .join("|"),
                FieldKind::Flag => "yes|no".to_string(),
                FieldKind::Date => "YYYY-MM-DD".to_string(),
            };
            let default = field
                .default
                .as_ref()
                .map(|d| format!(" (default {})", d.to_form_string()))
                .unwrap_or_default();
            let required = if field.required && field.default.is_none() { " *" } else { "" };
            out.push_str(&format!("    {}{}: {}{}\n", field.key, required, hint, default));
        }
    }
    out
}

fn run_calculator(registry: &CalculatorRegistry, args: &CalcArgs) -> Result<String, AppError> {
    let calculator = registry.get(&args.slug)?;
    let mut session = FormSession::new(calculator);
    for (key, value) in &args.set {
        session.set(key, value.as_str())?;
    }
    debug!(calculator = session.slug(), fields = args.set.len(), "running calculator");

    let result = session.calculate()?.clone();
    let presentation = session
        .presentation()
        .ok_or_else(|| AppError::BadRequest("calculation produced no result".to_string()))?;

    if args.json {
        let body = json!({
            "calculator": session.slug(),
            "inputs": session.values(),
            "result": result,
            "presentation": presentation,
        });
        Ok(format!("{}\n", serde_json::to_string_pretty(&body)?))
    } else {
        Ok(presentation.to_text())
    }
}

fn browse_catalog(catalog: &Catalog, args: &CatalogArgs) -> Result<String, AppError> {
    let query = args.query.as_deref().unwrap_or("");
    let summaries = search_categories(catalog, query, args.sort.into());

    if args.json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(&summaries)?));
    }
    if summaries.is_empty() {
        return Ok(format!("No categories match `{query}`.\n"));
    }
    let mut out = String::new();
    for summary in &summaries {
        out.push_str(&format!(
            "{} [{}]  {} calculators, {} popular\n    {}\n",
            summary.name,
            summary.slug,
            summary.calculator_count,
            summary.popular_count,
            summary.description
        ));
    }
    Ok(out)
}
