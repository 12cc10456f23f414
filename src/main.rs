use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::error;

use recast::{
    run_jobs, ConfigError, ConfigValue, Configuration, ConnectorRegistry, Format, MappingLoader,
    OperatorTable, RecastResult, TransformationJob,
};

/// Environment variables with this prefix become a configuration layer;
/// `__` separates nesting levels.
const ENV_PREFIX: &str = "RECAST_";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override a configuration key (repeatable): key.path=value
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the configured transformation jobs
    Run {
        /// Run only the named job
        #[arg(long)]
        job: Option<String>,

        /// Abort on the first failing job instead of continuing
        #[arg(long)]
        fail_fast: bool,
    },
    /// Print the fully merged, normalized configuration
    ShowConfig,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    match execute(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            error!("{}", err);
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}

fn execute(cli: Cli) -> RecastResult<i32> {
    let config = build_configuration(&cli)?;
    match cli.command {
        Commands::ShowConfig => {
            let rendered = config
                .root()
                .to_yaml_string()
                .map_err(recast::RecastError::from)?;
            print!("{}", rendered);
            Ok(0)
        }
        Commands::Run { job, fail_fast } => run_transformations(&config, job, fail_fast),
    }
}

/// Assembles the configuration layers: file, environment, CLI overrides.
fn build_configuration(cli: &Cli) -> RecastResult<Configuration> {
    let mut layers = Vec::new();
    if let Some(path) = &cli.config {
        layers.push(Configuration::layer_from_file(path).map_err(recast::RecastError::from)?);
    }
    layers.push(Configuration::layer_from_env(ENV_PREFIX));
    layers.push(Configuration::layer_from_pairs(&cli.overrides).map_err(recast::RecastError::from)?);
    Ok(Configuration::from_layers(layers))
}

fn run_transformations(
    config: &Configuration,
    only: Option<String>,
    fail_fast: bool,
) -> RecastResult<i32> {
    let mapping = MappingLoader::new(mapping_search_paths(config)?).load()?;
    let table = OperatorTable::standard();
    let registry = ConnectorRegistry::standard();

    let jobs_section = config
        .get("transformations")
        .map_err(|_| ConfigError::validation("missing 'transformations' configuration"))?;
    let jobs_object = jobs_section.as_object().map_err(recast::RecastError::from)?;

    let mut names: Vec<&String> = jobs_object.keys().collect();
    names.sort();
    if let Some(only) = &only {
        let only = only.to_lowercase();
        if !jobs_object.contains_key(&only) {
            return Err(ConfigError::not_found(format!("transformations.{}", only)).into());
        }
        names.retain(|name| **name == only);
    }

    let fail_fast = fail_fast
        || config
            .get_or("runner.fail_fast", ConfigValue::Bool(false))
            .as_bool()
            .unwrap_or(false);

    let mut jobs = Vec::with_capacity(names.len());
    for name in names {
        jobs.push(build_job(config, &registry, name)?);
    }

    let summary = run_jobs(jobs, &mapping, &table, fail_fast)?;
    Ok(if summary.all_succeeded() { 0 } else { 1 })
}

fn mapping_search_paths(config: &Configuration) -> RecastResult<Vec<PathBuf>> {
    match config.get("mappings.paths") {
        Err(_) => Ok(vec![PathBuf::from("mappings")]),
        Ok(value) => {
            let entries = value.as_array().map_err(recast::RecastError::from)?;
            entries
                .iter()
                .map(|entry| {
                    entry
                        .as_string()
                        .map(PathBuf::from)
                        .map_err(recast::RecastError::from)
                })
                .collect()
        }
    }
}

fn build_job(
    config: &Configuration,
    registry: &ConnectorRegistry,
    name: &str,
) -> RecastResult<TransformationJob> {
    let base = format!("transformations.{}", name);

    let input_format = format_setting(config, &base, "input_format")?;
    let output_format = format_setting(config, &base, "output_format")?;

    let extract = section_setting(config, &base, "extract")?;
    let load = section_setting(config, &base, "load")?;

    Ok(TransformationJob {
        name: name.to_string(),
        input_format,
        output_format,
        extractor: registry.extractor(&extract)?,
        loader: registry.loader(&load)?,
    })
}

/// A connector section, resolved through the template namespace.
fn section_setting(
    config: &Configuration,
    base: &str,
    key: &str,
) -> RecastResult<ConfigValue> {
    let value = config.get_with_template_fallback(&format!("{}.{}", base, key), ConfigValue::Null);
    if value == ConfigValue::Null {
        return Err(ConfigError::validation(format!("{} has no {} configuration", base, key)).into());
    }
    Ok(value)
}

/// A format setting: either a bare name or a {name, version} mapping.
fn format_setting(config: &Configuration, base: &str, key: &str) -> RecastResult<Format> {
    let value = config.get_with_template_fallback(&format!("{}.{}", base, key), ConfigValue::Null);
    match &value {
        ConfigValue::String(name) => Ok(Format::named(name.clone())),
        ConfigValue::Object(_) => {
            let name = value.get("name").map_err(recast::RecastError::from)?;
            let name = name.as_string().map_err(recast::RecastError::from)?;
            let version = match value.get("version") {
                Err(_) => "1".to_string(),
                Ok(version) => match version {
                    ConfigValue::String(s) => s.clone(),
                    ConfigValue::Integer(i) => i.to_string(),
                    other => {
                        return Err(ConfigError::validation(format!(
                            "{}.{}.version must be a scalar, found {}",
                            base,
                            key,
                            other.type_name()
                        ))
                        .into())
                    }
                },
            };
            Ok(Format::new(name, version))
        }
        _ => Err(ConfigError::validation(format!("{} has no {} configured", base, key)).into()),
    }
}
