//! Swagger Models CLI
//!
//! Compiles a Swagger 2.0 contract into its resolved model and prints it as
//! JSON, as a GraphViz dependency graph, or as a short summary.

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use serde_json::json;
use std::path::PathBuf;
use swagger_models::{compile, Compiled, GeneratorConfig, SwaggerDocument};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "swagger-models")]
#[command(about = "Resolve the type model of a Swagger 2.0 contract")]
struct Cli {
    /// Path to the swagger.json (overrides the config file)
    swagger: Option<PathBuf>,

    /// Config file layered over the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only keep these operation groups (comma separated)
    #[arg(long, value_delimiter = ',')]
    include_tags: Vec<String>,

    /// Drop these operation groups (comma separated)
    #[arg(long, value_delimiter = ',')]
    exclude_tags: Vec<String>,

    /// Keep models no operation group uses
    #[arg(long)]
    keep_unused: bool,

    /// Group for untagged operations
    #[arg(long)]
    default_tag: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: Format,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Dot,
    Summary,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_ref().and_then(|p| p.to_str());
    let mut config = GeneratorConfig::load_from(config_path).context("loading configuration")?;

    if let Some(swagger) = cli.swagger {
        config.input.swagger = Some(swagger);
    }
    if !cli.include_tags.is_empty() {
        config.filter.include_tags = cli.include_tags;
    }
    if !cli.exclude_tags.is_empty() {
        config.filter.exclude_tags = cli.exclude_tags;
    }
    if cli.keep_unused {
        config.filter.ignore_unused_models = false;
    }
    if let Some(tag) = cli.default_tag {
        config.filter.default_tag = tag;
    }

    let Some(swagger) = config.input.swagger.clone() else {
        bail!("no swagger document given (pass a path or set input.swagger)");
    };
    let document = SwaggerDocument::from_path(&swagger)
        .with_context(|| format!("reading {}", swagger.display()))?;

    let compiled = compile(&document, &config.filter);

    let rendered = match cli.format {
        Format::Json => render_json(&compiled)?,
        Format::Dot => compiled.models.to_dot(),
        Format::Summary => render_summary(&compiled),
    };

    match cli.output {
        Some(path) => std::fs::write(&path, rendered)
            .with_context(|| format!("writing {}", path.display()))?,
        None => print!("{}", rendered),
    }
    Ok(())
}

fn render_json(compiled: &Compiled) -> anyhow::Result<String> {
    let models: Vec<_> = compiled.models.iter().collect();
    let groups: Vec<_> = compiled.groups.iter().collect();
    let dump = json!({
        "models": models,
        "groups": groups,
        "diagnostics": compiled.diagnostics.all(),
        "removed": compiled.report,
    });
    Ok(serde_json::to_string_pretty(&dump)? + "\n")
}

fn render_summary(compiled: &Compiled) -> String {
    let mut out = String::new();

    out.push_str(&format!("Models ({}):\n", compiled.models.len()));
    for model in compiled.models.iter() {
        let kind = model.shape.kind();
        let deps = compiled.models.class_names(&model.dependencies);
        if deps.is_empty() {
            out.push_str(&format!("  {} [{}]\n", model.class_name, kind));
        } else {
            out.push_str(&format!("  {} [{}] -> {}\n", model.class_name, kind, deps.join(", ")));
        }
    }

    out.push_str(&format!("\nGroups ({}):\n", compiled.groups.len()));
    for group in compiled.groups.iter() {
        out.push_str(&format!(
            "  {} ({} operation(s))\n",
            group.name,
            group.operations.len()
        ));
    }

    if !compiled.report.is_empty() {
        out.push_str(&format!(
            "\nRemoved {} group(s) and {} model(s)\n",
            compiled.report.removed_groups.len(),
            compiled.report.removed_models.len()
        ));
    }
    if !compiled.diagnostics.is_empty() {
        out.push('\n');
        out.push_str(&compiled.diagnostics.format_all());
    }
    out
}
