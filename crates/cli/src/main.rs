//! yang-docgen CLI
//!
//! Command-line interface for fetching YANG models from NETCONF devices and
//! generating option documents for network resource modules.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use yang_docgen_common::documentation::{embed_config, load_yaml, render_options, select_path};
use yang_docgen_converter::{
    ChoiceStyle, Converter, ConverterOptions, KeyStyle, RequiredPolicy, SchemaContext,
};
use yang_docgen_fetcher::{
    write_schemas, FetchResult, SchemaDescriptor, SchemaStore, SshConnection, SshTarget,
    ALL_SCHEMAS,
};

#[derive(Parser)]
#[command(name = "yang-docgen")]
#[command(version, about = "Fetch YANG models over NETCONF and generate option documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// How to reach the NETCONF device
#[derive(Args, Debug, Clone)]
struct DeviceArgs {
    /// Device host name or address
    #[arg(long)]
    host: String,

    /// NETCONF SSH port (ssh default if not specified)
    #[arg(short, long)]
    port: Option<u16>,

    /// Login user
    #[arg(short, long)]
    username: Option<String>,

    /// Extra ssh option, may be repeated (e.g. StrictHostKeyChecking=no)
    #[arg(short = 'o', long = "ssh-option")]
    ssh_options: Vec<String>,
}

impl DeviceArgs {
    fn target(&self) -> SshTarget {
        SshTarget {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            ssh_options: self.ssh_options.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the modules the device can serve
    #[command(after_help = "EXAMPLES:\n  \
        yang-docgen list --host router1 --username admin\n\n  \
        # Full catalog entries (revision, format, namespace)\n  \
        yang-docgen list --host router1 --json")]
    List {
        #[command(flatten)]
        device: DeviceArgs,

        /// Print the device's catalog entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch a module and everything it imports
    #[command(after_help = "EXAMPLES:\n  \
        # Fetch one model with its imports into ./yang\n  \
        yang-docgen fetch --host router1 --name openconfig-interfaces --dir ./yang\n\n  \
        # Fetch every model, recording failures instead of stopping\n  \
        yang-docgen fetch --host router1 --name all --continue-on-failure --json")]
    Fetch {
        #[command(flatten)]
        device: DeviceArgs,

        /// Module to fetch, or "all" (lists supported modules if not specified)
        #[arg(short, long)]
        name: Option<String>,

        /// Record failed modules and keep going
        #[arg(long)]
        continue_on_failure: bool,

        /// Directory to write <module>.yang files into
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Print the fetch result (or the catalog, without --name) as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a resolved schema document into an options document
    #[command(after_help = "EXAMPLES:\n  \
        # Whole module\n  \
        yang-docgen convert --schema interfaces.json --module example-interfaces\n\n  \
        # Only the interface list, choices as a single key\n  \
        yang-docgen convert \\\n    \
        --schema interfaces.json \\\n    \
        --module example-interfaces \\\n    \
        --path /interfaces/interface \\\n    \
        --choices enumerate \\\n    \
        --output interfaces.yml")]
    Convert {
        /// Resolved schema document (JSON)
        #[arg(short, long)]
        schema: PathBuf,

        /// Module to convert
        #[arg(short, long)]
        module: String,

        /// Data path to start from (whole module if not specified)
        #[arg(long)]
        path: Option<String>,

        /// Converter options file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// How the required flag is derived
        #[arg(long)]
        required: Option<RequiredArg>,

        /// How choices are represented
        #[arg(long)]
        choices: Option<ChoiceArg>,

        /// How option keys are spelled
        #[arg(long)]
        keys: Option<KeyArg>,

        /// Longest typedef/leafref chain to follow
        #[arg(long)]
        max_type_depth: Option<usize>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Embed an options document into a module descriptor's DOCUMENTATION
    #[command(after_help = "EXAMPLES:\n  \
        yang-docgen embed \\\n    \
        --options interfaces.yml \\\n    \
        --descriptor myos_interfaces.yml \\\n    \
        --key interfaces")]
    Embed {
        /// Options document (YAML)
        #[arg(short = 'i', long)]
        options: PathBuf,

        /// Dotted key selecting the part of the options document to embed
        #[arg(short, long, default_value = "")]
        key: String,

        /// Module descriptor (YAML with a DOCUMENTATION string)
        #[arg(short, long)]
        descriptor: PathBuf,

        /// Output file (descriptor is updated in place if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RequiredArg {
    /// Required iff `mandatory true`
    Mandatory,
    /// Required iff there is no default
    NoDefault,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ChoiceArg {
    /// Merge case contents into the parent
    Hoist,
    /// One str option listing the case names
    Enumerate,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KeyArg {
    /// Local names, hyphens replaced by underscores
    Local,
    /// module:name where the module changes
    Qualified,
}

impl From<RequiredArg> for RequiredPolicy {
    fn from(arg: RequiredArg) -> Self {
        match arg {
            RequiredArg::Mandatory => RequiredPolicy::Mandatory,
            RequiredArg::NoDefault => RequiredPolicy::NoDefault,
        }
    }
}

impl From<ChoiceArg> for ChoiceStyle {
    fn from(arg: ChoiceArg) -> Self {
        match arg {
            ChoiceArg::Hoist => ChoiceStyle::Hoist,
            ChoiceArg::Enumerate => ChoiceStyle::Enumerate,
        }
    }
}

impl From<KeyArg> for KeyStyle {
    fn from(arg: KeyArg) -> Self {
        match arg {
            KeyArg::Local => KeyStyle::Local,
            KeyArg::Qualified => KeyStyle::Qualified,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.verbose {
        eprintln!("{} Verbose mode enabled", "→".cyan());
    }

    match cli.command {
        Commands::List { device, json } => {
            list_command(&device, json)?;
        }
        Commands::Fetch {
            device,
            name,
            continue_on_failure,
            dir,
            json,
        } => match name {
            Some(name) => fetch_command(FetchConfig {
                device: &device,
                name: &name,
                continue_on_failure,
                dir: dir.as_deref(),
                json,
            })?,
            None => list_command(&device, json)?,
        },
        Commands::Convert {
            schema,
            module,
            path,
            config,
            required,
            choices,
            keys,
            max_type_depth,
            output,
        } => {
            let mut options = match config {
                Some(config) => load_yaml::<ConverterOptions>(&config)
                    .with_context(|| format!("Failed to load {}", config.display()))?,
                None => ConverterOptions::default(),
            };
            apply_overrides(&mut options, required, choices, keys, max_type_depth);
            convert_command(
                schema.as_path(),
                &module,
                path.as_deref(),
                options,
                output.as_deref(),
                cli.verbose,
            )?;
        }
        Commands::Embed {
            options,
            key,
            descriptor,
            output,
        } => {
            embed_command(
                options.as_path(),
                &key,
                descriptor.as_path(),
                output.as_deref(),
            )?;
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise warnings only, or debug with --verbose
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_overrides(
    options: &mut ConverterOptions,
    required: Option<RequiredArg>,
    choices: Option<ChoiceArg>,
    keys: Option<KeyArg>,
    max_type_depth: Option<usize>,
) {
    if let Some(required) = required {
        options.required = required.into();
    }
    if let Some(choices) = choices {
        options.choices = choices.into();
    }
    if let Some(keys) = keys {
        options.keys = keys.into();
    }
    if let Some(depth) = max_type_depth {
        options.max_type_depth = depth;
    }
}

/// JSON document printed by `fetch --json`
#[derive(Serialize)]
struct FetchReport<'a> {
    number_schema_fetched: usize,
    #[serde(flatten)]
    result: &'a FetchResult,
}

fn fetch_report(count: usize, result: &FetchResult) -> Result<String> {
    let report = FetchReport {
        number_schema_fetched: count,
        result,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn catalog_report(descriptors: &[SchemaDescriptor]) -> Result<String> {
    Ok(serde_json::to_string_pretty(descriptors)?)
}

// Progress goes to stderr; stdout carries only the requested document
fn open_store(device: &DeviceArgs) -> Result<SchemaStore<SshConnection>> {
    eprintln!("{} Connecting to {}", "→".cyan(), device.host.yellow());
    let conn = SshConnection::connect(&device.target())
        .with_context(|| format!("Failed to open NETCONF session to {}", device.host))?;
    SchemaStore::connect(conn).context("Device cannot serve schemas")
}

fn list_command(device: &DeviceArgs, json: bool) -> Result<()> {
    let mut store = open_store(device)?;

    if json {
        let catalog = store.list_catalog().context("Failed to list device schemas")?;
        info!(schemas = catalog.len(), "Listed device catalog");
        println!("{}", catalog_report(catalog.descriptors())?);
        return Ok(());
    }

    let modules = store
        .supported_modules()
        .context("Failed to list device schemas")?;

    println!("\n{}", "Supported modules:".bold());
    for module in &modules {
        println!("  • {}", module.cyan());
    }
    println!("\n{} {} modules", "✓".green(), modules.len());

    Ok(())
}

/// Configuration for one fetch run
struct FetchConfig<'a> {
    device: &'a DeviceArgs,
    name: &'a str,
    continue_on_failure: bool,
    dir: Option<&'a Path>,
    json: bool,
}

fn fetch_command(config: FetchConfig) -> Result<()> {
    let mut store = open_store(config.device)?;

    if config.name == ALL_SCHEMAS {
        eprintln!("{} Fetching every schema on the device", "→".cyan());
    } else {
        eprintln!(
            "{} Fetching {} and its imports",
            "→".cyan(),
            config.name.yellow()
        );
    }

    let mut result = FetchResult::default();
    let count = store
        .fetch(config.name, config.continue_on_failure, &mut result)
        .with_context(|| format!("Failed to fetch {}", config.name))?;

    info!(
        schema = config.name,
        fetched = count,
        failed = result.failed.len(),
        "Fetch finished"
    );
    eprintln!("{} Fetched {} schemas", "✓".green(), count);
    for failed in &result.failed {
        eprintln!("{} Could not fetch {}", "⚠".yellow(), failed);
    }

    if let Some(dir) = config.dir {
        let written = write_schemas(dir, &result)
            .with_context(|| format!("Failed to write schemas to {}", dir.display()))?;
        eprintln!(
            "{} Wrote {} files to {}",
            "✓".green(),
            written.len(),
            dir.display()
        );
    }

    if config.json {
        println!("{}", fetch_report(count, &result)?);
    }

    Ok(())
}

fn convert_command(
    schema_path: &Path,
    module: &str,
    path: Option<&str>,
    options: ConverterOptions,
    output: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    eprintln!(
        "{} Loading schema document: {}",
        "→".cyan(),
        schema_path.display()
    );
    let ctx = SchemaContext::from_file(schema_path)
        .with_context(|| format!("Failed to load {}", schema_path.display()))?;

    if verbose {
        eprintln!("  Module: {}", module);
        eprintln!("  Path: {}", path.unwrap_or("/"));
        eprintln!("  Options: {:?}", options);
    }

    let converter = Converter::new(&ctx, options);
    let conversion = match path {
        Some(path) => converter.convert_path(module, path),
        None => converter.convert_module(module),
    }
    .with_context(|| format!("Failed to convert {}", module))?;

    let stats = &conversion.stats;
    info!(
        module,
        deprecated = stats.skipped_deprecated,
        non_config = stats.skipped_non_config,
        unsupported = stats.skipped_unsupported,
        "Conversion finished"
    );
    eprintln!(
        "{} Converted {} nodes ({} leaves)",
        "✓".green(),
        stats.visited,
        stats.leaves
    );
    if verbose {
        eprintln!("  Skipped deprecated: {}", stats.skipped_deprecated);
        eprintln!("  Skipped non-config: {}", stats.skipped_non_config);
        eprintln!("  Skipped unsupported: {}", stats.skipped_unsupported);
    }

    let yaml = render_options(&conversion.options)?;
    match output {
        Some(output) => {
            fs::write(output, yaml)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            eprintln!("{} Wrote {}", "✓".green(), output.display());
        }
        None => print!("{}", yaml),
    }

    Ok(())
}

fn embed_command(
    options_path: &Path,
    key: &str,
    descriptor_path: &Path,
    output: Option<&Path>,
) -> Result<()> {
    eprintln!(
        "{} Embedding {} into {}",
        "→".cyan(),
        options_path.display(),
        descriptor_path.display()
    );

    let options: serde_yaml::Value = load_yaml(options_path)?;
    let config = select_path(&options, key)?;
    let descriptor = fs::read_to_string(descriptor_path)
        .with_context(|| format!("Failed to read {}", descriptor_path.display()))?;

    let updated = embed_config(&descriptor, config)
        .with_context(|| format!("Failed to update {}", descriptor_path.display()))?;

    let target = output.unwrap_or(descriptor_path);
    fs::write(target, updated).with_context(|| format!("Failed to write {}", target.display()))?;
    eprintln!("{} Updated {}", "✓".green(), target.display());

    Ok(())
}
