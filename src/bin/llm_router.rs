//! llm-router: inspect router mappings and send prompts through a fallback chain.
//!
//! Usage:
//!   llm-router validate [--config <path>]         Validate a router mapping
//!   llm-router show [--config <path>]             List models and chains
//!   llm-router resolve <model> [--config <path>]  Print the chain for a model
//!   llm-router ask <model> <question> [...]       Route a prompt

use anyhow::{bail, Context};
use llm_fallback_router::transport::HttpInvoker;
use llm_fallback_router::{
    ChainResolver, ConfigLoader, FallbackExecutor, ModelRequest, RouterMapping, RunOptions,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let result = match args[1].as_str() {
        "validate" => cmd_validate(&args[2..]).await,
        "show" => cmd_show(&args[2..]).await,
        "resolve" => cmd_resolve(&args[2..]).await,
        "ask" => cmd_ask(&args[2..]).await,
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"llm-router: fallback routing for LLM requests

USAGE:
    llm-router <COMMAND> [OPTIONS]

COMMANDS:
    validate [--config <path>]          Validate a router mapping file
    show [--config <path>]              List registered models and fallback chains
    resolve <model> [--config <path>]   Print the invocation chain for a model
    ask <model> <question>              Route a prompt through the chain
        --system <text>                 System prompt
        --two-tier                      Primary plus first fallback, hard failures only
        --fallback-only                 First fallback only, one call (with --two-tier)
        --config <path>                 Router mapping file
    version                             Show version information
    help                                Show this help message

ENVIRONMENT:
    LLM_ROUTER_CONFIG                   Router mapping file (YAML or JSON)
    RUST_LOG                            Log filter (default: info)"#
    );
}

fn cmd_version() {
    println!("llm-router {}", env!("CARGO_PKG_VERSION"));
}

/// Parsed flags shared by all commands.
#[derive(Debug, Default)]
struct Flags {
    config: Option<PathBuf>,
    system: Option<String>,
    two_tier: bool,
    fallback_only: bool,
    positional: Vec<String>,
}

fn parse_flags(args: &[String]) -> anyhow::Result<Flags> {
    let mut flags = Flags::default();
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                let path = it.next().context("--config needs a path")?;
                flags.config = Some(PathBuf::from(path));
            }
            "--system" => {
                flags.system = Some(it.next().context("--system needs a value")?.clone());
            }
            "--two-tier" => flags.two_tier = true,
            "--fallback-only" => flags.fallback_only = true,
            other if other.starts_with("--") => bail!("unknown option {other}"),
            _ => flags.positional.push(arg.clone()),
        }
    }
    Ok(flags)
}

async fn load_mapping(flags: &Flags) -> anyhow::Result<RouterMapping> {
    let loader = ConfigLoader::new().with_base_path(std::env::current_dir()?);
    Ok(loader.load(flags.config.as_deref()).await?)
}

async fn cmd_validate(args: &[String]) -> anyhow::Result<()> {
    let flags = parse_flags(args)?;
    let mapping = load_mapping(&flags).await?;
    println!(
        "OK: {} model(s), {} fallback rule(s)",
        mapping.registry().len(),
        mapping.fallback_table().rules().len()
    );
    Ok(())
}

async fn cmd_show(args: &[String]) -> anyhow::Result<()> {
    let flags = parse_flags(args)?;
    let mapping = load_mapping(&flags).await?;

    println!("Models:");
    for entry in mapping.registry().entries() {
        let rpm = entry
            .params
            .rpm
            .map(|r| format!(" ({r} rpm)"))
            .unwrap_or_default();
        println!(
            "  {}: {}/{}{}",
            entry.name, entry.provider_kind, entry.params.model, rpm
        );
    }

    println!("\nChains:");
    let resolver = ChainResolver::new(&mapping);
    for rule in mapping.fallback_table().rules() {
        let chain = resolver.resolve(&rule.primary)?;
        println!("  {}", chain.names().join(" -> "));
    }
    Ok(())
}

async fn cmd_resolve(args: &[String]) -> anyhow::Result<()> {
    let flags = parse_flags(args)?;
    let model = flags.positional.first().context("usage: resolve <model>")?;
    let mapping = load_mapping(&flags).await?;

    let chain = ChainResolver::new(&mapping).resolve(model)?;
    for (i, label) in chain.labels().iter().enumerate() {
        let role = if i == 0 { "primary" } else { "fallback" };
        println!("{i}. {label} [{role}]");
    }
    Ok(())
}

async fn cmd_ask(args: &[String]) -> anyhow::Result<()> {
    let flags = parse_flags(args)?;
    let (model, question) = match flags.positional.as_slice() {
        [model, rest @ ..] if !rest.is_empty() => (model.clone(), rest.join(" ")),
        _ => bail!("usage: ask <model> <question>"),
    };
    if flags.fallback_only && !flags.two_tier {
        bail!("--fallback-only only applies with --two-tier");
    }

    let mapping = load_mapping(&flags).await?;
    let invoker = HttpInvoker::new().context("failed to build HTTP client")?;
    let executor = FallbackExecutor::new(mapping, Arc::new(invoker));

    let mut request = ModelRequest::new(question);
    if let Some(system) = flags.system {
        request = request.system_prompt(system);
    }

    let response = if flags.two_tier {
        executor
            .run_two_tier(&model, &request, flags.fallback_only, RunOptions::default())
            .await?
    } else {
        executor.run(&model, &request).await?
    };

    println!("Provider: {}", response.provider_label);
    println!("Response: {}", response.text);
    Ok(())
}
