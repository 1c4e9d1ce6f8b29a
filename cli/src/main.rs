use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pal_core::{AgentLoop, ContextBuilder, Provider, ToolRegistry, config, providers};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod onboard;
mod repl;
mod server;

#[derive(Parser)]
#[command(name = "pal")]
#[command(about = "pal - a personal assistant agent with file and shell tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive configuration wizard
    Onboard,
    /// Chat in the terminal, or send a single message with --message
    Chat {
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Everything needed to build a fresh conversation loop.
#[derive(Clone)]
pub struct LoopFactory {
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
    system_prompt: Arc<str>,
}

impl LoopFactory {
    pub fn new(provider: Arc<dyn Provider>, registry: Arc<ToolRegistry>, system_prompt: impl Into<Arc<str>>) -> Self {
        Self {
            provider,
            registry,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn create(&self) -> AgentLoop {
        AgentLoop::new(
            self.provider.clone(),
            self.registry.clone(),
            &*self.system_prompt,
        )
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pal=info,pal_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_factory(config: &config::Config) -> Result<LoopFactory> {
    let provider = providers::create_provider(config).context("Could not create model provider")?;

    let working_dir = match &config.working_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    let registry = Arc::new(pal_core::default_tool_registry(config.working_dir.as_deref()));

    let system_prompt = ContextBuilder::new(&working_dir)
        .with_system_prompt(config.system_prompt.clone())
        .with_tool_specs(registry.specs())
        .build_system_prompt();

    tracing::info!(
        "Using provider {} with model {} (tools: {})",
        provider.name(),
        config.model,
        registry.names().join(", ")
    );

    Ok(LoopFactory::new(provider, registry, system_prompt))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let command = match cli.command {
        Some(command) => command,
        None => {
            let config = config::Config::load_or_init()?;
            if config::config_exists() || config.has_credentials() {
                Commands::Chat { message: None }
            } else {
                Commands::Onboard
            }
        }
    };

    match command {
        Commands::Onboard => {
            let onboard_config = onboard::run_onboard().map_err(|e| {
                eprintln!("❌ Onboarding failed: {}", e);
                anyhow::anyhow!("Onboarding failed: {}", e)
            })?;
            config::save_config(&onboard_config)?;
        }
        Commands::Chat { message } => {
            let config = config::Config::load_or_init()?;
            let factory = build_factory(&config)?;
            let mut agent_loop = factory.create();

            match message {
                Some(msg) => match agent_loop.send_message(&msg).await {
                    Ok(response) => repl::print_response(&response),
                    Err(e) => {
                        eprintln!("❌ Error: {}", e);
                        anyhow::bail!("Agent processing failed: {}", e);
                    }
                },
                None => repl::run(&mut agent_loop).await?,
            }
        }
        Commands::Serve { host, port } => {
            let mut config = config::Config::load_or_init()?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let factory = build_factory(&config)?;
            server::serve(&config.server, factory).await?;
        }
    }

    Ok(())
}
