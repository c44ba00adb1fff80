use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clinical_risk_engine::server::{self, AppState};
use clinical_risk_engine::{EngineConfig, ModelRegistry, PatientStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clinical-risk-engine")]
#[command(version = "0.1.0")]
#[command(about = "Serves predictions from pre-trained clinical-risk models", long_about = None)]
struct Cli {
    /// Path to the engine configuration file
    #[arg(short, long, default_value = "config/models.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to bind
        #[arg(short, long, default_value = "127.0.0.1:5000")]
        addr: SocketAddr,
    },

    /// List the models the configuration loads
    Models,

    /// Run a one-shot prediction from a JSON feature map
    Predict {
        /// Registry name of the model
        #[arg(short, long)]
        model: String,

        /// Path to a JSON file with a feature name -> value map
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::from_file(&cli.config)?;
    let registry = ModelRegistry::load(&config.models);

    match cli.command {
        Commands::Serve { addr } => {
            let patients = PatientStore::new(&config.patient_storage_dir)?;
            server::serve(addr, AppState::new(registry, patients)).await?;
        }

        Commands::Models => {
            println!("Loaded {} of {} configured models", registry.len(), config.models.len());
            for info in registry.list_info() {
                println!("\n=== {} ===", info.name);
                println!("Display name: {}", info.display_name);
                println!("Type:         {}", info.variant);
                if !info.description.is_empty() {
                    println!("Description:  {}", info.description);
                }
            }
        }

        Commands::Predict { model, input } => {
            let raw: HashMap<String, f64> = serde_json::from_str(&fs::read_to_string(&input)?)?;
            let entry = registry.get(&model)?;
            let result = entry.predict(&raw)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
