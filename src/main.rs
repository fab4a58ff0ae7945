//! kgt - Knowledge graph transition CLI
//!
//! Validates, analyzes and transforms JSON graph files with the transition engine.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use knowledge_transition::graph::{Graph, Node};
use knowledge_transition::{Config, GraphTransitionEngine, TransitionEngine, TransitionKind};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kgt")]
#[command(about = "Knowledge graph transition and analytics engine")]
struct Cli {
    /// YAML config file (defaults to ./kgt.yaml when present)
    #[arg(short, long, global = true, env = "KGT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a graph file against every structural invariant
    Validate {
        /// Graph JSON file
        graph: PathBuf,
    },

    /// Compute analytics for a graph file
    Analyze {
        /// Graph JSON file
        graph: PathBuf,

        /// Which analytics to compute
        #[arg(short, long, value_enum, default_value = "all")]
        query: Query,
    },

    /// Apply one transition and write the resulting graph
    Transition {
        /// Graph JSON file
        graph: PathBuf,

        /// evidence_integration, pruning, merging or refinement
        #[arg(short, long)]
        kind: TransitionKind,

        /// JSON array of evidence nodes (evidence_integration only)
        #[arg(short, long)]
        evidence: Option<PathBuf>,

        /// Write the full outcome here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Query {
    All,
    Centrality,
    Communities,
    Spectral,
}

fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing (stderr, so stdout stays valid JSON)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,knowledge_transition=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_yaml_and_env(cli.config.as_deref())?;
    let engine = GraphTransitionEngine::new(config.engine.clone());

    match cli.command {
        Commands::Validate { graph } => {
            let graph = read_graph(&graph)?;
            knowledge_transition::validate(&graph).context("Graph is invalid")?;
            tracing::info!(
                nodes = graph.nodes.len(),
                edges = graph.edges.len(),
                "Graph is valid"
            );
            Ok(())
        }
        Commands::Analyze { graph, query } => {
            let graph = read_graph(&graph)?;
            match query {
                Query::All => emit(&engine.analyze(&graph)?, config.pretty, None),
                Query::Centrality => emit(&engine.centrality(&graph)?, config.pretty, None),
                Query::Communities => emit(&engine.communities(&graph)?, config.pretty, None),
                Query::Spectral => emit(&engine.spectral(&graph)?, config.pretty, None),
            }
        }
        Commands::Transition {
            graph,
            kind,
            evidence,
            output,
        } => {
            let graph = read_graph(&graph)?;
            let evidence: Vec<Node> = match evidence {
                Some(path) => read_json(&path)?,
                None => Vec::new(),
            };
            let outcome = engine.apply(&graph, &evidence, kind)?;
            tracing::info!(
                %kind,
                topology_change = outcome.metrics.topology_change,
                information_gain = outcome.metrics.information_gain,
                confidence = outcome.confidence,
                "Transition applied"
            );
            emit(&outcome, config.pretty, output.as_deref())
        }
    }
}

fn read_graph(path: &Path) -> Result<Graph> {
    read_json(path)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn emit<T: Serialize>(value: &T, pretty: bool, output: Option<&Path>) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}
