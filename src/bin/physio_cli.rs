//! CLI binary (feature `cli`, spec §1 "discovering YAML pack files on
//! disk is the job of the CLI/server collaborators").

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use physio_reasoner::config::EngineConfig;
use physio_reasoner::loader::{self, PackDocument};
use physio_reasoner::model::{NodeId, Op, Perturbation};
use physio_reasoner::propagation::{self, SimulationOptions, SimulationRequest};
use physio_reasoner::telemetry::{PlainFormatter, TelemetryFormatter};

#[derive(Parser)]
#[command(name = "physio-cli")]
#[command(about = "Run qualitative physiology propagation over a knowledge pack")]
#[command(version)]
struct Cli {
    /// YAML knowledge pack files, merged in argument order.
    #[arg(required = true)]
    packs: Vec<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the packs and report node/edge counts plus any diagnostics.
    Check,
    /// Run one perturbation and print affected nodes with traces.
    Simulate {
        /// `<node_id>=<op>`, e.g. `cardio.hemodynamics.map=decrease`.
        #[arg(long = "set", required = true)]
        perturbations: Vec<String>,
        #[arg(long, default_value_t = 5)]
        max_hops: u32,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::from_env();

    let mut documents = Vec::with_capacity(cli.packs.len());
    for path in &cli.packs {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading pack {}: {e}", path.display()))?;
        documents.push(PackDocument::from_yaml_str(&text)?);
    }

    let (graph, diagnostics) = loader::load_pack(&documents)?;
    for rendered in PlainFormatter.render_diagnostics(&diagnostics) {
        print!("{}", rendered.join_lines());
    }

    match cli.command {
        Command::Check => {
            println!(
                "loaded {} nodes, {} edges, {} rules",
                graph.node_count(),
                graph.edge_count(),
                graph.rules().len()
            );
        }
        Command::Simulate { perturbations, max_hops } => {
            let mut parsed = Vec::with_capacity(perturbations.len());
            for entry in &perturbations {
                let (node_id, op) = entry
                    .split_once('=')
                    .ok_or_else(|| anyhow::anyhow!("expected <node_id>=<op>, got `{entry}`"))?;
                parsed.push(Perturbation {
                    node_id: NodeId::new(node_id.trim()),
                    op: op.trim().parse::<Op>().map_err(|e| anyhow::anyhow!("{e}"))?,
                });
            }

            let request = SimulationRequest {
                perturbations: parsed,
                context: Default::default(),
                options: SimulationOptions {
                    max_hops,
                    ..SimulationOptions::default()
                },
            };
            let response = propagation::simulate(&graph, &request, &config)?;

            for affected in &response.affected_nodes {
                let rendered = PlainFormatter.render_response(&affected.node_id, &response);
                print!("{}", rendered.join_lines());
            }
            println!("max_ticks: {}", response.max_ticks);
        }
    }

    Ok(())
}
