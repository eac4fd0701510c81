//! Carepath CLI
//!
//! Front end for the path reasoning engine:
//! - `recommend`: rank doctors for a set of symptoms under constraints
//! - `demo`: run the three canonical scenarios against a data directory
//! - `stats`: entity/edge counts for a loaded knowledge graph

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

use carepath_engine::{
    CombineMode, ConstraintSet, DecayProfile, Engine, EngineConfig, Query, Recommendation,
};
use carepath_graph::{EmbeddingFile, EmbeddingTable, EntityKind, KnowledgeGraph};

mod data;

#[derive(Parser)]
#[command(name = "carepath")]
#[command(
    author,
    version,
    about = "Neuro-symbolic doctor recommendation over a medical knowledge graph"
)]
struct Cli {
    /// Verbose logging (debug level).
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank doctors for the given symptoms under optional constraints.
    Recommend {
        /// Directory containing symptoms.json, diseases.json, doctors.json.
        #[arg(long)]
        data: PathBuf,
        /// Symptom name; repeat for several.
        #[arg(long = "symptom", required = true)]
        symptoms: Vec<String>,
        /// Maximum consultation budget in dollars.
        #[arg(long)]
        budget: Option<f64>,
        /// User position as graph coordinates, e.g. --location 12 12.
        #[arg(long, num_args = 2, value_names = ["X", "Y"])]
        location: Option<Vec<f64>>,
        /// Maximum acceptable distance in km.
        #[arg(long)]
        max_distance: Option<f64>,
        /// Required insurance network.
        #[arg(long)]
        insurance: Option<String>,
        #[arg(long, default_value_t = 4)]
        max_hops: usize,
        /// Softmax temperature for path weights.
        #[arg(long, default_value_t = 1.0)]
        temperature: f64,
        /// Show at most this many doctors.
        #[arg(long)]
        top_k: Option<usize>,
        /// Cap on candidate doctors scored per query.
        #[arg(long)]
        max_candidates: Option<usize>,
        #[arg(long, value_enum, default_value = "product")]
        combine: CombineArg,
        /// Cost weight in weighted-sum mode.
        #[arg(long, default_value_t = 1.0)]
        weight_cost: f64,
        /// Geography weight in weighted-sum mode.
        #[arg(long, default_value_t = 1.0)]
        weight_geo: f64,
        #[arg(long, value_enum, default_value = "linear")]
        decay: DecayArg,
        /// Drop doctors whose final score is zero.
        #[arg(long)]
        drop_unsatisfied: bool,
        /// Embedding file (JSON); defaults to a seeded deterministic table.
        #[arg(long)]
        embeddings: Option<PathBuf>,
        /// Embedding dimension for the seeded table.
        #[arg(long, default_value_t = 128)]
        dim: usize,
        /// Seed for the deterministic embedding table.
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Run the three canonical demo scenarios.
    Demo {
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value_t = 128)]
        dim: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Print entity and edge counts for a data directory.
    Stats {
        #[arg(long)]
        data: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CombineArg {
    Product,
    WeightedSum,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DecayArg {
    Linear,
    Smooth,
}

impl From<DecayArg> for DecayProfile {
    fn from(arg: DecayArg) -> Self {
        match arg {
            DecayArg::Linear => DecayProfile::Linear,
            DecayArg::Smooth => DecayProfile::Smooth,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_target(false)
        .init();

    match cli.command {
        Commands::Recommend {
            data,
            symptoms,
            budget,
            location,
            max_distance,
            insurance,
            max_hops,
            temperature,
            top_k,
            max_candidates,
            combine,
            weight_cost,
            weight_geo,
            decay,
            drop_unsatisfied,
            embeddings,
            dim,
            seed,
            json,
        } => {
            let graph = data::load_graph(&data)?;
            let table = load_embeddings(&graph, embeddings.as_deref(), dim, seed)?;

            let config = EngineConfig {
                max_hops,
                temperature,
                combine: match combine {
                    CombineArg::Product => CombineMode::Product,
                    CombineArg::WeightedSum => CombineMode::WeightedSum {
                        cost: weight_cost,
                        geo: weight_geo,
                    },
                },
                decay: decay.into(),
                include_unsatisfied: !drop_unsatisfied,
                top_k,
                max_candidates,
                ..Default::default()
            };

            let query = Query {
                symptoms: resolve_symptoms(&graph, &symptoms)?,
                constraints: ConstraintSet {
                    max_budget: budget,
                    location: location.map(|xy| (xy[0], xy[1])),
                    max_distance,
                    required_insurance: insurance,
                },
            };

            let engine = Engine::new(&graph, &table, config);
            let result = engine.recommend(&query)?;
            if json {
                print_json(&graph, &result)?;
            } else {
                print_text(&result);
            }
        }

        Commands::Demo { data, dim, seed } => {
            let graph = data::load_graph(&data)?;
            let table = EmbeddingTable::seeded(&graph, dim, seed);
            run_demo(&graph, &table)?;
        }

        Commands::Stats { data } => {
            let graph = data::load_graph(&data)?;
            println!(
                "{} entities, {} edges",
                graph.entity_count(),
                graph.edge_count()
            );
            for kind in EntityKind::ALL {
                let count = graph
                    .entities_of_kind(kind)
                    .map(|bitmap| bitmap.len())
                    .unwrap_or(0);
                println!("  {kind:<10} {count}");
            }
        }
    }

    Ok(())
}

fn load_embeddings(
    graph: &KnowledgeGraph,
    path: Option<&std::path::Path>,
    dim: usize,
    seed: u64,
) -> Result<EmbeddingTable> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            let file: EmbeddingFile = serde_json::from_str(&text)?;
            Ok(EmbeddingTable::from_records(graph, file.dim, file.items)?)
        }
        None => Ok(EmbeddingTable::seeded(graph, dim, seed)),
    }
}

/// Resolve symptom names, warning about any the graph does not know.
fn resolve_symptoms(
    graph: &KnowledgeGraph,
    names: &[String],
) -> Result<Vec<carepath_graph::EntityId>> {
    let mut resolved = Vec::new();
    for name in names {
        match graph.resolve(EntityKind::Symptom, name) {
            Some(id) => resolved.push(id),
            None => eprintln!(
                "{} unknown symptom {name:?}",
                "warning:".yellow().bold()
            ),
        }
    }
    if resolved.is_empty() {
        return Err(anyhow!("none of the given symptoms exist in the graph"));
    }
    Ok(resolved)
}

fn print_text(result: &Recommendation) {
    if let Some(note) = &result.note {
        println!("{} {note}", "no match:".yellow().bold());
        return;
    }
    for (rank, doc) in result.ranked.iter().enumerate() {
        println!(
            "{:>2}. {} (score {:.4}, relevance {:.4}, satisfaction {:.4})",
            rank + 1,
            doc.name.green().bold(),
            doc.final_score,
            doc.relevance,
            doc.satisfaction.total,
        );
        for line in doc.explanation.lines() {
            println!("      {}", line.dimmed());
        }
    }
}

fn print_json(graph: &KnowledgeGraph, result: &Recommendation) -> Result<()> {
    let doctors: Vec<serde_json::Value> = result
        .ranked
        .iter()
        .map(|doc| {
            let paths: Vec<serde_json::Value> = doc
                .top_paths
                .iter()
                .map(|scored| {
                    serde_json::json!({
                        "chain": scored
                            .path
                            .nodes()
                            .iter()
                            .map(|&id| graph.name(id))
                            .collect::<Vec<_>>(),
                        "energy": scored.energy,
                        "weight": scored.weight,
                    })
                })
                .collect();
            serde_json::json!({
                "doctor": doc.name,
                "relevance": doc.relevance,
                "satisfaction": doc.satisfaction,
                "final_score": doc.final_score,
                "paths": paths,
                "explanation": doc.explanation,
            })
        })
        .collect();

    let value = serde_json::json!({
        "ranked": doctors,
        "note": result.note,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

struct Scenario {
    name: &'static str,
    symptom: &'static str,
    budget: f64,
    location: (f64, f64),
    insurance: &'static str,
}

const SCENARIOS: [Scenario; 3] = [
    Scenario {
        name: "Worker with Back Pain",
        symptom: "Severe Back Pain",
        budget: 60.0,
        location: (12.0, 12.0),
        insurance: "Basic",
    },
    Scenario {
        name: "Child High Fever Emergency",
        symptom: "High Fever (Child)",
        budget: 200.0,
        location: (10.0, 20.0),
        insurance: "Premium",
    },
    Scenario {
        name: "Elderly Chest Pain",
        symptom: "Chest Pain",
        budget: 150.0,
        location: (15.0, 15.0),
        insurance: "Gold",
    },
];

fn run_demo(graph: &KnowledgeGraph, table: &EmbeddingTable) -> Result<()> {
    // Smooth profile: sigmoid cost decay, Gaussian distance decay, no hard
    // distance cutoff.
    let config = EngineConfig {
        decay: DecayProfile::Smooth,
        top_k: Some(3),
        ..Default::default()
    };
    let engine = Engine::new(graph, table, config);

    for scenario in &SCENARIOS {
        println!("{} {}", "scenario:".cyan().bold(), scenario.name);
        println!(
            "  symptom {:?}, budget ${}, location ({}, {}), insurance {}",
            scenario.symptom,
            scenario.budget,
            scenario.location.0,
            scenario.location.1,
            scenario.insurance,
        );

        let Some(symptom) = graph.resolve(EntityKind::Symptom, scenario.symptom) else {
            println!("  {} symptom not in graph", "skipped:".yellow().bold());
            continue;
        };

        let result = engine.recommend(&Query {
            symptoms: vec![symptom],
            constraints: ConstraintSet {
                max_budget: Some(scenario.budget),
                location: Some(scenario.location),
                max_distance: None,
                required_insurance: Some(scenario.insurance.to_string()),
            },
        })?;

        print_text(&result);
        println!();
    }

    Ok(())
}
