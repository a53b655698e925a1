//! Print the lineage graph of a pipeline configuration
//!
//! Loads one or more JSON configuration files, builds the lineage graph and writes
//! it to stdout as JSON, Mermaid, GraphViz DOT, a level table, the action graph or
//! the element list. Logs go to stderr.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use sdl_lineage_graph::{
    BuildOptions, ConfigData, DescriptionCache, ElementLists, ElementType, ExtractOptions,
    FsDescriptionSource, GraphBuilder, LayoutDirection, LineageGraph, LoaderOptions,
    RenderGraph, TraversalDepth,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Render-ready node and edge lists
    Json,
    /// Mermaid flowchart
    Mermaid,
    /// GraphViz DOT
    Dot,
    /// One line per data object with its level
    Levels,
    /// Producer/consumer links between actions
    Actions,
    /// Data objects, actions and connections by id
    List,
}

#[derive(Debug, Parser)]
#[command(name = "sdl-lineage", version, about = "Lineage graphs for pipeline configurations")]
struct Cli {
    /// Configuration files, already converted to JSON; later files override earlier ones
    #[arg(required = true)]
    configs: Vec<PathBuf>,

    /// Data object or action to centre the graph on
    #[arg(long)]
    focus: Option<String>,

    /// Only include direct producers and consumers of the focus
    #[arg(long, conflicts_with_all = ["upstream_depth", "downstream_depth"])]
    direct: bool,

    /// Maximum number of edges to follow upstream of the focus
    #[arg(long)]
    upstream_depth: Option<usize>,

    /// Maximum number of edges to follow downstream of the focus
    #[arg(long)]
    downstream_depth: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Layout direction, TB or LR
    #[arg(long, default_value = "TB")]
    direction: LayoutDirection,

    /// Add edges for recursive inputs
    #[arg(long)]
    include_recursive: bool,

    /// Keep attribute names as written instead of converting them to camelCase
    #[arg(long)]
    keep_keys: bool,

    /// Fail when the configuration has dangling references or malformed actions
    #[arg(long)]
    strict: bool,

    /// Regular expression applied to element ids, for the list format
    #[arg(long)]
    filter: Option<String>,

    /// Print the description of this element instead of a graph
    #[arg(long)]
    describe: Option<String>,

    /// Directory containing the description folder
    #[arg(long, env = "SDL_DESCRIPTION_ROOT", default_value = ".")]
    description_root: PathBuf,
}

impl Cli {
    fn extract_options(&self) -> ExtractOptions {
        if self.direct {
            return ExtractOptions::direct_neighbours();
        }
        let depth = |limit: Option<usize>| limit.map_or(TraversalDepth::Unbounded, TraversalDepth::Limited);
        ExtractOptions {
            upstream: depth(self.upstream_depth),
            downstream: depth(self.downstream_depth),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let loader = LoaderOptions {
        normalize_keys: !cli.keep_keys,
    };
    let config = ConfigData::load_all(&cli.configs, &loader)
        .context("Failed to load configuration")?;

    if let Some(id) = &cli.describe {
        return describe(&cli, &config, id).await;
    }

    let outcome = GraphBuilder::new(BuildOptions {
        include_recursive_edges: cli.include_recursive,
        assign_levels: true,
    })
    .build(&config);

    if !outcome.is_clean() {
        warn!(errors = outcome.errors.len(), "Configuration has errors");
    }
    let graph = if cli.strict {
        outcome.into_result()?
    } else {
        outcome.graph
    };
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Built lineage graph"
    );

    let render = match &cli.focus {
        Some(id) => {
            let partial = graph.partial_graph_for(id, &cli.extract_options())?;
            RenderGraph::partial(&graph, &partial)
        }
        None => RenderGraph::full(&graph),
    }
    .with_direction(cli.direction);

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&render)?),
        OutputFormat::Mermaid => print!("{}", render.to_mermaid()),
        OutputFormat::Dot => print!("{}", render.to_dot()),
        OutputFormat::Levels => {
            for node in &render.nodes {
                let level = node.level.map_or_else(|| "-".to_string(), |level| level.to_string());
                println!("{level}\t{}", node.id);
            }
        }
        OutputFormat::Actions => print_action_graph(&graph),
        OutputFormat::List => list(&cli, &config)?,
    }

    Ok(())
}

fn print_action_graph(graph: &LineageGraph) {
    let action_graph = graph.action_graph();
    for link in &action_graph.links {
        println!("{} -> {} (via {})", link.from, link.to, link.via);
    }
}

fn list(cli: &Cli, config: &ConfigData) -> Result<()> {
    let mut lists = ElementLists::from_config(config);
    if let Some(pattern) = &cli.filter {
        lists = lists.filter_by_regex(pattern)?;
    }

    for element_type in [
        ElementType::DataObject,
        ElementType::Action,
        ElementType::Connection,
    ] {
        for entry in lists.list(element_type) {
            let type_name = entry.type_name().unwrap_or("-");
            println!("{element_type}\t{}\t{type_name}", entry.id);
        }
    }
    Ok(())
}

async fn describe(cli: &Cli, config: &ConfigData, id: &str) -> Result<()> {
    let Some((element_type, raw_config)) = [
        ElementType::DataObject,
        ElementType::Action,
        ElementType::Connection,
    ]
    .into_iter()
    .find_map(|element_type| {
        config
            .element(element_type, id)
            .map(|raw_config| (element_type, raw_config))
    }) else {
        bail!("Unknown element: {id}");
    };

    let source = FsDescriptionSource::new(&cli.description_root);
    let cache = DescriptionCache::new();
    let text = cache
        .describe(&source, element_type, id, raw_config)
        .await?;
    println!("{text}");
    Ok(())
}
