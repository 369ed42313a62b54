use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use hierarchy_lib::config::TreeConfig;
use hierarchy_lib::config::TreeVariant;
use hierarchy_lib::service::HttpTreeService;
use hierarchy_lib::service::MemoryTreeService;
use hierarchy_lib::service::RemoteTreeService;
use hierarchy_lib::Error;
use hierarchy_lib::TreeDriver;
use hierarchy_lib::TreeEngine;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::SimpleLogger;
use simplelog::WriteLogger;

#[derive(Parser)]
#[command(name = "hierarchy")]
#[command(about = "Load a node/leaf hierarchy and print it as a tree")]
struct Args {
    /// JSON fixture with `node` and `leaf` record lists
    #[arg(long, conflicts_with = "url")]
    fixture: Option<PathBuf>,

    /// Backend base URL
    #[arg(long)]
    url: Option<String>,

    /// Backend module
    #[arg(long, default_value = "file")]
    module: String,

    /// Root node key; asks the backend for one when omitted
    #[arg(long)]
    root: Option<String>,

    /// Viewed node (browser mode)
    #[arg(long)]
    node: Option<String>,

    /// Show the breadcrumb and only the viewed node's children
    #[arg(long)]
    browser: bool,

    /// Skip leaves
    #[arg(long)]
    no_leaves: bool,

    /// How many levels to expand
    #[arg(long, default_value = "3")]
    depth: usize,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Write the log to a file instead of stderr
    #[arg(long)]
    log: Option<PathBuf>,

    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    let logger = match &args.log {
        Some(path) => match File::create(path) {
            Ok(file) => WriteLogger::init(level, Config::default(), file),
            Err(e) => {
                eprintln!("Error: cannot create log file {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => SimpleLogger::init(level, Config::default()),
    };
    if let Err(e) = logger {
        eprintln!("Error: failed to initialize logger: {}", e);
    }

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Error> {
    let service: Arc<dyn RemoteTreeService> = match (&args.fixture, &args.url) {
        (_, Some(url)) => Arc::new(
            HttpTreeService::builder()
                .base_url(url.as_str())
                .timeout(Duration::from_secs(args.timeout))
                .build()?,
        ),
        (Some(path), None) => Arc::new(MemoryTreeService::from_json(&std::fs::read_to_string(path)?)?),
        (None, None) => Arc::new(MemoryTreeService::from_json(include_str!(
            "../fixtures/repository.json"
        ))?),
    };

    let mut config = TreeConfig::new(args.module.as_str()).with_leaves(!args.no_leaves);
    if let Some(root) = &args.root {
        config = config.with_root_node(root.as_str());
    }
    if let Some(node) = &args.node {
        config = config.with_node(node.as_str());
    }
    if args.browser {
        config = config.with_variant(TreeVariant::Browser);
    }

    let mut driver = TreeDriver::new(TreeEngine::new(config), service);
    driver.run_until_idle().await;

    for _ in 0..args.depth {
        let closed: Vec<String> = driver
            .engine()
            .visible()
            .into_iter()
            .filter(|(depth, n)| *depth + 1 < args.depth && n.can_expand() && !n.expanded)
            .map(|(_, n)| n.key.clone())
            .collect();
        if closed.is_empty() {
            break;
        }
        for key in closed {
            driver.engine_mut().toggle_expand(&key);
        }
        driver.run_until_idle().await;
    }

    print_tree(driver.engine());
    Ok(())
}

fn print_tree(engine: &TreeEngine) {
    if let Some(failure) = engine.failure() {
        println!("{}", failure.message());
        return;
    }

    let path = engine.path();
    if !path.is_empty() {
        let labels: Vec<&str> = path.iter().map(|s| s.name.as_str()).collect();
        println!("{}", labels.join(" / "));
    }
    match engine.root_node() {
        Some(root) => println!("[{}]", root),
        None => println!("(no root node)"),
    }

    for (depth, node) in engine.visible() {
        let marker = match (node.can_expand(), node.expanded, node.has_no_children) {
            (false, _, _) => " ",
            (true, _, true) => "-",
            (true, true, false) => "v",
            (true, false, false) => ">",
        };
        let text = engine.describe(&node.key);
        let headline = text
            .as_ref()
            .map(|t| t.headline.clone())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| node.key.clone());
        match text.and_then(|t| t.subline) {
            Some(size) => println!("{}{} {}  ({})", "  ".repeat(depth), marker, headline, size),
            None => println!("{}{} {}", "  ".repeat(depth), marker, headline),
        }
    }
}
