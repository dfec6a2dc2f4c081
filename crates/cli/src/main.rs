mod scanner;

use anyhow::{bail, Context, Result};
use bytesize::ByteSize;
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use treemap_core::{export, generate, hit_test, search, Domain, Entry, NodeId, Rect, TreeBuilder, WeightedTree};

use scanner::{ScanMsg, Scanner};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Point {
    x: i32,
    y: i32,
}

impl FromStr for Point {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("expected X,Y but got {s:?}"))?;
        Ok(Point {
            x: x.trim().parse().map_err(|e| format!("bad x in {s:?}: {e}"))?,
            y: y.trim().parse().map_err(|e| format!("bad y in {s:?}: {e}"))?,
        })
    }
}

#[derive(Parser, Debug)]
#[command(name = "treemap-cli", about = "Treemap layout of a directory tree")]
struct Args {
    /// File or directory to lay out
    root: PathBuf,
    /// Layout width in pixels
    #[arg(long, default_value_t = 1024, value_parser = clap::value_parser!(i32).range(0..))]
    width: i32,
    /// Layout height in pixels
    #[arg(long, default_value_t = 738, value_parser = clap::value_parser!(i32).range(0..))]
    height: i32,
    /// Seed for reproducible colours
    #[arg(long)]
    seed: Option<u64>,
    /// Stop scanning after this many files
    #[arg(long)]
    max_files: Option<u64>,
    /// Pick the leaf whose path best matches this fuzzy query
    #[arg(long, conflicts_with = "at")]
    select: Option<String>,
    /// Pick the leaf under this point, given as X,Y
    #[arg(long)]
    at: Option<Point>,
    /// Grow the picked leaf by one percent
    #[arg(long, conflicts_with_all = ["shrink", "remove"])]
    grow: bool,
    /// Shrink the picked leaf by one percent
    #[arg(long, conflicts_with = "remove")]
    shrink: bool,
    /// Remove the picked leaf from the tree
    #[arg(long)]
    remove: bool,
    /// Output JSON layout path
    #[arg(short, long)]
    json: Option<PathBuf>,
    /// Output CSV layout path
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let area = Rect::new(0, 0, args.width, args.height);

    let entry = scan(&args)?;
    let builder = match args.seed {
        Some(seed) => TreeBuilder::seeded(seed),
        None => TreeBuilder::new(),
    };
    let mut tree = builder
        .domain(Domain::FileSystem)
        .build(entry)
        .context("building tree from scan")?;
    info!(nodes = tree.len(), size = %ByteSize(tree.total_weight()), "tree ready");

    let picked = if let Some(query) = &args.select {
        search::best_leaf(&tree, query)
    } else {
        args.at.and_then(|p| hit_test(&tree, (p.x, p.y), area))
    };
    match picked {
        Some(id) => edit(&mut tree, id, &args)?,
        None if args.grow || args.shrink || args.remove => bail!("no leaf matched the selection"),
        None => {}
    }

    let items = generate(&tree, area);
    if let Some(path) = &args.json {
        let mut json = export::to_json(&tree, area, &items);
        json["root"] = serde_json::json!(args.root);
        json["generated_at"] = serde_json::json!(chrono::Local::now().to_rfc3339());
        std::fs::write(path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(path) = &args.csv {
        let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        export::to_csv(&tree, &items, std::io::BufWriter::new(file))
            .with_context(|| format!("writing {}", path.display()))?;
    }

    println!(
        "{} rectangles in {}x{}, total {}",
        items.len(),
        area.w,
        area.h,
        ByteSize(tree.total_weight())
    );
    Ok(())
}

fn scan(args: &Args) -> Result<Entry> {
    if !args.root.exists() {
        bail!("{} does not exist", args.root.display());
    }
    let cancel = Arc::new(AtomicBool::new(false));
    let (tx, rx) = crossbeam_channel::unbounded::<ScanMsg>();
    let scanner = Scanner::new(cancel.clone());
    std::thread::spawn({
        let root = args.root.clone();
        move || scanner.scan(root, tx)
    });

    while let Ok(msg) = rx.recv() {
        match msg {
            ScanMsg::Progress { scanned, bytes } => {
                debug!(scanned, bytes, "scan progress");
                if args.max_files.is_some_and(|max| scanned >= max) && !cancel.swap(true, Ordering::Relaxed) {
                    warn!(scanned, "file limit reached, stopping scan");
                }
            }
            ScanMsg::Error(e) => warn!(error = %e, "skipping entry"),
            ScanMsg::Done(entry) => return Ok(entry),
        }
    }
    bail!("scanner exited without a result")
}

fn edit(tree: &mut WeightedTree, id: NodeId, args: &Args) -> Result<()> {
    let path = tree.path_string(id)?;
    if args.grow {
        let delta = tree.grow_leaf(id)?;
        debug!(delta, "grew");
    } else if args.shrink {
        let delta = tree.shrink_leaf(id)?;
        debug!(delta, "shrank");
    } else if args.remove {
        let weight = tree.remove_leaf(id).with_context(|| format!("removing {path}"))?;
        println!("removed {path} ({})", ByteSize(weight));
        return Ok(());
    }
    println!("{path} ({})", ByteSize(tree.node(id)?.weight));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_points() {
        assert_eq!("35,5".parse::<Point>().unwrap(), Point { x: 35, y: 5 });
        assert_eq!(" 1 , -2".parse::<Point>().unwrap(), Point { x: 1, y: -2 });
        assert!("35".parse::<Point>().is_err());
        assert!("a,b".parse::<Point>().is_err());
    }

    #[test]
    fn mutation_flags_are_exclusive() {
        assert!(Args::try_parse_from(["treemap-cli", ".", "--grow", "--remove"]).is_err());
        assert!(Args::try_parse_from(["treemap-cli", ".", "--select", "x", "--at", "1,2"]).is_err());
        let args = Args::try_parse_from(["treemap-cli", ".", "--at", "3,4", "--shrink"]).unwrap();
        assert_eq!(args.at, Some(Point { x: 3, y: 4 }));
        assert!(args.shrink);
    }

    #[test]
    fn negative_sizes_are_rejected() {
        assert!(Args::try_parse_from(["treemap-cli", ".", "--width", "-5"]).is_err());
    }
}
