use std::{env, process};

use lineagegraph::{
    CommandLineConfig, Edge, EdgeType, GraphStore, LineageError, LineageService, Node, NodeType,
    SqliteLineageStore, find_downstream, find_upstream, statistics_map,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lineagegraph=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("{}", CommandLineConfig::help());
        return;
    }
    let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
    let config = match CommandLineConfig::from_args(&arg_refs) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("error: {err}");
            eprint!("{}", CommandLineConfig::help());
            process::exit(2);
        }
    };

    let store = match SqliteLineageStore::from_config(&config.store) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("{err}");
            process::exit(2);
        }
    };

    if let Err(err) = run_command(&store, &config) {
        eprintln!("command failed: {err}");
        process::exit(1);
    }
}

fn run_command(store: &SqliteLineageStore, config: &CommandLineConfig) -> Result<(), LineageError> {
    let args = &config.command_args;
    let service: LineageService<&SqliteLineageStore> = store.lineage();
    match config.command.as_str() {
        "status" => {
            let (nodes, edges) = store.counts()?;
            println!("backend=sqlite nodes={nodes} edges={edges}");
        }
        "add-node" => {
            let name = arg(args, 0, "node name")?;
            let node_type: NodeType = arg(args, 1, "node type")?.parse()?;
            store.insert_node(&Node::new(name, node_type))?;
            println!("registered {name}");
        }
        "add-edge" => {
            let (source, target, edge_type) = edge_args(args)?;
            store.insert_edge(&Edge::new(source, target, edge_type))?;
            println!("{source} -> {target} ({edge_type})");
        }
        "remove-edge" => {
            let (source, target, edge_type) = edge_args(args)?;
            let removed = store.delete_edge(source, target, edge_type)?;
            println!("removed {removed}");
        }
        "graph" => {
            let name = arg(args, 0, "resource name")?;
            let graph = service.get_lineage_graph(name, config.direction, config.max_depth)?;
            print_json(&graph)?;
        }
        "upstream" | "downstream" => {
            let name = arg(args, 0, "resource name")?;
            if !service.exists_in_lineage(name)? {
                return Err(LineageError::resource_not_found(name));
            }
            let items = if config.command == "upstream" {
                find_upstream(service.store(), name, config.max_depth)?
            } else {
                find_downstream(service.store(), name, config.max_depth)?
            };
            for item in items {
                println!("{}\t{}", item.depth, item.name);
            }
        }
        "exists" => {
            let name = arg(args, 0, "resource name")?;
            println!("{}", service.exists_in_lineage(name)?);
        }
        "stats" => {
            let name = arg(args, 0, "resource name")?;
            print_json(&statistics_map(service.get_lineage_statistics(name)?))?;
        }
        "list" => {
            for name in store.list_node_names()? {
                let kind = store
                    .find_node(&name)?
                    .map(|node| node.node_type.to_string())
                    .unwrap_or_default();
                println!("{name}\t{kind}");
            }
        }
        other => {
            return Err(LineageError::invalid_input(format!("unknown command {other}")));
        }
    }
    Ok(())
}

fn arg<'a>(args: &'a [String], idx: usize, what: &str) -> Result<&'a str, LineageError> {
    args.get(idx)
        .map(String::as_str)
        .ok_or_else(|| LineageError::invalid_input(format!("missing {what}")))
}

fn edge_args(args: &[String]) -> Result<(&str, &str, EdgeType), LineageError> {
    let source = arg(args, 0, "edge source")?;
    let target = arg(args, 1, "edge target")?;
    let edge_type = match args.get(2) {
        Some(raw) => raw.parse()?,
        None => EdgeType::default(),
    };
    Ok((source, target, edge_type))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), LineageError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| LineageError::invalid_input(e.to_string()))?;
    println!("{text}");
    Ok(())
}
