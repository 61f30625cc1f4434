use crate::{service::LineageDirection, traversal::UNLIMITED_DEPTH};

pub const IN_MEMORY_DATABASE: &str = "memory";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// `"memory"` or a filesystem path to the SQLite database.
    pub database: String,
    pub adjacency_cache: bool,
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self {
            database: path.into(),
            adjacency_cache: true,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database == IN_MEMORY_DATABASE
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: IN_MEMORY_DATABASE.to_string(),
            adjacency_cache: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLineConfig {
    pub store: StoreConfig,
    pub direction: LineageDirection,
    pub max_depth: i32,
    pub command: String,
    pub command_args: Vec<String>,
}

impl CommandLineConfig {
    pub fn from_args(args: &[&str]) -> Result<Self, String> {
        let mut store = StoreConfig::default();
        let mut direction = LineageDirection::Both;
        let mut max_depth = UNLIMITED_DEPTH;
        let mut command = String::from("status");
        let mut command_args = Vec::new();
        let mut command_set = false;
        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            match *arg {
                "--db" | "--database" => {
                    store.database = iter
                        .next()
                        .ok_or_else(|| "--db requires a value".to_string())?
                        .to_string();
                }
                "--direction" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| "--direction requires a value".to_string())?;
                    direction = value.parse().map_err(|e| format!("{e}"))?;
                }
                "--depth" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| "--depth requires a value".to_string())?;
                    max_depth = value
                        .parse()
                        .map_err(|_| format!("--depth expects an integer, got {value}"))?;
                    if max_depth < UNLIMITED_DEPTH {
                        return Err(format!("--depth must be -1 or greater, got {max_depth}"));
                    }
                }
                "--no-cache" => store.adjacency_cache = false,
                other if other.starts_with("--") => {
                    return Err(format!("unknown flag {other}"));
                }
                _ if command_set => command_args.push(arg.to_string()),
                _ => {
                    command = arg.to_string();
                    command_set = true;
                }
            }
        }
        Ok(Self {
            store,
            direction,
            max_depth,
            command,
            command_args,
        })
    }

    pub fn help() -> &'static str {
        "Usage: lineagegraph [--db memory|PATH] [--direction upstream|downstream|both] [--depth N] [--no-cache] <command> [args]\n\
         Commands:\n  \
           status\n  \
           list\n  \
           add-node <name> <type>\n  \
           add-edge <source> <target> [edge_type]\n  \
           remove-edge <source> <target> [edge_type]\n  \
           graph <name>\n  \
           upstream <name>\n  \
           downstream <name>\n  \
           exists <name>\n  \
           stats <name>\n"
    }
}
