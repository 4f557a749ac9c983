#![forbid(unsafe_code)]

mod defaults;

use ns_core::ids::{NodeId, TreeId};
use ns_core::{Directive, MoveOutcome, Node};
use ns_storage::{CreateNodeRequest, SqliteStore, StoreConfig, StoreError, TreeQuery};
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
struct CliConfig {
    storage_dir: PathBuf,
    tree: TreeId,
    verify: Option<bool>,
    command: Command,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Show { id: Option<NodeId> },
    Create {
        name: String,
        id: Option<NodeId>,
        parent: Option<NodeId>,
    },
    Move { id: NodeId, directive: Directive },
    SetParent { id: NodeId, parent: Option<NodeId> },
    Delete { id: NodeId },
    Check,
    Rebuild,
    Trees,
}

fn usage() -> &'static str {
    "nestset: inspect and edit nested set trees stored in SQLite\n\n\
USAGE:\n\
  nestset [--storage-dir DIR] [--tree ID] [--verify | --no-verify] COMMAND\n\n\
COMMANDS:\n\
  show [ID]                          whole tree, or ID with its subtree\n\
  create NAME [--parent ID] [--id ID]\n\
  move ID DIRECTIVE [REF]            higher | lower | highest | lowest | indent | outdent\n\
                                     above REF | below REF | into REF | to POSITION\n\
  set-parent ID PARENT|none\n\
  delete ID                          removes ID and its subtree\n\
  check                              run the tree self-check\n\
  rebuild                            recompute bounds from parent links\n\
  trees                              list stored trees\n\n\
ENV:\n\
  NESTSET_STORAGE_DIR, NESTSET_TREE, NESTSET_DB_FILE, NESTSET_BUSY_TIMEOUT_MS, NESTSET_VERIFY\n\
  RUST_LOG (default: info, written to stderr)\n"
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_storage_dir() -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    defaults::default_storage_dir_from_start(&cwd)
}

fn parse_node_id(raw: &str, what: &str) -> Result<NodeId, String> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|v| NodeId::try_new(v).ok())
        .ok_or_else(|| format!("{what} must be a positive integer, got {raw:?}"))
}

/// Accepts `into:3` as well as `into 3`.
fn parse_directive(raw: &str, argument: Option<&str>) -> Result<Directive, String> {
    let (name, inline) = match raw.split_once(':') {
        Some((name, value)) => (name, Some(value)),
        None => (raw, None),
    };
    let value = inline.or(argument);
    let reference = |label: &str| -> Result<NodeId, String> {
        let value = value.ok_or_else(|| format!("{name} requires {label}"))?;
        parse_node_id(value, label)
    };

    let directive = match name.to_ascii_lowercase().as_str() {
        "higher" => Directive::Higher,
        "lower" => Directive::Lower,
        "highest" => Directive::Highest,
        "lowest" => Directive::Lowest,
        "indent" => Directive::Indent,
        "outdent" => Directive::Outdent,
        "above" => Directive::Above(reference("REF")?),
        "below" => Directive::Below(reference("REF")?),
        "into" => Directive::Into(reference("REF")?),
        "to" => {
            let value = value.ok_or("to requires POSITION")?;
            let position = value
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("POSITION must be an integer, got {value:?}"))?;
            Directive::To(position)
        }
        other => return Err(format!("unknown directive {other:?}")),
    };
    Ok(directive)
}

fn parse_command(
    positional: &[String],
    id: Option<NodeId>,
    parent: Option<NodeId>,
) -> Result<Command, String> {
    let (head, rest) = positional.split_first().ok_or("missing COMMAND")?;
    let arg = |index: usize, label: &str| {
        rest.get(index)
            .map(String::as_str)
            .ok_or_else(|| format!("{head} requires {label}"))
    };

    let command = match head.as_str() {
        "show" => Command::Show {
            id: rest.first().map(|v| parse_node_id(v, "ID")).transpose()?,
        },
        "create" => Command::Create {
            name: arg(0, "NAME")?.to_string(),
            id,
            parent,
        },
        "move" => Command::Move {
            id: parse_node_id(arg(0, "ID")?, "ID")?,
            directive: parse_directive(arg(1, "DIRECTIVE")?, rest.get(2).map(String::as_str))?,
        },
        "set-parent" => {
            let target = arg(1, "PARENT")?;
            Command::SetParent {
                id: parse_node_id(arg(0, "ID")?, "ID")?,
                parent: match target {
                    "none" => None,
                    other => Some(parse_node_id(other, "PARENT")?),
                },
            }
        }
        "delete" => Command::Delete {
            id: parse_node_id(arg(0, "ID")?, "ID")?,
        },
        "check" => Command::Check,
        "rebuild" => Command::Rebuild,
        "trees" => Command::Trees,
        other => return Err(format!("unknown command {other:?}")),
    };
    Ok(command)
}

fn parse_args(args: &[String]) -> Result<CliConfig, String> {
    let mut storage_dir: Option<PathBuf> = env_var("NESTSET_STORAGE_DIR").map(PathBuf::from);
    let mut tree: String =
        env_var("NESTSET_TREE").unwrap_or_else(|| defaults::DEFAULT_TREE.to_string());
    let mut verify: Option<bool> = None;
    let mut id: Option<NodeId> = None;
    let mut parent: Option<NodeId> = None;
    let mut positional = Vec::new();

    let mut i = 0usize;
    while i < args.len() {
        let a = args[i].as_str();
        match a {
            "--storage-dir" => {
                i += 1;
                let v = args.get(i).ok_or("--storage-dir requires DIR")?;
                storage_dir = Some(PathBuf::from(v));
            }
            "--tree" => {
                i += 1;
                let v = args.get(i).ok_or("--tree requires ID")?;
                tree = v.to_string();
            }
            "--verify" => verify = Some(true),
            "--no-verify" => verify = Some(false),
            "--id" => {
                i += 1;
                let v = args.get(i).ok_or("--id requires ID")?;
                id = Some(parse_node_id(v, "--id")?);
            }
            "--parent" => {
                i += 1;
                let v = args.get(i).ok_or("--parent requires ID")?;
                parent = Some(parse_node_id(v, "--parent")?);
            }
            _ if a.starts_with("--") => return Err(format!("unknown flag {a}")),
            _ => positional.push(a.to_string()),
        }
        i += 1;
    }

    let tree = TreeId::try_new(tree).map_err(|e| format!("--tree: {e}"))?;
    let command = parse_command(&positional, id, parent)?;
    Ok(CliConfig {
        storage_dir: storage_dir.unwrap_or_else(default_storage_dir),
        tree,
        verify,
        command,
    })
}

fn node_json(query: &TreeQuery<'_>, node: &Node) -> Result<Value, StoreError> {
    Ok(json!({
        "id": node.id.get(),
        "name": node.name,
        "parent_id": node.parent_id.map(NodeId::get),
        "left": node.left(),
        "right": node.right(),
        "level": query.level(node)?,
    }))
}

fn nodes_json(query: &TreeQuery<'_>, nodes: &[Node]) -> Result<Value, StoreError> {
    let rendered = nodes
        .iter()
        .map(|node| node_json(query, node))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(rendered))
}

fn outcome_json(query: &TreeQuery<'_>, outcome: &MoveOutcome) -> Result<Value, StoreError> {
    Ok(match outcome {
        MoveOutcome::Moved(node) => json!({ "moved": true, "node": node_json(query, node)? }),
        MoveOutcome::Rejected(reason) => json!({ "moved": false, "reason": reason.as_str() }),
    })
}

fn open_store(cfg: &CliConfig) -> Result<SqliteStore, StoreError> {
    let mut config = StoreConfig::from_env(&cfg.storage_dir);
    if let Some(verify) = cfg.verify {
        config.verify_invariants = verify;
    }
    SqliteStore::open_with(config)
}

fn run(store: &mut SqliteStore, cfg: &CliConfig) -> Result<Value, StoreError> {
    let tree = &cfg.tree;
    let value = match &cfg.command {
        Command::Show { id } => {
            let query = store.query(tree);
            let nodes = match id {
                Some(id) => query.self_and_descendants(&query.get(*id)?)?,
                None => query.nodes()?,
            };
            json!({ "tree": tree.as_str(), "nodes": nodes_json(&query, &nodes)? })
        }
        Command::Create { name, id, parent } => {
            let mut request = CreateNodeRequest::new(name.clone());
            if let Some(id) = id {
                request = request.with_id(*id);
            }
            if let Some(parent) = parent {
                request = request.under(*parent);
            }
            let node = store.create_node(tree, request)?;
            json!({ "tree": tree.as_str(), "node": node_json(&store.query(tree), &node)? })
        }
        Command::Move { id, directive } => {
            let outcome = store.move_node(tree, *id, *directive)?;
            outcome_json(&store.query(tree), &outcome)?
        }
        Command::SetParent { id, parent } => {
            let outcome = store.set_parent(tree, *id, *parent)?;
            outcome_json(&store.query(tree), &outcome)?
        }
        Command::Delete { id } => {
            let deleted = store.delete_node(tree, *id)?;
            json!({ "tree": tree.as_str(), "deleted": deleted })
        }
        Command::Check => {
            store.check_tree(tree)?;
            json!({ "tree": tree.as_str(), "ok": true, "nodes": store.query(tree).count()? })
        }
        Command::Rebuild => {
            let changed = store.rebuild_bounds(tree)?;
            json!({ "tree": tree.as_str(), "changed": changed })
        }
        Command::Trees => {
            let trees = store
                .list_trees()?
                .iter()
                .map(|tree| Value::String(tree.as_str().to_string()))
                .collect::<Vec<_>>();
            json!({ "trees": trees })
        }
    };
    Ok(value)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print!("{}", usage());
        return;
    }
    let cfg = match parse_args(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}\n\n{}", usage());
            std::process::exit(2);
        }
    };
    init_logging();

    let result = open_store(&cfg).and_then(|mut store| run(&mut store, &cfg));
    match result {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(2);
            }
        },
        Err(e) => {
            tracing::error!(tree = %cfg.tree, error = %e, "command failed");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
