use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

mod cli;
mod config;

use cli::Cli;
use cli::commands::{Commands, HierarchyCommands, PluginCommands, RegistryCommands, ToolCommands};
use config::Config;
use toolshed::catalog::{ToolFilter, ToolView};
use toolshed::hierarchy::{Hierarchy, NodeKind};
use toolshed::registry::{ToolNode, ToolTree, load_definitions};
use toolshed::store::{Database, NewTool, NodeRecord, ToolRecord, ToolUpdate};
use toolshed::tools::McpRegistry;

fn setup_logging(level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("toolshed")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("toolshed.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG wins over the configured level
    let env = env_logger::Env::default().default_filter_or(level.unwrap_or("info"));
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Folder { command } => {
            let db = open_database(cli, config)?;
            handle_hierarchy_command(&db.folders(), command)
        }
        Commands::Label { command } => {
            let db = open_database(cli, config)?;
            handle_hierarchy_command(&db.labels(), command)
        }
        Commands::Tool { command } => {
            let db = open_database(cli, config)?;
            handle_tool_command(&db, command)
        }
        Commands::Registry { command } => handle_registry_command(command, config),
        Commands::Plugin { command } => handle_plugin_command(command),
    }
}

fn open_database(cli: &Cli, config: &Config) -> Result<Database> {
    let path = cli.db.as_ref().unwrap_or(&config.database.path);
    if cli.is_verbose() {
        println!("{} {}", "Database:".dimmed(), path.display());
    }
    Database::open(path).context(format!("Failed to open database at {}", path.display()))
}

fn handle_hierarchy_command<K: NodeKind>(hierarchy: &Hierarchy<'_, K>, command: &HierarchyCommands) -> Result<()> {
    info!("Handling {} command: {:?}", K::NOUN, command);
    match command {
        HierarchyCommands::List { parent } => {
            for record in hierarchy.list_children(*parent)? {
                print_node(&record);
            }
        }
        HierarchyCommands::Tree => {
            let tree = hierarchy.tree()?;
            for node in tree.flatten() {
                println!(
                    "{}{} {}",
                    "  ".repeat(node.depth),
                    node.record.name.bold(),
                    format!("#{}", node.record.id).dimmed()
                );
            }
        }
        HierarchyCommands::Show { id } => {
            let record = hierarchy
                .get(*id)?
                .ok_or_else(|| eyre!("{} {} not found", K::NOUN, id))?;
            print_node(&record);
        }
        HierarchyCommands::Create { name, parent } => {
            let id = hierarchy.create(name, *parent)?;
            println!("{} {} {} #{}", "Created".green(), K::NOUN, name, id);
        }
        HierarchyCommands::Rename { id, name } => {
            hierarchy.update(*id, name)?;
            println!("{} {} #{} to {}", "Renamed".green(), K::NOUN, id, name);
        }
        HierarchyCommands::Delete { id } => {
            hierarchy.delete(*id)?;
            println!("{} {} #{}", "Deleted".red(), K::NOUN, id);
        }
        HierarchyCommands::Move { id, parent } => {
            hierarchy.move_to(*id, *parent)?;
            println!("{} {} #{} under #{}", "Moved".green(), K::NOUN, id, parent);
        }
        HierarchyCommands::Copy { id, parent } => {
            let copy_id = hierarchy.copy(*id, *parent)?;
            println!("{} {} #{} as #{}", "Copied".green(), K::NOUN, id, copy_id);
        }
    }
    Ok(())
}

fn print_node(record: &NodeRecord) {
    let parent = record
        .parent_id
        .map(|p| format!("parent #{}", p))
        .unwrap_or_else(|| "root".to_string());
    println!("{:>5}  {}  {}", record.id, record.name.bold(), parent.dimmed());
}

fn handle_tool_command(db: &Database, command: &ToolCommands) -> Result<()> {
    info!("Handling tool command: {:?}", command);
    let catalog = db.tools();
    match command {
        ToolCommands::List {
            folder,
            search,
            folder_path,
            labels,
            json,
        } => {
            let mut filter = ToolFilter::default();
            if let Some(search) = search {
                filter = filter.with_search(search.as_str());
            }
            if let Some(folder_path) = folder_path {
                filter = filter.with_folder_path(folder_path.as_str());
            }
            if let Some(labels) = labels {
                filter = filter.with_label_csv(labels)?;
            }
            let mut views = catalog.search(&filter)?;
            if let Some(folder) = folder {
                views.retain(|view| view.tool.folder_id == *folder);
            }
            if *json {
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                for view in &views {
                    print_tool_view(view);
                }
            }
        }
        ToolCommands::Show { id } => {
            let tool = catalog
                .get(*id)?
                .ok_or_else(|| eyre!("tool {} not found", id))?;
            print_tool(&tool);
            let labels = catalog.list_labels(*id)?;
            if !labels.is_empty() {
                let names: Vec<&str> = labels.iter().map(|l| l.name.as_str()).collect();
                println!("       labels: {}", names.join(", ").cyan());
            }
        }
        ToolCommands::Create {
            name,
            folder,
            description,
            disabled,
        } => {
            let new_tool = NewTool::new(name.as_str())
                .with_description(description.as_str())
                .with_enabled(!disabled)
                .in_folder(*folder);
            let id = catalog.create(&new_tool)?;
            println!("{} tool {} #{}", "Created".green(), name, id);
        }
        ToolCommands::Update {
            id,
            name,
            description,
            enabled,
            folder,
        } => {
            let update = ToolUpdate {
                name: name.clone(),
                description: description.clone(),
                enabled: *enabled,
                folder_id: *folder,
            };
            let tool = catalog.update(*id, &update)?;
            print_tool(&tool);
        }
        ToolCommands::Delete { id } => {
            catalog.delete(*id)?;
            println!("{} tool #{}", "Deleted".red(), id);
        }
        ToolCommands::Move { id, folder } => {
            catalog.move_to(*id, *folder)?;
            println!("{} tool #{} to folder #{}", "Moved".green(), id, folder);
        }
        ToolCommands::Copy { id, folder } => {
            let copy_id = catalog.copy(*id, *folder)?;
            println!("{} tool #{} as #{}", "Copied".green(), id, copy_id);
        }
        ToolCommands::Tag { id, label } => {
            catalog.add_label(*id, *label)?;
            println!("{} label #{} to tool #{}", "Added".green(), label, id);
        }
        ToolCommands::Untag { id, label } => {
            catalog.remove_label(*id, *label)?;
            println!("{} label #{} from tool #{}", "Removed".yellow(), label, id);
        }
        ToolCommands::Labels { id } => {
            for label in catalog.list_labels(*id)? {
                println!("{:>5}  {}", label.id, label.name);
            }
        }
    }
    Ok(())
}

fn enabled_marker(enabled: bool) -> ColoredString {
    if enabled { "on ".green() } else { "off".red() }
}

fn print_tool(tool: &ToolRecord) {
    println!(
        "{:>5}  {}  {}  {}",
        tool.id,
        enabled_marker(tool.enabled),
        tool.name.bold(),
        tool.description.dimmed()
    );
}

fn print_tool_view(view: &ToolView) {
    let labels: Vec<&str> = view.labels.iter().map(|l| l.name.as_str()).collect();
    println!(
        "{:>5}  {}  {}  {}  {}",
        view.tool.id,
        enabled_marker(view.tool.enabled),
        view.tool.name.bold(),
        format!("[{}]", view.folder_path).dimmed(),
        labels.join(", ").cyan()
    );
}

fn load_registry(config: &Config) -> Result<ToolTree> {
    match &config.registry.definitions {
        Some(path) => {
            let definitions = load_definitions(path)
                .context(format!("Failed to load registry definitions from {}", path.display()))?;
            Ok(ToolTree::discover(&definitions))
        }
        None => Ok(ToolTree::with_defaults()),
    }
}

fn handle_registry_command(command: &RegistryCommands, config: &Config) -> Result<()> {
    info!("Handling registry command: {:?}", command);
    let mut tree = load_registry(config)?;
    match command {
        RegistryCommands::List { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(tree.root())?);
            } else {
                print_registry_node(tree.root(), 0);
            }
        }
        RegistryCommands::Enable { name } => toggle_registry(&mut tree, name, true)?,
        RegistryCommands::Disable { name } => toggle_registry(&mut tree, name, false)?,
        RegistryCommands::Path { name } => {
            let path = tree.label_path(name);
            if path.is_empty() {
                return Err(eyre!("registry node '{}' not found", name));
            }
            println!("{}", path.join(" > "));
        }
    }
    Ok(())
}

fn toggle_registry(tree: &mut ToolTree, name: &str, enabled: bool) -> Result<()> {
    if !tree.toggle(name, enabled) {
        return Err(eyre!("registry node '{}' not found", name));
    }
    // The tree is rebuilt on every run, so the change lasts for this process only
    println!("{} {}", if enabled { "Enabled".green() } else { "Disabled".red() }, name);
    Ok(())
}

fn print_registry_node(node: &ToolNode, depth: usize) {
    println!(
        "{}{} {} {}",
        "  ".repeat(depth),
        enabled_marker(node.enabled),
        node.label.bold(),
        format!("({})", node.name).dimmed()
    );
    for child in &node.children {
        print_registry_node(child, depth + 1);
    }
}

fn handle_plugin_command(command: &PluginCommands) -> Result<()> {
    info!("Handling plugin command: {:?}", command);
    let registry = McpRegistry::with_builtins();
    match command {
        PluginCommands::List => {
            for descriptor in registry.list_tools() {
                println!("{}", serde_json::to_string(&descriptor)?);
            }
        }
        PluginCommands::Call { name, payload } => {
            let payload: Value = serde_json::from_str(payload).context("Payload is not valid JSON")?;
            let result = registry.call(name, payload)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging with the configured level
    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
