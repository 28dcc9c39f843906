//! Factory Planner
//!
//! Command line front end: edit stored factories and print their flow report.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing::info;
use tracing_subscriber::EnvFilter;

use factory_planner::config::{PlannerConfig, ResidualPolicy};
use factory_planner::persist::{SnapshotWriter, SqliteSink};
use factory_planner::{Catalog, Factory, Position, Recipe, engine, port, report, sample, store};

#[derive(Parser)]
#[command(name = "factory-planner")]
#[command(about = "Plan production networks and see where items flow")]
struct Cli {
    /// Path to the SQLite database holding factories
    #[arg(short, long, default_value = "factories.db")]
    database: PathBuf,

    /// Game data dump (file or directory of JSON files); the built-in sample is used if omitted
    #[arg(long)]
    dump: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override what happens to producer output nobody claims
    #[arg(long, value_enum)]
    residual_policy: Option<ResidualPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a data dump and report what it contains
    Extract {
        /// Path to the dump file or directory
        dump: PathBuf,
    },

    /// List recipes, optionally only those mentioning an item
    ListRecipes {
        /// Item id to filter on
        #[arg(long)]
        item: Option<String>,
    },

    /// List all items in the catalog
    ListItems,

    /// Create an empty factory
    Create {
        /// Display name
        #[arg(default_value = Factory::DEFAULT_NAME)]
        name: String,

        /// Explicit id (generated if omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// List stored factories, most recently changed first
    List,

    /// Delete a stored factory
    Delete { factory: String },

    /// Rename a factory
    Rename { factory: String, name: String },

    /// Add a building running a recipe
    Add {
        factory: String,
        recipe: String,

        /// Number of parallel machines
        #[arg(short, long, default_value = "1.0")]
        count: f64,
    },

    /// Remove a building and its connections
    Remove { factory: String, building: String },

    /// Set the number of machines in a building
    Count {
        factory: String,
        building: String,
        count: f64,
    },

    /// Change a building's recipe
    Recipe {
        factory: String,
        building: String,
        recipe: String,
    },

    /// Connect an output port to an input port (port ids as printed by `show`)
    Connect {
        factory: String,
        source: String,
        target: String,
    },

    /// Remove a connection
    Disconnect { factory: String, connection: String },

    /// Create a matching building attached to a dangling port
    Extend {
        factory: String,
        port: String,

        #[arg(long, default_value = "0")]
        x: f64,

        #[arg(long, default_value = "0")]
        y: f64,
    },

    /// Show buildings, port flows and unconnected totals
    Show { factory: String },
}

fn load_catalog(cli: &Cli) -> Result<Catalog> {
    let (catalog, stats) = match &cli.dump {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("Failed to load dump {}", path.display()))?,
        None => {
            info!("no dump given, using built-in sample catalog");
            sample::sample_catalog()?
        }
    };
    info!("{}", stats);
    Ok(catalog)
}

fn load_config(cli: &Cli) -> Result<PlannerConfig> {
    let mut config = match &cli.config {
        Some(path) => PlannerConfig::load(path)?,
        None => PlannerConfig::default(),
    };
    if let Some(policy) = cli.residual_policy {
        config.residual_policy = policy;
    }
    Ok(config)
}

fn extract_dump(dump: &Path) -> Result<()> {
    let (dumped, stats) =
        Catalog::load(dump).with_context(|| format!("Failed to load dump {}", dump.display()))?;
    println!("{}", stats);
    println!(
        "{} recipes produced in a machine",
        dumped
            .recipes()
            .iter()
            .filter(|r| r.is_machine_recipe())
            .count()
    );
    Ok(())
}

fn print_recipes<'a>(recipes: impl IntoIterator<Item = &'a Recipe>) {
    println!("{:<36} {:<24} {}", "Recipe", "Machine", "Id");
    println!("{}", "-".repeat(80));
    for recipe in recipes {
        println!(
            "{:<36} {:<24} {}",
            recipe.name,
            recipe.produced_in.as_deref().unwrap_or("-"),
            recipe.id
        );
    }
}

fn require_factory(conn: &Connection, id: &str) -> Result<Factory> {
    store::load_factory(conn, id)?.ok_or_else(|| anyhow!("Factory '{}' not found", id))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if let Commands::Extract { dump } = &cli.command {
        return extract_dump(dump);
    }

    let catalog = load_catalog(&cli)?;
    let conn = Connection::open(&cli.database)?;
    store::init_schema(&conn)?;
    let writer = SnapshotWriter::spawn(SqliteSink::open(&cli.database)?, config.debounce());

    let updated = match &cli.command {
        // Handled before any catalog or database is opened.
        Commands::Extract { .. } => None,

        Commands::ListRecipes { item } => {
            match item {
                Some(item) => {
                    println!("Producing {}:", catalog.display_name(item));
                    print_recipes(catalog.producers_of(item));
                    println!();
                    println!("Consuming {}:", catalog.display_name(item));
                    print_recipes(catalog.consumers_of(item));
                }
                None => print_recipes(catalog.recipes()),
            }
            None
        }

        Commands::ListItems => {
            for item in catalog.items() {
                println!("  {:<32} {}", item.name, item.id);
            }
            None
        }

        Commands::Create { name, id } => {
            let id = id.clone().unwrap_or_else(|| {
                format!(
                    "factory-{}",
                    time::OffsetDateTime::now_utc().unix_timestamp_nanos()
                )
            });
            if store::load_factory(&conn, &id)?.is_some() {
                bail!("Factory '{}' already exists", id);
            }
            let factory = engine::rename(&Factory::new(id.clone()), name);
            println!("Created factory {}", id);
            Some(factory)
        }

        Commands::List => {
            let factories = store::list_factories(&conn)?;
            if factories.is_empty() {
                println!("No factories yet. Run 'create' first.");
            }
            for f in factories {
                println!("{:<30} {:<24} {}", f.name, f.id, f.updated_at);
            }
            None
        }

        Commands::Delete { factory } => {
            if store::delete_factory(&conn, factory)? {
                println!("Deleted {}", factory);
            } else {
                println!("Factory '{}' not found", factory);
            }
            None
        }

        Commands::Rename { factory, name } => {
            Some(engine::rename(&require_factory(&conn, factory)?, name))
        }

        Commands::Add {
            factory,
            recipe,
            count,
        } => {
            let current = require_factory(&conn, factory)?;
            let recipe = catalog
                .recipe(recipe)
                .ok_or_else(|| anyhow!("Recipe '{}' not found", recipe))?;
            let (next, id) = engine::add_building(&current, recipe, None, *count, &config)?;
            println!("Added {} ({})", id, recipe.name);
            Some(next)
        }

        Commands::Remove { factory, building } => Some(engine::remove_building(
            &require_factory(&conn, factory)?,
            building,
        )?),

        Commands::Count {
            factory,
            building,
            count,
        } => Some(engine::set_building_count(
            &require_factory(&conn, factory)?,
            building,
            *count,
        )?),

        Commands::Recipe {
            factory,
            building,
            recipe,
        } => {
            let current = require_factory(&conn, factory)?;
            let next = engine::set_recipe(&current, building, recipe, &catalog)?;
            let removed = current.connections.len() - next.connections.len();
            if removed > 0 {
                println!("Removed {} connection(s) no longer carried", removed);
            }
            Some(next)
        }

        Commands::Connect {
            factory,
            source,
            target,
        } => {
            let current = require_factory(&conn, factory)?;
            let (next, id) =
                engine::connect(&current, port::decode(source)?, port::decode(target)?)?;
            println!("Connected {}", id);
            Some(next)
        }

        Commands::Disconnect {
            factory,
            connection,
        } => Some(engine::disconnect(
            &require_factory(&conn, factory)?,
            connection,
        )),

        Commands::Extend { factory, port, x, y } => {
            let current = require_factory(&conn, factory)?;
            let dragged = port::decode(port)?;
            match engine::auto_extend(&current, &dragged, Position::new(*x, *y), &catalog, &config)
            {
                Some((next, id)) => {
                    let recipe = next
                        .building(&id)
                        .map_or("?", |b| b.recipe.name.as_str());
                    println!("Added {} ({})", id, recipe);
                    Some(next)
                }
                None => {
                    println!("No recipe fits {}", port);
                    None
                }
            }
        }

        Commands::Show { factory } => {
            let factory = require_factory(&conn, factory)?;
            let report = report::summarize_factory(&factory, &catalog, config.residual_policy);
            println!("{}", report);
            None
        }
    };

    if let Some(factory) = updated {
        writer.submit(factory);
    }
    writer.shutdown();

    Ok(())
}
