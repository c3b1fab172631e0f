//! gdmlkit CLI - build the detector setup and write it as GDML.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gdmlkit::MaterialCatalog;
use gdmlkit_ir::{Document, Placement, PlacementTarget};
use gdmlkit_setup::SetupConfig;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gdmlkit")]
#[command(about = "Parametric detector geometry written as GDML", long_about = None)]
struct Cli {
    /// Log debug events
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the setup and write it as GDML
    Build {
        /// TOML configuration (defaults are used for missing keys)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// GDML materials file extending the NIST catalog
        #[arg(short, long)]
        materials: Option<PathBuf>,
        /// Output GDML file
        #[arg(short, long, default_value = "Setup.gdml")]
        output: PathBuf,
        /// Also write the geometry document as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Print the default configuration as TOML
    Defaults,
    /// Summarize a JSON geometry document
    Info {
        /// Path to the .json document
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build {
            config,
            materials,
            output,
            json,
        } => build(config.as_deref(), materials.as_deref(), &output, json.as_deref())?,
        Commands::Defaults => {
            print!("{}", SetupConfig::default().to_toml_string()?);
        }
        Commands::Info { file } => show_info(&file)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn build(
    config: Option<&Path>,
    materials: Option<&Path>,
    output: &Path,
    json: Option<&Path>,
) -> Result<()> {
    let config = match config {
        Some(path) => SetupConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SetupConfig::default(),
    };

    let mut catalog = MaterialCatalog::nist();
    if let Some(path) = materials {
        let file = MaterialCatalog::from_file(path)
            .with_context(|| format!("failed to read materials {}", path.display()))?;
        catalog.extend(file);
    }

    let doc = gdmlkit_setup::build_geometry(&config, catalog).context("failed to build setup")?;
    gdmlkit::write_gdml(&doc, output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    if let Some(path) = json {
        gdmlkit::write_json(&doc, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    println!("Wrote {}", output.display());
    Ok(())
}

fn show_info(file: &Path) -> Result<()> {
    let doc = gdmlkit::read_json(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    println!("gdmlkit document: {}", file.display());
    println!("  Version: {}", doc.version);
    println!("  Materials: {}", doc.materials.len());
    println!("  Solids: {}", doc.solids.len());
    println!("  Volumes: {}", doc.volumes.len());
    println!("  Assemblies: {}", doc.assemblies.len());
    println!("  Placements: {}", doc.placement_count());

    match &doc.world {
        Some(world) => {
            println!("\nWorld: {}", world.volume);
            print_placements(&doc, &world.placements, 1);
        }
        None => println!("\nWorld: not set"),
    }

    if let Err(e) = gdmlkit::validate(&doc) {
        println!("\nInvalid document: {}", e);
    }
    Ok(())
}

fn print_placements(doc: &Document, placements: &[Placement], depth: usize) {
    // Bounded so a cyclic document cannot recurse forever
    if depth > doc.assemblies.len() + 1 {
        return;
    }
    let indent = "  ".repeat(depth);
    for placement in placements {
        let z = placement.transform.position.z;
        match &placement.target {
            PlacementTarget::Volume(name) => {
                println!("{}{} -> volume {} (z = {})", indent, placement.name, name, z);
            }
            PlacementTarget::Assembly(name) => {
                println!("{}{} -> assembly {} (z = {})", indent, placement.name, name, z);
                if let Some(assembly) = doc.assembly(name) {
                    print_placements(doc, &assembly.placements, depth + 1);
                }
            }
        }
    }
}
