//! Lap CLI - mesh asset processing command-line tool.
//!
//! Usage: lap <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `lap --help` for available commands.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use lap::io::{self, ImportOptions, ObjModel};
use lap::mesh::{
    indexed_mesh_from_mesh, indexed_mesh_with_options, mesh_from_indexed_mesh, model_from_mesh,
    AnyMesh, Mesh, ModelVertex, WeldOptions,
};

#[derive(Parser)]
#[command(name = "lap")]
#[command(author, version, about = "Mesh asset processing CLI", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Skip reading material libraries
    #[arg(long, global = true)]
    no_materials: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh and per-group statistics
    Info {
        /// Input OBJ file
        input: PathBuf,
    },

    /// Print the mesh contents
    Dump {
        /// Input OBJ file
        input: PathBuf,

        /// Weld the mesh before printing
        #[arg(long)]
        indexed: bool,
    },

    /// Write each geometry group to its own file
    Extract {
        /// Input OBJ file
        input: PathBuf,

        /// Directory for the extracted groups
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Weld duplicate vertices and write the result
    Weld {
        /// Input OBJ file
        input: PathBuf,

        /// Output OBJ file
        output: PathBuf,

        /// Welding method
        #[arg(short, long, value_enum, default_value = "kd-tree")]
        method: Method,
    },

    /// Parse a file and write it back out
    Convert {
        /// Input OBJ file
        input: PathBuf,

        /// Output OBJ file
        output: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Method {
    /// Incremental kd-tree over positions
    KdTree,
    /// Linear scan of the palette (exact but quadratic)
    Scan,
}

impl From<Method> for lap::mesh::WeldMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::KdTree => lap::mesh::WeldMethod::KdTree,
            Method::Scan => lap::mesh::WeldMethod::Scan,
        }
    }
}

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult {
    let options = ImportOptions::default().with_load_materials(!cli.no_materials);

    match cli.command {
        Commands::Info { input } => cmd_info(&input, &options)?,
        Commands::Dump { input, indexed } => cmd_dump(&input, &options, indexed)?,
        Commands::Extract { input, out_dir } => cmd_extract(&input, &options, &out_dir)?,
        Commands::Weld {
            input,
            output,
            method,
        } => cmd_weld(&input, &output, &options, method)?,
        Commands::Convert { input, output } => cmd_convert(&input, &output, &options)?,
    }

    Ok(())
}

fn load(input: &Path, options: &ImportOptions) -> CliResult<(ObjModel, AnyMesh)> {
    let model = io::load_model(input, options)?;
    let mesh = AnyMesh::from_model(&model)?;
    Ok((model, mesh))
}

fn cmd_info(input: &Path, options: &ImportOptions) -> CliResult {
    let (model, mesh) = load(input, options)?;

    println!("File: {}", input.display());
    println!("Vertex format: {}", model.vertex_format());
    println!("Triangles: {}", model.num_triangles());

    match &mesh {
        AnyMesh::P(m) => print_info(m),
        AnyMesh::PT(m) => print_info(m),
        AnyMesh::PN(m) => print_info(m),
        AnyMesh::PTN(m) => print_info(m),
    }
}

fn print_info<V: ModelVertex>(mesh: &Mesh<V>) -> CliResult {
    let flat = mesh.flatten()?;
    let indexed = indexed_mesh_from_mesh(&flat)?;
    println!("Vertices: {}", mesh.vertices().len());
    println!(
        "Indexed: {} vertices, {} indices",
        indexed.vertices().len(),
        indexed.indices().len()
    );

    for group in mesh.geometry_groups() {
        let part = mesh.slice(group)?.flatten()?;
        let welded = indexed_mesh_from_mesh(&part)?;
        let materials: Vec<&str> = part.material_groups().iter().map(|g| g.name()).collect();
        println!(
            "  {}: {} vertices, {} welded, {} indices, materials [{}]",
            group.name(),
            part.vertices().len(),
            welded.vertices().len(),
            welded.indices().len(),
            materials.join(", ")
        );
    }

    Ok(())
}

fn cmd_dump(input: &Path, options: &ImportOptions, indexed: bool) -> CliResult {
    let (_, mesh) = load(input, options)?;

    match &mesh {
        AnyMesh::P(m) => print_mesh(m, indexed),
        AnyMesh::PT(m) => print_mesh(m, indexed),
        AnyMesh::PN(m) => print_mesh(m, indexed),
        AnyMesh::PTN(m) => print_mesh(m, indexed),
    }
}

fn print_mesh<V: ModelVertex>(mesh: &Mesh<V>, indexed: bool) -> CliResult {
    if indexed {
        print!("{}", indexed_mesh_from_mesh(mesh)?);
    } else {
        print!("{}", mesh);
    }
    Ok(())
}

fn cmd_extract(input: &Path, options: &ImportOptions, out_dir: &Path) -> CliResult {
    let (_, mesh) = load(input, options)?;
    std::fs::create_dir_all(out_dir)?;

    let start = Instant::now();
    let written = match &mesh {
        AnyMesh::P(m) => extract_groups(m, out_dir)?,
        AnyMesh::PT(m) => extract_groups(m, out_dir)?,
        AnyMesh::PN(m) => extract_groups(m, out_dir)?,
        AnyMesh::PTN(m) => extract_groups(m, out_dir)?,
    };
    println!(
        "Extracted {} groups to {} ({:.2?})",
        written,
        out_dir.display(),
        start.elapsed()
    );

    Ok(())
}

fn extract_groups<V: ModelVertex>(mesh: &Mesh<V>, out_dir: &Path) -> CliResult<usize> {
    let mut written = 0;
    for group in mesh.geometry_groups() {
        if group.is_empty() {
            log::warn!("skipping empty group '{}'", group.name());
            continue;
        }
        let part = mesh.slice(group)?.flatten()?;
        let welded = indexed_mesh_from_mesh(&part)?;
        let unwelded = mesh_from_indexed_mesh(&welded)?;

        let path = out_dir.join(format!("{}.obj", group.name()));
        let mut model = model_from_mesh(&unwelded)?;
        model.name = group.name().to_string();
        io::save_model(&model, &path)?;
        println!(
            "Saved: {} ({} vertices welded to {})",
            path.display(),
            part.vertices().len(),
            welded.vertices().len()
        );
        written += 1;
    }
    Ok(written)
}

fn cmd_weld(input: &Path, output: &Path, options: &ImportOptions, method: Method) -> CliResult {
    let (model, mesh) = load(input, options)?;

    println!(
        "Loaded: {} triangles ({})",
        model.num_triangles(),
        model.vertex_format()
    );

    let weld = WeldOptions::default().with_method(method.into());
    let start = Instant::now();
    let result = match &mesh {
        AnyMesh::P(m) => AnyMesh::P(weld_mesh(m, &weld)?),
        AnyMesh::PT(m) => AnyMesh::PT(weld_mesh(m, &weld)?),
        AnyMesh::PN(m) => AnyMesh::PN(weld_mesh(m, &weld)?),
        AnyMesh::PTN(m) => AnyMesh::PTN(weld_mesh(m, &weld)?),
    };
    let elapsed = start.elapsed();

    let mut out = result.to_model()?;
    out.name = model.name;
    println!(
        "Result: {} positions, {} uvs, {} normals",
        out.positions.len(),
        out.uvs.len(),
        out.normals.len()
    );
    io::save_model(&out, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn weld_mesh<V: ModelVertex>(mesh: &Mesh<V>, options: &WeldOptions) -> CliResult<Mesh<V>> {
    let flat = mesh.flatten()?;
    if flat.vertices().is_empty() {
        return Ok(flat);
    }
    let indexed = indexed_mesh_with_options(&flat, options)?;
    println!(
        "Welded {} corners to {} vertices",
        flat.vertices().len(),
        indexed.vertices().len()
    );
    Ok(mesh_from_indexed_mesh(&indexed)?)
}

fn cmd_convert(input: &Path, output: &Path, options: &ImportOptions) -> CliResult {
    let model = io::load_model(input, options)?;
    println!(
        "Loaded: {} positions, {} triangles",
        model.positions.len(),
        model.num_triangles()
    );
    io::save_model(&model, output)?;
    println!("Saved: {}", output.display());
    Ok(())
}
