// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! area-mesher: polygons in, left/right attributed line mesh out.
//!
//! Usage: `area-mesher --output mesh.geojson --id-field OKOOD parishes.geojson`
//!
//! Settings are read from `AREA_MESHER_*` environment variables first and
//! overridden by flags. Logs go to stderr (`RUST_LOG` applies); the summary
//! goes to stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use area_mesher_io::{reload, verify, Mesher};
use area_mesher_topology::MeshConfig;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "area-mesher", version)]
#[command(about = "Build a left/right attributed line mesh from adjacent polygons")]
struct Args {
    /// GeoJSON polygon sources, all in one coordinate reference system
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Where to write the line mesh (GeoJSON)
    #[arg(short, long)]
    output: PathBuf,

    /// Attribute holding the polygon id
    #[arg(long)]
    id_field: Option<String>,

    /// Coincidence tolerance in source units
    #[arg(long)]
    tolerance: Option<f64>,

    /// Keep one edge per segment instead of joining collinear runs
    #[arg(long)]
    no_merge_collinear: bool,

    /// Text encoding of the sources
    #[arg(long, default_value = "utf-8")]
    encoding: String,

    /// Re-read the dump and compare it with the mesh
    #[arg(long)]
    verify: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self, base: MeshConfig) -> MeshConfig {
        let mut config = base;
        if let Some(field) = &self.id_field {
            config.id_field = field.clone();
        }
        if let Some(tolerance) = self.tolerance {
            config.tolerance = tolerance;
        }
        if self.no_merge_collinear {
            config.merge_collinear = false;
        }
        config
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = args.config(MeshConfig::from_env());
    config.validate().context("invalid configuration")?;
    tracing::info!(
        inputs = args.inputs.len(),
        id_field = %config.id_field,
        tolerance = config.tolerance,
        merge_collinear = config.merge_collinear,
        "starting area-mesher"
    );

    let mut mesher = Mesher::new(config);
    for input in &args.inputs {
        mesher
            .load(input, &args.encoding)
            .with_context(|| format!("failed to load {}", input.display()))?;
    }

    let built = mesher.build().context("failed to build mesh")?;
    let mesh = &built.mesh;
    println!("Polygons:        {}", built.stats.polygons);
    println!("Polygon area:    {:.3}", built.stats.polygon_area);
    println!("Vertices:        {}", mesh.vertex_count());
    println!("Edges:           {}", mesh.edge_count());
    println!("Exterior edges:  {}", mesh.exterior_edge_count());
    println!("Total length:    {:.3}", mesh.total_length());
    println!("Ignored duplicates: {}", built.stats.ignored_duplicates);
    println!("Warnings:        {}", built.warnings.len());
    for warning in &built.warnings {
        println!("  {}", warning);
    }

    mesher
        .dump(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!("Wrote {}", args.output.display());

    if args.verify {
        let dumped = reload(&args.output)
            .with_context(|| format!("failed to reload {}", args.output.display()))?;
        if let Some(mesh) = mesher.mesh() {
            verify(mesh, &dumped).context("dump verification failed")?;
        }
        println!("Verified {} edges", dumped.len());
    }

    Ok(())
}
