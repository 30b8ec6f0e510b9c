//! cloudpick CLI - closest-point picking against point clouds
//!
//! Loads a cloud, builds its hierarchy and answers pick rays from the command
//! line. Set `RUST_LOG=debug` to see build statistics.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use cloudpick::{BvhVisualizer, PerspectiveCamera, PickMode, PickSettings, PointCloudPicker, Ray};
use cloudpick_math::{Point3, Vec3};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

mod loader;

#[derive(Parser)]
#[command(name = "cloudpick")]
#[command(about = "Closest-point picking against point clouds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CloudArgs {
    /// Point cloud file (.ply or `x y z [r g b]` text)
    #[arg(long, conflicts_with = "synthetic")]
    cloud: Option<PathBuf>,
    /// Generate a random cloud with this many points instead of loading one
    #[arg(long)]
    synthetic: Option<usize>,
    /// Seed for the synthetic cloud
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Recenter the cloud on its bounding-box center
    #[arg(long)]
    center: bool,
    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick the point closest to a ray
    Pick {
        #[command(flatten)]
        cloud: CloudArgs,
        /// Ray origin as x,y,z
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true, requires = "direction")]
        origin: Option<Vec3>,
        /// Ray direction as x,y,z
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        direction: Option<Vec3>,
        /// Pointer position as x,y, cast through the default camera
        #[arg(long, value_parser = parse_pair, conflicts_with = "origin")]
        pixel: Option<(f64, f64)>,
        /// Viewport size as width,height for --pixel
        #[arg(long, value_parser = parse_pair, default_value = "800,600")]
        viewport: (f64, f64),
        /// Maximum distance from the ray, overrides the settings file
        #[arg(long)]
        threshold: Option<f64>,
        /// Scan every point instead of using the hierarchy
        #[arg(long)]
        brute_force: bool,
    },
    /// Fire random rays with both query modes and compare answers
    Compare {
        #[command(flatten)]
        cloud: CloudArgs,
        /// Number of rays
        #[arg(long, default_value_t = 1000)]
        rays: usize,
        /// Maximum distance from the ray, overrides the settings file
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Print the hierarchy's boxes down to a depth as JSON
    Helper {
        #[command(flatten)]
        cloud: CloudArgs,
        /// Deepest level to print (root = 0), overrides the settings file
        #[arg(long)]
        depth: Option<usize>,
        /// Print wireframe line segments instead of boxes
        #[arg(long)]
        segments: bool,
    },
    /// Print the default settings as TOML
    Config,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Pick {
            cloud,
            origin,
            direction,
            pixel,
            viewport,
            threshold,
            brute_force,
        } => {
            let mut settings = load_settings(cloud.config.as_deref())?;
            if let Some(threshold) = threshold {
                settings.raycast_threshold = threshold;
            }
            if brute_force {
                settings.mode = PickMode::BruteForce;
            }
            settings.validate()?;
            let ray = pick_ray(origin, direction, pixel, viewport)?;
            run_pick(&cloud, &ray, &settings)?;
        }
        Commands::Compare {
            cloud,
            rays,
            threshold,
        } => {
            let mut settings = load_settings(cloud.config.as_deref())?;
            if let Some(threshold) = threshold {
                settings.raycast_threshold = threshold;
            }
            settings.validate()?;
            run_compare(&cloud, rays, &settings)?;
        }
        Commands::Helper {
            cloud,
            depth,
            segments,
        } => {
            let mut settings = load_settings(cloud.config.as_deref())?;
            if let Some(depth) = depth {
                settings.helper_depth = depth;
            }
            settings.validate()?;
            run_helper(&cloud, &settings, segments)?;
        }
        Commands::Config => {
            print!("{}", PickSettings::default().to_toml_string()?);
        }
    }

    Ok(())
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let values = parse_list(s)?;
    match values.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z, got `{s}`")),
    }
}

fn parse_pair(s: &str) -> Result<(f64, f64), String> {
    let values = parse_list(s)?;
    match values.as_slice() {
        [a, b] => Ok((*a, *b)),
        _ => Err(format!("expected two comma-separated numbers, got `{s}`")),
    }
}

fn parse_list(s: &str) -> Result<Vec<f64>, String> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| format!("`{}` is not a number", part.trim()))
        })
        .collect()
}

fn load_settings(path: Option<&Path>) -> Result<PickSettings> {
    let Some(path) = path else {
        return Ok(PickSettings::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings {}", path.display()))?;
    PickSettings::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
}

fn load_picker(args: &CloudArgs, settings: &PickSettings) -> Result<PointCloudPicker> {
    let mut points = match (&args.cloud, args.synthetic) {
        (Some(path), _) => loader::load_cloud(path)?,
        (None, Some(n)) => loader::synthetic_cloud(n, args.seed),
        (None, None) => bail!("pass --cloud <file> or --synthetic <n>"),
    };
    if args.center {
        let offset = loader::center(&mut points);
        info!("recentered cloud by {:?}", offset);
    }
    info!("loaded {} points", points.len());

    let mut picker = PointCloudPicker::new(points);
    let started = Instant::now();
    picker.build(&settings.build);
    info!("hierarchy built in {:?}", started.elapsed());
    Ok(picker)
}

fn pick_ray(
    origin: Option<Vec3>,
    direction: Option<Vec3>,
    pixel: Option<(f64, f64)>,
    (width, height): (f64, f64),
) -> Result<Ray> {
    if let Some((x, y)) = pixel {
        let camera = PerspectiveCamera {
            aspect: width / height,
            ..PerspectiveCamera::default()
        };
        return Ok(camera.ray_from_pixel(x, y, width, height)?);
    }
    let (Some(origin), Some(direction)) = (origin, direction) else {
        bail!("pass --origin and --direction, or --pixel");
    };
    Ray::from_vector(Point3::from(origin), direction).context("ray direction must be non-zero")
}

fn run_pick(args: &CloudArgs, ray: &Ray, settings: &PickSettings) -> Result<()> {
    let picker = load_picker(args, settings)?;
    let started = Instant::now();
    let pick = picker.pick(ray, settings)?;
    info!("{:?} pick took {:?}", settings.mode, started.elapsed());
    match pick {
        Some(pick) => println!("{}", serde_json::to_string_pretty(&pick)?),
        None => println!("no point"),
    }
    Ok(())
}

#[derive(Serialize)]
struct CompareReport {
    rays: usize,
    hits: usize,
    agreed: usize,
    accelerated_ms: f64,
    brute_force_ms: f64,
}

fn run_compare(args: &CloudArgs, count: usize, settings: &PickSettings) -> Result<()> {
    let picker = load_picker(args, settings)?;
    let rays = random_rays(&picker, count, args.seed);

    let accelerated = PickSettings {
        mode: PickMode::Accelerated,
        ..settings.clone()
    };
    let brute = PickSettings {
        mode: PickMode::BruteForce,
        ..settings.clone()
    };

    let started = Instant::now();
    let fast = picker.pick_batch(&rays, &accelerated)?;
    let accelerated_ms = started.elapsed().as_secs_f64() * 1e3;

    let started = Instant::now();
    let slow = picker.pick_batch(&rays, &brute)?;
    let brute_force_ms = started.elapsed().as_secs_f64() * 1e3;

    let agreed = fast
        .iter()
        .zip(&slow)
        .filter(|(a, b)| a.map(|p| p.hit.index) == b.map(|p| p.hit.index))
        .count();
    let report = CompareReport {
        rays: rays.len(),
        hits: slow.iter().filter(|p| p.is_some()).count(),
        agreed,
        accelerated_ms,
        brute_force_ms,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    if agreed != rays.len() {
        bail!("{} of {} rays disagree", rays.len() - agreed, rays.len());
    }
    Ok(())
}

/// Rays from a sphere around the cloud aimed at random points inside its box.
fn random_rays(picker: &PointCloudPicker, count: usize, seed: u64) -> Vec<Ray> {
    let aabb = picker
        .hierarchy()
        .map(|bvh| bvh.root_aabb())
        .unwrap_or_default();
    if aabb.is_empty() {
        return Vec::new();
    }
    let center = aabb.centroid();
    let extent = aabb.extent();
    let radius = extent.norm().max(1e-6) * 2.0;
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));

    (0..count)
        .filter_map(|_| {
            let offset = Vec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            );
            let origin = center + offset.try_normalize(1e-9)? * radius;
            let target = aabb.min
                + Vec3::new(
                    rng.random::<f64>() * extent.x,
                    rng.random::<f64>() * extent.y,
                    rng.random::<f64>() * extent.z,
                );
            Ray::through(origin, target)
        })
        .collect()
}

fn run_helper(args: &CloudArgs, settings: &PickSettings, segments: bool) -> Result<()> {
    let picker = load_picker(args, settings)?;
    let Some(bvh) = picker.hierarchy() else {
        bail!("hierarchy was not built");
    };
    let mut helper = BvhVisualizer::new(settings.helper_depth);
    helper.update(bvh);
    info!(
        "{} boxes down to depth {} of {}",
        helper.boxes().len(),
        helper.depth(),
        bvh.depth()
    );
    if segments {
        println!("{}", serde_json::to_string_pretty(&helper.line_segments())?);
    } else {
        println!("{}", serde_json::to_string_pretty(helper.boxes())?);
    }
    Ok(())
}
