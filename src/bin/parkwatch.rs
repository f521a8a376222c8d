//! parkwatch - space configuration and single-frame occupancy tool

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use parkwatch::control::format_report;
use parkwatch::detect::parse_detections;
use parkwatch::overlay::resolve_font;
use parkwatch::storage::{available_configs, config_label};
use parkwatch::{
    BackendRegistry, Frame, JsonSpaceStore, OccupancyResolver, OverlayStyle, Session,
    SessionController, StubBackend, VehicleClasses,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the space configuration files in a directory.
    Configs {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Print the spaces in a configuration file.
    Show {
        #[arg(long, default_value = "parking_spaces1.json", env = "PARKWATCH_SPACES")]
        spaces: PathBuf,
    },
    /// Delete the last space from a configuration file.
    RemoveLast {
        #[arg(long, default_value = "parking_spaces1.json", env = "PARKWATCH_SPACES")]
        spaces: PathBuf,
    },
    /// Resolve occupancy for one image and write the annotated frame.
    Annotate {
        #[arg(long, default_value = "parking_spaces1.json", env = "PARKWATCH_SPACES")]
        spaces: PathBuf,
        /// Input frame (PNG or JPEG).
        #[arg(long)]
        image: PathBuf,
        /// JSON array of detections for the frame.
        #[arg(long)]
        detections: PathBuf,
        /// Where to write the annotated frame.
        #[arg(long, default_value = "annotated.png")]
        out: PathBuf,
        /// Comma-separated detector class ids that count as vehicles.
        #[arg(long, default_value = "2", value_delimiter = ',')]
        vehicle_classes: Vec<u32>,
        /// TrueType/OpenType font for spot numbers and captions.
        #[arg(long, env = "PARKWATCH_FONT")]
        font: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match args.command {
        Command::Configs { dir } => list_configs(dir),
        Command::Show { spaces } => show(spaces),
        Command::RemoveLast { spaces } => remove_last(spaces),
        Command::Annotate {
            spaces,
            image,
            detections,
            out,
            vehicle_classes,
            font,
        } => annotate(spaces, image, detections, out, vehicle_classes, font),
    }
}

fn list_configs(dir: PathBuf) -> Result<()> {
    let configs = available_configs(&dir)?;
    if configs.is_empty() {
        println!("no space configurations in {}", dir.display());
        return Ok(());
    }
    for path in configs {
        let label = config_label(&path).unwrap_or_default();
        println!("{:<16} {}", label, path.display());
    }
    Ok(())
}

fn show(spaces: PathBuf) -> Result<()> {
    let session = Session::open(Arc::new(JsonSpaceStore::new(spaces)))?;
    for (index, space) in session.spaces()?.iter().enumerate() {
        let vertices: Vec<String> = space
            .polygon
            .vertices()
            .iter()
            .map(|p| format!("({},{})", p.x, p.y))
            .collect();
        println!("spot {} ({}): {}", index + 1, space.id, vertices.join(" "));
    }
    println!("{} spaces", session.space_count()?);
    Ok(())
}

fn remove_last(spaces: PathBuf) -> Result<()> {
    let session = Session::open(Arc::new(JsonSpaceStore::new(&spaces)))?;
    match session.remove_last_space()? {
        Some(_) => println!(
            "removed last space, {} left in {}",
            session.space_count()?,
            spaces.display()
        ),
        None => println!("no spaces to remove in {}", spaces.display()),
    }
    Ok(())
}

fn annotate(
    spaces: PathBuf,
    image: PathBuf,
    detections: PathBuf,
    out: PathBuf,
    vehicle_classes: Vec<u32>,
    font: Option<PathBuf>,
) -> Result<()> {
    let session = Session::open(Arc::new(JsonSpaceStore::new(spaces)))?;
    let frame = image::open(&image)
        .with_context(|| format!("failed to decode {}", image.display()))?
        .to_rgb8();
    let raw = std::fs::read_to_string(&detections)
        .with_context(|| format!("failed to read {}", detections.display()))?;
    let hits = parse_detections(&raw);
    if hits.is_empty() && !raw.trim().is_empty() && !raw.trim().starts_with('[') {
        return Err(anyhow!(
            "{} must hold a JSON array of detections",
            detections.display()
        ));
    }

    let mut registry = BackendRegistry::new();
    registry.register(StubBackend::repeating(hits));
    let style = OverlayStyle::default().with_font(resolve_font(font.as_deref())?);
    let resolver = OccupancyResolver::new(VehicleClasses::new(vehicle_classes)?).with_style(style);
    let controller = SessionController::new(session, registry, resolver);
    let snapshot = controller.process_frame(&Frame::new(1, frame))?;

    snapshot
        .annotated
        .image()
        .save(&out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    eprintln!("{}", format_report(&snapshot.report));
    println!("{}", serde_json::to_string_pretty(&snapshot.report)?);
    Ok(())
}
