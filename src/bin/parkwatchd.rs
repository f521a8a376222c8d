//! parkwatchd - parking occupancy monitoring daemon
//!
//! This daemon:
//! 1. Loads configuration (PARKWATCH_CONFIG file plus PARKWATCH_* overrides)
//! 2. Opens the session from the saved space configuration
//! 3. Pulls frames from the configured source and runs the vehicle detector
//! 4. Publishes per-spot status to the log and, optionally, an output directory
//! 5. Accepts operator commands on stdin (toggle, remove-last, remove-id, status)

use anyhow::Result;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parkwatch::{
    control, ingest, overlay, pipeline, DirectorySink, JsonSpaceStore, LogSink,
    OccupancyResolver, OverlayStyle, ParkwatchConfig, Pipeline, Session, SessionController,
    SnapshotSink,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = ParkwatchConfig::load()?;
    log::info!(
        "parkwatchd {} starting: spaces={} source={} detector={:?}",
        env!("CARGO_PKG_VERSION"),
        cfg.spaces_path.display(),
        cfg.source.url,
        cfg.detector.backend
    );

    let store = Arc::new(JsonSpaceStore::new(&cfg.spaces_path));
    let session = Session::open(store)?;
    let registry = cfg.detector.build_registry()?;
    let font = overlay::resolve_font(cfg.font_path.as_deref())?;
    let resolver = OccupancyResolver::new(cfg.vehicle_classes()?)
        .with_style(OverlayStyle::default().with_font(font));
    let controller = SessionController::new(session.clone(), registry, resolver);

    let mut sinks: Vec<Box<dyn SnapshotSink>> = vec![Box::new(LogSink::new())];
    if let Some(dir) = &cfg.output.dir {
        let sink = DirectorySink::create(dir, cfg.output.every_n_frames)?;
        log::info!(
            "writing annotated frames to {} every {} frames",
            sink.dir().display(),
            cfg.output.every_n_frames
        );
        sinks.push(Box::new(sink));
    }

    let stop = pipeline::stop_flag();
    let stop_handler = stop.clone();
    ctrlc::set_handler(move || {
        stop_handler.store(true, Ordering::SeqCst);
    })?;

    // Detached: it ends with stdin or the process.
    let _control = control::spawn_stdin_control(session.clone())?;

    let source = ingest::open_source(cfg.source.clone())?;
    let stats = Pipeline::new(cfg.queue_depth)?.run(source, &controller, &mut sinks, stop)?;

    let report = session.report()?;
    log::info!(
        "parkwatchd stopped ({:?}): {} frames processed, {} failed; total={} occupied={} available={}",
        stats.exit,
        stats.frames_processed,
        stats.frames_failed,
        report.counts.total,
        report.counts.occupied,
        report.counts.available
    );
    Ok(())
}
