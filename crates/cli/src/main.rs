use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use pitchtag_core::analytics::appearance::appearance_counts;
use pitchtag_core::analytics::heatmap::build_heatmaps;
use pitchtag_core::analytics::passing_lanes::{
    best_opportunity, passing_lanes, viable_opportunities,
};
use pitchtag_core::analytics::possession::{
    infer_possession, possession_share, possession_timeline, possession_zones,
};
use pitchtag_core::session::annotator_state::AnnotatorState;
use pitchtag_core::session::session_controller::SessionController;
use pitchtag_core::session::state_observer::LoggingStateObserver;
use pitchtag_core::shared::bounding_box::FrameIndex;
use pitchtag_core::shared::resolution::Resolution;
use pitchtag_core::shared::settings::Settings;
use pitchtag_core::sync::domain::message::InboundMessage;
use pitchtag_core::sync::infrastructure::offline_transport::OfflineTransport;
use pitchtag_core::sync::infrastructure::websocket_transport::WebSocketTransport;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Frame-by-frame annotation of tracked players, ball and referees.
#[derive(Parser)]
#[command(name = "pitchtag")]
struct Cli {
    /// Settings file (defaults to the per-user config file).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Follow a live backend, reconnecting until stopped.
    Watch {
        /// Backend WebSocket URL.
        #[arg(long)]
        url: Option<String>,

        /// Click tolerance in rendered pixels.
        #[arg(long)]
        leeway: Option<f64>,

        /// Stop after this many seconds (runs until interrupted if omitted).
        #[arg(long)]
        duration: Option<u64>,

        /// Ask the backend to buffer this video once connected.
        #[arg(long)]
        video: Option<String>,

        /// First frame to buffer.
        #[arg(long, default_value = "0")]
        min: FrameIndex,

        /// Last frame to buffer.
        #[arg(long, default_value = "0")]
        max: FrameIndex,
    },
    /// Feed recorded inbound messages (one JSON document per line) through
    /// a session and print its analytics.
    Replay {
        /// Recorded messages, JSON lines.
        input: PathBuf,

        /// Frame to score passing lanes for (defaults to the last frame).
        #[arg(long)]
        frame: Option<FrameIndex>,

        /// Natural video width.
        #[arg(long, default_value = "1920")]
        width: f64,

        /// Natural video height.
        #[arg(long, default_value = "1080")]
        height: f64,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut settings = match &cli.settings {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };

    match cli.command {
        Command::Watch {
            url,
            leeway,
            duration,
            video,
            min,
            max,
        } => {
            if let Some(url) = url {
                settings.backend_url = url;
            }
            if let Some(leeway) = leeway {
                settings.hit_leeway = leeway;
            }
            validate_watch(&settings, min, max)?;
            run_watch(&settings, duration, video.as_deref(), min, max);
            Ok(())
        }
        Command::Replay {
            input,
            frame,
            width,
            height,
        } => {
            let natural = Resolution::new(width, height);
            if !natural.is_usable() {
                return Err(format!("Video size must be positive, got {natural}").into());
            }
            run_replay(&settings, &input, natural, frame)
        }
    }
}

fn run_watch(
    settings: &Settings,
    duration: Option<u64>,
    video: Option<&str>,
    min: FrameIndex,
    max: FrameIndex,
) {
    log::info!("Connecting to {}", settings.backend_url);
    let transport = WebSocketTransport::new(settings.backend_url.as_str());
    let mut controller = SessionController::new(transport, settings);
    controller.add_observer(Box::new(LoggingStateObserver::default()));

    let started = Instant::now();
    let deadline = duration.map(|secs| started + Duration::from_secs(secs));
    controller.start(started);

    let mut requested = false;
    loop {
        let now = Instant::now();
        if deadline.is_some_and(|d| now >= d) {
            break;
        }
        controller.tick(now);
        if !requested && controller.state().connected {
            controller.request_video_list();
            if let Some(video) = video {
                controller.load_video(video, min, max);
            }
            requested = true;
        }
        thread::sleep(POLL_INTERVAL);
    }

    controller.finish();
    print_appearances(controller.state());
}

fn run_replay(
    settings: &Settings,
    input: &Path,
    natural: Resolution,
    frame: Option<FrameIndex>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(input)
        .map_err(|e| format!("Cannot read {}: {e}", input.display()))?;

    let mut controller = SessionController::new(OfflineTransport, settings);
    controller.add_observer(Box::new(LoggingStateObserver::default()));
    controller.set_natural_resolution(natural);

    // Bare box arrays carry no frame index; each one is the next frame.
    let mut next_frame: FrameIndex = 0;
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match InboundMessage::parse(line) {
            Ok(message @ InboundMessage::Boxes(_)) => {
                controller.set_active_frame(next_frame);
                controller.apply_message(message);
                next_frame += 1;
            }
            Ok(message) => controller.apply_message(message),
            Err(e) => log::warn!("{}:{}: {e}", input.display(), line_no + 1),
        }
    }
    controller.finish();

    let state = controller.state();
    print_appearances(state);
    print_possession(state, settings)?;
    print_heatmaps(state, settings)?;
    print_passing(state, settings, frame)?;
    Ok(())
}

fn print_appearances(state: &AnnotatorState) {
    let counts = appearance_counts(&state.store);
    println!("Appearances ({} identities):", counts.len());
    for (id, count) in counts {
        println!("  {id:>5}: {count} frame(s)");
    }
}

fn print_possession(
    state: &AnnotatorState,
    settings: &Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let possessors = infer_possession(&state.store, &state.registry, settings.control_radius);
    let segments = possession_timeline(&possessors, settings.min_possession_frames);
    println!("Possession ({} segment(s)):", segments.len());
    for segment in &segments {
        println!(
            "  {:>6}..={:<6} {:>5} frame(s)  {}",
            segment.start,
            segment.end(),
            segment.duration,
            segment.team
        );
    }
    let share = possession_share(&segments);
    println!(
        "  share: left {:.1}%, right {:.1}%",
        share.left * 100.0,
        share.right * 100.0
    );
    let zones = possession_zones(&state.store, &state.registry, &possessors, state.natural)?;
    println!(
        "  zones: defensive {:.1}%, middle {:.1}%, attacking {:.1}%",
        zones.defensive * 100.0,
        zones.middle * 100.0,
        zones.attacking * 100.0
    );
    Ok(())
}

fn print_heatmaps(
    state: &AnnotatorState,
    settings: &Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let heatmaps = build_heatmaps(
        &state.store,
        &state.registry,
        state.natural,
        settings.heatmap_rows,
        settings.heatmap_cols,
    )?;
    println!(
        "Heatmap samples ({}x{}): left {}, right {}, ball {}",
        heatmaps.left.rows(),
        heatmaps.left.cols(),
        heatmaps.left.total(),
        heatmaps.right.total(),
        heatmaps.ball.total()
    );
    Ok(())
}

fn print_passing(
    state: &AnnotatorState,
    settings: &Settings,
    frame: Option<FrameIndex>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(frame) = frame.or_else(|| state.store.frame_range().map(|(_, last)| last)) else {
        println!("Passing lanes: no frames stored");
        return Ok(());
    };
    let lanes = passing_lanes(
        state.store.get_frame(frame),
        &state.registry,
        state.natural,
        &settings.passing,
    )?;
    let viable = viable_opportunities(&lanes, &settings.passing);
    println!(
        "Passing lanes at frame {frame}: {} scored, {} viable",
        lanes.len(),
        viable.len()
    );
    if let Some(best) = best_opportunity(&lanes) {
        println!("Best opportunity:\n{}", serde_json::to_string_pretty(best)?);
    }
    Ok(())
}

fn validate_watch(
    settings: &Settings,
    min: FrameIndex,
    max: FrameIndex,
) -> Result<(), Box<dyn std::error::Error>> {
    if !settings.backend_url.starts_with("ws://") {
        return Err(format!(
            "Backend URL must start with ws://, got '{}'",
            settings.backend_url
        )
        .into());
    }
    if !settings.hit_leeway.is_finite() || settings.hit_leeway < 0.0 {
        return Err(format!("Leeway must be non-negative, got {}", settings.hit_leeway).into());
    }
    if min > max {
        return Err(format!("--min ({min}) must not exceed --max ({max})").into());
    }
    Ok(())
}
