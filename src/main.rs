mod cli;

use std::cell::Cell;
use std::io::Write as _;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use bandstand::analysis::{tempo, FrequencyAnalyzer};
use bandstand::config;
use bandstand::playback::{MonotonicClock, PlaybackController, PlayerEvent, RodioOutput};

use cli::Cli;

const METER_WIDTH: usize = 12;
const TICK: Duration = Duration::from_millis(33);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect bandstand.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = std::path::PathBuf::from("bandstand.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("bandstand").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });

    let mut cfg = config::Config::default();
    if let Some(ref path) = config_path {
        match config::load_config(path) {
            Some(loaded) => {
                log::info!("Loaded config from {}", path.display());
                cfg = loaded;
            }
            None => log::warn!("Failed to load config from {}", path.display()),
        }
    }

    // CLI values win over config
    if let Some(low) = cli.low_hz {
        cfg.analyzer.low_hz = low;
    }
    if let Some(mid) = cli.mid_hz {
        cfg.analyzer.mid_hz = mid;
    }
    if let Some(high) = cli.high_hz {
        cfg.analyzer.high_hz = high;
    }
    if let Some(volume) = cli.volume {
        cfg.playback.volume = volume;
    }
    if cli.looping {
        cfg.playback.looping = true;
    }

    log::info!("bandstand - playback & band-energy meter");
    log::info!("Track: {}", cli.track);
    log::info!(
        "Bands: low<{}Hz<mid<{}Hz<high (fft {})",
        cfg.analyzer.mid_hz,
        cfg.analyzer.high_hz,
        cfg.analyzer.fft_size
    );

    let output = RodioOutput::new().context("failed to open audio output device")?;
    let mut controller =
        PlaybackController::with_config(output, MonotonicClock::new(), &cfg.playback);

    let ended = Rc::new(Cell::new(false));
    let ended_flag = Rc::clone(&ended);
    controller.subscribe(PlayerEvent::TrackEnded, move |_| ended_flag.set(true));

    controller
        .change_audio(&cli.track, false)
        .with_context(|| format!("failed to load {}", cli.track))?;

    let grid = if cli.show_beats {
        controller.buffer().map(|buffer| {
            let estimate = tempo::estimate(buffer.as_ref());
            log::info!("Estimated tempo: {:.1} BPM", estimate.bpm);
            tempo::BeatGrid::new(estimate.bpm)
        })
    } else {
        None
    };

    if let Some(start_at) = cli.start_at {
        controller.seek(start_at, Some(false));
    }
    if cfg.playback.autoplay {
        controller.play();
    }

    let mut analyzer = FrequencyAnalyzer::new(cfg.analyzer.clone());
    let total = fmt_time(controller.duration_seconds());

    while !ended.get() {
        controller.tick();
        analyzer.update(&controller);
        let bands = analyzer.band_energy();

        let beat_marker = match grid {
            Some(grid) => {
                let beat = grid.beat_at(controller.playback_seconds());
                if beat.phase < 0.15 {
                    format!("  beat {}", beat.number + 1)
                } else {
                    String::new()
                }
            }
            None => String::new(),
        };

        print!(
            "\r{} / {}  low [{}] mid [{}] high [{}]{}   ",
            controller.position_display(),
            total,
            meter(bands.low),
            meter(bands.mid),
            meter(bands.high),
            beat_marker
        );
        std::io::stdout().flush().ok();

        thread::sleep(TICK);
    }

    println!();
    log::info!("Track ended");
    Ok(())
}

fn fmt_time(seconds: f64) -> String {
    let whole = seconds.max(0.0) as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

fn meter(value: f32) -> String {
    let filled = (value.clamp(0.0, 1.0) * METER_WIDTH as f32).round() as usize;
    let mut bar = "#".repeat(filled);
    bar.push_str(&" ".repeat(METER_WIDTH - filled));
    bar
}
