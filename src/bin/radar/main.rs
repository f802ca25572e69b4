use clap::Parser;
use log::{info, warn};
use soundscope::{
    args::{InputTask, RadarArgs, SceneKind, SynthCommand},
    config::RadarConfig,
    dummy_source::{DummySource, Scene},
    pipeline::RadarPipeline,
    source::AudioSource,
    wav_source::WavSource,
};

use std::{
    error::Error,
    process::exit,
    time::{Duration, Instant},
};

// Example:
// cargo run --bin radar --
//                       --config   soundscope.ron
//                       --duration 30 synth
//                       --scene    rotating
//                       --level    0.5
//                       --period   6

fn main() {
    env_logger::init();
    let args = RadarArgs::parse();

    let config = match RadarConfig::from_path_or_default(&args.config) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("could not load configuration: {}", error);
            exit(1);
        }
    };

    let result = match args.command.clone() {
        InputTask::Wav(cmd) => match WavSource::open(&cmd.file) {
            Ok(source) => {
                let source = source.with_block_size(config.block_size);
                run_radar(source, &config, &args)
            }
            Err(error) => {
                eprintln!("could not open {}: {}", cmd.file.display(), error);
                exit(1);
            }
        },
        InputTask::Synth(cmd) => {
            let source = DummySource::builder()
                .scene(scene_from(&cmd))
                .sample_rate(config.sample_rate)
                .block_size(config.block_size)
                .build();
            run_radar(source, &config, &args)
        }
    };

    if let Err(error) = result {
        eprintln!("radar failed: {}", error);
        exit(1);
    }
}

fn scene_from(cmd: &SynthCommand) -> Scene {
    match cmd.scene {
        SceneKind::Silence => Scene::Silence,
        SceneKind::Single => Scene::Single {
            channel: cmd.channel,
            level: cmd.level,
        },
        SceneKind::Rotating => Scene::Rotating {
            period_secs: cmd.period,
            level: cmd.level,
        },
        SceneKind::Opposing => Scene::OpposingSides { level: cmd.level },
    }
}

/// Drives the pipeline at frame cadence until the duration runs out or
/// the source drains and the last blip fades.
fn run_radar<S>(source: S, config: &RadarConfig, args: &RadarArgs) -> Result<(), Box<dyn Error>>
where
    S: AudioSource + Send + 'static,
{
    let mut pipeline = RadarPipeline::launch(source, config)?;
    let frame_period = Duration::from_millis(10);
    let log_every = Duration::from_secs_f32(args.log_every.max(0.1));
    let started = Instant::now();
    let mut last_log = started;

    loop {
        let now = Instant::now();
        let snapshot = pipeline.tick(now);

        if now.duration_since(last_log) >= log_every {
            last_log = now;
            if snapshot.is_empty() {
                info!("radar quiet");
            } else {
                let strongest = snapshot
                    .blips
                    .iter()
                    .max_by(|a, b| {
                        a.scaled_intensity()
                            .partial_cmp(&b.scaled_intensity())
                            .expect("intensities are finite")
                    })
                    .expect("snapshot is non-empty");
                info!(
                    "{} blips, strongest {} at {:.0} deg ({:.2})",
                    snapshot.blips.len(),
                    strongest.category(),
                    strongest.bearing(),
                    strongest.scaled_intensity(),
                );
            }
        }

        if let Some(limit) = args.duration {
            if started.elapsed() >= Duration::from_secs_f32(limit) {
                info!("duration reached, stopping");
                break;
            }
        }
        if pipeline.is_finished() && snapshot.is_empty() {
            info!("source drained and radar cleared, stopping");
            break;
        }

        spin_sleep::sleep(frame_period);
    }

    let stats = pipeline.stats();
    info!(
        "session: {} blocks, {} dropped, {} frames, {} resets",
        stats.blocks_processed(),
        stats.samples_dropped(),
        stats.frames_ticked(),
        stats.device_resets(),
    );
    if stats.samples_dropped() > 0 {
        warn!("render side fell behind the audio cadence at least once");
    }

    pipeline.shutdown();
    Ok(())
}
