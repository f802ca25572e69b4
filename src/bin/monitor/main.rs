mod gui;

use std::path::PathBuf;
use std::process::exit;

use gui::engage_gui;
use soundscope::channel::Channel;
use soundscope::config::RadarConfig;
use soundscope::dummy_source::{DummySource, Scene};
use soundscope::gui::scene_selector;
use soundscope::pipeline::RadarPipeline;

fn main() {
    env_logger::init();

    let config_path = PathBuf::from("soundscope.ron");
    let config = match RadarConfig::from_path_or_default(&config_path) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("could not load configuration: {}", error);
            exit(1);
        }
    };

    let scenes = vec![
        (
            "Rotating source".to_string(),
            Scene::Rotating {
                period_secs: 6.0,
                level: 0.5,
            },
        ),
        (
            "Front left tone".to_string(),
            Scene::Single {
                channel: Channel::FrontLeft,
                level: 0.5,
            },
        ),
        (
            "Opposing sides".to_string(),
            Scene::OpposingSides { level: 0.5 },
        ),
        ("Silence".to_string(), Scene::Silence),
    ];
    let scene = match scene_selector(scenes) {
        Ok(Some(scene)) => scene,
        Ok(None) => return,
        Err(error) => {
            eprintln!("scene selector failed: {}", error);
            exit(1);
        }
    };

    let source = DummySource::builder()
        .scene(scene)
        .sample_rate(config.sample_rate)
        .block_size(config.block_size)
        .build();
    let control = source.controller();

    let pipeline = match RadarPipeline::launch(source, &config) {
        Ok(pipeline) => pipeline,
        Err(error) => {
            eprintln!("could not start the radar pipeline: {}", error);
            exit(1);
        }
    };

    if let Err(error) = engage_gui(pipeline, control, config_path) {
        eprintln!("monitor error: {}", error);
    }
}
