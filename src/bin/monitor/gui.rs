use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{
        block::{Position, Title},
        Axis, Block, Chart, Dataset, GraphType,
    },
    Frame, Terminal,
};
use soundscope::blip::BlipCategory;
use soundscope::channel::Channel;
use soundscope::config::RadarConfig;
use soundscope::dummy_source::{DummyControl, Scene};
use soundscope::geometry::Point;
use soundscope::pipeline::RadarPipeline;
use std::{
    error::Error,
    io,
    path::PathBuf,
    time::{Duration, Instant},
};

struct App {
    pipeline: RadarPipeline,
    control: DummyControl,
    config_path: PathBuf,
    speaker_points: Vec<(f64, f64)>,
    blip_points: [Vec<(f64, f64)>; 4],
    status: String,
}

impl App {
    fn new(pipeline: RadarPipeline, control: DummyControl, config_path: PathBuf) -> App {
        let speaker_points = Self::speaker_points(&pipeline);
        App {
            pipeline,
            control,
            config_path,
            speaker_points,
            blip_points: Default::default(),
            status: String::new(),
        }
    }

    fn speaker_points(pipeline: &RadarPipeline) -> Vec<(f64, f64)> {
        let params = pipeline.params();
        Channel::ALL
            .iter()
            .filter_map(|&ch| params.geometry.direction(ch))
            .map(|dir| (f64::from(dir.x), f64::from(dir.y)))
            .collect()
    }

    fn on_tick(&mut self) {
        let snapshot = self.pipeline.tick(Instant::now());

        for points in self.blip_points.iter_mut() {
            points.clear();
        }
        for blip in &snapshot.blips {
            // Blips sit between 40% and 80% of the radar radius, pushed
            // outward by their presented intensity.
            let radius = 0.4 + 0.4 * f64::from(blip.scaled_intensity());
            let direction = Point::from_bearing(blip.bearing());
            let band = match blip.category() {
                BlipCategory::Low => 0,
                BlipCategory::Medium => 1,
                BlipCategory::High => 2,
                BlipCategory::Critical => 3,
            };
            self.blip_points[band]
                .push((f64::from(direction.x) * radius, f64::from(direction.y) * radius));
        }

        let stats = self.pipeline.stats();
        let heading = snapshot
            .direction
            .map(|d| format!("{:5.1} deg at {:.2}", d.bearing(), d.intensity))
            .unwrap_or_else(|| "quiet".to_string());
        self.status = format!(
            " {} blips | {} | blocks {} dropped {} resets {} ",
            snapshot.blips.len(),
            heading,
            stats.blocks_processed(),
            stats.samples_dropped(),
            stats.device_resets(),
        );
    }

    fn reload_config(&mut self) {
        match RadarConfig::from_path(&self.config_path) {
            Ok(config) => match self.pipeline.reload(&config) {
                Ok(()) => {
                    self.speaker_points = Self::speaker_points(&self.pipeline);
                    self.status = " configuration reloaded ".to_string();
                }
                Err(error) => {
                    self.status = format!(" reload rejected: {} ", error);
                }
            },
            Err(error) => {
                self.status = format!(" reload failed: {} ", error);
            }
        }
    }
}

pub fn engage_gui(
    pipeline: RadarPipeline,
    control: DummyControl,
    config_path: PathBuf,
) -> Result<(), Box<dyn Error>> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // create app and run it at the frame cadence
    let tick_rate = Duration::from_millis(10);
    let app = App::new(pipeline, control, config_path);
    let res = run_app(&mut terminal, app, tick_rate);

    // restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    match res {
        Ok(app) => {
            let App { pipeline, .. } = app;
            pipeline.shutdown();
        }
        Err(err) => println!("{:?}", err),
    }

    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    tick_rate: Duration,
) -> io::Result<App> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui(f, &app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => return Ok(app),
                        KeyCode::Char('r') => app.reload_config(),
                        KeyCode::Char('d') => app.control.drop_out(),
                        KeyCode::Char('1') => app.control.set_scene(Scene::Rotating {
                            period_secs: 6.0,
                            level: 0.5,
                        }),
                        KeyCode::Char('2') => app.control.set_scene(Scene::Single {
                            channel: Channel::FrontLeft,
                            level: 0.5,
                        }),
                        KeyCode::Char('3') => {
                            app.control.set_scene(Scene::OpposingSides { level: 0.5 })
                        }
                        KeyCode::Char('4') => app.control.set_scene(Scene::Silence),
                        _ => {}
                    }
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let datasets = vec![
        Dataset::default()
            .name("speakers")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Cyan))
            .data(&app.speaker_points),
        Dataset::default()
            .name("low")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Green))
            .data(&app.blip_points[0]),
        Dataset::default()
            .name("medium")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&app.blip_points[1]),
        Dataset::default()
            .name("high")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::LightRed))
            .data(&app.blip_points[2]),
        Dataset::default()
            .name("critical")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::White))
            .data(&app.blip_points[3]),
    ];

    let instructions = Title::from(" <1-4> Scene  <D> Drop-out  <R> Reload  <Q> Quit ");
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(" SoundScope Radar ")
                .title(Title::from(app.status.clone()).position(Position::Bottom))
                .title(instructions.position(Position::Top)),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::White))
                .bounds([-1.2, 1.2])
                .labels(
                    ["-1.2", "0.0", "1.2"]
                        .iter()
                        .cloned()
                        .map(Span::from)
                        .collect(),
                ),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::White))
                .bounds([-1.2, 1.2])
                .labels(
                    ["-1.2", "0.0", "1.2"]
                        .iter()
                        .cloned()
                        .map(Span::from)
                        .collect(),
                ),
        );

    f.render_widget(chart, f.size());
}
