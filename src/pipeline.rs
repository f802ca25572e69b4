//! The coordinator that bridges audio-block cadence and render-frame
//! cadence.
//!
//! On the producer side, a pump thread drains the audio source into the
//! level extractor and direction blender stages, each running as a
//! [`crate::component::Component`] on its own thread. The last stage
//! publishes into a bounded latest-samples cell. On the consumer side,
//! [`RadarPipeline::tick`] is called once per render frame: it drains
//! the cell, feeds the blip manager, and returns a fresh snapshot.
//!
//! The producer never waits for the consumer. When the cell is full the
//! oldest sample is dropped, never the newest; when the consumer races
//! ahead it simply finds the cell empty and lets the live blips age.
//! Both shared cells are guarded by mutexes held only long enough to
//! push, drain, or clone an `Arc`, well under the frame and block
//! deadlines on either side.

use crate::blender::{DirectionBlender, DirectionEvent, DirectionSample};
use crate::blip::{BlipManager, BlipSnapshot};
use crate::channel::{ChannelLevels, CHANNEL_COUNT};
use crate::component::run_component;
use crate::config::{ConfigError, Params, RadarConfig};
use crate::extractor::LevelExtractor;
use crate::source::AudioSource;
use log::info;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// How many unconsumed direction samples the cell holds before the
/// oldest is dropped. At ~43 blocks per second this is under a fifth of
/// a second of backlog.
const SAMPLE_CELL_CAPACITY: usize = 8;

/// The hot-reloadable parameter cell. Stages and the frame consumer
/// clone out one `Arc<Params>` at the start of each block or tick and
/// use it throughout, so a concurrent swap can never tear one
/// computation across two parameter generations.
#[derive(Debug)]
pub struct ParamCell {
    inner: Mutex<Arc<Params>>,
}

impl ParamCell {
    /// A cell holding the given parameter generation.
    pub fn new(params: Arc<Params>) -> Self {
        Self {
            inner: Mutex::new(params),
        }
    }

    /// The current generation. Cheap: clones the `Arc`, not the params.
    pub fn load(&self) -> Arc<Params> {
        self.inner.lock().unwrap().clone()
    }

    /// Swaps in a new generation. In-flight holders of the previous
    /// `Arc` keep computing against it until their block or tick ends.
    pub fn store(&self, params: Arc<Params>) {
        *self.inner.lock().unwrap() = params;
    }
}

/// The bounded cell between the audio-rate producer and the frame-rate
/// consumer. Drop-oldest on overflow.
#[derive(Debug, Default)]
pub struct SampleCell {
    inner: Mutex<VecDeque<(DirectionSample, ChannelLevels)>>,
}

impl SampleCell {
    /// An empty cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes the newest sample, dropping the oldest if the cell is
    /// full. Returns whether anything was dropped.
    pub fn push(&self, sample: DirectionSample, levels: ChannelLevels) -> bool {
        let mut queue = self.inner.lock().unwrap();
        let dropped = queue.len() >= SAMPLE_CELL_CAPACITY;
        if dropped {
            queue.pop_front();
        }
        queue.push_back((sample, levels));
        dropped
    }

    /// Takes everything currently buffered, oldest first.
    pub fn drain(&self) -> Vec<(DirectionSample, ChannelLevels)> {
        self.inner.lock().unwrap().drain(..).collect()
    }

    /// Discards everything currently buffered.
    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }
}

/// Running counters for the whole pipeline. All relaxed atomics; these
/// inform a status line, they do not synchronize anything.
#[derive(Debug, Default)]
pub struct PipelineStats {
    blocks: AtomicU64,
    dropped: AtomicU64,
    frames: AtomicU64,
    resets: AtomicU64,
}

impl PipelineStats {
    /// Blocks that made it through extraction and blending.
    pub fn blocks_processed(&self) -> u64 {
        self.blocks.load(Ordering::Relaxed)
    }

    /// Samples discarded because the consumer fell behind.
    pub fn samples_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Frame ticks served.
    pub fn frames_ticked(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Stream losses survived.
    pub fn device_resets(&self) -> u64 {
        self.resets.load(Ordering::Relaxed)
    }
}

/// A running radar pipeline: the producer thread chain plus the
/// frame-rate consumer state.
pub struct RadarPipeline {
    cell: Arc<SampleCell>,
    params: Arc<ParamCell>,
    stats: Arc<PipelineStats>,
    reset_pending: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    manager: BlipManager,
    latest_sample: Option<DirectionSample>,
    latest_levels: Option<ChannelLevels>,
    workers: Vec<JoinHandle<()>>,
}

impl RadarPipeline {
    /// Validates the config and the source's declared shape, then spins
    /// up the producer chain. A source declaring anything but eight
    /// channels is refused here, before any thread starts.
    pub fn launch<S>(mut source: S, config: &RadarConfig) -> Result<Self, ConfigError>
    where
        S: AudioSource + Send + 'static,
    {
        let params = Arc::new(ParamCell::new(Arc::new(config.to_params()?)));
        if source.channels() != CHANNEL_COUNT {
            return Err(ConfigError::ChannelCount {
                expected: CHANNEL_COUNT,
                actual: source.channels(),
            });
        }

        let cell = Arc::new(SampleCell::new());
        let stats = Arc::new(PipelineStats::default());
        let reset_pending = Arc::new(AtomicBool::new(false));
        let stop = Arc::new(AtomicBool::new(false));

        let (block_tx, block_rx) = mpsc::channel();
        let (levels_tx, levels_rx) = mpsc::channel();
        let (dir_tx, dir_rx) = mpsc::channel();

        let pump_stop = stop.clone();
        let pump = thread::spawn(move || {
            while let Some(event) = source.next() {
                if pump_stop.load(Ordering::Relaxed) {
                    break;
                }
                if block_tx.send(event).is_err() {
                    break;
                }
            }
            info!("audio source drained");
        });

        let extractor = run_component(LevelExtractor::new(params.clone()), block_rx, levels_tx);
        let blender = run_component(DirectionBlender::new(params.clone()), levels_rx, dir_tx);

        let publisher_cell = cell.clone();
        let publisher_stats = stats.clone();
        let publisher_reset = reset_pending.clone();
        let publisher = thread::spawn(move || {
            while let Ok(event) = dir_rx.recv() {
                match event {
                    DirectionEvent::Sample { sample, levels } => {
                        if publisher_cell.push(sample, levels) {
                            publisher_stats.dropped.fetch_add(1, Ordering::Relaxed);
                        }
                        publisher_stats.blocks.fetch_add(1, Ordering::Relaxed);
                    }
                    DirectionEvent::Reset => {
                        publisher_cell.clear();
                        publisher_reset.store(true, Ordering::Relaxed);
                        publisher_stats.resets.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        });

        info!(
            "radar pipeline launched: {} Hz, {} frame blocks",
            config.sample_rate, config.block_size
        );

        Ok(Self {
            cell,
            params,
            stats,
            reset_pending,
            stop,
            manager: BlipManager::new(),
            latest_sample: None,
            latest_levels: None,
            workers: vec![pump, extractor, blender, publisher],
        })
    }

    /// One render-frame tick: drain buffered samples into the blip
    /// manager, age the live set against `now`, and return a fresh
    /// snapshot. Safe to call with no new samples at all; blips keep
    /// aging on wall-clock time.
    pub fn tick(&mut self, now: Instant) -> BlipSnapshot {
        // One parameter snapshot for the whole frame.
        let params = self.params.load();

        if self.reset_pending.swap(false, Ordering::Relaxed) {
            self.manager.clear();
            self.latest_sample = None;
            self.latest_levels = None;
        }

        for (sample, levels) in self.cell.drain() {
            self.manager.observe(&sample, &params);
            self.latest_sample = Some(sample);
            self.latest_levels = Some(levels);
        }

        self.manager.tick(now, &params);
        self.stats.frames.fetch_add(1, Ordering::Relaxed);

        BlipSnapshot {
            blips: self.manager.blips().to_vec(),
            direction: self.latest_sample,
            levels: self.latest_levels,
            taken_at: now,
        }
    }

    /// Validates a new config and swaps its parameters in atomically
    /// between ticks. An invalid config changes nothing: the error comes
    /// back and the previous generation stays in force.
    pub fn reload(&self, config: &RadarConfig) -> Result<(), ConfigError> {
        let params = config.to_params()?;
        self.params.store(Arc::new(params));
        info!("parameters hot-reloaded");
        Ok(())
    }

    /// The parameter generation currently in force.
    pub fn params(&self) -> Arc<Params> {
        self.params.load()
    }

    /// Running counters.
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// True once the source has drained and every producer thread has
    /// wound down.
    pub fn is_finished(&self) -> bool {
        self.workers.iter().all(JoinHandle::is_finished)
    }

    /// Stops the producer chain and joins it. Relies on the source
    /// yielding at its block cadence so the pump can notice the flag.
    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
