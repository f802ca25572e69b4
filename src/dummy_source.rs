//! A synthetic audio source for development and the monitor binary.
//!
//! A generator thread synthesizes 8-channel sine blocks for a chosen
//! [`Scene`], paced at the real block cadence, and the [`DummySource`]
//! handle feeds them out as an ordinary [`AudioSource`]. The scene can
//! be swapped and a device drop-out injected at any time over a control
//! channel.

use crate::channel::{Channel, SampleBlock, CHANNEL_COUNT};
use crate::geometry::angular_distance;
use crate::source::{AudioSource, SourceEvent};
use rand::prelude::*;
use std::f32::consts::TAU;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Tone frequency for all synthesized channels.
const TONE_HZ: f32 = 440.0;

/// Full-scale fraction of random noise mixed into every sample, so the
/// generated stream is not suspiciously clean.
const NOISE_FLOOR: f32 = 0.0005;

/// What the generator should be playing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scene {
    /// All channels silent.
    Silence,

    /// A steady tone on one channel at the given level.
    Single {
        /// The channel carrying the tone.
        channel: Channel,
        /// Target RMS level in `[0, 1]`.
        level: f32,
    },

    /// A tone sweeping clockwise around the listener.
    Rotating {
        /// Seconds per full revolution.
        period_secs: f32,
        /// Target RMS level in `[0, 1]`.
        level: f32,
    },

    /// Equal tones on side left and side right, which cancel each other
    /// out directionally.
    OpposingSides {
        /// Target RMS level of each side in `[0, 1]`.
        level: f32,
    },
}

enum Signal {
    SetScene(Scene),
    DropOut,
    Stop,
}

/// Builder for a [`DummySource`].
pub struct DummySourceBuilder {
    scene: Scene,
    sample_rate: u32,
    block_size: usize,
    paced: bool,
    block_limit: Option<u64>,
}

impl DummySourceBuilder {
    /// The opening scene.
    pub fn scene(mut self, scene: Scene) -> Self {
        self.scene = scene;
        self
    }

    /// Sample rate in Hz.
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Frames per block.
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Whether to pace generation at the real block cadence. Tests turn
    /// this off to run as fast as the consumer drains.
    pub fn paced(mut self, paced: bool) -> Self {
        self.paced = paced;
        self
    }

    /// Stop after this many blocks instead of running forever.
    pub fn blocks(mut self, limit: u64) -> Self {
        self.block_limit = Some(limit);
        self
    }

    /// Starts the generator thread and returns the source handle.
    pub fn build(self) -> DummySource {
        let (ctl_tx, ctl_rx) = mpsc::channel::<Signal>();
        let (block_tx, block_rx) = mpsc::channel::<SourceEvent>();

        let sample_rate = self.sample_rate;
        let block_size = self.block_size;
        let paced = self.paced;
        let block_limit = self.block_limit;
        let mut scene = self.scene;

        let handle = thread::spawn(move || {
            let block_period = Duration::from_secs_f64(block_size as f64 / sample_rate as f64);
            let mut rng = thread_rng();
            let mut phase = 0.0f32;
            let mut elapsed = 0.0f32;
            let mut emitted = 0u64;
            let mut running = true;

            while running && block_limit.map_or(true, |limit| emitted < limit) {
                while let Ok(signal) = ctl_rx.try_recv() {
                    match signal {
                        Signal::SetScene(new_scene) => scene = new_scene,
                        Signal::DropOut => {
                            if block_tx.send(SourceEvent::Lost).is_err() {
                                running = false;
                            }
                        }
                        Signal::Stop => running = false,
                    }
                }
                if !running {
                    break;
                }

                let gains = scene_gains(&scene, elapsed);
                let block =
                    synthesize_block(&gains, sample_rate, block_size, &mut phase, &mut rng);
                if block_tx.send(SourceEvent::Block(block)).is_err() {
                    break;
                }

                emitted += 1;
                elapsed += block_period.as_secs_f32();
                if paced {
                    spin_sleep::sleep(block_period);
                }
            }
        });

        DummySource {
            handle: Some(handle),
            ctl_tx,
            block_rx,
            sample_rate,
            block_size,
        }
    }
}

/// Per-channel amplitude gains for a scene at a moment in time.
fn scene_gains(scene: &Scene, elapsed: f32) -> [f32; CHANNEL_COUNT] {
    let mut gains = [0.0f32; CHANNEL_COUNT];
    match *scene {
        Scene::Silence => {}
        Scene::Single { channel, level } => {
            gains[channel.index()] = level;
        }
        Scene::Rotating { period_secs, level } => {
            let bearing = (elapsed / period_secs.max(0.1)) * 360.0 % 360.0;
            for channel in Channel::ALL.iter().filter(|c| c.is_directional()) {
                let offset = angular_distance(bearing, standard_bearing(*channel));
                // Linear falloff to silence a quarter turn away.
                let gain = (1.0 - offset / 90.0).max(0.0);
                gains[channel.index()] = level * gain;
            }
        }
        Scene::OpposingSides { level } => {
            gains[Channel::SideLeft.index()] = level;
            gains[Channel::SideRight.index()] = level;
        }
    }
    gains
}

/// The stock 7.1 bearing of a channel, for scene synthesis only. The
/// pipeline's own geometry stays configurable; the generator just needs
/// somewhere plausible to put its speakers.
fn standard_bearing(channel: Channel) -> f32 {
    match channel {
        Channel::Center => 0.0,
        Channel::FrontRight => 45.0,
        Channel::SideRight => 90.0,
        Channel::RearRight => 135.0,
        Channel::RearLeft => 225.0,
        Channel::SideLeft => 270.0,
        Channel::FrontLeft => 315.0,
        Channel::Lfe => 0.0,
    }
}

fn synthesize_block(
    gains: &[f32; CHANNEL_COUNT],
    sample_rate: u32,
    block_size: usize,
    phase: &mut f32,
    rng: &mut ThreadRng,
) -> SampleBlock {
    let mut samples = vec![0i16; block_size * CHANNEL_COUNT];
    let phase_step = TAU * TONE_HZ / sample_rate as f32;

    for frame in 0..block_size {
        let wave = phase.sin();
        *phase = (*phase + phase_step) % TAU;

        for channel in Channel::ALL {
            // A sine at amplitude sqrt(2) * level has RMS = level; levels
            // near full scale clip and land a little low, which is fine
            // for a test signal.
            let amplitude = (gains[channel.index()] * std::f32::consts::SQRT_2).min(1.0);
            let noise = rng.gen_range(-NOISE_FLOOR..NOISE_FLOOR);
            let value = (wave * amplitude + noise).clamp(-1.0, 1.0);
            samples[frame * CHANNEL_COUNT + channel.index()] =
                (value * f32::from(i16::MAX)) as i16;
        }
    }

    SampleBlock::new(samples, CHANNEL_COUNT, sample_rate, Instant::now())
}

/// A synthetic [`AudioSource`] driven by a background generator thread.
pub struct DummySource {
    handle: Option<thread::JoinHandle<()>>,
    ctl_tx: mpsc::Sender<Signal>,
    block_rx: mpsc::Receiver<SourceEvent>,
    sample_rate: u32,
    block_size: usize,
}

/// A clonable handle for poking a running [`DummySource`] after the
/// source itself has moved into the pipeline.
#[derive(Clone)]
pub struct DummyControl {
    ctl_tx: mpsc::Sender<Signal>,
}

impl DummyControl {
    /// Switches what the generator is playing.
    pub fn set_scene(&self, scene: Scene) {
        let _ = self.ctl_tx.send(Signal::SetScene(scene));
    }

    /// Injects a device drop-out into the stream.
    pub fn drop_out(&self) {
        let _ = self.ctl_tx.send(Signal::DropOut);
    }
}

impl DummySource {
    /// A builder with the defaults: silence, 44.1 kHz, 1024-frame
    /// blocks, real-time pacing, no block limit.
    pub fn builder() -> DummySourceBuilder {
        DummySourceBuilder {
            scene: Scene::Silence,
            sample_rate: 44100,
            block_size: 1024,
            paced: true,
            block_limit: None,
        }
    }

    /// A control handle usable after the source moves elsewhere.
    pub fn controller(&self) -> DummyControl {
        DummyControl {
            ctl_tx: self.ctl_tx.clone(),
        }
    }

    /// Switches what the generator is playing.
    pub fn set_scene(&self, scene: Scene) {
        let _ = self.ctl_tx.send(Signal::SetScene(scene));
    }

    /// Injects a device drop-out into the stream.
    pub fn drop_out(&self) {
        let _ = self.ctl_tx.send(Signal::DropOut);
    }

    /// Stops the generator and joins its thread.
    pub fn stop(&mut self) {
        let _ = self.ctl_tx.send(Signal::Stop);
        // `.take()` moves the JoinHandle out of the struct so we can
        // join it here; `None` is left behind for Drop to see.
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DummySource {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Iterator for DummySource {
    type Item = SourceEvent;

    fn next(&mut self) -> Option<SourceEvent> {
        self.block_rx.recv().ok()
    }
}

impl AudioSource for DummySource {
    fn channels(&self) -> usize {
        CHANNEL_COUNT
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn block_size(&self) -> usize {
        self.block_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_rms(block: &SampleBlock, channel: Channel) -> f32 {
        let mut sum = 0.0f64;
        let mut count = 0usize;
        for sample in block.channel_samples(channel) {
            let v = f64::from(sample) / f64::from(i16::MAX);
            sum += v * v;
            count += 1;
        }
        (sum / count.max(1) as f64).sqrt() as f32
    }

    #[test]
    fn emits_the_requested_number_of_blocks() {
        let source = DummySource::builder()
            .scene(Scene::Silence)
            .block_size(128)
            .paced(false)
            .blocks(10)
            .build();

        let events: Vec<SourceEvent> = source.collect();
        assert_eq!(events.len(), 10);
        for event in &events {
            match event {
                SourceEvent::Block(block) => {
                    assert_eq!(block.channels(), CHANNEL_COUNT);
                    assert_eq!(block.frames(), 128);
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    #[test]
    fn single_scene_concentrates_energy_on_its_channel() {
        let mut source = DummySource::builder()
            .scene(Scene::Single {
                channel: Channel::FrontLeft,
                level: 0.5,
            })
            .block_size(1024)
            .paced(false)
            .blocks(1)
            .build();

        let block = match source.next() {
            Some(SourceEvent::Block(block)) => block,
            other => panic!("expected a block, got {:?}", other),
        };

        assert!((channel_rms(&block, Channel::FrontLeft) - 0.5).abs() < 0.05);
        assert!(channel_rms(&block, Channel::RearRight) < 0.01);
    }

    #[test]
    fn opposing_scene_drives_both_sides_equally() {
        let mut source = DummySource::builder()
            .scene(Scene::OpposingSides { level: 0.4 })
            .block_size(1024)
            .paced(false)
            .blocks(1)
            .build();

        let block = match source.next() {
            Some(SourceEvent::Block(block)) => block,
            other => panic!("expected a block, got {:?}", other),
        };

        let sl = channel_rms(&block, Channel::SideLeft);
        let sr = channel_rms(&block, Channel::SideRight);
        assert!((sl - sr).abs() < 0.02);
        assert!((sl - 0.4).abs() < 0.05);
    }

    #[test]
    fn rotating_scene_moves_energy_over_time() {
        let early = scene_gains(
            &Scene::Rotating {
                period_secs: 4.0,
                level: 0.5,
            },
            0.0,
        );
        let later = scene_gains(
            &Scene::Rotating {
                period_secs: 4.0,
                level: 0.5,
            },
            1.0,
        );

        // At t=0 the tone sits dead ahead; a quarter period later it has
        // swung to side right.
        assert!(early[Channel::Center.index()] > 0.4);
        assert!(later[Channel::SideRight.index()] > 0.4);
        assert!(later[Channel::Center.index()] < 0.01);
    }
}
