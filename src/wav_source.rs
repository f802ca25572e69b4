//! WAV playback as an audio source, wrapping the hound reader.
//!
//! Feeds an 8-channel 16-bit PCM file through the pipeline at the real
//! capture cadence, which makes any multichannel recording a repeatable
//! radar session. The reader yields whole blocks until the file drains;
//! the final block may be short.

use crate::channel::SampleBlock;
use crate::source::{AudioSource, SourceError, SourceEvent};
use hound::{SampleFormat, WavReader};
use log::warn;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{Duration, Instant};

/// An [`AudioSource`] that replays a 16-bit PCM WAV file.
pub struct WavSource {
    reader: WavReader<BufReader<File>>,
    channels: usize,
    sample_rate: u32,
    block_size: usize,
    paced: bool,
    finished: bool,
}

impl WavSource {
    /// Opens a WAV file for playback. Only 16-bit integer PCM is
    /// supported; anything else is refused up front. Channel count is
    /// reported as-is and left for the pipeline to judge.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();

        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(SourceError::UnsupportedFormat(format!(
                "{:?} at {} bits, want 16-bit integer PCM",
                spec.sample_format, spec.bits_per_sample
            )));
        }

        Ok(Self {
            reader,
            channels: usize::from(spec.channels),
            sample_rate: spec.sample_rate,
            block_size: 1024,
            paced: true,
            finished: false,
        })
    }

    /// Overrides the frames-per-block the source delivers.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Turns off real-time pacing; blocks come as fast as they are
    /// consumed. Meant for tests.
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    fn block_period(&self) -> Duration {
        Duration::from_secs_f64(self.block_size as f64 / f64::from(self.sample_rate))
    }
}

impl Iterator for WavSource {
    type Item = SourceEvent;

    fn next(&mut self) -> Option<SourceEvent> {
        if self.finished {
            return None;
        }

        let wanted = self.block_size * self.channels;
        let mut samples = Vec::with_capacity(wanted);
        {
            let mut reader_samples = self.reader.samples::<i16>();
            while samples.len() < wanted {
                match reader_samples.next() {
                    Some(Ok(sample)) => samples.push(sample),
                    Some(Err(error)) => {
                        warn!("wav read failed mid-file, ending stream: {}", error);
                        self.finished = true;
                        break;
                    }
                    None => {
                        self.finished = true;
                        break;
                    }
                }
            }
        }

        if samples.is_empty() {
            return None;
        }

        if self.paced {
            spin_sleep::sleep(self.block_period());
        }

        Some(SourceEvent::Block(SampleBlock::new(
            samples,
            self.channels,
            self.sample_rate,
            Instant::now(),
        )))
    }
}

impl AudioSource for WavSource {
    fn channels(&self) -> usize {
        self.channels
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
    use crate::channel::{Channel, CHANNEL_COUNT};
    use hound::{WavSpec, WavWriter};

    fn write_fixture(path: &Path, frames: usize) {
        let spec = WavSpec {
            channels: CHANNEL_COUNT as u16,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for frame in 0..frames {
            for channel in 0..CHANNEL_COUNT {
                // Center carries a square wave, the rest silence.
                let value = if channel == Channel::Center.index() {
                    if frame % 2 == 0 {
                        i16::MAX / 2
                    } else {
                        -(i16::MAX / 2)
                    }
                } else {
                    0
                };
                writer.write_sample(value).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn replays_whole_file_in_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.wav");
        write_fixture(&path, 150);

        let source = WavSource::open(&path).unwrap().with_block_size(64).unpaced();
        assert_eq!(source.channels(), CHANNEL_COUNT);
        assert_eq!(source.sample_rate(), 44100);

        let blocks: Vec<SampleBlock> = source
            .map(|event| match event {
                SourceEvent::Block(block) => block,
                other => panic!("unexpected event {:?}", other),
            })
            .collect();

        // 150 frames in 64-frame blocks: 64 + 64 + 22.
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].frames(), 64);
        assert_eq!(blocks[2].frames(), 22);
    }

    #[test]
    fn center_channel_content_survives_the_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.wav");
        write_fixture(&path, 64);

        let mut source = WavSource::open(&path).unwrap().with_block_size(64).unpaced();
        let block = match source.next() {
            Some(SourceEvent::Block(block)) => block,
            other => panic!("expected a block, got {:?}", other),
        };

        let center: Vec<i16> = block.channel_samples(Channel::Center).collect();
        assert_eq!(center[0], i16::MAX / 2);
        assert_eq!(center[1], -(i16::MAX / 2));
        assert!(block
            .channel_samples(Channel::SideLeft)
            .all(|sample| sample == 0));
    }

    #[test]
    fn refuses_float_wavs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = WavSpec {
            channels: CHANNEL_COUNT as u16,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..CHANNEL_COUNT {
            writer.write_sample(0.0f32).unwrap();
        }
        writer.finalize().unwrap();

        match WavSource::open(&path) {
            Err(SourceError::UnsupportedFormat(_)) => {}
            other => panic!("expected UnsupportedFormat, got {:?}", other.map(|_| ())),
        }
    }
}
