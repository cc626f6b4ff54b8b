use anyhow::{Context, Result};
use crossbeam::channel::{Receiver, Sender, bounded};
use std::io::Write;

const BLOCK_CHANNEL_CAPACITY: usize = 32;

/// Consumer of finished blocks.
pub trait Sink {
    fn consume(&mut self, block: &[f32]) -> Result<()>;

    /// Called once when the engine stops.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes each sample as fixed-precision text, one per line.
pub struct ConsoleSink<W: Write> {
    writer: W,
    precision: usize,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(writer: W, precision: usize) -> Self {
        Self { writer, precision }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sink for ConsoleSink<W> {
    fn consume(&mut self, block: &[f32]) -> Result<()> {
        for sample in block {
            writeln!(self.writer, "{sample:.prec$}", prec = self.precision)
                .context("Failed to write sample")?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush output")
    }
}

/// Forwards copies of each block to another thread over a bounded channel.
pub struct ChannelSink {
    tx: Sender<Vec<f32>>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<Vec<f32>>) {
        let (tx, rx) = bounded::<Vec<f32>>(BLOCK_CHANNEL_CAPACITY);
        (Self { tx }, rx)
    }
}

impl Sink for ChannelSink {
    fn consume(&mut self, block: &[f32]) -> Result<()> {
        self.tx
            .send(block.to_vec())
            .map_err(|_| anyhow::anyhow!("Block receiver disconnected"))
    }
}

/// Keeps every sample it receives, in order.
#[derive(Debug, Default)]
pub struct CollectSink {
    samples: Vec<f32>,
    blocks: usize,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn blocks(&self) -> usize {
        self.blocks
    }
}

impl Sink for CollectSink {
    fn consume(&mut self, block: &[f32]) -> Result<()> {
        self.samples.extend_from_slice(block);
        self.blocks += 1;
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn consume(&mut self, block: &[f32]) -> Result<()> {
        (**self).consume(block)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn consume(&mut self, block: &[f32]) -> Result<()> {
        (**self).consume(block)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
