use anyhow::{Context, Result};
use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, bounded};
use log::{debug, info, trace};
use std::time::Duration;

use crate::dsp::pipeline::Pipeline;
use crate::dsp::source::SineGenerator;
use crate::engine::sink::Sink;
use crate::engine::stats::{StatsHandle, StatsRecorder};
use crate::error::{MAX_BLOCK_SIZE, PipelineError};
use crate::settings::Settings;

pub mod sink;
pub mod stats;

/// Cancellation signal for [`Engine::run`].
///
/// Cloneable and `Send`, so it can be triggered from a signal handler or
/// another thread. Triggering it wakes an engine that is waiting out its
/// cadence immediately.
#[derive(Clone)]
pub struct Shutdown {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self { tx, rx }
    }

    pub fn trigger(&self) {
        // A full channel means shutdown is already pending.
        let _ = self.tx.try_send(());
    }

    pub fn is_triggered(&self) -> bool {
        !self.rx.is_empty()
    }

    // Blocks for up to `timeout`, returning true if shutdown was requested.
    fn wait(&self, timeout: Duration) -> bool {
        if timeout.is_zero() {
            return self.is_triggered();
        }
        match self.rx.recv_timeout(timeout) {
            Ok(()) => {
                // Leave the signal in place for other observers.
                self.trigger();
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives the generate → process → emit cycle, one block at a time.
pub struct Engine<S: Sink> {
    source: SineGenerator,
    pipeline: Pipeline,
    sink: S,
    block: Vec<f32>,
    cadence: Duration,
    stats: StatsRecorder,
    cycles: u64,
}

impl<S: Sink> Engine<S> {
    pub fn new(
        source: SineGenerator,
        pipeline: Pipeline,
        sink: S,
        block_size: usize,
        cadence: Duration,
    ) -> Result<(Self, StatsHandle), PipelineError> {
        if !(1..=MAX_BLOCK_SIZE).contains(&block_size) {
            return Err(PipelineError::InvalidBlockSize(block_size));
        }

        let (stats, handle) = StatsRecorder::new();

        debug!(
            "Engine: {} samples per block, {:?} cadence, stages {:?}",
            block_size,
            cadence,
            pipeline.stage_names()
        );

        Ok((
            Self {
                source,
                pipeline,
                sink,
                block: vec![0.0; block_size],
                cadence,
                stats,
                cycles: 0,
            },
            handle,
        ))
    }

    pub fn from_settings(settings: &Settings, sink: S) -> Result<(Self, StatsHandle)> {
        settings.validate()?;

        let source = settings.build_source()?;
        let pipeline = settings.build_pipeline()?;

        Ok(Self::new(
            source,
            pipeline,
            sink,
            settings.block_size,
            settings.cadence(),
        )?)
    }

    pub fn block_size(&self) -> usize {
        self.block.len()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn source(&self) -> &SineGenerator {
        &self.source
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Generates one block, runs it through the pipeline and hands it to the sink.
    pub fn process_cycle(&mut self) -> Result<()> {
        self.source.generate_block(&mut self.block);
        self.pipeline.process_block(&mut self.block);
        self.stats.record(&self.block);

        self.sink
            .consume(&self.block)
            .with_context(|| format!("Sink rejected block {}", self.cycles))?;

        self.cycles += 1;
        trace!(
            "Cycle {} done, source phase {:.6}",
            self.cycles,
            self.source.phase()
        );
        Ok(())
    }

    /// Runs exactly `count` cycles back to back, without waiting between them.
    pub fn run_cycles(&mut self, count: u64) -> Result<()> {
        for _ in 0..count {
            self.process_cycle()?;
        }
        self.sink.flush()
    }

    /// Runs cycles at the configured cadence until `shutdown` fires or
    /// `max_cycles` have completed. Returns the number of cycles run.
    /// There is no pause after the last of `max_cycles`.
    pub fn run(&mut self, shutdown: &Shutdown, max_cycles: Option<u64>) -> Result<u64> {
        info!("Engine started");
        let start = self.cycles;

        while !shutdown.is_triggered() {
            if max_cycles.is_some_and(|max| self.cycles - start >= max) {
                break;
            }

            self.process_cycle()?;

            if max_cycles.is_some_and(|max| self.cycles - start >= max) {
                break;
            }
            if shutdown.wait(self.cadence) {
                break;
            }
        }

        self.sink.flush()?;

        let ran = self.cycles - start;
        info!("Engine stopped after {ran} cycles");
        Ok(ran)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::stages::gain::GainStage;
    use crate::engine::sink::CollectSink;
    use std::thread;
    use std::time::Instant;

    fn engine(block_size: usize, cadence: Duration) -> (Engine<CollectSink>, StatsHandle) {
        let source = SineGenerator::new(1000.0, 48_000).unwrap();
        let pipeline = Pipeline::new().with_stage(GainStage::new(0.5).unwrap());
        Engine::new(source, pipeline, CollectSink::new(), block_size, cadence).unwrap()
    }

    #[test]
    fn rejects_empty_blocks() {
        let source = SineGenerator::new(1000.0, 48_000).unwrap();
        let result = Engine::new(
            source,
            Pipeline::new(),
            CollectSink::new(),
            0,
            Duration::ZERO,
        );
        assert!(matches!(result, Err(PipelineError::InvalidBlockSize(0))));
    }

    #[test]
    fn rejects_oversized_blocks() {
        let source = SineGenerator::new(1000.0, 48_000).unwrap();
        let result = Engine::new(
            source,
            Pipeline::new(),
            CollectSink::new(),
            usize::MAX,
            Duration::ZERO,
        );
        assert!(matches!(
            result,
            Err(PipelineError::InvalidBlockSize(usize::MAX))
        ));
    }

    #[test]
    fn each_cycle_emits_one_full_block() -> Result<()> {
        let (mut engine, stats) = engine(64, Duration::ZERO);
        engine.run_cycles(5)?;

        assert_eq!(engine.cycles(), 5);
        assert_eq!(engine.sink().blocks(), 5);
        assert_eq!(engine.sink().samples().len(), 5 * 64);

        let stats = stats.snapshot();
        assert_eq!(stats.blocks, 5);
        assert_eq!(stats.samples, 5 * 64);
        assert!((stats.peak - 0.5).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn run_stops_after_max_cycles() -> Result<()> {
        let (mut engine, _) = engine(16, Duration::ZERO);
        let ran = engine.run(&Shutdown::new(), Some(3))?;

        assert_eq!(ran, 3);
        assert_eq!(engine.sink().blocks(), 3);
        Ok(())
    }

    #[test]
    fn pre_triggered_shutdown_runs_nothing() -> Result<()> {
        let (mut engine, _) = engine(16, Duration::ZERO);
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();

        assert_eq!(engine.run(&shutdown, None)?, 0);
        assert!(shutdown.is_triggered());
        Ok(())
    }

    #[test]
    fn shutdown_interrupts_cadence_wait() -> Result<()> {
        let (mut engine, _) = engine(16, Duration::from_secs(60));
        let shutdown = Shutdown::new();

        let remote = shutdown.clone();
        let trigger = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            remote.trigger();
        });

        let started = Instant::now();
        let ran = engine.run(&shutdown, None)?;
        trigger.join().expect("trigger thread panicked");

        assert_eq!(ran, 1);
        assert!(started.elapsed() < Duration::from_secs(30));
        Ok(())
    }

    // Records when each block arrives.
    struct TimingSink {
        arrivals: Vec<Instant>,
    }

    impl Sink for TimingSink {
        fn consume(&mut self, _block: &[f32]) -> Result<()> {
            self.arrivals.push(Instant::now());
            Ok(())
        }
    }

    #[test]
    fn cycles_are_spaced_by_cadence() -> Result<()> {
        const CADENCE: Duration = Duration::from_millis(40);

        let source = SineGenerator::new(1000.0, 48_000).unwrap();
        let sink = TimingSink {
            arrivals: Vec::new(),
        };
        let (mut engine, _) = Engine::new(source, Pipeline::new(), sink, 16, CADENCE)?;

        assert_eq!(engine.run(&Shutdown::new(), Some(4))?, 4);

        let arrivals = &engine.sink().arrivals;
        assert_eq!(arrivals.len(), 4);
        for pair in arrivals.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= CADENCE, "blocks only {gap:?} apart");
        }
        Ok(())
    }

    #[test]
    fn no_pause_after_last_cycle() -> Result<()> {
        let (mut engine, _) = engine(16, Duration::from_secs(60));

        let started = Instant::now();
        assert_eq!(engine.run(&Shutdown::new(), Some(1))?, 1);
        assert!(started.elapsed() < Duration::from_secs(30));
        Ok(())
    }

    #[test]
    fn sink_failure_stops_the_run() {
        struct FailingSink;
        impl Sink for FailingSink {
            fn consume(&mut self, _block: &[f32]) -> Result<()> {
                anyhow::bail!("device gone")
            }
        }

        let source = SineGenerator::new(1000.0, 48_000).unwrap();
        let (mut engine, _) =
            Engine::new(source, Pipeline::new(), FailingSink, 8, Duration::ZERO).unwrap();

        let err = engine.run(&Shutdown::new(), Some(10)).unwrap_err();
        assert!(format!("{err:#}").contains("device gone"));
        assert_eq!(engine.cycles(), 0);
    }
}
