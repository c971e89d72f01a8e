//! Per-channel Hilbert FIR worker thread.
//!
//! The orchestrator and a worker exchange a single `WorkChunk` over two
//! bounded(1) channels: "input ready" carries a filled chunk to the worker,
//! "output ready" carries it back with the results. The buffer is moved, never
//! shared, so at most one chunk per channel is in flight.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::error::{CwaveError, Result};
use crate::signal_processing::{FilterTaps, HilbertFir, ScanOrder};

/// Block of input samples and the matching analytic outputs for one channel
#[derive(Debug, Default)]
pub struct WorkChunk {
    pub input: Vec<f64>,
    pub re: Vec<f64>,
    pub im: Vec<f64>,
    /// Set on the final chunk; the worker exits after returning it
    pub end: bool,
}

impl WorkChunk {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            input: Vec::with_capacity(capacity),
            re: Vec::with_capacity(capacity),
            im: Vec::with_capacity(capacity),
            end: false,
        }
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }
}

/// Handle to a running channel worker
pub struct ChannelWorker {
    name: String,
    input_ready: Sender<WorkChunk>,
    output_ready: Receiver<WorkChunk>,
    handle: JoinHandle<()>,
}

impl ChannelWorker {
    /// Start a worker owning its own delay line
    pub fn spawn(name: &str, taps: Arc<FilterTaps>, scan: ScanOrder, gain: f64) -> Result<Self> {
        let (input_ready, input_rx) = bounded::<WorkChunk>(1);
        let (output_tx, output_ready) = bounded::<WorkChunk>(1);

        let handle = thread::Builder::new()
            .name(format!("hilbert-{}", name))
            .spawn(move || {
                let mut fir = HilbertFir::new(taps, scan);
                while let Ok(mut chunk) = input_rx.recv() {
                    chunk.re.resize(chunk.input.len(), 0.0);
                    chunk.im.resize(chunk.input.len(), 0.0);
                    for s in &mut chunk.input {
                        *s *= gain;
                    }
                    fir.process_block(&chunk.input, &mut chunk.re, &mut chunk.im);
                    let end = chunk.end;
                    if output_tx.send(chunk).is_err() || end {
                        break;
                    }
                }
            })
            .map_err(|e| {
                CwaveError::Resource(format!("cannot start the {} channel worker: {}", name, e))
            })?;

        log::debug!("Started {} channel worker", name);
        Ok(Self {
            name: name.to_string(),
            input_ready,
            output_ready,
            handle,
        })
    }

    /// Hand a filled chunk to the worker
    pub fn submit(&self, chunk: WorkChunk) -> Result<()> {
        self.input_ready
            .send(chunk)
            .map_err(|_| self.stopped())
    }

    /// Wait for the worker to return the processed chunk
    pub fn collect(&self) -> Result<WorkChunk> {
        self.output_ready.recv().map_err(|_| self.stopped())
    }

    /// Wait for the worker thread to exit
    pub fn join(self) -> Result<()> {
        let Self {
            name,
            input_ready,
            output_ready,
            handle,
        } = self;
        drop(input_ready);
        drop(output_ready);
        handle
            .join()
            .map_err(|_| CwaveError::Resource(format!("{} channel worker panicked", name)))?;
        log::debug!("Joined {} channel worker", name);
        Ok(())
    }

    fn stopped(&self) -> CwaveError {
        CwaveError::Resource(format!("{} channel worker stopped unexpectedly", self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal_processing::FilterSpec;

    #[test]
    fn test_worker_matches_inline_filter() {
        let taps = Arc::new(FilterTaps::design(FilterSpec::new(22, 4.0).unwrap()));
        let worker = ChannelWorker::spawn("test", taps.clone(), ScanOrder::Reverse, 0.5).unwrap();
        let mut reference = HilbertFir::new(taps, ScanOrder::Reverse);

        let input: Vec<f64> = (0..100).map(|i| ((i * 37) % 200) as f64 - 100.0).collect();
        let mut chunk = WorkChunk::with_capacity(32);
        for (n, block) in input.chunks(32).enumerate() {
            chunk.input.clear();
            chunk.input.extend_from_slice(block);
            chunk.end = n == 3;
            worker.submit(chunk).unwrap();
            chunk = worker.collect().unwrap();

            assert_eq!(chunk.len(), block.len());
            for (i, &s) in block.iter().enumerate() {
                let z = reference.process(s * 0.5);
                assert_eq!(chunk.re[i], z.re);
                assert_eq!(chunk.im[i], z.im);
            }
        }
        worker.join().unwrap();
    }

    #[test]
    fn test_collect_after_end_reports_stopped_worker() {
        let taps = Arc::new(FilterTaps::design(FilterSpec::new(6, 1.0).unwrap()));
        let worker = ChannelWorker::spawn("test", taps, ScanOrder::Direct, 1.0).unwrap();
        let chunk = WorkChunk {
            input: vec![1.0],
            end: true,
            ..Default::default()
        };
        worker.submit(chunk).unwrap();
        assert!(worker.collect().is_ok());
        assert!(matches!(worker.collect(), Err(CwaveError::Resource(_))));
        worker.join().unwrap();
    }
}
