use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::mpsc::{channel, Receiver, Sender},
};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::library::{
    errors::{EncodeWriteError, PipelineError},
    frame_encoder::{FrameEncoder, SaveJob, SavedImage},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteTotals {
    pub saved: u64,
    pub failed: u64,
    pub bytes_written: u64,
}

type WriteOutcome = Result<SavedImage, EncodeWriteError>;

/// Encodes and writes accepted frames on a fixed pool of workers.
///
/// At most one batch is in flight: `dispatch` waits for the previous batch to land before
/// handing over the next one, so the producer can fill one batch while the pool drains the
/// other and no more than two batches of frames are ever held in memory.
pub struct EncodeStage {
    pool: ThreadPool,
    encoder: FrameEncoder,
    outcome_tx: Sender<WriteOutcome>,
    outcome_rx: Receiver<WriteOutcome>,
    in_flight: usize,
    totals: WriteTotals,
}

impl EncodeStage {
    pub fn new(num_workers: usize, encoder: FrameEncoder) -> Result<Self, PipelineError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|i| format!("encode-worker-{}", i))
            .build()?;

        let (outcome_tx, outcome_rx) = channel();

        Ok(Self {
            pool,
            encoder,
            outcome_tx,
            outcome_rx,
            in_flight: 0,
            totals: WriteTotals::default(),
        })
    }

    pub fn dispatch(&mut self, jobs: Vec<SaveJob>) {
        self.wait_in_flight();

        for job in jobs {
            let encoder = self.encoder;
            let outcome_tx = self.outcome_tx.clone();
            self.pool.spawn(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| encoder.encode_and_write(&job)))
                    .unwrap_or_else(|_| Err(EncodeWriteError::Panicked(job.save_index)));
                //the receiver only goes away with the stage itself, and the stage waits for
                //every outcome before it goes.
                let _ = outcome_tx.send(outcome);
            });
            self.in_flight += 1;
        }
    }

    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn wait_in_flight(&mut self) {
        while self.in_flight > 0 {
            match self.outcome_rx.recv() {
                Ok(outcome) => self.record(outcome),
                Err(_) => break,
            }
            self.in_flight -= 1;
        }
    }

    pub fn finish(&mut self) -> WriteTotals {
        self.wait_in_flight();
        self.totals
    }

    fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            Ok(saved) => {
                trace!(
                    "Wrote frame {} as {} ({} bytes)",
                    saved.decode_index,
                    saved.path.display(),
                    saved.bytes_written
                );
                self.totals.saved += 1;
                self.totals.bytes_written += saved.bytes_written;
            }
            Err(e) => {
                warn!("{}", e);
                debug!("Save index {} is left unused", e.save_index());
                self.totals.failed += 1;
            }
        }
    }
}

impl Drop for EncodeStage {
    fn drop(&mut self) {
        self.wait_in_flight();
    }
}
