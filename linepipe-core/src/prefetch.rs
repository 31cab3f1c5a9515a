//! Background prefetching over dataset iteration
//!
//! The core pipeline is pull-based and synchronous; this helper decouples
//! producer and consumer throughput by driving a dataset's iteration on a
//! dedicated worker thread and handing records through a bounded blocking
//! queue. Channel disconnect is the completion signal. The iterator is
//! restartable: pulling again after it has been fully drained relaunches
//! the worker from the start of the dataset.

use std::sync::mpsc::{self, Receiver};
use std::thread::JoinHandle;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::record::Record;

/// An iterator that prefetches records on a background thread
pub struct PrefetchIterator {
    dataset: Dataset,
    capacity: usize,
    receiver: Option<Receiver<Result<Record>>>,
    worker: Option<JoinHandle<()>>,
}

impl PrefetchIterator {
    /// Prefetch over `dataset`, buffering up to `capacity` records
    pub fn new(dataset: Dataset, capacity: usize) -> Self {
        let mut iterator = Self {
            dataset,
            capacity: capacity.max(1),
            receiver: None,
            worker: None,
        };
        iterator.launch();
        iterator
    }

    fn launch(&mut self) {
        let (sender, receiver) = mpsc::sync_channel(self.capacity);
        let dataset = self.dataset.clone();
        let worker = std::thread::spawn(move || {
            for item in dataset.iter() {
                // the consumer going away is a normal shutdown
                if sender.send(item).is_err() {
                    break;
                }
            }
        });
        self.receiver = Some(receiver);
        self.worker = Some(worker);
    }

    fn shutdown(&mut self) {
        self.receiver = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Iterator for PrefetchIterator {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.receiver.is_none() {
            self.launch();
        }
        let item = self.receiver.as_ref().and_then(|rx| rx.recv().ok());
        if item.is_none() {
            self.shutdown();
        }
        item
    }
}

impl Drop for PrefetchIterator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
