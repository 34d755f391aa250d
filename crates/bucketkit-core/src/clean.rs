//! Bulk deletion of every object in a bucket.

use std::collections::HashSet;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::bucket::Bucket;
use crate::error::S3Error;
use crate::types::ListFilter;

impl Bucket {
    /// Delete every object in the bucket with a pool of `workers` tasks.
    ///
    /// Returns one error per object that could not be deleted; an empty list
    /// means everything was removed. A listing failure is returned as a
    /// single error and nothing is deleted. Keys left unreported by a worker
    /// that stopped early are returned as [`S3Error::WorkerStopped`] failures.
    pub async fn clean(&self, workers: usize) -> Vec<S3Error> {
        let files = match self.files(&ListFilter::new()).await {
            Ok(files) => files,
            Err(error) => return vec![error],
        };

        let total = files.len();
        if total == 0 {
            return Vec::new();
        }
        let workers = workers.clamp(1, total);
        info!(bucket = %self.name(), objects = total, workers, "deleting all objects");

        let (queue_tx, queue_rx) = async_channel::bounded::<String>(total);
        let (result_tx, mut result_rx) = mpsc::channel::<(String, Result<(), S3Error>)>(total);

        let mut pool = JoinSet::new();
        for _ in 0..workers {
            let queue = queue_rx.clone();
            let results = result_tx.clone();
            let bucket = self.clone();
            pool.spawn(async move {
                while let Ok(key) = queue.recv().await {
                    let outcome = bucket.object(&key).delete_object().await.map_err(|error| {
                        warn!(key = %key, %error, "failed to delete object");
                        S3Error::DeleteFailed {
                            key: key.clone(),
                            source: Box::new(error),
                        }
                    });
                    if results.send((key, outcome)).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(queue_rx);
        drop(result_tx);

        let keys: Vec<String> = files.into_iter().map(|file| file.key).collect();
        for key in &keys {
            if queue_tx.send(key.clone()).await.is_err() {
                break;
            }
        }
        drop(queue_tx);

        let mut stopped = Vec::new();
        while let Some(joined) = pool.join_next().await {
            if let Err(error) = joined {
                warn!(%error, "delete worker stopped unexpectedly");
                stopped.push(error.to_string());
            }
        }

        let mut reported = HashSet::with_capacity(total);
        let mut errors = Vec::new();
        while let Some((key, outcome)) = result_rx.recv().await {
            reported.insert(key);
            if let Err(error) = outcome {
                errors.push(error);
            }
        }

        if reported.len() < total {
            let reason = if stopped.is_empty() {
                "no result reported".to_owned()
            } else {
                stopped.join("; ")
            };
            errors.extend(
                keys.into_iter()
                    .filter(|key| !reported.contains(key))
                    .map(|key| S3Error::DeleteFailed {
                        key,
                        source: Box::new(S3Error::WorkerStopped(reason.clone())),
                    }),
            );
        }

        info!(
            bucket = %self.name(),
            deleted = total - errors.len(),
            failed = errors.len(),
            "bulk delete finished"
        );
        errors
    }
}
