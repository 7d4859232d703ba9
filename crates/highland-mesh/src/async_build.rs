//! Asynchronous chunk building on a worker pool.
//!
//! Offloads grid sampling and LOD derivation to background threads, supports
//! cancellation of chunks that leave the view before they are done, and
//! delivers completed chunks through a bounded channel. A chunk only reaches
//! the caller once every LOD mesh has been built.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, bounded};
use dashmap::DashMap;
use highland_terrain::NoiseField;

use crate::builder::build_base_mesh;
use crate::chunk::{ChunkCoord, LOD_LEVELS, TerrainChunk};
use crate::lod_derivation::derive_lod_mesh;

/// A fully built chunk ready to be inserted into the world.
#[derive(Debug)]
pub struct BuiltChunk {
    /// The chunk, with all LOD meshes present.
    pub chunk: TerrainChunk,
    /// Build time in microseconds (for profiling).
    pub build_time_us: u64,
}

struct BuildTask {
    coord: ChunkCoord,
    cancelled: Arc<AtomicBool>,
}

struct BuildOutput {
    built: BuiltChunk,
    cancelled: Arc<AtomicBool>,
}

/// Builds terrain chunks across a thread pool.
pub struct AsyncChunkBuilder {
    task_sender: Option<Sender<BuildTask>>,
    result_receiver: Receiver<BuildOutput>,
    /// Cancellation flag per pending chunk.
    active_tasks: Arc<DashMap<ChunkCoord, Arc<AtomicBool>>>,
    in_flight: Arc<AtomicU64>,
    max_concurrent: u64,
    worker_handles: Vec<JoinHandle<()>>,
}

impl AsyncChunkBuilder {
    /// Spawn `thread_count` workers building chunks of `chunk_size` cells from `field`.
    ///
    /// At most `max_concurrent` chunks are queued or building at once; further
    /// submissions are rejected. Up to `result_capacity` finished chunks wait
    /// for [`drain_results`](Self::drain_results) before workers block.
    pub fn new(
        field: Arc<NoiseField>,
        chunk_size: u32,
        thread_count: usize,
        max_concurrent: usize,
        result_capacity: usize,
    ) -> Self {
        let max_concurrent = max_concurrent.max(1);
        let (task_sender, task_receiver) = bounded::<BuildTask>(max_concurrent);
        let (result_sender, result_receiver) = bounded::<BuildOutput>(result_capacity.max(1));
        let in_flight = Arc::new(AtomicU64::new(0));

        let mut worker_handles = Vec::with_capacity(thread_count.max(1));
        for index in 0..thread_count.max(1) {
            let receiver = task_receiver.clone();
            let sender = result_sender.clone();
            let in_flight = Arc::clone(&in_flight);
            let field = Arc::clone(&field);

            let spawned = std::thread::Builder::new()
                .name(format!("chunk-build-worker-{index}"))
                .spawn(move || {
                    while let Ok(task) = receiver.recv() {
                        let start = Instant::now();
                        let chunk = build_chunk_cancellable(
                            &field,
                            task.coord,
                            chunk_size,
                            &task.cancelled,
                        );
                        let elapsed = start.elapsed().as_micros() as u64;

                        if let Some(chunk) = chunk {
                            let _ = sender.send(BuildOutput {
                                built: BuiltChunk {
                                    chunk,
                                    build_time_us: elapsed,
                                },
                                cancelled: task.cancelled,
                            });
                        } else {
                            tracing::trace!(coord = ?task.coord, "chunk build cancelled");
                        }
                        in_flight.fetch_sub(1, Ordering::Relaxed);
                    }
                });
            match spawned {
                Ok(handle) => worker_handles.push(handle),
                Err(err) => tracing::error!("failed to spawn chunk build worker: {err}"),
            }
        }
        tracing::debug!(
            workers = worker_handles.len(),
            max_concurrent,
            chunk_size,
            "chunk build pool started"
        );

        Self {
            task_sender: Some(task_sender),
            result_receiver,
            active_tasks: Arc::new(DashMap::new()),
            in_flight,
            max_concurrent: max_concurrent as u64,
            worker_handles,
        }
    }

    /// Create a builder with a thread count derived from the CPU core count.
    pub fn with_defaults(field: Arc<NoiseField>, chunk_size: u32) -> Self {
        Self::new(field, chunk_size, default_thread_count(), 64, 128)
    }

    /// Queue a chunk for building.
    ///
    /// Submitting a chunk that is already pending is a no-op. Returns
    /// `Err(coord)` when the in-flight budget is exhausted, the queue is full,
    /// or the pool has shut down.
    pub fn submit(&self, coord: ChunkCoord) -> Result<(), ChunkCoord> {
        if self.active_tasks.contains_key(&coord) {
            return Ok(());
        }
        let Some(sender) = &self.task_sender else {
            return Err(coord);
        };
        if self.in_flight.load(Ordering::Relaxed) >= self.max_concurrent {
            return Err(coord);
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        self.active_tasks.insert(coord, Arc::clone(&cancelled));
        self.in_flight.fetch_add(1, Ordering::Relaxed);

        sender
            .try_send(BuildTask { coord, cancelled })
            .map_err(|e| {
                self.in_flight.fetch_sub(1, Ordering::Relaxed);
                let coord = e.into_inner().coord;
                self.active_tasks.remove(&coord);
                coord
            })
    }

    /// Cancel a pending chunk. No-op if nothing is pending for `coord`.
    pub fn cancel(&self, coord: &ChunkCoord) {
        if let Some((_, cancelled)) = self.active_tasks.remove(coord) {
            cancelled.store(true, Ordering::Relaxed);
        }
    }

    /// Drain all completed chunks. Call once per frame on the main thread.
    ///
    /// Chunks cancelled while building are discarded here even if the worker
    /// finished them.
    pub fn drain_results(&self) -> Vec<BuiltChunk> {
        let mut results = Vec::new();
        while let Ok(output) = self.result_receiver.try_recv() {
            if output.cancelled.load(Ordering::Relaxed) {
                continue;
            }
            let coord = output.built.chunk.coord();
            self.active_tasks
                .remove_if(&coord, |_, flag| Arc::ptr_eq(flag, &output.cancelled));
            results.push(output.built);
        }
        results
    }

    /// Number of chunks currently queued or building.
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Returns `true` if a chunk is pending for `coord`.
    pub fn is_pending(&self, coord: &ChunkCoord) -> bool {
        self.active_tasks.contains_key(coord)
    }

    /// Stop all workers and discard unfinished work.
    ///
    /// Closes the task queue, cancels everything pending, and keeps draining
    /// the result channel until every worker has exited so none stays blocked
    /// on a full channel.
    pub fn shutdown(&mut self) {
        if self.task_sender.take().is_none() && self.worker_handles.is_empty() {
            return;
        }
        for entry in self.active_tasks.iter() {
            entry.value().store(true, Ordering::Relaxed);
        }
        self.active_tasks.clear();

        for handle in self.worker_handles.drain(..) {
            while !handle.is_finished() {
                while self.result_receiver.try_recv().is_ok() {}
                std::thread::sleep(Duration::from_millis(1));
            }
            let _ = handle.join();
        }
        while self.result_receiver.try_recv().is_ok() {}
        tracing::debug!("chunk build pool shut down");
    }
}

impl Drop for AsyncChunkBuilder {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Worker count leaving headroom for the main thread, never below one.
pub fn default_thread_count() -> usize {
    let cpus = num_cpus::get().max(2);
    (cpus - 2).max(1)
}

/// Build a chunk, checking `cancelled` between stages.
fn build_chunk_cancellable(
    field: &NoiseField,
    coord: ChunkCoord,
    size: u32,
    cancelled: &AtomicBool,
) -> Option<TerrainChunk> {
    if cancelled.load(Ordering::Relaxed) {
        return None;
    }
    let base = build_base_mesh(field, coord, size);

    let mut lods = Vec::with_capacity(LOD_LEVELS);
    for level in 0..LOD_LEVELS as u8 {
        if cancelled.load(Ordering::Relaxed) {
            return None;
        }
        lods.push(derive_lod_mesh(&base, size, level));
    }
    Some(TerrainChunk::new(coord, size, base, lods))
}
