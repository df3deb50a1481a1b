//! Run orchestration: reduce once, render every slice, hand frames to the assembler in order.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, mpsc};

use rayon::prelude::*;

use crate::config::DisplayConfig;
use crate::cube::fits::CubeSource;
use crate::cube::model::{CoordinateMap, Cube};
use crate::cube::reduce::{ReferenceMap, reduce};
use crate::encode::assembler::{VideoAssembler, VideoStream};
use crate::encode::backend::EncoderBackend;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::{CpuBackendOpts, Frame, RenderBackend};
use crate::render::cpu::CpuBackend;
use crate::render::slice::render_slice;
use crate::sequence::reorder::ReorderBuffer;
use crate::sequence::store::FrameStore;

const MAX_REORDER_BUFFER_BYTES: u64 = 128 * 1024 * 1024;

/// Shared cancellation flag, checked before each slice is rendered.
#[derive(Clone, Debug, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the run stop before its next slice.
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options controlling a full run.
#[derive(Clone, Debug)]
pub struct PipelineOpts {
    /// Output frame rate.
    pub fps: Fps,
    /// Render slices on a dedicated rayon pool.
    pub parallel: bool,
    /// Override the number of worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Slices handed to the pool per batch.
    pub chunk_size: usize,
    /// Bounded channel capacity between workers and the encoder thread.
    pub channel_capacity: usize,
    /// Persist every frame as PNG in addition to encoding it.
    pub store: Option<FrameStore>,
    pub abort: Option<AbortFlag>,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            parallel: false,
            threads: None,
            chunk_size: 64,
            channel_capacity: 4,
            store: None,
            abort: None,
        }
    }
}

/// Result of a completed [`Pipeline::render_all`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub frames: u64,
    pub stream: VideoStream,
    /// `(Y, X)` of the reference map.
    pub reference_shape: (usize, usize),
}

/// Loaded cube plus its reference map, ready to render any slice.
///
/// The reference map is computed once in [`Pipeline::new`] and is read-only afterwards, so
/// slices can be rendered from any number of threads.
pub struct Pipeline {
    cube: Cube,
    coords: CoordinateMap,
    reference: ReferenceMap,
    display: DisplayConfig,
}

impl Pipeline {
    pub fn new(cube: Cube, coords: CoordinateMap, display: DisplayConfig) -> ReelResult<Self> {
        display.validate()?;
        let reference = reduce(cube.view_dyn())?;
        let (v, y, x) = cube.shape();
        tracing::info!(v, y, x, "cube reduced to reference map");
        Ok(Self {
            cube,
            coords,
            reference,
            display,
        })
    }

    pub fn from_source(source: &dyn CubeSource, display: DisplayConfig) -> ReelResult<Self> {
        let (cube, coords) = source.load()?;
        Self::new(cube, coords, display)
    }

    pub fn cube(&self) -> &Cube {
        &self.cube
    }

    pub fn coords(&self) -> &CoordinateMap {
        &self.coords
    }

    pub fn reference(&self) -> &ReferenceMap {
        &self.reference
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    /// Number of frames a full run produces (`X`).
    pub fn frame_count(&self) -> u64 {
        self.cube.slice_count()
    }

    pub fn render_frame(
        &self,
        index: FrameIndex,
        backend: &mut dyn RenderBackend,
    ) -> ReelResult<Frame> {
        render_slice(
            &self.cube,
            &self.reference,
            &self.coords,
            index,
            &self.display,
            backend,
        )
    }

    /// Render every slice and encode the frames, in index order, into one stream at `output`.
    ///
    /// Any failure aborts the stream, which stays marked incomplete.
    #[tracing::instrument(skip_all, fields(frames = self.frame_count(), parallel = opts.parallel))]
    pub fn render_all(
        &self,
        opts: &PipelineOpts,
        output: impl Into<PathBuf>,
        backend: &mut dyn RenderBackend,
        encoder: &mut dyn EncoderBackend,
    ) -> ReelResult<RunReport> {
        let output = output.into();
        tracing::info!(path = %output.display(), fps = opts.fps.as_f64(), "render run started");

        let mut assembler = VideoAssembler::new(encoder, output, opts.fps);
        let res = self.drive(opts, backend, &mut |frame: Frame| assembler.append(&frame));
        let stream = match res.and_then(|_| assembler.finalize()) {
            Ok(stream) => stream,
            Err(e) => {
                if let Err(abort_err) = assembler.abort() {
                    tracing::warn!(error = %abort_err, "failed to abort video stream");
                }
                tracing::warn!(error = %e, "run failed; output stream left incomplete");
                return Err(e);
            }
        };

        tracing::info!(
            frames = stream.frame_count,
            width = stream.width,
            height = stream.height,
            "render run finished"
        );
        Ok(RunReport {
            frames: stream.frame_count,
            stream,
            reference_shape: self.reference.dim(),
        })
    }

    /// Render every slice into `opts.store` without encoding.
    #[tracing::instrument(skip_all, fields(frames = self.frame_count()))]
    pub fn render_frames(
        &self,
        opts: &PipelineOpts,
        backend: &mut dyn RenderBackend,
    ) -> ReelResult<u64> {
        let Some(store) = opts.store.as_ref() else {
            return Err(ReelError::validation(
                "render_frames needs a frame store to write into",
            ));
        };
        let written = self.drive(opts, backend, &mut |_frame: Frame| Ok(()))?;
        tracing::info!(frames = written, dir = %store.dir().display(), "frames persisted");
        Ok(written)
    }

    fn drive(
        &self,
        opts: &PipelineOpts,
        backend: &mut dyn RenderBackend,
        consume: &mut (dyn FnMut(Frame) -> ReelResult<()> + Send),
    ) -> ReelResult<u64> {
        if opts.parallel {
            match backend.worker_opts() {
                Some(worker_opts) => return self.drive_parallel(opts, worker_opts, consume),
                None => tracing::warn!("backend cannot be replicated; rendering sequentially"),
            }
        }
        self.drive_sequential(opts, backend, consume)
    }

    fn drive_sequential(
        &self,
        opts: &PipelineOpts,
        backend: &mut dyn RenderBackend,
        consume: &mut (dyn FnMut(Frame) -> ReelResult<()> + Send),
    ) -> ReelResult<u64> {
        let n = self.frame_count();
        for i in 0..n {
            check_abort(opts.abort.as_ref(), i)?;
            let frame = self.render_frame(FrameIndex(i), backend)?;
            if let Some(store) = opts.store.as_ref() {
                store.write(&frame)?;
            }
            consume(frame)?;
        }
        Ok(n)
    }

    fn drive_parallel(
        &self,
        opts: &PipelineOpts,
        worker_opts: CpuBackendOpts,
        consume: &mut (dyn FnMut(Frame) -> ReelResult<()> + Send),
    ) -> ReelResult<u64> {
        let n = self.frame_count();
        // Surface backend construction errors here rather than once per worker.
        CpuBackend::new(worker_opts.clone())?;

        let cap = opts.channel_capacity.max(1);
        let bytes_per_frame = u64::from(self.display.width)
            .saturating_mul(u64::from(self.display.height))
            .saturating_mul(4)
            .max(1);
        let max_chunk_by_mem = (MAX_REORDER_BUFFER_BYTES / bytes_per_frame).max(1);
        let chunk_size = normalized_chunk_size(opts.chunk_size)
            .min(max_chunk_by_mem)
            .min(n.max(1));
        let pool = build_thread_pool(opts.threads)?;
        let rendered = AtomicU64::new(0);

        std::thread::scope(|scope| -> ReelResult<u64> {
            let (tx, rx) = mpsc::sync_channel::<FrameMsg>(cap);

            // Single writer: frames leave this thread in index order only.
            let enc = scope.spawn(move || -> ReelResult<ReorderBuffer<Frame>> {
                let mut reorder = ReorderBuffer::new(0, n);
                for msg in rx {
                    reorder.insert(msg.index, msg.frame)?;
                    while let Some((_, frame)) = reorder.pop_ready() {
                        consume(frame)?;
                    }
                }
                Ok(reorder)
            });

            let ctx = ChunkCtx {
                pipeline: self,
                opts,
                worker_opts: &worker_opts,
                rendered: &rendered,
                tx: &tx,
            };
            let mut produce_res = Ok(());
            let mut chunk_start = 0;
            while chunk_start < n {
                let chunk_end = (chunk_start + chunk_size).min(n);
                produce_res = pool.install(|| render_chunk(&ctx, chunk_start, chunk_end));
                if produce_res.is_err() {
                    break;
                }
                tracing::debug!(chunk_start, chunk_end, "chunk rendered");
                chunk_start = chunk_end;
            }

            drop(tx);
            let enc_res = enc
                .join()
                .map_err(|_| ReelError::encoding("encoder thread panicked"))?;

            // A failed writer makes the producers fail too; report the writer's error.
            let reorder = enc_res?;
            produce_res?;
            reorder.finish()?;
            Ok(n)
        })
    }
}

#[derive(Debug)]
struct FrameMsg {
    index: FrameIndex,
    frame: Frame,
}

struct ChunkCtx<'a> {
    pipeline: &'a Pipeline,
    opts: &'a PipelineOpts,
    worker_opts: &'a CpuBackendOpts,
    rendered: &'a AtomicU64,
    tx: &'a mpsc::SyncSender<FrameMsg>,
}

fn render_chunk(ctx: &ChunkCtx<'_>, start: u64, end: u64) -> ReelResult<()> {
    let tx = ctx.tx.clone();
    (start..end).into_par_iter().try_for_each_init(
        || CpuBackend::new(ctx.worker_opts.clone()).ok(),
        move |backend, i| -> ReelResult<()> {
            check_abort(ctx.opts.abort.as_ref(), ctx.rendered.load(Ordering::SeqCst))?;
            let backend = backend
                .as_mut()
                .ok_or_else(|| ReelError::render("failed to build worker backend"))?;
            let frame = ctx.pipeline.render_frame(FrameIndex(i), backend)?;
            if let Some(store) = ctx.opts.store.as_ref() {
                store.write(&frame)?;
            }
            ctx.rendered.fetch_add(1, Ordering::SeqCst);
            tx.send(FrameMsg {
                index: frame.index,
                frame,
            })
            .map_err(|_| ReelError::encoding("encoder thread is not accepting frames"))?;
            Ok(())
        },
    )
}

fn check_abort(flag: Option<&AbortFlag>, completed: u64) -> ReelResult<()> {
    match flag {
        Some(flag) if flag.is_aborted() => {
            tracing::warn!(completed, "abort requested");
            Err(ReelError::Aborted { completed })
        }
        _ => Ok(()),
    }
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        1
    } else {
        chunk_size as u64
    }
}

fn build_thread_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ReelError::validation("'threads' must be >= 1 when set"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ReelError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
