use std::{
    sync::{Arc, mpsc},
    thread::JoinHandle,
};

use rayon::prelude::*;

use crate::{
    config::PipelineOpts,
    effects::{chain::build_effect_chain, params::TransformParams},
    foundation::{
        core::{FrameSize, TrimRange},
        error::{VidfxError, VidfxResult},
    },
    job::scratch::JobScratch,
    media::{
        decode::{DecodeConfig, FrameReader},
        encode::{AudioInput, EncodeConfig, FfmpegEncoder},
        format::OutputFormat,
        probe::probe,
    },
    progress::{ProgressTracker, estimate},
    render::{FrameRGBA, cpu::FrameProcessor},
};

pub type JobId = u64;

/// Progress report for one job; values never decrease and end with `1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressEvent {
    pub job_id: JobId,
    pub progress: f64,
}

/// Encoded result of a render job.
#[derive(Clone, Debug)]
pub struct RenderOutput {
    pub data: Vec<u8>,
    pub format: OutputFormat,
    pub size: FrameSize,
    pub frames: u64,
}

/// One render/export request: input bytes, parameters and pipeline options.
#[derive(Clone, Debug)]
pub struct RenderJob {
    pub id: JobId,
    pub input: Vec<u8>,
    /// Container extension of `input` (`mp4`, `mov`, ...).
    pub extension: String,
    pub params: TransformParams,
    pub opts: Arc<PipelineOpts>,
}

impl RenderJob {
    pub fn new(
        id: JobId,
        input: Vec<u8>,
        extension: impl Into<String>,
        params: TransformParams,
    ) -> Self {
        Self {
            id,
            input,
            extension: extension.into(),
            params,
            opts: Arc::new(PipelineOpts::default()),
        }
    }

    pub fn with_opts(mut self, opts: Arc<PipelineOpts>) -> Self {
        self.opts = opts;
        self
    }

    /// Run the job on the calling thread.
    ///
    /// Scratch files are removed before this returns, on success and failure alike.
    #[tracing::instrument(skip_all, fields(job_id = self.id, format = ?self.params.output_format))]
    pub fn run(&self, mut on_progress: impl FnMut(ProgressEvent)) -> VidfxResult<RenderOutput> {
        self.opts.validate()?;
        self.params.validate()?;

        let tools = self.opts.tools();
        let scratch = JobScratch::new(self.opts.temp_dir.as_deref())?;
        let input = scratch.write_input(&self.input, &self.extension)?;

        let meta = probe(&tools, &input)?;
        if meta.fps() <= 0.0 {
            return Err(VidfxError::media_read("source has no usable frame rate"));
        }
        let source = meta.display_size();
        let chain = Arc::new(build_effect_chain(&self.params, source, self.opts.lut_size));

        let (start_us, end_us) = chain.trim.resolve(meta.duration_us);
        if meta.duration_us > 0 && end_us <= start_us {
            return Err(VidfxError::validation(format!(
                "trim window {start_us}..{end_us}us is empty"
            )));
        }
        let window = TrimRange {
            start_us: Some(start_us),
            end_us: Some(end_us),
        };
        let decode_end = chain.trim.end_us.map(|_| end_us);

        let format = self.params.output_format;
        let out_path = scratch.file(&format!("output.{}", format.extension()));
        let encode_cfg = EncodeConfig {
            size: chain.output,
            input_rate: meta.fps() * chain.speed.map_or(1.0, |s| s.factor()),
            output_rate: chain.speed.map(|_| meta.fps_arg()),
            format,
            bitrate: self.params.bitrate,
            audio: (self.params.enable_audio && meta.has_audio).then(|| AudioInput {
                path: input.clone(),
                start_us,
                end_us: decode_end,
                tempo: chain.speed.map(|s| s.atempo_stages()).unwrap_or_default(),
            }),
            out_path: out_path.clone(),
            overwrite: true,
        };
        let decode_cfg = DecodeConfig {
            size: source,
            start_us,
            end_us: decode_end,
            rate: Some(meta.fps_arg()),
        };

        tracing::debug!(
            source = ?source,
            output = ?chain.output,
            effects = ?chain.kinds(),
            "render pipeline ready"
        );

        let reader = FrameReader::open(&tools, &input, &decode_cfg)?;
        let encoder = FfmpegEncoder::new(&tools, encode_cfg)?;
        let processor = FrameProcessor::new(chain.clone());
        let mut tracker = ProgressTracker::new(self.opts.progress_interval());
        let job_id = self.id;

        let frames = self.stream_frames(reader, encoder, &processor, &mut |frames_read| {
            let position = start_us + frames_read as i64 * meta.frame_duration_us();
            if let Some(p) = tracker.update(estimate(position, window, meta.duration_us)) {
                on_progress(ProgressEvent {
                    job_id,
                    progress: p,
                });
            }
        })?;

        let data = std::fs::read(&out_path).map_err(|e| {
            VidfxError::export(format!("cannot read encoded output '{}': {e}", out_path.display()))
        })?;
        if let Some(p) = tracker.finish() {
            on_progress(ProgressEvent {
                job_id,
                progress: p,
            });
        }
        tracing::info!(frames, bytes = data.len(), "render finished");

        Ok(RenderOutput {
            data,
            format,
            size: chain.output,
            frames,
        })
    }

    /// Run the job on its own thread.
    pub fn spawn(self) -> VidfxResult<JobHandle> {
        let id = self.id;
        let (tx, rx) = mpsc::channel();
        let join = std::thread::Builder::new()
            .name(format!("vidfx-job-{id}"))
            .spawn(move || {
                // `tx` drops when `run` returns, so the channel closes before the result is
                // observable through `join`.
                self.run(move |ev| {
                    let _ = tx.send(ev);
                })
            })
            .map_err(|e| VidfxError::export(format!("failed to spawn job thread: {e}")))?;
        Ok(JobHandle {
            id,
            progress: rx,
            join,
        })
    }

    /// Decode, process and encode every frame.
    ///
    /// Frames are decoded in chunks on this thread, processed in parallel on a rayon pool and
    /// handed in order to a dedicated encoder thread.
    fn stream_frames(
        &self,
        mut reader: FrameReader,
        encoder: FfmpegEncoder,
        processor: &FrameProcessor,
        on_chunk: &mut dyn FnMut(u64),
    ) -> VidfxResult<u64> {
        let pool = self.opts.build_thread_pool()?;
        let chunk_size = self.opts.chunk_size.max(1);
        let cap = self.opts.channel_capacity.max(1);

        std::thread::scope(|scope| -> VidfxResult<u64> {
            let (tx, rx) = mpsc::sync_channel::<FrameRGBA>(cap);
            let enc = scope.spawn(move || -> VidfxResult<u64> {
                let mut encoder = encoder;
                for frame in rx {
                    encoder.encode_frame(&frame)?;
                }
                encoder.finish()
            });

            let produced = (|| -> VidfxResult<()> {
                loop {
                    let mut chunk = Vec::with_capacity(chunk_size);
                    while chunk.len() < chunk_size {
                        match reader.next_frame()? {
                            Some(frame) => chunk.push(frame),
                            None => break,
                        }
                    }
                    if chunk.is_empty() {
                        return Ok(());
                    }

                    let processed = pool.install(|| {
                        chunk
                            .into_par_iter()
                            .map(|f| processor.process(f))
                            .collect::<VidfxResult<Vec<_>>>()
                    })?;
                    for frame in processed {
                        if tx.send(frame).is_err() {
                            // Encoder hung up; its own error is reported below.
                            return Ok(());
                        }
                    }
                    on_chunk(reader.frames_read());
                }
            })();
            drop(tx);

            let encoded = enc
                .join()
                .map_err(|_| VidfxError::export("encoder thread panicked"))?;
            produced?;
            let frames = encoded?;
            reader.finish()?;
            Ok(frames)
        })
    }
}

/// Handle to a spawned render job.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    progress: mpsc::Receiver<ProgressEvent>,
    join: JoinHandle<VidfxResult<RenderOutput>>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn progress(&self) -> &mpsc::Receiver<ProgressEvent> {
        &self.progress
    }

    /// Forward every progress event to `f`, then return the job result.
    pub fn wait_with_progress(self, mut f: impl FnMut(ProgressEvent)) -> VidfxResult<RenderOutput> {
        for ev in self.progress.iter() {
            f(ev);
        }
        self.join()
    }

    pub fn wait(self) -> VidfxResult<RenderOutput> {
        self.join()
    }

    fn join(self) -> VidfxResult<RenderOutput> {
        self.join
            .join()
            .map_err(|_| VidfxError::export(format!("render job {} panicked", self.id)))?
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/render.rs"]
mod tests;
