use std::ffi::OsString;
use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self as mpsc_std, SyncSender, TrySendError};

use tokio::sync::mpsc;

use crate::audio::pcm::AudioInputConfig;
use crate::foundation::core::Fps;
use crate::foundation::error::{PresenterError, PresenterResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::surface::FrameRGBA;

/// Channel on which a recorder delivers encoded chunks, in order.
pub type ChunkSender = mpsc::UnboundedSender<Vec<u8>>;

/// Configuration provided to a [`MediaRecorder`] at recording start.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
    /// Container/codec hint, e.g. `video/webm;codecs=vp9`.
    pub mime_type: String,
    /// Optional raw PCM audio muxed alongside the video.
    pub audio: Option<AudioInputConfig>,
}

/// Recording capability: consumes frames, emits encoded chunks.
///
/// Contract: `start` is called once, then `push_frame` zero or more times, then `stop` once.
/// When `stop` returns, every chunk has been sent and every clone of the [`ChunkSender`] held by the
/// recorder has been dropped; the closed channel is the stop signal.
///
/// `push_frame` runs on the async scheduler and must not block. `stop` may block; callers run it on
/// a blocking thread.
pub trait MediaRecorder: Send {
    /// Begin recording; chunks go to `chunks`.
    fn start(&mut self, cfg: RecorderConfig, chunks: ChunkSender) -> PresenterResult<()>;
    /// Encode one frame.
    fn push_frame(&mut self, frame: &FrameRGBA) -> PresenterResult<()>;
    /// Flush and finalize.
    fn stop(&mut self) -> PresenterResult<()>;
}

/// Creates a fresh recorder for every capture session.
pub type RecorderFactory = std::sync::Arc<dyn Fn() -> Box<dyn MediaRecorder> + Send + Sync>;

/// In-memory recorder for tests and debugging: every pushed frame becomes one chunk holding its
/// raw RGBA bytes.
#[derive(Debug, Default)]
pub struct InMemoryRecorder {
    cfg: Option<RecorderConfig>,
    chunks: Option<ChunkSender>,
    frames: u64,
}

impl InMemoryRecorder {
    /// Create a new in-memory recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory producing in-memory recorders.
    pub fn factory() -> RecorderFactory {
        std::sync::Arc::new(|| Box::new(InMemoryRecorder::new()) as Box<dyn MediaRecorder>)
    }

    /// Frames pushed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl MediaRecorder for InMemoryRecorder {
    fn start(&mut self, cfg: RecorderConfig, chunks: ChunkSender) -> PresenterResult<()> {
        if self.cfg.is_some() {
            return Err(PresenterError::capture("recorder already started"));
        }
        self.cfg = Some(cfg);
        self.chunks = Some(chunks);
        self.frames = 0;
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA) -> PresenterResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| PresenterError::capture("recorder not started"))?;
        check_frame_size(cfg, frame)?;
        let tx = self
            .chunks
            .as_ref()
            .ok_or_else(|| PresenterError::capture("recorder is already finalized"))?;
        tx.send(frame.data.clone())
            .map_err(|_| PresenterError::capture("chunk receiver dropped"))?;
        self.frames += 1;
        Ok(())
    }

    fn stop(&mut self) -> PresenterResult<()> {
        drop(self.chunks.take());
        Ok(())
    }
}

/// Options for [`FfmpegRecorder`].
#[derive(Clone, Debug)]
pub struct FfmpegRecorderOpts {
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
    /// Target video bitrate, in ffmpeg notation.
    pub video_bitrate: String,
    /// Size of the stdout reads that become chunks.
    pub chunk_bytes: usize,
    /// Frames that may wait for the encoder before new ones are dropped.
    pub frame_queue: usize,
}

impl Default for FfmpegRecorderOpts {
    fn default() -> Self {
        Self {
            bg_rgba: [255, 255, 255, 255],
            video_bitrate: "2M".to_string(),
            chunk_bytes: 64 * 1024,
            frame_queue: 8,
        }
    }
}

/// Recorder that spawns the system `ffmpeg`, streams raw frames to stdin and emits the WebM
/// (VP9, optional Opus) stream from stdout as chunks.
///
/// `push_frame` never blocks: frames are handed to a writer thread through a bounded queue and
/// dropped while the queue is full. `stop` blocks until ffmpeg exits.
pub struct FfmpegRecorder {
    opts: FfmpegRecorderOpts,

    child: Option<Child>,
    frames: Option<SyncSender<Vec<u8>>>,
    stdin_writer: Option<std::thread::JoinHandle<std::io::Result<()>>>,
    stdout_pump: Option<std::thread::JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    dropped_frames: u64,
    cfg: Option<RecorderConfig>,
}

impl FfmpegRecorder {
    /// Create a recorder; nothing is spawned until `start`.
    pub fn new(opts: FfmpegRecorderOpts) -> Self {
        Self {
            opts,
            child: None,
            frames: None,
            stdin_writer: None,
            stdout_pump: None,
            stderr_drain: None,
            dropped_frames: 0,
            cfg: None,
        }
    }

    /// Factory producing ffmpeg recorders with `opts`.
    pub fn factory(opts: FfmpegRecorderOpts) -> RecorderFactory {
        std::sync::Arc::new(move || Box::new(FfmpegRecorder::new(opts.clone())) as Box<dyn MediaRecorder>)
    }

    /// Frames skipped because the encoder fell behind.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }
}

/// Command-line arguments for one recording (everything after the program name).
fn ffmpeg_args(cfg: &RecorderConfig, opts: &FfmpegRecorderOpts) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    let mut push = |items: &[&str]| args.extend(items.iter().map(OsString::from));

    // Input: raw RGBA8 frames, flattened to opaque in push_frame.
    push(&[
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
        &format!("{}x{}", cfg.width, cfg.height),
        "-r",
        &format!("{}/{}", cfg.fps.num, cfg.fps.den),
        "-i",
        "pipe:0",
    ]);

    match cfg.audio.as_ref() {
        Some(audio) => {
            push(&[
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate.to_string(),
                "-ac",
                &audio.channels.to_string(),
                "-i",
            ]);
            args.push(audio.path.clone().into_os_string());
            // Audio is padded with silence; the video stream alone decides where the output ends.
            args.extend(
                ["-map", "0:v", "-map", "1:a", "-af", "apad", "-c:a", "libopus", "-shortest"]
                    .iter()
                    .map(OsString::from),
            );
        }
        None => args.push(OsString::from("-an")),
    }

    args.extend(
        [
            "-c:v",
            "libvpx-vp9",
            "-pix_fmt",
            "yuv420p",
            "-deadline",
            "realtime",
            "-cpu-used",
            "8",
            "-row-mt",
            "1",
            "-b:v",
            opts.video_bitrate.as_str(),
            "-f",
            "webm",
            "pipe:1",
        ]
        .iter()
        .map(OsString::from),
    );
    args
}

impl MediaRecorder for FfmpegRecorder {
    fn start(&mut self, cfg: RecorderConfig, chunks: ChunkSender) -> PresenterResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(PresenterError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(PresenterError::validation(
                "recorder width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(PresenterError::validation(
                "recorder width/height must be even (required for yuv420p output)",
            ));
        }
        if !cfg.mime_type.starts_with("video/webm") {
            return Err(PresenterError::unavailable(format!(
                "unsupported recording container '{}'",
                cfg.mime_type
            )));
        }
        if let Some(audio) = cfg.audio.as_ref() {
            audio.validate()?;
        }
        if !is_ffmpeg_on_path() {
            return Err(PresenterError::unavailable(
                "ffmpeg is required for WebM recording, but was not found on PATH",
            ));
        }

        let mut child = Command::new("ffmpeg")
            .args(ffmpeg_args(&cfg, &self.opts))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                PresenterError::unavailable(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PresenterError::capture("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| PresenterError::capture("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| PresenterError::capture("failed to open ffmpeg stderr (unexpected)"))?;

        let (frames_tx, frames_rx) = mpsc_std::sync_channel::<Vec<u8>>(self.opts.frame_queue.max(1));
        let stdin_writer = std::thread::spawn(move || {
            for frame in frames_rx {
                stdin.write_all(&frame)?;
            }
            // Closing stdin ends the video stream.
            drop(stdin);
            Ok(())
        });

        let chunk_bytes = self.opts.chunk_bytes.max(1);
        let stdout_pump = std::thread::spawn(move || {
            let mut buf = vec![0u8; chunk_bytes];
            loop {
                let n = stdout.read(&mut buf)?;
                if n == 0 {
                    return Ok(());
                }
                if chunks.send(buf[..n].to_vec()).is_err() {
                    return Ok(());
                }
            }
        });
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.child = Some(child);
        self.frames = Some(frames_tx);
        self.stdin_writer = Some(stdin_writer);
        self.stdout_pump = Some(stdout_pump);
        self.stderr_drain = Some(stderr_drain);
        self.dropped_frames = 0;
        self.cfg = Some(cfg);
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA) -> PresenterResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| PresenterError::capture("ffmpeg recorder not started"))?;
        check_frame_size(cfg, frame)?;
        let Some(frames) = self.frames.as_ref() else {
            return Err(PresenterError::capture("ffmpeg recorder is already finalized"));
        };

        let mut opaque = vec![0u8; frame.data.len()];
        flatten_premul_over_bg_to_opaque_rgba8(&mut opaque, &frame.data, self.opts.bg_rgba)?;

        match frames.try_send(opaque) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped_frames += 1;
                tracing::debug!(dropped = self.dropped_frames, "encoder busy, frame dropped");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(PresenterError::capture(
                "ffmpeg stopped accepting frames",
            )),
        }
    }

    fn stop(&mut self) -> PresenterResult<()> {
        drop(self.frames.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| PresenterError::capture("ffmpeg recorder not started"))?;

        let written = match self.stdin_writer.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| PresenterError::capture("ffmpeg stdin writer thread panicked"))?,
            None => Ok(()),
        };
        let status = child.wait().map_err(|e| {
            PresenterError::capture(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        if let Some(handle) = self.stdout_pump.take() {
            handle
                .join()
                .map_err(|_| PresenterError::capture("ffmpeg stdout pump thread panicked"))?
                .map_err(|e| PresenterError::capture(format!("ffmpeg stdout read failed: {e}")))?;
        }
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| PresenterError::capture("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| PresenterError::capture(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(PresenterError::capture(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        written.map_err(|e| {
            PresenterError::capture(format!("failed to write frames to ffmpeg stdin: {e}"))
        })?;
        if self.dropped_frames > 0 {
            tracing::warn!(dropped = self.dropped_frames, "encoder dropped frames");
        }

        self.cfg = None;
        Ok(())
    }
}

impl Drop for FfmpegRecorder {
    fn drop(&mut self) {
        drop(self.frames.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn check_frame_size(cfg: &RecorderConfig, frame: &FrameRGBA) -> PresenterResult<()> {
    if frame.width != cfg.width || frame.height != cfg.height {
        return Err(PresenterError::validation(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width, frame.height, cfg.width, cfg.height
        )));
    }
    Ok(())
}

fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> PresenterResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(PresenterError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = bg_rgba[0] as u16;
    let bg_g = bg_rgba[1] as u16;
    let bg_b = bg_rgba[2] as u16;

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = s[3] as u16;
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (s[0] as u16 + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (s[1] as u16 + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (s[2] as u16 + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/capability/recorder.rs"]
mod tests;
