use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use smartwelcome::{
    AudioInputConfig, CaptureTarget, NarrationMode, Presenter, PresenterConfig, ProcessSpeech,
    SpeechSynth, Timeline, narration::voices::preferred_voice,
};

#[derive(Parser, Debug)]
#[command(name = "smartwelcome", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one presentation and record it to WebM (requires `ffmpeg` on PATH).
    Record(RecordArgs),
    /// Render a single frame of the estimated timeline as a PNG.
    Frame(FrameArgs),
    /// Print the estimated word timeline as JSON.
    Timeline(CommonArgs),
    /// List the speech engine's voices.
    Voices(VoicesArgs),
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Presenter configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read the narration script from this file.
    #[arg(long)]
    script_file: Option<PathBuf>,

    /// TTF/OTF font used for title and subtitles.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CaptureArg {
    Canvas,
    Tab,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NarrationArg {
    Microphone,
    DeviceSpeech,
}

#[derive(Parser, Debug)]
struct RecordArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// What to record.
    #[arg(long, value_enum)]
    capture: Option<CaptureArg>,

    /// Where narration comes from.
    #[arg(long, value_enum)]
    narration: Option<NarrationArg>,

    /// Speech voice name.
    #[arg(long)]
    voice: Option<String>,

    /// Directory receiving the recording.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Raw f32le PCM file used as the microphone.
    #[arg(long)]
    mic_pcm: Option<PathBuf>,

    /// Sample rate of `--mic-pcm`.
    #[arg(long, default_value_t = 48_000)]
    mic_rate: u32,

    /// Channel count of `--mic-pcm`.
    #[arg(long, default_value_t = 1)]
    mic_channels: u16,

    /// Speech program with an espeak-ng compatible command line.
    #[arg(long)]
    speech_command: Option<String>,

    /// Grant display (tab) capture.
    #[arg(long, default_value_t = false)]
    allow_display: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Milliseconds since narration start.
    #[arg(long, default_value_t = 0)]
    at_ms: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct VoicesArgs {
    /// Speech program to query.
    #[arg(long, default_value = "espeak-ng")]
    speech_command: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Record(args) => cmd_record(args).await,
        Command::Frame(args) => cmd_frame(args),
        Command::Timeline(args) => cmd_timeline(args),
        Command::Voices(args) => cmd_voices(args).await,
    }
}

fn load_config(args: &CommonArgs) -> anyhow::Result<PresenterConfig> {
    let mut cfg = match &args.config {
        Some(path) => PresenterConfig::from_path(path)?,
        None => PresenterConfig::default(),
    };
    if let Some(path) = &args.script_file {
        cfg.script = std::fs::read_to_string(path)
            .with_context(|| format!("read script '{}'", path.display()))?;
    }
    if let Some(font) = &args.font {
        cfg.font_path = Some(font.clone());
    }
    Ok(cfg)
}

async fn cmd_record(args: RecordArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.common)?;
    if let Some(c) = args.capture {
        cfg.capture = match c {
            CaptureArg::Canvas => CaptureTarget::Canvas,
            CaptureArg::Tab => CaptureTarget::Tab,
        };
    }
    if let Some(n) = args.narration {
        cfg.narration = match n {
            NarrationArg::Microphone => NarrationMode::Microphone,
            NarrationArg::DeviceSpeech => NarrationMode::DeviceSpeech,
        };
    }
    if args.voice.is_some() {
        cfg.voice = args.voice;
    }
    if let Some(dir) = args.out_dir {
        cfg.out_dir = dir;
    }
    if let Some(path) = args.mic_pcm {
        cfg.mic_pcm = Some(AudioInputConfig {
            path,
            sample_rate: args.mic_rate,
            channels: args.mic_channels,
        });
    }
    if args.speech_command.is_some() {
        cfg.speech_command = args.speech_command;
    }
    cfg.display_consent |= args.allow_display;
    cfg.validate()?;

    let mut presenter = Presenter::headless(cfg)?;
    let mut status = presenter.subscribe_status();
    let status_log = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            eprintln!("{}", *status.borrow_and_update());
        }
    });

    let report = presenter.run_to_artifact().await?;
    tracing::info!(outcome = ?report.outcome, "session finished");
    let saved = presenter.save_download()?;
    presenter.teardown().await;
    status_log.abort();

    match saved {
        Some(path) => eprintln!("wrote {}", path.display()),
        None => anyhow::bail!("no recording was produced"),
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.common)?;
    let presenter = Presenter::headless(cfg)?;
    let frame = presenter.render_still(args.at_ms)?;
    frame.save_png(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_timeline(args: CommonArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args)?;
    let timeline = Timeline::estimate(&cfg.script);
    let json = serde_json::to_string_pretty(&timeline).context("serialize timeline")?;
    println!("{json}");
    Ok(())
}

async fn cmd_voices(args: VoicesArgs) -> anyhow::Result<()> {
    let speech = ProcessSpeech::detect(args.speech_command);
    if !speech.is_available() {
        anyhow::bail!("speech program '{}' is not available", speech.program());
    }
    let voices = speech.list_voices().await?;
    let preferred = preferred_voice(&voices).map(|v| v.name.clone());
    for v in &voices {
        let mark = if Some(&v.name) == preferred.as_ref() {
            "*"
        } else {
            " "
        };
        println!("{mark} {} ({})", v.name, v.lang);
    }
    Ok(())
}
