use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sha2::Digest as _;

#[derive(Parser, Debug)]
#[command(name = "mixplay", version)]
struct Cli {
    /// Engine configuration JSON.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the track layout of a media URL as JSON.
    Probe(ProbeArgs),
    /// Composite frames at given times and write them as PNGs.
    Render(RenderArgs),
    /// Read JSON method calls from stdin, one per line, and answer each on stdout.
    Session,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Media URL (`solid:...`, `file://...` or a path).
    url: String,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Background video URL.
    #[arg(long)]
    base: String,

    /// Overlay video URL.
    #[arg(long)]
    overlay: String,

    /// Optional narration audio URL.
    #[arg(long)]
    narration: Option<String>,

    /// Overlay opacity in [0, 1]; defaults to the configured value.
    #[arg(long)]
    opacity: Option<f32>,

    /// Presentation times in milliseconds.
    #[arg(long = "at-ms", value_delimiter = ',', default_value = "0")]
    at_ms: Vec<i64>,

    /// Output directory for `frame_<ms>.png`.
    #[arg(long)]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => mixplay::EngineConfig::from_json_file(path)?,
        None => mixplay::EngineConfig::default(),
    };
    mixplay::logging::init_logging(&config.logging);

    match cli.cmd {
        Command::Probe(args) => cmd_probe(args),
        Command::Render(args) => cmd_render(config, args),
        Command::Session => cmd_session(config),
    }
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let asset = mixplay::SourceLoader::default().open(&args.url)?;
    let json = serde_json::to_string_pretty(&asset.info()).context("serialize probe")?;
    println!("{json}");
    Ok(())
}

fn cmd_render(config: mixplay::EngineConfig, args: RenderArgs) -> anyhow::Result<()> {
    let controller = mixplay::PlaybackController::new(config)?;
    controller.load(
        &args.base,
        &args.overlay,
        args.narration.as_deref(),
        args.opacity,
    )?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    for ms in &args.at_ms {
        let frame = controller
            .frame_at(mixplay::MediaTime::from_millis(*ms))?
            .context("no composition loaded")?;
        let out = args.out_dir.join(format!("frame_{ms}.png"));
        frame
            .to_rgba_image()?
            .save_with_format(&out, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", out.display()))?;

        let digest = sha2::Sha256::digest(frame.data());
        println!("{ms}\t{}\t{}", hex(&digest), out.display());
    }

    let stats = controller.pipeline_stats();
    eprintln!(
        "rendered {} frame(s): {} submitted, {} reused, {} failed",
        args.at_ms.len(),
        stats.submitted,
        stats.reused,
        stats.failed
    );
    controller.dispose();
    Ok(())
}

fn cmd_session(config: mixplay::EngineConfig) -> anyhow::Result<()> {
    let controller = mixplay::PlaybackController::new(config)?;
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line.context("read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let response: mixplay::surface::MethodResponse =
            match serde_json::from_str::<mixplay::surface::MethodCall>(&line) {
                Ok(call) => mixplay::surface::dispatch(&controller, &call).into(),
                Err(e) => mixplay::surface::MethodResponse::Error {
                    error: mixplay::surface::MethodError {
                        code: "args".to_string(),
                        message: format!("malformed method call: {e}"),
                    },
                },
            };
        serde_json::to_writer(&mut stdout, &response).context("write response")?;
        writeln!(stdout).context("write response")?;
        stdout.flush().context("flush stdout")?;
    }

    controller.dispose();
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
