//! Reelsmith command-line driver.
//!
//! Runs the whole flow once: prompt to scenes, one video job per scene,
//! then a single combined video.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_ai_client::{ChatCompletionClient, PollConfig, ServiceConfig, VideoClient};
use reel_media::ConcatConfig;
use reel_models::{GenerationParams, Resolution};
use reel_worker::{OrchestrationController, ReelConfig};

#[derive(Parser, Debug)]
#[command(name = "reelsmith")]
#[command(about = "Turn one prompt into a multi-scene AI video", long_about = None)]
struct Args {
    /// Story prompt
    #[arg(short, long)]
    prompt: String,

    /// Number of scenes (1-10)
    #[arg(short, long, default_value_t = 3)]
    scenes: usize,

    /// Seconds per scene (1-20); REEL_DEFAULT_DURATION when omitted
    #[arg(short, long)]
    duration: Option<u32>,

    /// 1280x720 or 720x1280; REEL_DEFAULT_RESOLUTION when omitted
    #[arg(short, long)]
    resolution: Option<Resolution>,

    /// Output video path; the scratch directory when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the final scene list as JSON
    #[arg(long)]
    json: bool,
}

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("reel=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Already installed is fine
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();
    init_tracing()?;

    let args = Args::parse();

    let config = ReelConfig::from_env();
    let params = GenerationParams::new(
        args.duration
            .unwrap_or(config.default_params.duration_seconds),
        args.resolution.unwrap_or(config.default_params.resolution),
    )?;

    let service = ServiceConfig::from_env().context("Failed to load service configuration")?;
    let text = Arc::new(ChatCompletionClient::new(service.clone())?);
    let video = Arc::new(VideoClient::new(service)?);

    let controller = OrchestrationController::new(
        config,
        text,
        video,
        PollConfig::from_env(),
        ConcatConfig::from_env(),
    );

    info!("Generating {} scenes", args.scenes);
    let indices = controller
        .generate_scenes(&args.prompt, args.scenes, params)
        .await?;
    for scene in controller.snapshot() {
        info!(scene = %scene.index, "Scene {}: {}", scene.index.number(), scene.text);
    }

    controller.submit_all()?;

    tokio::select! {
        result = controller.wait_for_gate() => {
            if let Err(e) = result {
                if indices.len() > 1 {
                    return Err(e).context("Not every scene produced a video");
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            controller.shutdown().await;
            bail!("Interrupted");
        }
    }

    let output = match (indices.as_slice(), args.output) {
        // A single scene has nothing to combine with.
        ([only], Some(dest)) => controller.export_scene(*only, &dest).await?,
        ([only], None) => controller
            .snapshot()
            .into_iter()
            .find(|s| s.index == *only && s.is_ready())
            .and_then(|s| s.artifact_path)
            .with_context(|| format!("Scene {} produced no video", only.number()))?,
        (_, Some(dest)) => controller.combine(&dest).await?.output_path,
        (_, None) => controller.preview().await?.output_path,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
    }
    println!("{}", output.display());
    Ok(())
}
