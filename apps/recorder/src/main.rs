//! Command-line recorder: runs a timed simulated capture session and streams
//! tagged CSV records to a file, with a JSON manifest alongside.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde::Serialize;

use model::{EndReason, SessionMeta};
use motion_ingest_core::SessionController;
use motion_ingest_sim::{SimConfig, SimSource};
use motion_io::write_through;

#[derive(Parser, Debug)]
#[command(name = "recorder", about = "Capture simulated motion samples to CSV")]
struct Args {
    /// Sampling rate in Hz.
    #[arg(long, default_value_t = 50.0)]
    rate: f64,

    /// Capture duration in seconds.
    #[arg(long, default_value_t = 10.0)]
    duration: f64,

    /// Tag prepended to every CSV record.
    #[arg(long, default_value = "session")]
    tag: String,

    /// Output CSV path. Defaults to recorder.csv under the user data dir.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Serialize)]
struct Manifest {
    #[serde(flatten)]
    meta: SessionMeta,
    lines: usize,
    csv_path: PathBuf,
}

fn default_out() -> PathBuf {
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("motion-recorder")
        .join("recorder.csv")
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let out = args.out.clone().unwrap_or_else(default_out);
    if let Some(dir) = out.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let file = File::create(&out).with_context(|| format!("create {}", out.display()))?;

    let meta = SessionMeta::new(args.tag.as_str(), args.rate);
    let source = Arc::new(SimSource::new(SimConfig {
        rate_hz: args.rate,
        ..SimConfig::default()
    }));
    let mut controller = SessionController::new(source, args.rate);
    let mut stream = controller.begin().await?;

    // blocking consumer pump; result comes back over the channel
    let (done_tx, done_rx) = crossbeam_channel::bounded(1);
    let tag = args.tag.clone();
    let writer = thread::spawn(move || {
        let mut w = BufWriter::new(file);
        let _ = done_tx.send(write_through(&mut stream, &mut w, &tag));
    });

    info!(
        "recording {}s at {} Hz to {}",
        args.duration,
        args.rate,
        out.display()
    );
    tokio::time::sleep(Duration::from_secs_f64(args.duration)).await;
    controller.end(EndReason::Stopped).await?;

    let lines = done_rx
        .recv()
        .context("writer thread exited without a result")??;
    writer.join().ok();

    let manifest = Manifest {
        meta,
        lines,
        csv_path: out.clone(),
    };
    let manifest_path = out.with_extension("manifest.json");
    std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("write {}", manifest_path.display()))?;

    info!("manifest at {}", manifest_path.display());
    println!("{} records -> {}", lines, out.display());
    Ok(())
}
