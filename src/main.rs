use anyhow::{bail, Result};
use clap::Parser;
use duoscribe::transcribe::{reader, SharedSink};
use duoscribe::{
    AudioFile, Config, InterleavedStream, NatsStreamingCall, Outcome, RequestDescriptor,
    RetryClient, TranscriptCollector, TwoChannelReader,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Stream two WAV files to the transcription service as one interleaved
/// two-channel session.
#[derive(Parser)]
struct Args {
    /// Audio file for the left channel
    left: PathBuf,
    /// Audio file for the right channel
    right: PathBuf,
    /// Config file path (without extension)
    #[arg(long, default_value = "config/duoscribe")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} starting", cfg.service.name);

    let left = AudioFile::open(&args.left)?;
    let right = AudioFile::open(&args.right)?;

    let descriptor =
        RequestDescriptor::two_channel_pcm(cfg.audio.sample_rate, cfg.audio.language_code.clone());

    let stream = InterleavedStream::new(Some(left.into_source()), Some(right.into_source()));
    let shared_reader = reader::shared(TwoChannelReader::new(
        stream,
        "two-file",
        descriptor.clone(),
    ));

    let call = NatsStreamingCall::connect(cfg.nats_call_config()).await?;
    let client = RetryClient::with_policy(call, cfg.retry_policy(), cfg.stream.chunk_size);

    let collector = Arc::new(Mutex::new(TranscriptCollector::new("two-file")));
    let sink: SharedSink = collector.clone();

    let outcome = client.run(descriptor, shared_reader, sink).await;

    match outcome {
        Outcome::Success => {
            let collector = collector.lock().await;
            info!("Final transcript: {}", collector.transcript());
            Ok(())
        }
        Outcome::Failure(err) => bail!("transcription failed: {}", err),
    }
}
