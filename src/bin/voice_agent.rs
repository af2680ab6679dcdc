use anyhow::{Context, Result};
use clap::Parser;
use dns_voice_agent::{
    audio::{CpalAudioSource, RecordedAudio, Recorder, RecorderConfig, StopReason, StopSignal},
    config::load_config,
    llm::{build_agent, ConversationTemplates},
    stt::{HttpTranscriptionEngine, STTError, Transcriber},
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Speak DNS requests to the agent", long_about = None)]
pub struct Args {
    /// Input device name (see `list-devices`); system default if omitted
    #[arg(long)]
    device: Option<String>,

    /// Maximum recording length in seconds
    #[arg(long, default_value_t = 10)]
    max_duration: u64,
}

async fn read_line() -> Result<String> {
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| line)
    })
    .await
    .context("stdin reader panicked")?
    .context("Failed to read input")
}

async fn record(device: Option<String>, config: RecorderConfig, stop: StopSignal) -> Result<RecordedAudio> {
    // cpal streams are not Send, so the source lives and dies on the blocking thread
    let audio = tokio::task::spawn_blocking(move || {
        let source = CpalAudioSource::new(device.as_deref())?;
        Recorder::with_config(source, config)
            .with_stop_signal(stop)
            .record()
    })
    .await
    .context("recording thread panicked")??;
    Ok(audio)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    log::info!("🚀 Starting voice DNS agent");

    let config = load_config().context("Failed to load configuration")?;
    let engine = HttpTranscriptionEngine::new(&config.stt).context("Failed to create STT engine")?;
    let transcriber = Transcriber::new(Arc::new(engine));
    let (mut agent, llm) =
        build_agent(config.dns, &config.llm).context("Failed to initialize agent")?;

    let recorder_config = RecorderConfig {
        max_duration: Duration::from_secs(args.max_duration),
        ..RecorderConfig::default()
    };

    println!("🎙️ Voice DNS Agent ({}) | STT: {}", llm.model(), config.stt.model);
    println!("{}", ConversationTemplates::tip());

    loop {
        println!("\nPress Enter to speak, or type 'exit' to quit.");
        let line = read_line().await?;
        let command = line.trim().to_lowercase();
        if matches!(command.as_str(), "exit" | "quit" | "bye") {
            break;
        }
        // EOF
        if line.is_empty() {
            break;
        }

        println!(
            "🔴 Recording... press Enter to stop (max {}s)",
            args.max_duration
        );
        let stop = StopSignal::new();
        let stopper = {
            let stop = stop.clone();
            tokio::spawn(async move {
                let result = read_line().await;
                stop.set();
                result
            })
        };

        let recorded = record(args.device.clone(), recorder_config.clone(), stop.clone()).await;
        let ended_without_enter =
            matches!(&recorded, Ok(audio) if audio.stop_reason == StopReason::Timeout)
                || recorded.is_err();
        if ended_without_enter && !stopper.is_finished() {
            println!("(press Enter to continue)");
        }
        // One line is consumed per recording, whichever way it ended
        stopper.await.context("stop listener panicked")??;

        let audio = match recorded {
            Ok(audio) => audio,
            Err(e) => {
                println!("❌ Recording failed: {:#}", e);
                continue;
            }
        };

        let transcript = match transcriber.transcribe(&audio.samples, audio.sample_rate).await {
            Ok(transcript) => transcript,
            Err(STTError::NoSpeechDetected) => {
                println!("🤷 No speech detected, try again.");
                continue;
            }
            Err(e) => {
                log::error!("Transcription failed: {:?}", e);
                println!("❌ Transcription failed: {}", e);
                continue;
            }
        };

        println!("🗣️ \"{}\"", transcript.text);
        match agent.process_turn(&transcript.text).await {
            Ok(report) => {
                for line in report.lines() {
                    println!("{}", line);
                }
            }
            Err(e) => println!("❌ Error: {}", e),
        }
    }

    println!("{}", ConversationTemplates::goodbye());
    Ok(())
}
