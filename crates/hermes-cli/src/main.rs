//! Command-line interface to the Hermes protocol library.
//!
//! Each subcommand drives one request/response flow over MQTT: publish a
//! request, wait for the correlated reply, print it as one line of JSON.
//! Correlation by request/session id happens here, not in the client core.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use hermes_client::{
    ClientConfig, DispatchMode, HermesClient, HermesHandle, Inbound, MessageHandler, MqttConfig,
    MqttTransport, Outbound,
};
use hermes_proto::asr::{AsrStartListening, AsrStopListening};
use hermes_proto::audioserver::AudioFrame;
use hermes_proto::nlu::NluQuery;
use hermes_proto::tts::TtsSay;
use hermes_proto::wake::{HotwordToggleOff, HotwordToggleOn};
use hermes_proto::{Message, MessageKind, TopicArgs, DEFAULT_SITE_ID};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "hermes", about = "Talk to a Hermes voice assistant over MQTT")]
struct Args {
    /// MQTT host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// MQTT port
    #[arg(long, default_value_t = 1883)]
    port: u16,

    /// Hermes site id(s) to listen for (default: all)
    #[arg(long = "site-id")]
    site_id: Vec<String>,

    /// Print MQTT topics with JSON messages
    #[arg(long)]
    print_topics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transcribe WAV file(s)
    TranscribeWav {
        /// Path(s) to WAV file(s); reads WAV data from stdin when empty
        wav_file: Vec<PathBuf>,

        /// Audio frames per published chunk
        #[arg(long, default_value_t = 2048)]
        frames_per_chunk: usize,
    },

    /// Recognize intent(s) from text
    RecognizeIntent {
        /// Sentences to recognize; reads from stdin when empty
        sentence: Vec<String>,
    },

    /// Speak sentence(s)
    SpeakSentence {
        /// Sentence(s) to speak; reads from stdin when empty
        sentence: Vec<String>,

        /// Language for text to speech
        #[arg(long)]
        language: Option<String>,
    },

    /// Wait until a wake word is detected
    WaitWake {
        /// Toggle the hotword service on/off around detection
        #[arg(long)]
        toggle: bool,
    },
}

/// Forwards every dispatched message to the command flows below.
struct ForwardHandler {
    tx: mpsc::UnboundedSender<Inbound>,
}

#[async_trait]
impl MessageHandler for ForwardHandler {
    async fn on_message(&self, inbound: Inbound) -> Vec<Outbound> {
        let _ = self.tx.send(inbound);
        Vec::new()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mqtt = MqttConfig {
        broker: format!("tcp://{}:{}", args.host, args.port),
        client_id: format!("hermes-cli-{}", Uuid::new_v4()),
        ..MqttConfig::default()
    };
    let (transport, events) =
        MqttTransport::connect(&mqtt).context("Failed to connect to MQTT broker")?;

    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
    let config = ClientConfig {
        client_name: "hermes-cli".to_string(),
        site_ids: args.site_id.clone(),
    };
    let client = HermesClient::new(
        config,
        Arc::new(transport),
        events,
        ForwardHandler { tx: inbound_tx },
    );
    let handle = client.handle();
    let loop_task = tokio::spawn(client.run());

    let site_id = args
        .site_id
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_SITE_ID.to_string());

    match &args.command {
        Command::TranscribeWav {
            wav_file,
            frames_per_chunk,
        } => {
            transcribe(
                &handle,
                &mut inbound_rx,
                wav_file,
                *frames_per_chunk,
                &site_id,
                args.print_topics,
            )
            .await?;
        }
        Command::RecognizeIntent { sentence } => {
            let sentences = sentences_or_stdin(sentence)?;
            recognize(&handle, &mut inbound_rx, &sentences, &site_id, args.print_topics).await?;
        }
        Command::SpeakSentence { sentence, language } => {
            let sentences = sentences_or_stdin(sentence)?;
            speak(
                &handle,
                &mut inbound_rx,
                &sentences,
                language.as_deref(),
                &site_id,
                args.print_topics,
            )
            .await?;
        }
        Command::WaitWake { toggle } => {
            wait_wake(&handle, &mut inbound_rx, *toggle, &site_id, args.print_topics).await?;
        }
    }

    handle.stop().await.ok();
    loop_task.await.context("client loop failed")?;

    Ok(())
}

/// Recognize intents from sentences using `hermes/nlu`.
async fn recognize(
    handle: &HermesHandle,
    inbound: &mut mpsc::UnboundedReceiver<Inbound>,
    sentences: &[String],
    site_id: &str,
    print_topics: bool,
) -> Result<()> {
    handle
        .subscribe(
            &[
                MessageKind::NluIntent,
                MessageKind::NluIntentNotRecognized,
                MessageKind::NluError,
            ],
            DispatchMode::Concurrent,
        )
        .await?;

    for sentence in sentences {
        let query_id = Uuid::new_v4().to_string();
        let session_id = Uuid::new_v4().to_string();
        tracing::debug!(sentence, query_id, "recognizing");

        handle
            .publish(Outbound::new(NluQuery {
                input: sentence.clone(),
                intent_filter: None,
                id: Some(query_id.clone()),
                site_id: site_id.to_string(),
                session_id: Some(session_id.clone()),
            }))
            .await?;

        loop {
            let received = recv(inbound).await?;
            let done = match &received.message {
                Message::NluIntent(intent) => intent.id.as_deref() == Some(&query_id),
                Message::NluIntentNotRecognized(not_recognized) => {
                    not_recognized.id.as_deref() == Some(&query_id)
                }
                Message::NluError(error) => error.session_id.as_deref() == Some(&session_id),
                _ => false,
            };

            if done {
                print_message(&received, print_topics)?;
                break;
            }
        }
    }

    Ok(())
}

/// Speak sentences using `hermes/tts`.
async fn speak(
    handle: &HermesHandle,
    inbound: &mut mpsc::UnboundedReceiver<Inbound>,
    sentences: &[String],
    language: Option<&str>,
    site_id: &str,
    print_topics: bool,
) -> Result<()> {
    handle
        .subscribe(&[MessageKind::TtsSayFinished], DispatchMode::Concurrent)
        .await?;

    for sentence in sentences {
        let say_id = Uuid::new_v4().to_string();

        handle
            .publish(Outbound::new(TtsSay {
                text: sentence.clone(),
                lang: language.map(ToString::to_string),
                id: Some(say_id.clone()),
                site_id: site_id.to_string(),
                session_id: None,
            }))
            .await?;

        loop {
            let received = recv(inbound).await?;
            if let Message::TtsSayFinished(finished) = &received.message {
                if finished.id.as_deref() == Some(&say_id) {
                    print_message(&received, print_topics)?;
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Transcribe WAV files by streaming them as audio frames to the ASR.
async fn transcribe(
    handle: &HermesHandle,
    inbound: &mut mpsc::UnboundedReceiver<Inbound>,
    wav_files: &[PathBuf],
    frames_per_chunk: usize,
    site_id: &str,
    print_topics: bool,
) -> Result<()> {
    handle
        .subscribe(&[MessageKind::AsrTextCaptured], DispatchMode::Concurrent)
        .await?;

    let wavs = read_wavs(wav_files)?;

    for (name, wav_bytes) in wavs {
        let session_id = Uuid::new_v4().to_string();
        tracing::debug!(name = %name, session_id, "transcribing");

        handle
            .publish(Outbound::new(AsrStartListening {
                site_id: site_id.to_string(),
                session_id: Some(session_id.clone()),
                lang: None,
                stop_on_silence: true,
                send_audio_captured: false,
                wakeword_id: None,
                intent_filter: None,
            }))
            .await?;

        let frame_args = TopicArgs::new().with("site_id", site_id);
        for chunk in hermes_audio::chunk_wav(&wav_bytes, frames_per_chunk)
            .with_context(|| format!("{name}: not a usable WAV file"))?
        {
            handle
                .publish(Outbound::with_args(
                    AudioFrame::from(chunk),
                    frame_args.clone(),
                ))
                .await?;
        }

        handle
            .publish(Outbound::new(AsrStopListening {
                site_id: site_id.to_string(),
                session_id: Some(session_id.clone()),
            }))
            .await?;

        loop {
            let received = recv(inbound).await?;
            if let Message::AsrTextCaptured(captured) = &received.message {
                if captured.session_id.as_deref() == Some(&session_id) {
                    print_message(&received, print_topics)?;
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Wait for a hotword detection, optionally toggling the service.
async fn wait_wake(
    handle: &HermesHandle,
    inbound: &mut mpsc::UnboundedReceiver<Inbound>,
    toggle: bool,
    site_id: &str,
    print_topics: bool,
) -> Result<()> {
    handle
        .subscribe(&[MessageKind::HotwordDetected], DispatchMode::Concurrent)
        .await?;

    if toggle {
        handle
            .publish(Outbound::new(HotwordToggleOn {
                site_id: site_id.to_string(),
            }))
            .await?;
    }

    loop {
        let received = recv(inbound).await?;
        if matches!(received.message, Message::HotwordDetected(_)) {
            print_message(&received, print_topics)?;
            break;
        }
    }

    if toggle {
        handle
            .publish(Outbound::new(HotwordToggleOff {
                site_id: site_id.to_string(),
                session_id: None,
            }))
            .await?;
    }

    Ok(())
}

async fn recv(inbound: &mut mpsc::UnboundedReceiver<Inbound>) -> Result<Inbound> {
    inbound
        .recv()
        .await
        .context("client stopped while waiting for a reply")
}

/// Print a received message as a single line of JSON.
fn print_message(inbound: &Inbound, print_topics: bool) -> Result<()> {
    let payload = inbound.message.encode()?;
    let line = String::from_utf8(payload).context("message payload is not UTF-8 JSON")?;

    if print_topics {
        println!("{} {line}", inbound.topic);
    } else {
        println!("{line}");
    }

    Ok(())
}

/// Use the given sentences, or read one per line from stdin.
fn sentences_or_stdin(sentences: &[String]) -> Result<Vec<String>> {
    if !sentences.is_empty() {
        return Ok(sentences.to_vec());
    }

    eprintln!("Reading sentences from stdin...");
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read stdin")?;

    Ok(buffer
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect())
}

/// Read the named WAV files, or WAV data from stdin when none are given.
fn read_wavs(wav_files: &[PathBuf]) -> Result<Vec<(String, Vec<u8>)>> {
    if wav_files.is_empty() {
        eprintln!("Reading WAV data from stdin...");
        let mut wav_bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut wav_bytes)
            .context("failed to read stdin")?;
        return Ok(vec![("<stdin>".to_string(), wav_bytes)]);
    }

    wav_files
        .iter()
        .map(|path| {
            let bytes =
                std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            Ok((path.display().to_string(), bytes))
        })
        .collect()
}
