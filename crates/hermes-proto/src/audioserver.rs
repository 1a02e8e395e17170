//! Messages for audio recording and playback.
//!
//! The frame messages (`AudioFrame`, `AudioSessionFrame`) are raw WAV
//! payloads published at a high rate; both ids live in the topic path
//! because there is no JSON body to carry them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::default_site_id;
use crate::message::BinaryBody;

/// Recorded frame of audio from a site, as a raw WAV payload.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioFrame {
    /// Recorded audio frame in WAV format.
    pub wav_bytes: Vec<u8>,
}

/// Recorded frame of audio for a specific session, as a raw WAV payload.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioSessionFrame {
    /// Audio frame in WAV format.
    pub wav_bytes: Vec<u8>,
}

/// Play a WAV sound on a specific site.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioPlayBytes {
    /// Audio to play in WAV format.
    pub wav_bytes: Vec<u8>,
}

/// Sent when the audio server has finished playing a sound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioPlayFinished {
    /// Request id from the `playBytes` topic.
    #[serde(default)]
    pub id: Option<String>,
    /// Id of the active session, if any.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Summary of recent audio frames for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSummary {
    /// Energy of the audio after DC bias removal.
    pub debiased_energy: f64,
    /// Whether voice activity detection saw speech.
    #[serde(default)]
    pub is_speech: Option<bool>,
}

/// Activate sending of audio summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryToggleOn {
    /// Id of the site where audio is being recorded.
    #[serde(default = "default_site_id")]
    pub site_id: String,
}

/// Deactivate sending of audio summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryToggleOff {
    /// Id of the site where audio is being recorded.
    #[serde(default = "default_site_id")]
    pub site_id: String,
}

/// Activate the audio output system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioToggleOn {
    /// Id of the site where audio output should be turned on.
    #[serde(default = "default_site_id")]
    pub site_id: String,
}

/// Deactivate the audio output system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioToggleOff {
    /// Id of the site where audio output should be turned off.
    #[serde(default = "default_site_id")]
    pub site_id: String,
}

/// Mode of an audio device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioDeviceMode {
    /// Recording device.
    Input,
    /// Playback device.
    Output,
}

/// Description of an audio device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDevice {
    /// Recording or playback device.
    pub mode: AudioDeviceMode,
    /// Unique id of the device.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: Option<String>,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// Status of the device if tested.
    #[serde(default)]
    pub working: Option<bool>,
}

/// Get details for available audio devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioGetDevices {
    /// Device types to report on.
    pub modes: Vec<AudioDeviceMode>,
    /// Id of the site where the devices are located.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Unique id, returned in the response.
    #[serde(default)]
    pub id: Option<String>,
    /// Test each device before reporting.
    #[serde(default)]
    pub test: bool,
}

/// Response to `getDevices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDevices {
    /// Description of the requested device types.
    pub devices: Vec<AudioDevice>,
    /// Id of the site where the devices are located.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Unique id from the request.
    #[serde(default)]
    pub id: Option<String>,
}

/// Error from the audio input component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioRecordError {
    /// Description of the error.
    pub error: String,
    /// Id of the site where the error occurred.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Context in which the error occurred.
    #[serde(default)]
    pub context: Option<String>,
    /// Id of the active session, if any.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Error from the audio output component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioPlayError {
    /// Description of the error.
    pub error: String,
    /// Id of the site where the error occurred.
    #[serde(default = "default_site_id")]
    pub site_id: String,
    /// Context in which the error occurred.
    #[serde(default)]
    pub context: Option<String>,
    /// Id of the active session, if any.
    #[serde(default)]
    pub session_id: Option<String>,
}

macro_rules! binary_wav {
    ($ty:ident) => {
        impl From<Vec<u8>> for $ty {
            fn from(wav_bytes: Vec<u8>) -> Self {
                Self { wav_bytes }
            }
        }

        impl BinaryBody for $ty {
            fn body(&self) -> &[u8] {
                &self.wav_bytes
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({} byte(s))", stringify!($ty), self.wav_bytes.len())
            }
        }
    };
}

binary_wav!(AudioFrame);
binary_wav!(AudioSessionFrame);
binary_wav!(AudioPlayBytes);
