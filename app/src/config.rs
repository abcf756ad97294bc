//! Phone configuration. Parsing config files is a collaborator's job; this
//! struct is the contract it fills in, and the binary falls back to
//! environment variables so the phone runs headless.

use std::net::{Ipv4Addr, UdpSocket};
use std::path::{Path, PathBuf};

use sccp_core::device_type_from_model;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid MAC address: {0}")]
    InvalidMac(String),

    #[error("unknown phone model: {0}")]
    UnknownModel(String),

    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

/// What to feed the RTP sender once media starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayMode {
    Silent,
    Microphone,
    Wav(PathBuf),
}

impl PlayMode {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "silent" | "silence" => Self::Silent,
            "mic" | "microphone" => Self::Microphone,
            _ => Self::Wav(PathBuf::from(s.trim())),
        }
    }
}

/// Immutable after start.
#[derive(Debug, Clone)]
pub struct PhoneConfig {
    pub server: String,
    pub port: u16,
    pub mac: String,
    pub device_name: String,
    pub model: String,
    pub device_type: u32,
    pub line_count: u32,
    pub auto_connect: bool,
    pub auto_answer: bool,
    pub tone_volume_db: f32,
    pub play_mode: PlayMode,
    pub tones_dir: PathBuf,
    // Topology discovery toggles consumed by the CDP/LLDP collaborator.
    pub enable_cdp: bool,
    pub enable_lldp: bool,
    pub enable_lsp: bool,
}

impl PhoneConfig {
    pub fn new(server: &str, mac: &str, model: &str) -> Result<Self, ConfigError> {
        let mac = normalize_mac(mac)?;
        let device_type = device_type_from_model(model)
            .ok_or_else(|| ConfigError::UnknownModel(model.to_string()))?;
        Ok(Self {
            server: server.to_string(),
            port: 2000,
            device_name: format!("SEP{mac}"),
            mac,
            model: model.to_string(),
            device_type,
            line_count: 2,
            auto_connect: true,
            auto_answer: false,
            tone_volume_db: 5.0,
            play_mode: PlayMode::Silent,
            tones_dir: PathBuf::from("cisco_tones"),
            enable_cdp: false,
            enable_lldp: false,
            enable_lsp: false,
        })
    }

    /// Environment-variable fallback for running without a config
    /// collaborator: SKINNY_SERVER, SKINNY_MAC, SKINNY_MODEL plus the
    /// optional knobs below.
    pub fn from_env() -> Result<Self, ConfigError> {
        let server = std::env::var("SKINNY_SERVER").map_err(|_| ConfigError::Missing("SKINNY_SERVER"))?;
        let mac = std::env::var("SKINNY_MAC").map_err(|_| ConfigError::Missing("SKINNY_MAC"))?;
        let model = std::env::var("SKINNY_MODEL").unwrap_or_else(|_| "7940".into());

        let mut config = Self::new(&server, &mac, &model)?;
        if let Ok(port) = std::env::var("SKINNY_PORT") {
            if let Ok(port) = port.parse() {
                config.port = port;
            }
        }
        if let Ok(v) = std::env::var("SKINNY_AUTO_ANSWER") {
            config.auto_answer = matches!(v.as_str(), "1" | "true" | "yes");
        }
        if let Ok(v) = std::env::var("SKINNY_TONE_VOLUME") {
            if let Ok(db) = v.parse() {
                config.tone_volume_db = db;
            }
        }
        if let Ok(v) = std::env::var("SKINNY_PLAY_MODE") {
            config.play_mode = PlayMode::parse(&v);
        }
        if let Ok(v) = std::env::var("SKINNY_TONES_DIR") {
            config.tones_dir = PathBuf::from(v);
        }
        Ok(config)
    }
}

/// Normalize a MAC address to a 12-character uppercase hex string.
pub fn normalize_mac(mac: &str) -> Result<String, ConfigError> {
    let cleaned: String = mac
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .collect::<String>()
        .to_uppercase();
    if cleaned.len() != 12 {
        return Err(ConfigError::InvalidMac(mac.to_string()));
    }
    Ok(cleaned)
}

/// Wav file backing a CUCM tone id; unlisted ids resolve to "no tone".
pub fn tone_wav_path(tones_dir: &Path, tone_id: u32) -> Option<PathBuf> {
    let file = match tone_id {
        0 => "key_beep.wav",
        1 => "phone_ring.wav",
        2 => "busy_tone.wav",
        4 => "outside_dial_tone.wav",
        6 => "call_waiting_tone.wav",
        33 => "inside_dial_tone.wav",
        36 => "alerting_tone.wav",
        37 => "reorder_tone.wav",
        _ => return None,
    };
    Some(tones_dir.join(file))
}

/// The address the OS would route toward the server from; no traffic is
/// sent, the socket just gets bound.
pub fn local_ip_toward(server: &str) -> std::io::Result<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect((server, 80))?;
    match socket.local_addr()?.ip() {
        std::net::IpAddr::V4(ip) => Ok(ip),
        std::net::IpAddr::V6(_) => Ok(Ipv4Addr::UNSPECIFIED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_normalization() {
        assert_eq!(normalize_mac("00:11:22:aa:bb:cc").unwrap(), "001122AABBCC");
        assert_eq!(normalize_mac("0011.22aa.bbcc").unwrap(), "001122AABBCC");
        assert_eq!(normalize_mac("001122AABBCC").unwrap(), "001122AABBCC");
        assert!(normalize_mac("00:11:22").is_err());
        assert!(normalize_mac("001122AABBCC99").is_err());
    }

    #[test]
    fn device_name_is_sep_plus_mac() {
        let config = PhoneConfig::new("10.0.0.1", "00-11-22-33-44-55", "7940").unwrap();
        assert_eq!(config.device_name, "SEP001122334455");
        assert_eq!(config.device_type, 8);
        assert_eq!(config.port, 2000);
        assert!(config.auto_connect);
    }

    #[test]
    fn unknown_model_is_rejected() {
        assert!(matches!(
            PhoneConfig::new("10.0.0.1", "001122334455", "9000x"),
            Err(ConfigError::UnknownModel(_))
        ));
    }

    #[test]
    fn play_mode_parsing() {
        assert_eq!(PlayMode::parse("silent"), PlayMode::Silent);
        assert_eq!(PlayMode::parse("Silence"), PlayMode::Silent);
        assert_eq!(PlayMode::parse("microphone"), PlayMode::Microphone);
        assert_eq!(
            PlayMode::parse("prompts/hello.wav"),
            PlayMode::Wav(PathBuf::from("prompts/hello.wav"))
        );
    }

    #[test]
    fn tone_lookup() {
        let dir = PathBuf::from("tones");
        assert_eq!(
            tone_wav_path(&dir, 33).unwrap(),
            PathBuf::from("tones/inside_dial_tone.wav")
        );
        assert_eq!(tone_wav_path(&dir, 3), None);
    }
}
