//! Error types for moodwave.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown mood: {0}")]
    UnknownMood(String),
    #[error("invalid root note: {0}")]
    InvalidRoot(String),
    #[error("unknown effect type: {0}")]
    UnknownEffect(String),
    #[error("effects manager has been disposed")]
    DisposedManager,
    #[error("effects manager has not been initialized")]
    NotInitialized,
    #[error("no usable instrument for render")]
    NoInstrument,
    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),
    #[error("invalid effect parameter: {0} (expected EFFECT.NAME=VALUE)")]
    InvalidParam(String),
    #[error("unknown duration token: {0}")]
    UnknownDuration(String),
    #[error("render duration must be a positive number of seconds, got {0}")]
    InvalidDuration(f64),
    #[error("render cancelled")]
    Cancelled,
    #[error("capture error: {0}")]
    Capture(String),
    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(Error::UnknownMood("angry".into()).to_string(), "unknown mood: angry");
        assert_eq!(
            Error::UnknownEffect("phaser".into()).to_string(),
            "unknown effect type: phaser"
        );
        assert_eq!(
            Error::DisposedManager.to_string(),
            "effects manager has been disposed"
        );
        assert_eq!(Error::NoInstrument.to_string(), "no usable instrument for render");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
