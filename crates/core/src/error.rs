/// Result alias that carries the custom [`OrbError`] type.
pub type Result<T> = std::result::Result<T, OrbError>;

/// Common error type for the core crate.
///
/// The animation and rendering paths never fail; these variants cover the
/// edges where the orb meets files, scripts and sample streams.
#[derive(Debug, thiserror::Error)]
pub enum OrbError {
    /// Free-form message for failures without a more specific variant.
    #[error("{0}")]
    Message(String),
    /// Input that cannot be processed, e.g. an empty audio block.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A canonical mode/feeling/palette name that is not recognised.
    #[error("unknown {kind} `{name}`")]
    UnknownName { kind: &'static str, name: String },
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Config or script JSON that failed to decode.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    /// Frame encoding failure.
    #[error("png: {0}")]
    Png(#[from] png::EncodingError),
    /// Spectrum analysis failure in the audio meter.
    #[error("fft: {0}")]
    Fft(#[from] realfft::FftError),
    /// A frame was written while no recording session was active.
    #[error("recorder is not started")]
    NotRecording,
}

impl OrbError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn unknown(kind: &'static str, name: &str) -> Self {
        Self::UnknownName {
            kind,
            name: name.to_string(),
        }
    }
}

impl From<&str> for OrbError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for OrbError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
