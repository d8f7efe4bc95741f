#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no default input device available")]
    NoInputDevice,
    #[error("no default output device available")]
    NoOutputDevice,
    #[error(transparent)]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),
    #[error(transparent)]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error(transparent)]
    PlayStream(#[from] cpal::PlayStreamError),
    #[error("output stream unavailable: {0}")]
    OutputStream(String),
    #[error(transparent)]
    Wav(#[from] hound::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
