use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdolError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid onboarding answers: {0}")]
    InvalidAnswers(String),

    #[error("Onboarding has not been completed yet")]
    NotOnboarded,

    #[error("Message {0} is not streaming")]
    MessageNotStreaming(String),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, IdolError>;
