use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("cannot sign token: {0}")]
    Signing(String),

    #[error("gateway unreachable: {0}")]
    Transport(String),

    #[error("{message}")]
    Gateway { status: u16, message: String },

    #[error("provided key ({0}) does not exist in metadata")]
    MissingKey(String),

    #[error("invalid spec: {0}")]
    InvalidSpec(String),

    #[error("invalid config: {0}")]
    Config(String),
}

impl SyncError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Gateway { status, .. } if (400..600).contains(status) => *status,
            Self::Gateway { .. } => 500,
            Self::Signing(_)
            | Self::Transport(_)
            | Self::MissingKey(_)
            | Self::InvalidSpec(_)
            | Self::Config(_) => 500,
        }
    }

    pub fn gateway(status: u16, message: impl Into<String>) -> Self {
        Self::Gateway {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidSpec(format!("undecodable gateway response: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }
}
