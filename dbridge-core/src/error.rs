use std::time::Duration;

/// Errors that can occur while launching and bridging a debug target
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Timeout ({}ms) waiting for {host}:{port} to be free", timeout.as_millis())]
    StartupTimeout {
        host: String,
        port: u16,
        timeout: Duration,
    },

    #[error("Timeout ({}ms) waiting for the inspector to announce itself", timeout.as_millis())]
    AnnounceTimeout { timeout: Duration },

    #[error("Could not resolve '{0}' to a script or executable")]
    TargetNotFound(String),

    #[error("Failed to spawn target: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Target exited before the inspector announced itself")]
    EarlyExit,

    #[error("Unexpected {status} from inspector endpoint: {body}")]
    Discovery { status: u16, body: String },

    #[error("Inspector endpoint reported no debuggable sessions")]
    NoSessions,

    #[error("Session descriptor contains an invalid URL: {0}")]
    BadDescriptor(#[from] url::ParseError),

    #[error("Inspector endpoint request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LaunchError {
    /// Expected operational failures get a plain message; anything else is
    /// reported as an internal error by the CLI.
    pub fn is_operational(&self) -> bool {
        !matches!(self, LaunchError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, LaunchError>;
