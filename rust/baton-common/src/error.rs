use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_topology(length: usize) -> Error {
        Error(ErrorKind::InvalidTopology { length }.into())
    }

    pub fn chain_build(stage: usize, source: std::io::Error) -> Error {
        Error(ErrorKind::ChainBuild { stage, source }.into())
    }

    pub fn peer_launch(peer: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::PeerLaunch {
                peer: peer.into(),
                source,
            }
            .into(),
        )
    }

    pub fn closed_point(context: impl Into<String>) -> Error {
        Error(
            ErrorKind::ClosedPoint {
                context: context.into(),
            }
            .into(),
        )
    }

    pub fn timeout_exceeded(waited: Duration) -> Error {
        Error(ErrorKind::TimeoutExceeded { waited }.into())
    }

    pub fn worker_failed(worker: impl Into<String>) -> Error {
        Error(
            ErrorKind::WorkerFailed {
                worker: worker.into(),
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid topology: a relay chain needs at least one stage, got {length}")]
    InvalidTopology { length: usize },

    #[error("failed to launch relay stage {stage}: {source}")]
    ChainBuild {
        stage: usize,
        source: std::io::Error,
    },

    #[error("failed to launch peer '{peer}': {source}")]
    PeerLaunch {
        peer: String,
        source: std::io::Error,
    },

    #[error("hand-off point closed: {context}")]
    ClosedPoint { context: String },

    #[error("workers did not shut down within {waited:?}")]
    TimeoutExceeded { waited: Duration },

    #[error("worker '{worker}' terminated without a result")]
    WorkerFailed { worker: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
