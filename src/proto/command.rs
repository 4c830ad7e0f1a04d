use thiserror::Error;

use crate::link::LinkError;
use crate::timer::Tick;

/// Link-level command that started an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Send,
    SendBurst,
    Recv,
}

impl Command {
    pub fn is_tx(self) -> bool {
        matches!(self, Command::Send | Command::SendBurst)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtoError {
    #[error("handler rejected packet")]
    Handler,
    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Result of one engine poll. At most one exchange per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No transport event this cycle. Try again later; not an error.
    Idle,
    Done {
        cmd: Command,
        size: u16,
        delta: Tick,
    },
    Failed {
        cmd: Command,
        size: u16,
        delta: Tick,
        error: ProtoError,
    },
    /// Requested payload exceeds the packet buffer. Rejected before any
    /// transport I/O.
    TooLarge { cmd: Command, size: u16 },
}

/// What a handler's fill callback reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillVerdict {
    Ok { size: u16 },
    TooLarge { size: u16 },
    Err,
}

/// What a handler's process callback reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcVerdict {
    Ok,
    Err,
}
