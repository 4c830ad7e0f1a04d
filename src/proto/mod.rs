//! The packet bridge protocol engine and its exchange taxonomy.

pub mod command;
pub mod engine;

pub use command::{Command, FillVerdict, Outcome, ProcVerdict, ProtoError};
pub use engine::{Engine, PacketHandler};
