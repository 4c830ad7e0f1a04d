//! The protocol engine: one non-blocking step per poll.
//!
//! The engine owns the shared packet buffer and drives at most one exchange
//! per `poll()` call through a [`PacketHandler`]. It never blocks and never
//! retries; retry policy belongs to the caller, reported via the
//! [`Outcome`]. Run modes (self-test, bridge) are just different handlers
//! passed in by the dispatch layer.

use crate::link::{LinkEvent, LinkPort};
use crate::pkt_buf::PktBuf;
use crate::proto::command::{Command, FillVerdict, Outcome, ProcVerdict, ProtoError};
use crate::timer::{Tick, TickClock, delta};

/// Transfer behavior capability: the fill/process pair the engine drains
/// and fills the packet buffer through.
///
/// Both callbacks must be total and non-blocking: any internal failure is
/// encoded in the verdict, never panicked out of the poll loop.
pub trait PacketHandler {
    /// Populate an outgoing packet of at most `max_size` bytes.
    fn fill_pkt(&mut self, buf: &mut [u8], max_size: usize, clock: &dyn TickClock) -> FillVerdict;

    /// Validate or consume one received packet.
    fn proc_pkt(&mut self, buf: &[u8]) -> ProcVerdict;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    /// Armed: the peer has been signalled and will issue the next command.
    AwaitingCommand,
    Transferring,
}

pub struct Engine {
    buf: PktBuf,
    state: State,
    request_ts: Tick,
}

impl Engine {
    pub fn new(buf: PktBuf) -> Self {
        Self {
            buf,
            state: State::Idle,
            request_ts: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Arm the engine for the next exchange: record the request tick and
    /// raise the attention line so the peer issues a command. Idempotent
    /// while already armed.
    pub fn request_recv(&mut self, port: &mut dyn LinkPort, clock: &dyn TickClock) {
        if self.state == State::Idle {
            self.state = State::AwaitingCommand;
            self.request_ts = clock.now();
            port.signal_pending();
        }
    }

    /// Run at most one exchange. Returns [`Outcome::Idle`] with no side
    /// effects when the port has nothing pending.
    pub fn poll(
        &mut self,
        handler: &mut dyn PacketHandler,
        port: &mut dyn LinkPort,
        clock: &dyn TickClock,
    ) -> Outcome {
        let Some(event) = port.poll_event() else {
            return Outcome::Idle;
        };
        match event {
            LinkEvent::SendRequest { burst } => {
                let cmd = if burst {
                    Command::SendBurst
                } else {
                    Command::Send
                };
                // a send answers our arm request: time from the request tick
                let start = if self.state == State::AwaitingCommand {
                    self.request_ts
                } else {
                    clock.now()
                };
                self.state = State::Transferring;
                let outcome = self.run_send(cmd, start, handler, port, clock);
                self.state = State::Idle;
                outcome
            }
            LinkEvent::PacketReady { size } => {
                // an arm not yet answered survives an interleaved inbound packet
                let resume = self.state;
                let start = clock.now();
                self.state = State::Transferring;
                let outcome = self.run_recv(size, start, handler, port, clock);
                self.state = resume;
                outcome
            }
        }
    }

    fn run_send(
        &mut self,
        cmd: Command,
        start: Tick,
        handler: &mut dyn PacketHandler,
        port: &mut dyn LinkPort,
        clock: &dyn TickClock,
    ) -> Outcome {
        let max_size = self.buf.capacity();
        match handler.fill_pkt(self.buf.storage_mut(), max_size, clock) {
            FillVerdict::TooLarge { size } => Outcome::TooLarge { cmd, size },
            FillVerdict::Ok { size } if size as usize > max_size => {
                Outcome::TooLarge { cmd, size }
            }
            FillVerdict::Ok { size } => {
                self.buf.set_len(size as usize);
                match port.write_packet(self.buf.filled()) {
                    Ok(()) => Outcome::Done {
                        cmd,
                        size,
                        delta: delta(start, clock.now()),
                    },
                    Err(e) => Outcome::Failed {
                        cmd,
                        size,
                        delta: delta(start, clock.now()),
                        error: e.into(),
                    },
                }
            }
            FillVerdict::Err => Outcome::Failed {
                cmd,
                size: 0,
                delta: delta(start, clock.now()),
                error: ProtoError::Handler,
            },
        }
    }

    fn run_recv(
        &mut self,
        size: u16,
        start: Tick,
        handler: &mut dyn PacketHandler,
        port: &mut dyn LinkPort,
        clock: &dyn TickClock,
    ) -> Outcome {
        let cmd = Command::Recv;
        match port.read_packet(self.buf.storage_mut()) {
            Ok(n) => {
                self.buf.set_len(n as usize);
                match handler.proc_pkt(self.buf.filled()) {
                    ProcVerdict::Ok => Outcome::Done {
                        cmd,
                        size: n,
                        delta: delta(start, clock.now()),
                    },
                    ProcVerdict::Err => Outcome::Failed {
                        cmd,
                        size: n,
                        delta: delta(start, clock.now()),
                        error: ProtoError::Handler,
                    },
                }
            }
            Err(e) => Outcome::Failed {
                cmd,
                size,
                delta: delta(start, clock.now()),
                error: e.into(),
            },
        }
    }
}
