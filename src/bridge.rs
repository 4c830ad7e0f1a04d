//! Bridge mode: shuttle frames between the host link and the Ethernet
//! controller.
//!
//! The controller driver itself (register sequencing, link negotiation)
//! sits behind [`EthBackend`]; the bridge only needs raw frame transfer
//! plus a link-up signal. [`MockEth`] is the in-memory stand-in used by
//! the console binary and the tests.

use std::collections::VecDeque;

use crate::link::LinkPort;
use crate::proto::command::{FillVerdict, Outcome, ProcVerdict};
use crate::proto::engine::{Engine, PacketHandler};
use crate::stats::Stats;
use crate::timer::{TickClock, rate_kbps};

/// Ethernet controller boundary: raw frames in and out.
pub trait EthBackend {
    fn link_up(&mut self) -> bool;

    /// Send one frame out the wire.
    fn transmit(&mut self, pkt: &[u8]);

    /// Non-blocking: the next frame received from the wire, if any.
    fn poll_receive(&mut self) -> Option<Vec<u8>>;
}

/// The bridge-side packet handler: fills from the controller's receive
/// path, forwards processed packets to its transmit path.
pub struct BridgeHandler<B: EthBackend> {
    backend: B,
    /// Frame fetched from the controller, parked until the peer pulls it.
    pending: Option<Vec<u8>>,
}

impl<B: EthBackend> BridgeHandler<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            pending: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// One cooperative iteration: offer at most one controller frame to the
    /// host, then run the engine.
    pub fn worker(
        &mut self,
        engine: &mut Engine,
        port: &mut dyn LinkPort,
        clock: &dyn TickClock,
        stats: &mut Stats,
    ) -> Outcome {
        if self.pending.is_none() && self.backend.link_up() {
            if let Some(pkt) = self.backend.poll_receive() {
                self.pending = Some(pkt);
                engine.request_recv(port, clock);
            }
        }

        let outcome = engine.poll(self, port, clock);
        match outcome {
            Outcome::Idle => {}
            Outcome::Done { cmd, size, delta } => {
                stats.count_ok(cmd.is_tx(), size, rate_kbps(size, delta));
            }
            Outcome::Failed {
                cmd,
                size,
                delta,
                error,
            } => {
                eprintln!(
                    "[bridge] {:?} failed: {} (size={} delta={})",
                    cmd, error, size, delta
                );
                stats.count_err(cmd.is_tx());
            }
            Outcome::TooLarge { cmd, size } => {
                eprintln!("[bridge] {:?} rejected: frame of {} bytes", cmd, size);
                stats.count_err(cmd.is_tx());
            }
        }
        outcome
    }
}

impl<B: EthBackend> PacketHandler for BridgeHandler<B> {
    fn fill_pkt(&mut self, buf: &mut [u8], max_size: usize, _clock: &dyn TickClock) -> FillVerdict {
        let Some(pkt) = self.pending.take() else {
            return FillVerdict::Err;
        };
        if pkt.len() > max_size {
            // the oversized frame is dropped, not retried
            return FillVerdict::TooLarge {
                size: pkt.len() as u16,
            };
        }
        buf[..pkt.len()].copy_from_slice(&pkt);
        FillVerdict::Ok {
            size: pkt.len() as u16,
        }
    }

    fn proc_pkt(&mut self, buf: &[u8]) -> ProcVerdict {
        self.backend.transmit(buf);
        ProcVerdict::Ok
    }
}

/// In-memory controller stand-in.
pub struct MockEth {
    up: bool,
    from_wire: VecDeque<Vec<u8>>,
    to_wire: VecDeque<Vec<u8>>,
}

impl MockEth {
    pub fn new() -> Self {
        Self {
            up: true,
            from_wire: VecDeque::new(),
            to_wire: VecDeque::new(),
        }
    }

    pub fn set_link(&mut self, up: bool) {
        self.up = up;
    }

    /// Pretend a frame arrived from the wire.
    pub fn inject(&mut self, pkt: Vec<u8>) {
        self.from_wire.push_back(pkt);
    }

    /// The next frame the bridge transmitted, oldest first.
    pub fn pop_sent(&mut self) -> Option<Vec<u8>> {
        self.to_wire.pop_front()
    }
}

impl Default for MockEth {
    fn default() -> Self {
        Self::new()
    }
}

impl EthBackend for MockEth {
    fn link_up(&mut self) -> bool {
        self.up
    }

    fn transmit(&mut self, pkt: &[u8]) {
        self.to_wire.push_back(pkt.to_vec());
    }

    fn poll_receive(&mut self) -> Option<Vec<u8>> {
        self.from_wire.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LoopbackLink;
    use crate::pkt_buf::PktBuf;
    use crate::proto::command::Command;
    use crate::timer::TestClock;

    fn rig() -> (BridgeHandler<MockEth>, Engine, LoopbackLink, TestClock, Stats) {
        (
            BridgeHandler::new(MockEth::new()),
            Engine::new(PktBuf::new()),
            LoopbackLink::new(),
            TestClock::new(0),
            Stats::new(),
        )
    }

    #[test]
    fn idle_bridge_does_nothing() {
        let (mut bridge, mut engine, mut port, clock, mut stats) = rig();
        for _ in 0..4 {
            assert_eq!(
                bridge.worker(&mut engine, &mut port, &clock, &mut stats),
                Outcome::Idle
            );
        }
        assert_eq!(stats, Stats::default());
    }

    #[test]
    fn controller_frame_reaches_the_host_and_back() {
        let (mut bridge, mut engine, mut port, clock, mut stats) = rig();
        let frame = vec![0x11u8; 60];
        bridge.backend_mut().inject(frame.clone());

        // offer + pull: the frame goes out over the link
        let outcome = bridge.worker(&mut engine, &mut port, &clock, &mut stats);
        assert!(matches!(
            outcome,
            Outcome::Done {
                cmd: Command::Send,
                size: 60,
                ..
            }
        ));

        // the loopback peer hands it straight back; the bridge transmits it
        let outcome = bridge.worker(&mut engine, &mut port, &clock, &mut stats);
        assert!(matches!(
            outcome,
            Outcome::Done {
                cmd: Command::Recv,
                size: 60,
                ..
            }
        ));
        assert_eq!(bridge.backend_mut().pop_sent(), Some(frame));

        assert_eq!(stats.tx_cnt, 1);
        assert_eq!(stats.rx_cnt, 1);
    }

    #[test]
    fn link_down_leaves_controller_frames_queued() {
        let (mut bridge, mut engine, mut port, clock, mut stats) = rig();
        bridge.backend_mut().set_link(false);
        bridge.backend_mut().inject(vec![0x22; 60]);

        assert_eq!(
            bridge.worker(&mut engine, &mut port, &clock, &mut stats),
            Outcome::Idle
        );
        assert_eq!(stats, Stats::default());
    }

    #[test]
    fn oversized_controller_frame_is_rejected_and_dropped() {
        let mut bridge = BridgeHandler::new(MockEth::new());
        let mut engine = Engine::new(PktBuf::with_capacity(64));
        let mut port = LoopbackLink::new();
        let clock = TestClock::new(0);
        let mut stats = Stats::new();

        bridge.backend_mut().inject(vec![0x33; 100]);
        let outcome = bridge.worker(&mut engine, &mut port, &clock, &mut stats);
        assert_eq!(
            outcome,
            Outcome::TooLarge {
                cmd: Command::Send,
                size: 100,
            }
        );
        assert_eq!(stats.tx_err, 1);
        // dropped: the next iteration has nothing to offer
        assert_eq!(
            bridge.worker(&mut engine, &mut port, &clock, &mut stats),
            Outcome::Idle
        );
    }
}
