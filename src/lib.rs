//! Packet bridge between a host-side parallel link and an Ethernet
//! controller, with a built-in link self-test.
//!
//! The core is a cooperative, single-threaded protocol engine
//! ([`proto::Engine`]) that runs at most one packet exchange per poll,
//! filling and draining a shared [`pkt_buf::PktBuf`] through a
//! [`proto::PacketHandler`]. Two handlers exist: the self-test harness
//! ([`test::harness::TestHarness`]) that generates and verifies synthetic
//! frames, and the bridge handler ([`bridge::BridgeHandler`]) that forwards
//! frames to an Ethernet backend.

pub mod bridge;
pub mod cli;
pub mod cmdkey;
pub mod frame;
pub mod link;
pub mod pkt_buf;
pub mod proto;
pub mod stats;
pub mod test;
pub mod timer;
