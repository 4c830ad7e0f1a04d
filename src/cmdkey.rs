//! Single-key console commands and the interactive app loop.
//!
//! One input character maps to one zero-argument action, dispatched against
//! an [`App`] that owns the engine, both packet handlers and the session
//! state. The main loop never blocks: keys arrive over a channel fed by a
//! reader thread, and every iteration runs exactly one cooperative tick.

use std::io::Read;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Result;

use crate::bridge::{BridgeHandler, MockEth};
use crate::cli::RunOpts;
use crate::link::LoopbackLink;
use crate::pkt_buf::PktBuf;
use crate::proto::Engine;
use crate::stats::Stats;
use crate::test::harness::{TestHarness, TestParams};
use crate::timer::HostClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    DumpStats,
    ResetStats,
    EnterTestMode,
    EnterBridgeMode,
    SendTestPacket,
    SendTestPacketSilent,
    ToggleAuto,
    Quit,
}

pub const CMD_KEYS: &[(u8, Action)] = &[
    (b's', Action::DumpStats),
    (b'S', Action::ResetStats),
    (b't', Action::EnterTestMode),
    (b'b', Action::EnterBridgeMode),
    (b'p', Action::SendTestPacket),
    (b'P', Action::SendTestPacketSilent),
    (b'a', Action::ToggleAuto),
    (b'q', Action::Quit),
];

pub fn lookup(key: u8) -> Option<Action> {
    CMD_KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, action)| *action)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Test,
    Bridge,
}

pub struct App {
    mode: RunMode,
    engine: Engine,
    port: LoopbackLink,
    clock: HostClock,
    stats: Stats,
    harness: TestHarness,
    bridge: BridgeHandler<MockEth>,
}

impl App {
    pub fn new(params: TestParams) -> Self {
        let mut app = Self {
            mode: RunMode::Test,
            engine: Engine::new(PktBuf::new()),
            port: LoopbackLink::new(),
            clock: HostClock::new(),
            stats: Stats::new(),
            harness: TestHarness::new(params),
            bridge: BridgeHandler::new(MockEth::new()),
        };
        app.harness.begin();
        app
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Apply one console action. Returns false when the app should exit.
    pub fn dispatch(&mut self, action: Action) -> bool {
        match action {
            Action::DumpStats => self.stats.dump(),
            Action::ResetStats => {
                self.stats.reset();
                eprintln!("[stats] reset");
            }
            Action::EnterTestMode => {
                if self.mode != RunMode::Test {
                    self.mode = RunMode::Test;
                    self.harness.begin();
                }
            }
            Action::EnterBridgeMode => {
                if self.mode != RunMode::Bridge {
                    self.harness.end();
                    self.mode = RunMode::Bridge;
                    eprintln!("[BRIDGE] on");
                }
            }
            Action::SendTestPacket => self.send_test(false),
            Action::SendTestPacketSilent => self.send_test(true),
            Action::ToggleAuto => {
                if self.mode == RunMode::Test {
                    self.harness.toggle_auto(
                        &mut self.engine,
                        &mut self.port,
                        &self.clock,
                        &mut self.stats,
                    );
                } else {
                    eprintln!("[AUTO] only in test mode");
                }
            }
            Action::Quit => return false,
        }
        true
    }

    fn send_test(&mut self, silent: bool) {
        if self.mode == RunMode::Test {
            self.harness
                .send_packet(silent, &mut self.engine, &mut self.port, &self.clock);
        } else {
            eprintln!("[TEST] not in test mode");
        }
    }

    /// One cooperative main-loop iteration.
    pub fn tick(&mut self) {
        match self.mode {
            RunMode::Test => {
                self.harness.worker(
                    &mut self.engine,
                    &mut self.port,
                    &self.clock,
                    &mut self.stats,
                );
            }
            RunMode::Bridge => {
                self.bridge.worker(
                    &mut self.engine,
                    &mut self.port,
                    &self.clock,
                    &mut self.stats,
                );
            }
        }
    }
}

pub fn run(opts: RunOpts) -> Result<()> {
    let params = opts.link.to_params()?;
    eprintln!(
        "[plink] mac={} plen={} ptype=0x{:04x}",
        params.mac_addr, params.test_plen, params.test_ptype
    );
    eprintln!("[plink] keys: s=stats S=reset t=test b=bridge p=send P=send-silent a=auto q=quit");

    let mut app = App::new(params);
    let keys = spawn_key_reader();

    loop {
        match keys.try_recv() {
            Ok(key) => {
                if let Some(action) = lookup(key) {
                    if !app.dispatch(action) {
                        break;
                    }
                } else if !key.is_ascii_whitespace() {
                    eprintln!("[plink] unknown key '{}'", key as char);
                }
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => break, // stdin closed
        }
        app.tick();
        thread::sleep(Duration::from_millis(1));
    }

    app.stats().dump();
    Ok(())
}

fn spawn_key_reader() -> mpsc::Receiver<u8> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut stdin = std::io::stdin();
        let mut byte = [0u8; 1];
        while let Ok(n) = stdin.read(&mut byte) {
            if n == 0 || tx.send(byte[0]).is_err() {
                break;
            }
        }
    });
    rx
}
