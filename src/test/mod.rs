//! Scripted self-test campaigns over the loopback link.


use anyhow::{Result, bail};

use crate::cli::SelftestOpts;
use crate::link::LoopbackLink;
use crate::pkt_buf::PktBuf;
use crate::proto::{Engine, Outcome};
use crate::stats::Stats;
use crate::test::harness::TestHarness;
use crate::timer::HostClock;

pub fn run(opts: SelftestOpts) -> Result<()> {
    let params = opts.link.to_params()?;
    eprintln!(
        "[selftest] mac={} plen={} ptype=0x{:04x} count={}",
        params.mac_addr, params.test_plen, params.test_ptype, opts.count
    );

    let mut engine = Engine::new(PktBuf::new());
    let mut port = LoopbackLink::new();
    let clock = HostClock::new();
    let mut stats = Stats::new();
    let mut harness = TestHarness::new(params);
    harness.begin();

    if opts.auto {
        // continuous throughput run, stops on first failure
        harness.toggle_auto(&mut engine, &mut port, &clock, &mut stats);
        let mut round_trips = 0u32;
        while round_trips < opts.count && harness.auto_mode() {
            match harness.worker(&mut engine, &mut port, &clock, &mut stats) {
                Outcome::Done { cmd, .. } if !cmd.is_tx() => round_trips += 1,
                Outcome::Idle => bail!("loopback link went idle mid-run"),
                _ => {}
            }
        }
        if harness.auto_mode() {
            harness.toggle_auto(&mut engine, &mut port, &clock, &mut stats);
        }
    } else {
        for _ in 0..opts.count {
            harness.send_packet(opts.silent, &mut engine, &mut port, &clock);
            let mut spins = 0;
            while harness.worker(&mut engine, &mut port, &clock, &mut stats) != Outcome::Idle {
                spins += 1;
                if spins > 8 {
                    bail!("loopback link wedged");
                }
            }
        }
    }

    harness.end();
    stats.dump();
    if stats.tx_err + stats.rx_err > 0 {
        bail!(
            "self-test failed: tx_err={} rx_err={}",
            stats.tx_err,
            stats.rx_err
        );
    }
    Ok(())
}
