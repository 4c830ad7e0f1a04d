use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};

use crate::frame::{HDR_SIZE, Mac};
use crate::pkt_buf::PKT_BUF_SIZE;
use crate::test::harness::TestParams;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "plink-bridge",
    about = "parallel-link packet bridge with built-in link self-test"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// Interactive console (single-key commands)
    Run(RunOpts),
    /// Scripted self-test campaign over the loopback link
    Selftest(SelftestOpts),
}

#[derive(Args, Debug, Clone)]
pub struct LinkParams {
    /// Device MAC address
    #[arg(long, default_value = "02:00:00:00:00:01")]
    pub mac: Mac,
    /// Test packet length in bytes, header included
    #[arg(long, default_value_t = 64)]
    pub plen: u16,
    /// Test ethertype, hex (e.g. 0800 or 0x0800)
    #[arg(long, default_value = "0x0800", value_parser = parse_etype)]
    pub ptype: u16,
}

impl LinkParams {
    pub fn to_params(&self) -> Result<TestParams> {
        if (self.plen as usize) < HDR_SIZE {
            bail!("plen {} below the {}-byte header", self.plen, HDR_SIZE);
        }
        if self.plen as usize > PKT_BUF_SIZE {
            bail!(
                "plen {} exceeds the {}-byte packet buffer",
                self.plen,
                PKT_BUF_SIZE
            );
        }
        Ok(TestParams {
            mac_addr: self.mac,
            test_plen: self.plen,
            test_ptype: self.ptype,
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunOpts {
    #[command(flatten)]
    pub link: LinkParams,
}

#[derive(Args, Debug, Clone)]
pub struct SelftestOpts {
    #[command(flatten)]
    pub link: LinkParams,
    /// Number of test exchanges to run
    #[arg(long, default_value_t = 100)]
    pub count: u32,
    /// Continuous auto-repeat run instead of one-shot triggers
    #[arg(long, default_value_t = false)]
    pub auto: bool,
    /// Suppress per-packet result lines
    #[arg(long, default_value_t = false)]
    pub silent: bool,
}

fn parse_etype(s: &str) -> Result<u16, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u16::from_str_radix(digits, 16).map_err(|_| format!("bad ethertype {s:?} (want hex)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etype_accepts_both_hex_spellings() {
        assert_eq!(parse_etype("0x0800"), Ok(0x0800));
        assert_eq!(parse_etype("0806"), Ok(0x0806));
        assert!(parse_etype("frob").is_err());
    }

    #[test]
    fn plen_bounds_are_enforced() {
        let mut link = LinkParams {
            mac: Mac([0x02, 0, 0, 0, 0, 1]),
            plen: 64,
            ptype: 0x0800,
        };
        assert!(link.to_params().is_ok());

        link.plen = 13;
        assert!(link.to_params().is_err());
        link.plen = 14;
        assert!(link.to_params().is_ok());
        link.plen = PKT_BUF_SIZE as u16;
        assert!(link.to_params().is_ok());
        link.plen = PKT_BUF_SIZE as u16 + 1;
        assert!(link.to_params().is_err());
    }

    #[test]
    fn selftest_args_parse() {
        let cli = Cli::try_parse_from([
            "plink-bridge",
            "selftest",
            "--mac",
            "02:11:22:33:44:55",
            "--plen",
            "128",
            "--ptype",
            "0806",
            "--count",
            "10",
            "--auto",
        ])
        .unwrap();
        match cli.cmd {
            Cmd::Selftest(opts) => {
                assert_eq!(opts.link.mac, Mac([0x02, 0x11, 0x22, 0x33, 0x44, 0x55]));
                assert_eq!(opts.link.plen, 128);
                assert_eq!(opts.link.ptype, 0x0806);
                assert_eq!(opts.count, 10);
                assert!(opts.auto);
                assert!(!opts.silent);
            }
            other => panic!("wrong subcommand: {other:?}"),
        }
    }
}
