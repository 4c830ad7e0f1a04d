use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const TGT_MAC_OFF: usize = 0;
pub const SRC_MAC_OFF: usize = 6;
pub const ETYPE_OFF: usize = 12;

/// Ethernet header: target MAC, source MAC, ethertype.
pub const HDR_SIZE: usize = 14;

pub const ETYPE_IPV4: u16 = 0x0800;
pub const ETYPE_ARP: u16 = 0x0806;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame too short: {len} bytes, header needs {HDR_SIZE}")]
    TooShort { len: usize },
}

/// A 48-bit MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mac(pub [u8; 6]);

impl Mac {
    pub const BROADCAST: Mac = Mac([0xff; 6]);

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Mac::BROADCAST
    }
}

impl fmt::Display for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("bad mac address: {0:?} (want aa:bb:cc:dd:ee:ff)")]
pub struct MacParseError(String);

impl FromStr for Mac {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mac = [0u8; 6];
        let mut parts = s.split(':');
        for slot in mac.iter_mut() {
            let part = parts.next().ok_or_else(|| MacParseError(s.into()))?;
            *slot = u8::from_str_radix(part, 16).map_err(|_| MacParseError(s.into()))?;
        }
        if parts.next().is_some() {
            return Err(MacParseError(s.into()));
        }
        Ok(Mac(mac))
    }
}

fn check_hdr(pkt: &[u8]) -> Result<(), FrameError> {
    if pkt.len() < HDR_SIZE {
        Err(FrameError::TooShort { len: pkt.len() })
    } else {
        Ok(())
    }
}

fn mac_at(pkt: &[u8], off: usize) -> Result<Mac, FrameError> {
    check_hdr(pkt)?;
    let mut mac = [0u8; 6];
    mac.copy_from_slice(&pkt[off..off + 6]);
    Ok(Mac(mac))
}

pub fn tgt_mac(pkt: &[u8]) -> Result<Mac, FrameError> {
    mac_at(pkt, TGT_MAC_OFF)
}

pub fn src_mac(pkt: &[u8]) -> Result<Mac, FrameError> {
    mac_at(pkt, SRC_MAC_OFF)
}

pub fn set_tgt_mac(pkt: &mut [u8], mac: &Mac) -> Result<(), FrameError> {
    check_hdr(pkt)?;
    pkt[TGT_MAC_OFF..TGT_MAC_OFF + 6].copy_from_slice(mac.as_bytes());
    Ok(())
}

pub fn set_src_mac(pkt: &mut [u8], mac: &Mac) -> Result<(), FrameError> {
    check_hdr(pkt)?;
    pkt[SRC_MAC_OFF..SRC_MAC_OFF + 6].copy_from_slice(mac.as_bytes());
    Ok(())
}

/// Ethertype field, big-endian on the wire.
pub fn ethertype(pkt: &[u8]) -> Result<u16, FrameError> {
    check_hdr(pkt)?;
    Ok(u16::from_be_bytes([pkt[ETYPE_OFF], pkt[ETYPE_OFF + 1]]))
}

pub fn set_ethertype(pkt: &mut [u8], etype: u16) -> Result<(), FrameError> {
    check_hdr(pkt)?;
    pkt[ETYPE_OFF..ETYPE_OFF + 2].copy_from_slice(&etype.to_be_bytes());
    Ok(())
}

pub fn is_arp(pkt: &[u8]) -> Result<bool, FrameError> {
    Ok(ethertype(pkt)? == ETYPE_ARP)
}

pub fn is_ipv4(pkt: &[u8]) -> Result<bool, FrameError> {
    Ok(ethertype(pkt)? == ETYPE_IPV4)
}

pub fn is_broadcast_tgt(pkt: &[u8]) -> Result<bool, FrameError> {
    Ok(tgt_mac(pkt)?.is_broadcast())
}
