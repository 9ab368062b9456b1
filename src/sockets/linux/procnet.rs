use std::convert::TryFrom;
use std::fs::File;
use std::io::{prelude::*, BufReader};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;
use anyhow::{anyhow, Result};
use log::trace;
use crate::sockets::{Addr, Record, Source, State, Table, Timer, TimerKind};

/// Socket tables read from `<root>/net/{tcp,tcp6,udp,udp6}`.
pub struct ProcNet {
    root: PathBuf,
}

impl ProcNet {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

impl Source for ProcNet {
    fn records(&self, table: Table) -> Result<Vec<Record>> {
        let name = match table {
            Table::TCP4 => "tcp",
            Table::TCP6 => "tcp6",
            Table::UDP4 => "udp",
            _           => "udp6",
        };

        let path = self.root.join("net").join(name);
        let file = File::open(&path).map_err(|e| {
            anyhow!("failed to open {}: {}", path.display(), e)
        })?;

        let mut records = Vec::new();
        for line in BufReader::new(file).lines().skip(1) {
            let line = line?;
            match parse(table, &line) {
                Ok(record) => records.push(record),
                Err(e)     => trace!("skipping {} entry '{}': {}", name, line.trim(), e),
            }
        }

        Ok(records)
    }
}

pub fn parse(table: Table, line: &str) -> Result<Record> {
    let mut split = line.split_whitespace();
    let mut next  = || split.next().ok_or_else(|| anyhow!("truncated entry"));

    let _slot          = next()?;
    let local          = addr(next()?)?;
    let remote         = addr(next()?)?;
    let state          = u8::from_str_radix(next()?, 16)?;
    let (tx, rx)       = pair(next()?)?;
    let (kind, expiry) = pair(next()?)?;
    let retrans        = u32::from_str_radix(next()?, 16)?;
    let uid            = next()?.parse::<u32>()?;
    let probes         = next()?.parse::<u32>()?;
    let inode          = next()?.parse::<u64>()?;
    let _refs          = next()?;
    let sk             = u64::from_str_radix(next()?, 16)?;

    let timer = match TimerKind::from(u8::try_from(kind)?) {
        TimerKind::Off => None,
        kind           => Some(Timer {
            kind:    kind,
            expires: expiry,
            retrans: retrans,
            probes:  probes,
        }),
    };

    Ok(Record {
        table:    table,
        state:    State::from(state),
        local:    local,
        remote:   remote,
        rx_queue: u32::try_from(rx)?,
        tx_queue: u32::try_from(tx)?,
        inode:    inode,
        uid:      uid,
        timer:    timer,
        sk:       sk,
        owner:    None,
        holders:  Vec::new(),
    })
}

fn addr(field: &str) -> Result<Addr> {
    let (host, port) = field.split_once(':').ok_or_else(|| {
        anyhow!("invalid address '{}'", field)
    })?;

    if !host.is_ascii() {
        return Err(anyhow!("invalid address '{}'", field));
    }

    let addr = match host.len() {
        8  => IpAddr::V4(Ipv4Addr::from(word(host)?)),
        32 => {
            let mut octets = [0u8; 16];
            for (n, chunk) in octets.chunks_mut(4).enumerate() {
                chunk.copy_from_slice(&word(&host[n * 8..n * 8 + 8])?);
            }
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        _  => return Err(anyhow!("invalid address '{}'", field)),
    };

    Ok(Addr {
        addr: addr,
        port: u16::from_str_radix(port, 16)?,
    })
}

// the kernel prints each 32-bit word of the address in host byte order
fn word(hex: &str) -> Result<[u8; 4]> {
    Ok(u32::from_str_radix(hex, 16)?.to_ne_bytes())
}

fn pair(field: &str) -> Result<(u64, u64)> {
    let (a, b) = field.split_once(':').ok_or_else(|| {
        anyhow!("invalid pair '{}'", field)
    })?;
    Ok((u64::from_str_radix(a, 16)?, u64::from_str_radix(b, 16)?))
}
