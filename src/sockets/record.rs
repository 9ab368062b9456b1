use std::fmt;
use std::net::{IpAddr, SocketAddr};
use libc::pid_t;
use serde::{Serialize, Deserialize};
use super::State;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Protocol {
    TCP,
    UDP,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Family {
    V4,
    V6,
}

/// One kernel socket table: a protocol and address family pair.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Table(pub Protocol, pub Family);

impl Table {
    pub const TCP4: Table = Table(Protocol::TCP, Family::V4);
    pub const TCP6: Table = Table(Protocol::TCP, Family::V6);
    pub const UDP4: Table = Table(Protocol::UDP, Family::V4);
    pub const UDP6: Table = Table(Protocol::UDP, Family::V6);

    pub const ALL: [Table; 4] = [Table::TCP4, Table::TCP6, Table::UDP4, Table::UDP6];

    pub fn protocol(&self) -> Protocol {
        self.0
    }

    pub fn family(&self) -> Family {
        self.1
    }

    pub fn netid(&self) -> &'static str {
        match self.0 {
            Protocol::TCP => "tcp",
            Protocol::UDP => "udp",
        }
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct Addr {
    pub addr: IpAddr,
    pub port: u16,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TimerKind {
    Off,
    On,
    Keepalive,
    TimeWait,
    Persist,
    Unknown,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    pub kind:    TimerKind,
    pub expires: u64,
    pub retrans: u32,
    pub probes:  u32,
}

/// A process holding a descriptor that references a socket's inode.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Holder {
    pub pid: pid_t,
    pub fd:  String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Record {
    pub table:    Table,
    pub state:    State,
    pub local:    Addr,
    pub remote:   Addr,
    pub rx_queue: u32,
    pub tx_queue: u32,
    pub inode:    u64,
    pub uid:      u32,
    pub timer:    Option<Timer>,
    pub sk:       u64,
    pub owner:    Option<String>,
    pub holders:  Vec<Holder>,
}

impl Record {
    /// Name shown for this socket: the owning process, or the local
    /// address when no process holds the inode.
    pub fn user(&self) -> String {
        match &self.owner {
            Some(name) => name.clone(),
            None       => self.local.to_string(),
        }
    }
}

impl TimerKind {
    pub fn name(self) -> &'static str {
        match self {
            TimerKind::Off       => "off",
            TimerKind::On        => "on",
            TimerKind::Keepalive => "keepalive",
            TimerKind::TimeWait  => "timewait",
            TimerKind::Persist   => "persist",
            TimerKind::Unknown   => "unknown",
        }
    }
}

impl From<u8> for TimerKind {
    fn from(n: u8) -> Self {
        match n {
            0 => TimerKind::Off,
            1 => TimerKind::On,
            2 => TimerKind::Keepalive,
            3 => TimerKind::TimeWait,
            4 => TimerKind::Persist,
            _ => TimerKind::Unknown,
        }
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        SocketAddr::new(self.addr, self.port).fmt(f)
    }
}

impl From<SocketAddr> for Addr {
    fn from(sa: SocketAddr) -> Self {
        Self {
            addr: sa.ip(),
            port: sa.port(),
        }
    }
}
