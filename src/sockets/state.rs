use std::fmt;
use serde::{Serialize, Deserialize};

/// Connection state as reported by the kernel socket tables. The
/// discriminants match the kernel's TCP state numbers, with `Unconn`
/// standing in for TCP_CLOSE, and are used to index the tables below.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum State {
    #[serde(rename = "UNKNOWN")]    Unknown   = 0,
    #[serde(rename = "ESTAB")]      Estab     = 1,
    #[serde(rename = "SYN-SENT")]   SynSent   = 2,
    #[serde(rename = "SYN-RECV")]   SynRecv   = 3,
    #[serde(rename = "FIN-WAIT-1")] FinWait1  = 4,
    #[serde(rename = "FIN-WAIT-2")] FinWait2  = 5,
    #[serde(rename = "TIME-WAIT")]  TimeWait  = 6,
    #[serde(rename = "UNCONN")]     Unconn    = 7,
    #[serde(rename = "CLOSE-WAIT")] CloseWait = 8,
    #[serde(rename = "LAST-ACK")]   LastAck   = 9,
    #[serde(rename = "LISTEN")]     Listen    = 10,
    #[serde(rename = "CLOSING")]    Closing   = 11,
    #[serde(rename = "MAX")]        Max       = 12,
}

pub const STATES: [State; 13] = [
    State::Unknown,
    State::Estab,
    State::SynSent,
    State::SynRecv,
    State::FinWait1,
    State::FinWait2,
    State::TimeWait,
    State::Unconn,
    State::CloseWait,
    State::LastAck,
    State::Listen,
    State::Closing,
    State::Max,
];

const NAMES: [&str; 13] = [
    "UNKNOWN",
    "ESTAB",
    "SYN-SENT",
    "SYN-RECV",
    "FIN-WAIT-1",
    "FIN-WAIT-2",
    "TIME-WAIT",
    "UNCONN",
    "CLOSE-WAIT",
    "LAST-ACK",
    "LISTEN",
    "CLOSING",
    "MAX",
];

const ACTIVE:      [bool; 13] = [false, true,  false, false, false, false, false, false, false, false, true,  false, false];
const LISTEN_LIKE: [bool; 13] = [false, false, false, false, false, false, false, true,  false, false, true,  false, false];

impl State {
    pub fn name(self) -> &'static str {
        NAMES[self as usize]
    }

    /// ESTAB and LISTEN, the states shown without `--all`.
    pub fn is_active(self) -> bool {
        ACTIVE[self as usize]
    }

    /// States that count as a bound endpoint: LISTEN and UNCONN.
    pub fn is_listen_like(self) -> bool {
        LISTEN_LIKE[self as usize]
    }
}

impl From<u8> for State {
    fn from(n: u8) -> Self {
        match STATES.get(n as usize) {
            Some(&state) => state,
            None         => State::Unknown,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
