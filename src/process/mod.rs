use std::collections::{BTreeMap, BTreeSet};
use std::iter::FromIterator;
use libc::pid_t;
use serde::{Serialize, Deserialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Process {
    pub pid:     pid_t,
    pub name:    String,
    pub cmdline: Vec<String>,
    pub stat:    Stat,
    pub fds:     Vec<Fd>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Fd {
    pub name:  String,
    pub inode: u64,
}

/// Scan result keyed by resolved process name, then PID.
pub type Processes = BTreeMap<String, BTreeMap<pid_t, Process>>;

/// Process names a scan is restricted to. Empty matches everything.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Names(BTreeSet<String>);

impl Names {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// The name a process is reported under, or `None` if the filter
    /// excludes it. A process whose stat name is not listed may still
    /// match by argv[0], as when started through a wrapper script.
    pub fn resolve(&self, comm: &str, cmdline: &[String]) -> Option<String> {
        if self.is_empty() || self.contains(comm) {
            return Some(comm.to_owned());
        }

        let argv0 = cmdline.first()?;
        let name  = argv0.strip_prefix("./").unwrap_or(argv0);

        match self.contains(name) {
            true  => Some(name.to_owned()),
            false => None,
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Names {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Names(iter.into_iter().map(Into::into).collect())
    }
}

pub use lookup::{fds, lookup};
pub use scan::Scanner;
pub use stat::{Stat, state_name};

mod lookup;
mod scan;
mod stat;
mod walk;

#[cfg(test)]
pub(crate) mod test;
