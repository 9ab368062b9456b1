use std::collections::{BTreeMap, HashMap};
use libc::pid_t;
use crate::sockets::Holder;
use super::Tracked;

/// Socket inodes held open by each process, keyed by process name, PID,
/// and inode, with the fd label as the value. Ordered, so the first
/// holder of an inode is the lexically first name and then lowest PID.
#[derive(Debug, Default)]
pub struct FdCache {
    procs: BTreeMap<String, BTreeMap<pid_t, Tracked<u64, String>>>,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Owner {
    pub name: String,
    pub pid:  pid_t,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Holding {
    pub owner: Owner,
    pub fd:    String,
}

impl FdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &str, pid: pid_t, inode: u64, fd: &str) {
        let pids = self.procs.entry(name.to_owned()).or_default();
        pids.entry(pid).or_default().mark(inode, fd.to_owned());
    }

    /// Evict every fd not recorded since the last sweep, along with any
    /// PID or name left without fds. Returns the number of fds evicted.
    pub fn sweep(&mut self) -> usize {
        let mut count = 0;
        self.procs.retain(|_, pids| {
            pids.retain(|_, fds| {
                count += fds.sweep();
                !fds.is_empty()
            });
            !pids.is_empty()
        });
        count
    }

    /// Forget the marks of an abandoned cycle.
    pub fn unmark(&mut self) {
        for fds in self.procs.values_mut().flat_map(BTreeMap::values_mut) {
            fds.unmark();
        }
    }

    pub fn owner(&self, inode: u64) -> Option<Owner> {
        self.procs.iter().find_map(|(name, pids)| {
            let (&pid, _) = pids.iter().find(|(_, fds)| fds.contains_key(&inode))?;
            Some(Owner { name: name.clone(), pid })
        })
    }

    pub fn holders(&self, inode: u64) -> Vec<Holder> {
        self.procs.values().flatten().filter_map(|(&pid, fds)| {
            let fd = fds.get(&inode)?.clone();
            Some(Holder { pid, fd })
        }).collect()
    }

    /// Every holding of each inode, in cache order.
    pub fn index(&self) -> HashMap<u64, Vec<Holding>> {
        let mut index = HashMap::<u64, Vec<Holding>>::new();
        for (inode, holding) in self.holdings() {
            index.entry(inode).or_default().push(holding);
        }
        index
    }

    pub fn contains(&self, name: &str, pid: pid_t, inode: u64) -> bool {
        self.procs.get(name).and_then(|pids| {
            pids.get(&pid)
        }).map(|fds| fds.contains_key(&inode)).unwrap_or(false)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.procs.keys().map(String::as_str)
    }

    pub fn pids(&self, name: &str) -> Vec<pid_t> {
        match self.procs.get(name) {
            Some(pids) => pids.keys().copied().collect(),
            None       => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.procs.values().flat_map(BTreeMap::values).map(Tracked::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    fn holdings(&self) -> impl Iterator<Item = (u64, Holding)> + '_ {
        self.procs.iter().flat_map(|(name, pids)| {
            pids.iter().flat_map(move |(&pid, fds)| {
                fds.iter().map(move |(&inode, fd)| {
                    let owner = Owner { name: name.clone(), pid };
                    (inode, Holding { owner, fd: fd.clone() })
                })
            })
        })
    }
}
