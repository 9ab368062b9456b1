use std::collections::BTreeMap;
use std::mem;
use std::path::PathBuf;
use anyhow::Result;
use libc::pid_t;
use log::{debug, trace};
use serde::Serialize;
use crate::cache::Tracked;
use crate::config::Config;
use crate::os;
use crate::process::{Names, Scanner};

pub use sys::SysInfo;

mod sys;

/// Per-process CPU and memory figures, recomputed on every refresh.
pub struct Tracker {
    scanner: Scanner,
    root:    PathBuf,
    names:   Names,
    clk_tck: u64,
    page:    u64,
    cores:   usize,
    new:     SysInfo,
    old:     SysInfo,
    reserve: Tracked<Key, Reserve>,
    topo:    Topology,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Topology {
    pub services: BTreeMap<String, BTreeMap<pid_t, ProcStat>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcStat {
    pub load_avg:     f64,
    pub load_instant: Option<f64>,
    pub vm_size:      u64,
    pub vm_rss:       u64,
    pub state:        String,
    pub start_time:   u64,
}

// a restarted process reusing a PID has a new start time
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
struct Key {
    name:  String,
    pid:   pid_t,
    start: u64,
}

#[derive(Copy, Clone, Debug)]
struct Reserve {
    utime: u64,
    stime: u64,
}

impl Tracker {
    pub fn new(config: &Config) -> Self {
        Self {
            scanner: Scanner::new(config.proc_root.clone(), config.workers),
            root:    config.proc_root.clone(),
            names:   config.names.clone(),
            clk_tck: os::clock_ticks(),
            page:    os::page_size(),
            cores:   os::cores(),
            new:     SysInfo::default(),
            old:     SysInfo::default(),
            reserve: Tracked::new(),
            topo:    Topology::default(),
        }
    }

    /// Rescan every process and recompute its load. The instantaneous
    /// load needs a previous sample of the same process and is `None`
    /// until one exists. A failed refresh leaves the last topology in
    /// place.
    pub fn refresh(&mut self) -> Result<&Topology> {
        let sys   = SysInfo::read(&self.root)?;
        let procs = self.scanner.scan(false, &self.names)?;

        self.old = mem::replace(&mut self.new, sys);

        let elapsed = self.new.cpu_total.saturating_sub(self.old.cpu_total);
        let cores   = match self.new.cores {
            0 => self.cores,
            n => n,
        };
        let mut topo = Topology::default();

        for (name, pids) in procs {
            let services = topo.services.entry(name.clone()).or_default();

            for (pid, proc) in pids {
                let stat = &proc.stat;
                let used = stat.utime + stat.stime;
                let key  = Key {
                    name:  name.clone(),
                    pid:   pid,
                    start: stat.starttime,
                };

                let instant = self.reserve.get(&key).map(|prev| {
                    let delta = used.saturating_sub(prev.utime + prev.stime);
                    match elapsed {
                        0 => 0.0,
                        n => truncate(delta as f64 / (n as f64 / cores as f64)),
                    }
                });

                self.reserve.mark(key, Reserve {
                    utime: stat.utime,
                    stime: stat.stime,
                });

                services.insert(pid, ProcStat {
                    load_avg:     load(used, self.new.cpu_total),
                    load_instant: instant,
                    vm_size:      stat.vsize,
                    vm_rss:       stat.rss.max(0) as u64 * self.page,
                    state:        stat.state_name().to_owned(),
                    start_time:   self.new.btime + stat.starttime / self.clk_tck.max(1),
                });
            }
        }

        let evicted = self.reserve.sweep();
        trace!("evicted {} stale reserve entries", evicted);
        debug!("refreshed {} services", topo.services.len());

        self.topo = topo;

        Ok(&self.topo)
    }

    pub fn topology(&self) -> &Topology {
        &self.topo
    }
}

fn load(used: u64, total: u64) -> f64 {
    match total {
        0 => 0.0,
        n => truncate(used as f64 / n as f64),
    }
}

fn truncate(n: f64) -> f64 {
    (n * 1e5).trunc() / 1e5
}
