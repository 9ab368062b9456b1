use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use anyhow::{anyhow, Result};
use crossbeam_channel::{Receiver, Sender, unbounded};
use libc::pid_t;
use log::{debug, error, trace};
use parking_lot::{Mutex, MutexGuard};
use crate::cache::FdCache;
use super::{Names, Process, Processes};
use super::lookup::{fds, lookup, or_default};
use super::walk::{walk, Dirent};

/// Concurrent walker of a proc tree. Holds the fd cache that scans with
/// descriptors refresh.
pub struct Scanner {
    root:    Arc<PathBuf>,
    workers: usize,
    cache:   Arc<Mutex<FdCache>>,
}

pub(super) enum Output {
    Proc(Process),
    Fail(io::Error),
    End,
}

struct Task {
    root:  Arc<PathBuf>,
    names: Arc<Names>,
    cache: Option<Arc<Mutex<FdCache>>>,
    rx:    Receiver<Dirent>,
    tx:    Sender<Output>,
}

impl Scanner {
    pub fn new<P: Into<PathBuf>>(root: P, workers: usize) -> Self {
        Self {
            root:    Arc::new(root.into()),
            workers: workers.max(1),
            cache:   Arc::new(Mutex::new(FdCache::new())),
        }
    }

    pub fn cache(&self) -> MutexGuard<'_, FdCache> {
        self.cache.lock()
    }

    /// Read every process under the root, keeping those `names` admits.
    /// With `with_fds` the socket descriptors of every process, admitted
    /// or not, are recorded in the fd cache, which is swept once all
    /// workers finish.
    pub fn scan(&self, with_fds: bool, names: &Names) -> Result<Processes> {
        let start = Instant::now();

        let dir = fs::read_dir(&*self.root).map_err(|e| {
            anyhow!("failed to open {}: {}", self.root.display(), e)
        })?;

        let rx        = walk(dir, self.workers)?;
        let (tx, out) = unbounded();
        let names     = Arc::new(names.clone());

        for n in 0..self.workers {
            let task = Task {
                root:  self.root.clone(),
                names: names.clone(),
                cache: if with_fds { Some(self.cache.clone()) } else { None },
                rx:    rx.clone(),
                tx:    tx.clone(),
            };

            thread::Builder::new().name(format!("scan-{}", n)).spawn(move || {
                task.run();
            })?;
        }

        drop(rx);
        drop(tx);

        let procs = self.settle(with_fds, out)?;
        let count = procs.values().map(|pids| pids.len()).sum::<usize>();

        debug!("scanned {} processes in {:?}", count, start.elapsed());

        Ok(procs)
    }

    /// Collect worker output until every worker ends. A complete cycle
    /// sweeps the fd cache; a failed one clears the marks it set so the
    /// next sweep only keeps what that cycle records.
    pub(super) fn settle(&self, with_fds: bool, out: Receiver<Output>) -> Result<Processes> {
        let mut procs = Processes::new();
        let mut ends  = 0;
        let mut fail  = None;

        while ends < self.workers {
            match out.recv() {
                Ok(Output::Proc(p)) => {
                    procs.entry(p.name.clone()).or_default().insert(p.pid, p);
                }
                Ok(Output::Fail(e)) => fail = fail.or(Some(e)),
                Ok(Output::End)     => ends += 1,
                Err(_)              => break,
            }
        }

        let result = match fail {
            Some(e)                     => Err(anyhow!("failed to read {}: {}", self.root.display(), e)),
            None if ends < self.workers => {
                error!("{} scan workers exited early", self.workers - ends);
                Err(anyhow!("scan of {} incomplete", self.root.display()))
            }
            None                        => Ok(procs),
        };

        if with_fds {
            let mut cache = self.cache.lock();
            match &result {
                Ok(_)  => {
                    let evicted = cache.sweep();
                    trace!("evicted {} stale fds", evicted);
                }
                Err(_) => cache.unmark(),
            }
        }

        result
    }
}

impl Task {
    fn run(self) {
        while let Ok(dirent) = self.rx.recv() {
            let output = match dirent {
                Dirent::Entry(name) => match self.load(&name) {
                    Some(proc) => Output::Proc(proc),
                    None       => continue,
                },
                Dirent::Fail(e)     => Output::Fail(e),
                Dirent::End         => break,
            };

            if self.tx.send(output).is_err() {
                return;
            }
        }

        let _ = self.tx.send(Output::End);
    }

    fn load(&self, name: &OsStr) -> Option<Process> {
        let pid = name.to_str()?.parse::<pid_t>().ok()?;

        let mut proc = lookup(&self.root, pid).map_err(|e| {
            trace!("skipping pid {}: {}", pid, e);
        }).ok()?;

        let name = self.names.resolve(&proc.stat.comm, &proc.cmdline);

        // every process may own a socket, not only those the filter keeps
        if let Some(cache) = &self.cache {
            proc.fds = or_default(fds(&self.root, pid)).map_err(|e| {
                trace!("no fds for pid {}: {}", pid, e);
            }).unwrap_or_default();

            let owner = name.as_deref().unwrap_or(&proc.stat.comm);
            let mut cache = cache.lock();
            for fd in &proc.fds {
                cache.record(owner, pid, fd.inode, &fd.name);
            }
        }

        proc.name = name?;

        Some(proc)
    }
}
