use anyhow::Result;
use parking_lot::MutexGuard;
use crate::cache::FdCache;
use crate::config::Config;
use crate::process::{Names, Scanner};
use crate::sockets::{Holder, ProcNet, Record, Snapshot, Source, Table};
use super::{build, correlate, Graph, Locals};

/// Socket tables and the process tree of one host, read on demand.
pub struct Host {
    scanner: Scanner,
    source:  Box<dyn Source + Send>,
    names:   Names,
}

impl Host {
    pub fn new(config: &Config) -> Self {
        Self::with_source(config, ProcNet::new(config.proc_root.clone()))
    }

    pub fn with_source<S: Source + Send + 'static>(config: &Config, source: S) -> Self {
        Self {
            scanner: Scanner::new(config.proc_root.clone(), config.workers),
            source:  Box::new(source),
            names:   config.names.clone(),
        }
    }

    /// Read `tables`, correlating records with their processes when
    /// `owners` is set.
    pub fn snapshot(&self, tables: &[Table], owners: bool) -> Result<Snapshot> {
        if owners {
            self.scanner.scan(true, &self.names)?;
        }

        let mut snapshot = Snapshot::read_tables(&*self.source, tables)?;

        if owners {
            correlate(&mut snapshot, &self.scanner.cache());
        }

        Ok(snapshot)
    }

    pub fn demand(&self) -> Result<Graph> {
        self.demand_with(&Locals::capture())
    }

    pub fn demand_with(&self, locals: &Locals) -> Result<Graph> {
        let snapshot = self.snapshot(&Table::ALL, true)?;
        Ok(build(&snapshot, locals))
    }

    /// Processes whose cached descriptors reference the record's inode.
    pub fn holders(&self, record: &Record) -> Vec<Holder> {
        self.scanner.cache().holders(record.inode)
    }

    pub fn cache(&self) -> MutexGuard<'_, FdCache> {
        self.scanner.cache()
    }
}
