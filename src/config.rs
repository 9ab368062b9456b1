use std::path::PathBuf;
use std::time::Duration;
use crate::process::Names;

#[derive(Clone, Debug)]
pub struct Config {
    pub proc_root: PathBuf,
    pub workers:   usize,
    pub names:     Names,
    pub interval:  Duration,
    pub count:     Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            workers:   num_cpus::get(),
            names:     Names::default(),
            interval:  Duration::from_secs(5),
            count:     None,
        }
    }
}
