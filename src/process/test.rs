use std::fs;
use std::io::{self, ErrorKind};
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use anyhow::Result;
use crossbeam_channel::unbounded;
use libc::pid_t;
use tempfile::TempDir;
use crate::process::{Names, Scanner, Stat, state_name};
use super::scan::Output;

/// A throwaway proc tree.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Result<Self> {
        Ok(Self { dir: tempfile::tempdir()? })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn pid(&self, pid: pid_t) -> PathBuf {
        self.path().join(pid.to_string())
    }

    pub fn process(&self, pid: pid_t, comm: &str, cmdline: &[&str]) -> Result<()> {
        fs::create_dir_all(self.pid(pid).join("fd"))?;
        let cmd = cmdline.iter().map(|arg| format!("{}\0", arg)).collect::<String>();
        fs::write(self.pid(pid).join("cmdline"), cmd)?;
        self.ticks(pid, comm, 0, 0, 0)
    }

    pub fn ticks(&self, pid: pid_t, comm: &str, utime: u64, stime: u64, start: u64) -> Result<()> {
        fs::write(self.pid(pid).join("stat"), stat(pid, comm, utime, stime, start))?;
        Ok(())
    }

    pub fn socket(&self, pid: pid_t, fd: u32, inode: u64) -> Result<()> {
        self.link(pid, fd, &format!("socket:[{}]", inode))
    }

    pub fn link(&self, pid: pid_t, fd: u32, target: &str) -> Result<()> {
        symlink(target, self.pid(pid).join("fd").join(fd.to_string()))?;
        Ok(())
    }

    pub fn close(&self, pid: pid_t, fd: u32) -> Result<()> {
        fs::remove_file(self.pid(pid).join("fd").join(fd.to_string()))?;
        Ok(())
    }

    pub fn exit(&self, pid: pid_t) -> Result<()> {
        fs::remove_dir_all(self.pid(pid))?;
        Ok(())
    }

    pub fn cpu(&self, total: u64, btime: u64) -> Result<()> {
        let mut stat = format!("cpu  {} 0 0 0 0 0 0 0 0 0\n", total);
        for n in 0..4 {
            stat.push_str(&format!("cpu{} {} 0 0 0 0 0 0 0 0 0\n", n, total / 4));
        }
        stat.push_str(&format!("intr 0\nbtime {}\nprocesses 1\n", btime));
        fs::write(self.path().join("stat"), stat)?;
        Ok(())
    }
}

pub fn stat(pid: pid_t, comm: &str, utime: u64, stime: u64, start: u64) -> String {
    let mut rest = vec![0u64; 49];
    rest[0]  = 1;
    rest[10] = utime;
    rest[11] = stime;
    rest[16] = 1;
    rest[18] = start;
    rest[19] = 4096 * 1024;
    rest[20] = 100;
    let rest = rest.iter().map(u64::to_string).collect::<Vec<_>>().join(" ");
    format!("{} ({}) S {}\n", pid, comm, rest)
}

#[test]
fn parse_stat() -> Result<()> {
    let s = Stat::parse(stat(42, "nginx", 7, 3, 900).trim_end())?;
    assert_eq!(s.pid, 42);
    assert_eq!(s.comm, "nginx");
    assert_eq!(s.state, 'S');
    assert_eq!(s.ppid, 1);
    assert_eq!(s.utime, 7);
    assert_eq!(s.stime, 3);
    assert_eq!(s.starttime, 900);
    assert_eq!(s.vsize, 4096 * 1024);
    assert_eq!(s.rss, 100);
    assert_eq!(s.exit_code, 0);
    assert_eq!(s.state_name(), "Sleeping");
    Ok(())
}

#[test]
fn parse_stat_odd_comm() -> Result<()> {
    let s = Stat::parse(stat(7, "tmux: a) (b", 0, 0, 0).trim_end())?;
    assert_eq!(s.comm, "tmux: a) (b");
    assert_eq!(s.ppid, 1);
    Ok(())
}

#[test]
fn parse_stat_truncated() {
    assert!(Stat::parse("42 (nginx) S 1 42 42 0").is_err());
    assert!(Stat::parse("42 nginx S").is_err());
    assert!(Stat::parse("x (nginx) S").is_err());
}

#[test]
fn state_names() {
    assert_eq!(state_name('R'), "Running");
    assert_eq!(state_name('x'), "Dead");
    assert_eq!(state_name('?'), "Unknown");
}

#[test]
fn names_resolve() {
    let all = Names::default();
    assert_eq!(all.resolve("nginx", &[]), Some("nginx".to_owned()));

    let names = vec!["nginx", "app.py"].into_iter().collect::<Names>();
    let argv  = |args: &[&str]| args.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    assert_eq!(names.resolve("nginx", &argv(&["/usr/sbin/nginx"])), Some("nginx".to_owned()));
    assert_eq!(names.resolve("python3", &argv(&["./app.py", "-v"])), Some("app.py".to_owned()));
    assert_eq!(names.resolve("python3", &argv(&["app.py"])), Some("app.py".to_owned()));
    assert_eq!(names.resolve("python3", &argv(&["python3", "app.py"])), None);
    assert_eq!(names.resolve("kworker", &[]), None);
}

#[test]
fn scan_processes() -> Result<()> {
    let fx = Fixture::new()?;
    fx.process(100, "nginx", &["nginx", "-g", "daemon off;"])?;
    fx.process(101, "nginx", &["nginx"])?;
    fx.process(200, "redis-server", &["redis-server", "*:6379"])?;
    fx.process(300, "kthreadd", &[])?;

    // vanished between listing and read
    fs::create_dir(fx.path().join("400"))?;
    fs::write(fx.path().join("400/cmdline"), "gone\0")?;

    // malformed stat
    fx.process(500, "broken", &["broken"])?;
    fs::write(fx.path().join("500/stat"), "500 (broken) S 1 2 3\n")?;

    fs::create_dir(fx.path().join("sys"))?;

    let procs = Scanner::new(fx.path(), 4).scan(false, &Names::default())?;

    assert_eq!(procs.keys().collect::<Vec<_>>(), vec!["kthreadd", "nginx", "redis-server"]);
    assert_eq!(procs["nginx"].keys().collect::<Vec<_>>(), vec![&100, &101]);
    assert_eq!(procs["nginx"][&100].cmdline, vec!["nginx", "-g", "daemon off;"]);
    assert!(procs["kthreadd"][&300].cmdline.is_empty());
    assert!(procs["nginx"][&100].fds.is_empty());

    Ok(())
}

#[test]
fn scan_filters_names() -> Result<()> {
    let fx = Fixture::new()?;
    fx.process(100, "nginx", &["nginx"])?;
    fx.process(200, "python3", &["./app.py", "--port", "8000"])?;

    let names = vec!["app.py"].into_iter().collect::<Names>();
    let procs = Scanner::new(fx.path(), 2).scan(false, &names)?;

    assert_eq!(procs.len(), 1);
    assert_eq!(procs["app.py"][&200].stat.comm, "python3");
    assert_eq!(procs["app.py"][&200].name, "app.py");

    Ok(())
}

#[test]
fn scan_refreshes_fd_cache() -> Result<()> {
    let fx = Fixture::new()?;
    fx.process(100, "nginx", &["nginx"])?;
    fx.socket(100, 3, 55)?;
    fx.socket(100, 4, 56)?;
    fx.link(100, 5, "/dev/null")?;
    fx.process(200, "redis-server", &["redis-server"])?;
    fx.socket(200, 6, 77)?;

    let scanner = Scanner::new(fx.path(), 3);
    let procs   = scanner.scan(true, &Names::default())?;

    let mut fds = procs["nginx"][&100].fds.iter().map(|fd| fd.inode).collect::<Vec<_>>();
    fds.sort();
    assert_eq!(fds, vec![55, 56]);

    assert!(scanner.cache().contains("nginx", 100, 55));
    assert!(scanner.cache().contains("redis-server", 200, 77));
    assert_eq!(scanner.cache().holders(55)[0].fd, "3");

    fx.close(100, 4)?;
    fx.exit(200)?;
    scanner.scan(true, &Names::default())?;

    let cache = scanner.cache();
    assert!(cache.contains("nginx", 100, 55));
    assert!(!cache.contains("nginx", 100, 56));
    assert!(cache.pids("redis-server").is_empty());
    assert_eq!(cache.names().collect::<Vec<_>>(), vec!["nginx"]);

    Ok(())
}

#[test]
fn scan_without_fds_leaves_cache() -> Result<()> {
    let fx = Fixture::new()?;
    fx.process(100, "nginx", &["nginx"])?;
    fx.socket(100, 3, 55)?;

    let scanner = Scanner::new(fx.path(), 1);
    scanner.scan(true, &Names::default())?;
    scanner.scan(false, &Names::default())?;
    scanner.scan(false, &Names::default())?;

    assert!(scanner.cache().contains("nginx", 100, 55));
    Ok(())
}

#[test]
fn scan_missing_root() {
    let scanner = Scanner::new("/nonexistent/proc/root", 2);
    assert!(scanner.scan(false, &Names::default()).is_err());
}

#[test]
fn scan_records_fds_of_filtered_processes() -> Result<()> {
    let fx = Fixture::new()?;
    fx.process(100, "nginx", &["nginx"])?;
    fx.socket(100, 3, 55)?;
    fx.process(200, "python3", &["./app.py"])?;
    fx.socket(200, 4, 77)?;

    let scanner = Scanner::new(fx.path(), 2);
    let names   = vec!["app.py"].into_iter().collect::<Names>();
    let procs   = scanner.scan(true, &names)?;

    assert_eq!(procs.keys().collect::<Vec<_>>(), vec!["app.py"]);

    let cache = scanner.cache();
    assert!(cache.contains("nginx", 100, 55));
    assert!(cache.contains("app.py", 200, 77));

    Ok(())
}

#[test]
fn failed_scan_leaves_no_marks() -> Result<()> {
    let fx = Fixture::new()?;
    fx.process(100, "nginx", &["nginx"])?;
    fx.socket(100, 3, 55)?;
    fx.socket(100, 4, 56)?;

    let scanner = Scanner::new(fx.path(), 2);
    scanner.scan(true, &Names::default())?;

    // a cycle that records both fds before the walk fails
    scanner.cache().record("nginx", 100, 55, "3");
    scanner.cache().record("nginx", 100, 56, "4");

    let (tx, rx) = unbounded();
    tx.send(Output::Fail(io::Error::new(ErrorKind::Other, "read failed")))?;
    drop(tx);
    assert!(scanner.settle(true, rx).is_err());

    fx.close(100, 4)?;
    scanner.scan(true, &Names::default())?;

    assert!(scanner.cache().contains("nginx", 100, 55));
    assert!(!scanner.cache().contains("nginx", 100, 56));

    Ok(())
}
