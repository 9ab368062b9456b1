use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use anyhow::{anyhow, Result};
use libc::pid_t;
use super::{Fd, Process, Stat};
use super::walk::{walk, Dirent};

/// Read the command line and stat block of `pid`. Either failing means
/// the process is gone or unreadable and the caller should skip it.
pub fn lookup(root: &Path, pid: pid_t) -> Result<Process> {
    let cmdline = cmdline(root, pid)?;
    let stat    = stat(root, pid)?;

    if stat.pid != pid {
        return Err(anyhow!("stat for {} reports pid {}", pid, stat.pid));
    }

    Ok(Process {
        pid:     pid,
        name:    stat.comm.clone(),
        cmdline: cmdline,
        stat:    stat,
        fds:     Vec::new(),
    })
}

fn cmdline(root: &Path, pid: pid_t) -> Result<Vec<String>> {
    let cmd = fs::read(root.join(pid.to_string()).join("cmdline"))?;
    let mut args = cmd.split(|&c| c == 0).map(|part| {
        String::from_utf8_lossy(part).replace('\n', "")
    }).collect::<Vec<_>>();

    if args.last().map(String::is_empty).unwrap_or(false) {
        args.pop();
    }

    Ok(args)
}

fn stat(root: &Path, pid: pid_t) -> Result<Stat> {
    let stat = fs::read_to_string(root.join(pid.to_string()).join("stat"))?;
    Stat::parse(stat.trim_end())
}

/// Socket descriptors held by `pid`, read by walking its fd directory.
pub fn fds(root: &Path, pid: pid_t) -> Result<Vec<Fd>> {
    let path = root.join(pid.to_string()).join("fd");
    let rx   = walk(fs::read_dir(&path)?, 1)?;

    let mut fds = Vec::new();

    while let Ok(dirent) = rx.recv() {
        match dirent {
            Dirent::Entry(name) => fds.extend(fd(&path, name)),
            Dirent::Fail(e)     => return Err(e.into()),
            Dirent::End         => break,
        }
    }

    Ok(fds)
}

fn fd(dir: &Path, name: OsString) -> Option<Fd> {
    let link  = fs::read_link(dir.join(&name)).ok()?;
    let inode = inode(link.to_str()?)?;
    Some(Fd {
        name:  name.into_string().ok()?,
        inode: inode,
    })
}

fn inode(link: &str) -> Option<u64> {
    link.strip_prefix("socket:[")?.strip_suffix(']')?.parse().ok()
}

pub fn or_default<T: Default>(r: Result<T>) -> Result<T> {
    r.or_else(|e| {
        match e.downcast_ref::<std::io::Error>() {
            Some(e) if e.kind() == ErrorKind::NotFound         => Ok(T::default()),
            Some(e) if e.kind() == ErrorKind::PermissionDenied => Ok(T::default()),
            _                                                  => Err(e),
        }
    })
}
