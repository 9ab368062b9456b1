use anyhow::{anyhow, Result};
use libc::pid_t;
use serde::{Serialize, Deserialize};

/// Fields of `/proc/<pid>/stat`, in file order. Records from kernels
/// older than 3.5 lack the trailing fields and are rejected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub pid:                   pid_t,
    pub comm:                  String,
    pub state:                 char,
    pub ppid:                  pid_t,
    pub pgrp:                  pid_t,
    pub session:               i32,
    pub tty_nr:                i32,
    pub tpgid:                 i32,
    pub flags:                 u32,
    pub minflt:                u64,
    pub cminflt:               u64,
    pub majflt:                u64,
    pub cmajflt:               u64,
    pub utime:                 u64,
    pub stime:                 u64,
    pub cutime:                i64,
    pub cstime:                i64,
    pub priority:              i64,
    pub nice:                  i64,
    pub num_threads:           i64,
    pub itrealvalue:           i64,
    pub starttime:             u64,
    pub vsize:                 u64,
    pub rss:                   i64,
    pub rsslim:                u64,
    pub startcode:             u64,
    pub endcode:               u64,
    pub startstack:            u64,
    pub kstkesp:               u64,
    pub kstkeip:               u64,
    pub signal:                u64,
    pub blocked:               u64,
    pub sigignore:             u64,
    pub sigcatch:              u64,
    pub wchan:                 u64,
    pub nswap:                 u64,
    pub cnswap:                u64,
    pub exit_signal:           i32,
    pub processor:             i32,
    pub rt_priority:           u32,
    pub policy:                u32,
    pub delayacct_blkio_ticks: u64,
    pub guest_time:            u64,
    pub cguest_time:           i64,
    pub start_data:            u64,
    pub end_data:              u64,
    pub start_brk:             u64,
    pub arg_start:             u64,
    pub arg_end:               u64,
    pub env_start:             u64,
    pub env_end:               u64,
    pub exit_code:             i32,
}

impl Stat {
    pub fn parse(line: &str) -> Result<Self> {
        // comm may itself contain spaces and parentheses
        let open  = line.find('(').ok_or_else(|| anyhow!("missing comm"))?;
        let close = line.rfind(')').ok_or_else(|| anyhow!("missing comm"))?;
        if close < open {
            return Err(anyhow!("invalid comm"));
        }

        let mut split = line[close + 1..].split_whitespace();
        let mut next  = || split.next().ok_or_else(|| anyhow!("truncated stat"));

        let pid   = line[..open].trim().parse::<pid_t>()?;
        let comm  = line[open + 1..close].to_owned();
        let state = next()?.chars().next().unwrap_or('?');

        Ok(Self {
            pid:                   pid,
            comm:                  comm,
            state:                 state,
            ppid:                  next()?.parse()?,
            pgrp:                  next()?.parse()?,
            session:               next()?.parse()?,
            tty_nr:                next()?.parse()?,
            tpgid:                 next()?.parse()?,
            flags:                 next()?.parse()?,
            minflt:                next()?.parse()?,
            cminflt:               next()?.parse()?,
            majflt:                next()?.parse()?,
            cmajflt:               next()?.parse()?,
            utime:                 next()?.parse()?,
            stime:                 next()?.parse()?,
            cutime:                next()?.parse()?,
            cstime:                next()?.parse()?,
            priority:              next()?.parse()?,
            nice:                  next()?.parse()?,
            num_threads:           next()?.parse()?,
            itrealvalue:           next()?.parse()?,
            starttime:             next()?.parse()?,
            vsize:                 next()?.parse()?,
            rss:                   next()?.parse()?,
            rsslim:                next()?.parse()?,
            startcode:             next()?.parse()?,
            endcode:               next()?.parse()?,
            startstack:            next()?.parse()?,
            kstkesp:               next()?.parse()?,
            kstkeip:               next()?.parse()?,
            signal:                next()?.parse()?,
            blocked:               next()?.parse()?,
            sigignore:             next()?.parse()?,
            sigcatch:              next()?.parse()?,
            wchan:                 next()?.parse()?,
            nswap:                 next()?.parse()?,
            cnswap:                next()?.parse()?,
            exit_signal:           next()?.parse()?,
            processor:             next()?.parse()?,
            rt_priority:           next()?.parse()?,
            policy:                next()?.parse()?,
            delayacct_blkio_ticks: next()?.parse()?,
            guest_time:            next()?.parse()?,
            cguest_time:           next()?.parse()?,
            start_data:            next()?.parse()?,
            end_data:              next()?.parse()?,
            start_brk:             next()?.parse()?,
            arg_start:             next()?.parse()?,
            arg_end:               next()?.parse()?,
            env_start:             next()?.parse()?,
            env_end:               next()?.parse()?,
            exit_code:             next()?.parse()?,
        })
    }

    pub fn state_name(&self) -> &'static str {
        state_name(self.state)
    }
}

pub fn state_name(state: char) -> &'static str {
    match state {
        'R'       => "Running",
        'S'       => "Sleeping",
        'D'       => "Waiting",
        'Z'       => "Zombie",
        'T'       => "Stopped",
        't'       => "Tracing",
        'X' | 'x' => "Dead",
        'K'       => "Wakekill",
        'W'       => "Waking",
        'P'       => "Parked",
        _         => "Unknown",
    }
}
