use libc::{c_int, sysconf, _SC_CLK_TCK, _SC_PAGESIZE};

/// Kernel clock ticks per second, the unit of stat CPU counters.
pub fn clock_ticks() -> u64 {
    conf(_SC_CLK_TCK).unwrap_or(100)
}

/// Bytes per page, the unit of stat resident set size.
pub fn page_size() -> u64 {
    conf(_SC_PAGESIZE).unwrap_or(4096)
}

pub fn cores() -> usize {
    num_cpus::get()
}

fn conf(name: c_int) -> Option<u64> {
    match unsafe { sysconf(name) } {
        n if n > 0 => Some(n as u64),
        _          => None,
    }
}
