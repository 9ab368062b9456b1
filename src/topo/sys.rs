use std::fs;
use std::path::Path;
use anyhow::{anyhow, Result};

/// System-wide counters from `<root>/stat`. `cores` counts the per-CPU
/// lines, the same CPUs `cpu_total` sums over.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SysInfo {
    pub cpu_total: u64,
    pub cores:     usize,
    pub btime:     u64,
}

impl SysInfo {
    pub fn read(root: &Path) -> Result<Self> {
        let path = root.join("stat");
        let stat = fs::read_to_string(&path).map_err(|e| {
            anyhow!("failed to read {}: {}", path.display(), e)
        })?;
        Self::parse(&stat)
    }

    pub fn parse(stat: &str) -> Result<Self> {
        let mut cpu_total = None;
        let mut btime     = None;
        let mut cores     = 0;

        for line in stat.lines() {
            let mut split = line.split_whitespace();
            match split.next() {
                Some("cpu")                         => cpu_total = Some(total(split)?),
                Some("btime")                       => btime = split.next().map(str::parse::<u64>).transpose()?,
                Some(cpu) if cpu.starts_with("cpu") => cores += 1,
                _                                   => (),
            }
        }

        Ok(Self {
            cpu_total: cpu_total.ok_or_else(|| anyhow!("missing cpu line"))?,
            cores:     cores,
            btime:     btime.ok_or_else(|| anyhow!("missing btime"))?,
        })
    }
}

// user nice system idle iowait irq softirq steal
fn total<'a, I: Iterator<Item = &'a str>>(fields: I) -> Result<u64> {
    let mut sum = 0;
    for field in fields.take(8) {
        sum += field.parse::<u64>()?;
    }
    Ok(sum)
}
