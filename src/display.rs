use std::io::Write;
use anyhow::Result;
use crate::demand::{Graph, Locality};
use crate::sockets::{Count, Record, Snapshot, State, TimerKind};
use crate::topo::Topology;

#[derive(Copy, Clone, Debug, Default)]
pub struct Options {
    pub all:       bool,
    pub processes: bool,
    pub timers:    bool,
    pub extended:  bool,
    pub hz:        u64,
}

pub fn summary<W: Write>(w: &mut W, counts: &[Count]) -> Result<()> {
    writeln!(w, "{:<10} {:>6} {:>6} {:>6}", "Transport", "Total", "IPv4", "IPv6")?;
    for c in counts {
        let name = format!("{:?}", c.protocol);
        writeln!(w, "{:<10} {:>6} {:>6} {:>6}", name, c.total(), c.v4, c.v6)?;
    }
    Ok(())
}

pub fn sockets<W: Write>(w: &mut W, snapshot: &Snapshot, opts: &Options) -> Result<()> {
    write!(w, "{:<6} {:<11} {:>6} {:>6} {:<24} {:<24}", "Netid", "State", "Recv-Q", "Send-Q", "Local Address:Port", "Peer Address:Port")?;
    if opts.processes {
        write!(w, " Process")?;
    }
    writeln!(w)?;

    for table in snapshot.tables() {
        for record in snapshot.records(table) {
            if opts.all || record.state.is_active() {
                socket(w, record, opts)?;
            }
        }
    }

    Ok(())
}

fn socket<W: Write>(w: &mut W, r: &Record, opts: &Options) -> Result<()> {
    write!(w, "{:<6} {:<11} {:>6} {:>6} {:<24} {:<24}",
        r.table.netid(),
        r.state.name(),
        r.rx_queue,
        r.tx_queue,
        r.local.to_string(),
        r.remote.to_string(),
    )?;

    if let (true, Some(owner)) = (opts.processes, &r.owner) {
        write!(w, " [\"{}\"", owner)?;
        for h in &r.holders {
            write!(w, "(pid={},fd={})", h.pid, h.fd)?;
        }
        write!(w, "]")?;
    }

    if let (true, Some(timer)) = (opts.timers, &r.timer) {
        let count = match timer.kind {
            TimerKind::On => timer.retrans,
            _             => timer.probes,
        };
        let secs = timer.expires / opts.hz.max(1);
        write!(w, " [timer:({},{}sec,{})]", timer.kind.name(), secs, count)?;
    }

    if opts.extended {
        write!(w, " [detail:(")?;
        if r.uid != 0 {
            write!(w, "uid:{},", r.uid)?;
        }
        write!(w, "ino:{},sk:{:x})]", r.inode, r.sk)?;
    }

    writeln!(w)?;

    Ok(())
}

pub fn demand<W: Write>(w: &mut W, graph: &Graph) -> Result<()> {
    for (state, names) in &graph.states {
        writeln!(w, "{}", state)?;
        for (name, localities) in names {
            writeln!(w, "  {}", name)?;
            for (locality, peers) in localities {
                let indent = match state {
                    State::Estab => {
                        writeln!(w, "    {}", locality_name(*locality))?;
                        "      "
                    }
                    _ => "    ",
                };
                for peer in peers {
                    writeln!(w, "{}{}", indent, peer)?;
                }
            }
        }
    }
    Ok(())
}

fn locality_name(locality: Locality) -> &'static str {
    match locality {
        Locality::Local  => "Local",
        Locality::Remote => "Remote",
    }
}

pub fn topology<W: Write>(w: &mut W, topo: &Topology) -> Result<()> {
    writeln!(w, "{:<20} {:>7} {:<10} {:>8} {:>8} {:>12} {:>12} {:>12}",
             "Name", "PID", "State", "Load", "Instant", "VSZ", "RSS", "Start")?;

    for (name, pids) in &topo.services {
        for (pid, stat) in pids {
            let instant = match stat.load_instant {
                Some(load) => format!("{:.5}", load),
                None       => "-".to_owned(),
            };
            writeln!(w, "{:<20} {:>7} {:<10} {:>8.5} {:>8} {:>12} {:>12} {:>12}",
                     name, pid, stat.state, stat.load_avg, instant,
                     stat.vm_size, stat.vm_rss, stat.start_time)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use anyhow::Result;
    use crate::cache::FdCache;
    use crate::demand::{correlate, build, Locals};
    use crate::sockets::{Snapshot, State, Table, Timer, TimerKind};
    use crate::sockets::test::record;
    use super::*;

    fn render<F: FnOnce(&mut Vec<u8>) -> Result<()>>(f: F) -> Result<String> {
        let mut buf = Vec::new();
        f(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    fn snapshot() -> Snapshot {
        let mut estab = record(Table::TCP4, State::Estab, "127.0.0.1:9001", "127.0.0.1:8080", 77);
        estab.uid   = 1000;
        estab.sk    = 0xff;
        estab.timer = Some(Timer {
            kind:    TimerKind::Keepalive,
            expires: 500,
            retrans: 3,
            probes:  2,
        });

        let mut cache = FdCache::new();
        cache.record("P", 100, 55, "3");
        cache.record("Q", 200, 77, "4");

        let mut snapshot = Snapshot::from_records(vec![
            record(Table::TCP4, State::Listen,   "127.0.0.1:8080", "0.0.0.0:0", 55),
            estab,
            record(Table::TCP4, State::TimeWait, "127.0.0.1:9002", "127.0.0.1:8080", 0),
            record(Table::UDP6, State::Unconn,   "[::]:53", "[::]:0", 99),
        ]);
        correlate(&mut snapshot, &cache);
        snapshot
    }

    #[test]
    fn summary_rows() -> Result<()> {
        let out = render(|w| summary(w, &snapshot().summary()))?;
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("TCP"));
        assert!(lines[1].ends_with("3      3      0"));
        assert!(lines[2].ends_with("1      0      1"));
        Ok(())
    }

    #[test]
    fn socket_rows() -> Result<()> {
        let opts = Options {
            processes: true,
            timers:    true,
            extended:  true,
            hz:        100,
            ..Default::default()
        };

        let out = render(|w| sockets(w, &snapshot(), &opts))?;
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("[\"P\"(pid=100,fd=3)]"));
        assert!(lines[2].contains("[timer:(keepalive,5sec,2)]"));
        assert!(lines[2].contains("[detail:(uid:1000,ino:77,sk:ff)]"));
        assert!(!out.contains("TIME-WAIT"));

        let all = Options { all: true, ..Default::default() };
        let out = render(|w| sockets(w, &snapshot(), &all))?;
        assert!(out.contains("TIME-WAIT"));
        assert!(out.contains("UNCONN"));
        assert!(!out.contains("pid="));
        Ok(())
    }

    #[test]
    fn demand_tree() -> Result<()> {
        let locals = vec![std::net::IpAddr::from([127, 0, 0, 1])].into_iter().collect::<Locals>();
        let graph  = build(&snapshot(), &locals);
        let out    = render(|w| demand(w, &graph))?;
        assert_eq!(out, "ESTAB\n  Q\n    Local\n      P\nLISTEN\n  P\n    127.0.0.1:8080\n");
        Ok(())
    }
}
