use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use anyhow::{anyhow, Result};
use clap::{App, ArgMatches, load_yaml};
use crossbeam_channel::tick;
use env_logger::Builder;
use jemallocator::Jemalloc;
use log::{debug, warn};
use log::LevelFilter::*;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag::register;
use psss::args;
use psss::config::Config;
use psss::demand::Host;
use psss::display::{self, Options};
use psss::os;
use psss::sockets::Table;
use psss::topo::Tracker;

#[global_allocator]
static ALLOC: Jemalloc = Jemalloc;

fn main() -> Result<()> {
    let yaml = load_yaml!("args.yml");
    let ver  = env!("CARGO_PKG_VERSION");
    let args = App::from_yaml(&yaml).version(ver).get_matches();

    let (cmd, sub) = match args.subcommand() {
        (cmd, Some(sub)) => (cmd, sub),
        _                => return Err(anyhow!("missing command")),
    };

    let (module, level) = match sub.occurrences_of("verbose") {
        0 => (Some(module_path!()), Info),
        1 => (Some(module_path!()), Debug),
        2 => (Some(module_path!()), Trace),
        _ => (None,                 Trace),
    };
    Builder::from_default_env().filter(module, level).init();

    let config = args::config(sub)?;

    debug!("running {} against {}", cmd, config.proc_root.display());

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cmd {
        "sockets" => sockets(sub, &config, &mut out),
        "summary" => summary(&config, &mut out),
        "demand"  => demand(sub, &config, &mut out),
        "topo"    => topo(sub, &config, &mut out),
        _         => Err(anyhow!("unknown command {}", cmd)),
    }
}

fn sockets<W: Write>(args: &ArgMatches, config: &Config, out: &mut W) -> Result<()> {
    let opts = Options {
        all:       args.is_present("all"),
        processes: args.is_present("processes"),
        timers:    args.is_present("options"),
        extended:  args.is_present("extended"),
        hz:        os::clock_ticks(),
    };

    let host     = Host::new(config);
    let snapshot = host.snapshot(&args::tables(args), opts.processes)?;

    display::sockets(out, &snapshot, &opts)
}

fn summary<W: Write>(config: &Config, out: &mut W) -> Result<()> {
    let host     = Host::new(config);
    let snapshot = host.snapshot(&Table::ALL, false)?;
    display::summary(out, &snapshot.summary())
}

fn demand<W: Write>(args: &ArgMatches, config: &Config, out: &mut W) -> Result<()> {
    let graph = Host::new(config).demand()?;

    if args.is_present("json") {
        serde_json::to_writer_pretty(&mut *out, &graph)?;
        writeln!(out)?;
        return Ok(());
    }

    display::demand(out, &graph)
}

fn topo<W: Write>(args: &ArgMatches, config: &Config, out: &mut W) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    register(SIGTERM, shutdown.clone())?;
    register(SIGINT,  shutdown.clone())?;

    let json    = args.is_present("json");
    let ticker  = tick(config.interval);
    let timeout = Duration::from_millis(100);

    let mut tracker = Tracker::new(config);
    let mut count   = 0;

    while !shutdown.load(Ordering::Acquire) {
        match tracker.refresh() {
            Ok(topo) if json => {
                serde_json::to_writer(&mut *out, topo)?;
                writeln!(out)?;
            }
            Ok(topo)         => display::topology(out, topo)?,
            Err(e)           => warn!("refresh failed: {:?}", e),
        }
        out.flush()?;

        count += 1;
        if config.count.map(|n| count >= n).unwrap_or(false) {
            break;
        }

        while !shutdown.load(Ordering::Acquire) {
            if ticker.recv_timeout(timeout).is_ok() {
                break;
            }
        }
    }

    Ok(())
}
