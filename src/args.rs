use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use anyhow::Result;
use clap::ArgMatches;
use crate::config::Config;
use crate::sockets::{Family, Protocol, Table};

pub fn opt<T: FromStr>(arg: Option<&str>) -> Result<Option<T>> {
    Ok(arg.map(|s| T::from_str(s).map_err(|_| {
        let msg  = format!("invalid argument value '{}'", s);
        let kind = clap::ErrorKind::InvalidValue;
        clap::Error::with_description(&msg, kind)
    })).transpose()?)
}

pub fn config(args: &ArgMatches) -> Result<Config> {
    let mut config = Config::default();

    if let Some(root) = args.value_of("proc") {
        config.proc_root = PathBuf::from(root);
    }

    if let Some(workers) = opt(args.value_of("workers"))? {
        config.workers = workers;
    }

    if let Some(names) = args.values_of("name") {
        config.names = names.collect();
    }

    if let Some(secs) = opt(args.value_of("interval"))? {
        config.interval = Duration::from_secs(secs);
    }

    config.count = opt(args.value_of("count"))?;

    Ok(config)
}

/// Socket tables selected by the protocol and family flags. No flag in
/// a group selects every member of it.
pub fn tables(args: &ArgMatches) -> Vec<Table> {
    let protocols = pick(args, ("tcp", Protocol::TCP), ("udp", Protocol::UDP));
    let families  = pick(args, ("ipv4", Family::V4), ("ipv6", Family::V6));

    Table::ALL.iter().copied().filter(|t| {
        protocols.contains(&t.protocol()) && families.contains(&t.family())
    }).collect()
}

fn pick<T: Copy>(args: &ArgMatches, a: (&str, T), b: (&str, T)) -> Vec<T> {
    match (args.is_present(a.0), args.is_present(b.0)) {
        (false, false) => vec![a.1, b.1],
        (x,     y)     => [(x, a.1), (y, b.1)].iter().filter(|p| p.0).map(|p| p.1).collect(),
    }
}
