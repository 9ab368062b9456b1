use std::collections::{BTreeMap, BTreeSet};
use std::ptr;
use serde::{Serialize, Deserialize};
use crate::sockets::{Protocol, Record, Snapshot, State};
use super::Locals;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Locality {
    Local,
    Remote,
}

type Peers = BTreeMap<Locality, BTreeSet<String>>;

/// Service dependencies: state, then process, then locality, then the
/// peers it talks to. `listen` maps each listening process to its bound
/// addresses.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub states: BTreeMap<State, BTreeMap<String, Peers>>,
    pub listen: BTreeMap<String, BTreeSet<String>>,
}

impl Graph {
    pub fn peers(&self, state: State, name: &str, local: bool) -> Option<&BTreeSet<String>> {
        self.states.get(&state)?.get(name)?.get(&Locality::from(local))
    }

    fn insert(&mut self, state: State, name: String, locality: Locality, peer: String) {
        let names = self.states.entry(state).or_default();
        let peers = names.entry(name).or_default();
        peers.entry(locality).or_default().insert(peer);
    }
}

/// Build the graph from correlated records. Only LISTEN and ESTAB
/// records take part. A listener is keyed under its own address and is
/// always local.
pub fn build(snapshot: &Snapshot, locals: &Locals) -> Graph {
    let mut graph = Graph::default();

    for &protocol in &[Protocol::TCP, Protocol::UDP] {
        let group = snapshot.group(protocol).collect::<Vec<_>>();

        for record in &group {
            match record.state {
                State::Listen => {
                    let name  = record.user();
                    let local = record.local.to_string();
                    graph.listen.entry(name.clone()).or_default().insert(local.clone());
                    graph.insert(State::Listen, name, Locality::Local, local);
                }
                State::Estab => {
                    let local = locals.contains(&record.remote.addr);
                    let peer  = match local {
                        true  => resolve(record, &group),
                        false => record.remote.to_string(),
                    };
                    graph.insert(State::Estab, record.user(), local.into(), peer);
                }
                _ => (),
            }
        }
    }

    graph
}

/// Owner of the socket at the other end of a local connection: an owned
/// LISTEN or ESTAB record in the same protocol group bound to the remote
/// port. Listeners win over established sockets, then the lowest inode.
fn resolve(record: &Record, group: &[&Record]) -> String {
    let port = record.remote.port;

    group.iter().filter(|peer| {
        !ptr::eq(**peer, record) && peer.local.port == port
    }).filter(|peer| {
        matches!(peer.state, State::Listen | State::Estab)
    }).filter_map(|peer| {
        let owner = peer.owner.as_ref()?;
        Some(((peer.state != State::Listen, peer.inode), owner))
    }).min_by_key(|(rank, _)| *rank).map(|(_, owner)| {
        owner.clone()
    }).unwrap_or_else(|| record.remote.to_string())
}

impl From<bool> for Locality {
    fn from(local: bool) -> Self {
        match local {
            true  => Locality::Local,
            false => Locality::Remote,
        }
    }
}
