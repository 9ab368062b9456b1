use std::collections::HashSet;
use std::iter::FromIterator;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use log::debug;
use pnet::datalink;

/// Addresses that identify this host. A connection whose remote end is
/// one of them stays on the host.
#[derive(Clone, Debug, Default)]
pub struct Locals(HashSet<IpAddr>);

const ALIASES: &[IpAddr] = &[
    IpAddr::V4(Ipv4Addr::new(127, 0, 1, 1)),
    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
    IpAddr::V6(Ipv6Addr::UNSPECIFIED),
];

impl Locals {
    /// Addresses of every interface plus the host-local aliases.
    pub fn capture() -> Self {
        let mut locals = datalink::interfaces().into_iter().flat_map(|link| {
            link.ips.into_iter().map(|net| net.ip())
        }).collect::<Locals>();

        locals.0.extend(ALIASES.iter().copied());

        debug!("captured {} local addresses", locals.len());

        locals
    }

    pub fn contains(&self, addr: &IpAddr) -> bool {
        self.0.contains(&canonical(*addr))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<IpAddr> for Locals {
    fn from_iter<I: IntoIterator<Item = IpAddr>>(iter: I) -> Self {
        Locals(iter.into_iter().map(canonical).collect())
    }
}

fn canonical(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None     => IpAddr::V6(v6),
        },
        v4 => v4,
    }
}
