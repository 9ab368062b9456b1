use crate::cache::FdCache;
use crate::sockets::{Holder, Snapshot};

/// Assign each record its owner and holders from the fd cache. The owner
/// is the first holder in cache order. Records whose inode no process
/// holds are left unowned.
pub fn correlate(snapshot: &mut Snapshot, cache: &FdCache) {
    let index = cache.index();

    for record in snapshot.iter_mut() {
        let holdings = match record.inode {
            0     => None,
            inode => index.get(&inode),
        };

        let holdings = holdings.map(Vec::as_slice).unwrap_or_default();

        record.owner   = holdings.first().map(|h| h.owner.name.clone());
        record.holders = holdings.iter().map(|h| Holder {
            pid: h.owner.pid,
            fd:  h.fd.clone(),
        }).collect();
    }
}
