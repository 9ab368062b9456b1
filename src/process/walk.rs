use std::ffi::OsString;
use std::fs::ReadDir;
use std::io;
use std::thread;
use anyhow::Result;
use crossbeam_channel::{Receiver, unbounded};

#[derive(Debug)]
pub enum Dirent {
    Entry(OsString),
    Fail(io::Error),
    End,
}

/// Stream the names in `dir` from a dedicated thread. Entries arrive in
/// directory order and are followed by `ends` terminal records, one for
/// each consumer sharing the receiver. A read error is delivered once,
/// as `Fail`, and stops the walk.
pub fn walk(dir: ReadDir, ends: usize) -> Result<Receiver<Dirent>> {
    let (tx, rx) = unbounded();

    thread::Builder::new().name("walk".to_owned()).spawn(move || {
        for entry in dir {
            let (dirent, done) = match entry {
                Ok(entry) => (Dirent::Entry(entry.file_name()), false),
                Err(e)    => (Dirent::Fail(e), true),
            };

            if tx.send(dirent).is_err() {
                return;
            }

            if done {
                break;
            }
        }

        for _ in 0..ends {
            if tx.send(Dirent::End).is_err() {
                return;
            }
        }
    })?;

    Ok(rx)
}
