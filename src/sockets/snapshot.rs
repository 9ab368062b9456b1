use std::collections::BTreeMap;
use anyhow::Result;
use log::debug;
use serde::Serialize;
use super::{Family, Protocol, Record, Table};

/// Supplier of raw socket table entries, one table per call.
pub trait Source {
    fn records(&self, table: Table) -> Result<Vec<Record>>;
}

/// Immutable view of every socket table read in one poll.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    tables: BTreeMap<Table, Vec<Record>>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Count {
    pub protocol: Protocol,
    pub v4:       usize,
    pub v6:       usize,
}

impl Snapshot {
    pub fn read(source: &dyn Source) -> Result<Self> {
        Self::read_tables(source, &Table::ALL)
    }

    pub fn read_tables(source: &dyn Source, tables: &[Table]) -> Result<Self> {
        let mut map = BTreeMap::new();
        for &table in tables {
            let records = source.records(table)?;
            debug!("read {} {:?} records", records.len(), table);
            map.insert(table, records);
        }
        Ok(Self { tables: map })
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        let mut tables = BTreeMap::<Table, Vec<Record>>::new();
        for record in records {
            tables.entry(record.table).or_default().push(record);
        }
        Self { tables }
    }

    pub fn records(&self, table: Table) -> &[Record] {
        match self.tables.get(&table) {
            Some(records) => records,
            None          => &[],
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = Table> + '_ {
        self.tables.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.tables.values().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Record> {
        self.tables.values_mut().flatten()
    }

    /// Records of both families for one protocol.
    pub fn group(&self, protocol: Protocol) -> impl Iterator<Item = &Record> {
        self.tables.iter().filter(move |(table, _)| {
            table.protocol() == protocol
        }).flat_map(|(_, records)| records)
    }

    pub fn len(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn summary(&self) -> Vec<Count> {
        [Protocol::TCP, Protocol::UDP].iter().map(|&protocol| {
            let count = |family| self.records(Table(protocol, family)).len();
            Count {
                protocol: protocol,
                v4:       count(Family::V4),
                v6:       count(Family::V6),
            }
        }).collect()
    }
}

impl Count {
    pub fn total(&self) -> usize {
        self.v4 + self.v6
    }
}
