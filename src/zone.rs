use std::fmt::Debug;

use crate::dns_parser::{Question, ResourceRecord};

/// Zone data the resolver can answer from directly
///
/// Records returned with `authoritative` set make the response
/// authoritative.
pub trait ZoneLookup: Debug + Send + Sync {
    fn lookup(&self, question: &Question) -> Option<Vec<ResourceRecord>>;
}

/// No zone data at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoZones;

impl ZoneLookup for NoZones {
    fn lookup(&self, _question: &Question) -> Option<Vec<ResourceRecord>> {
        None
    }
}

/// A fixed set of records held in memory, all of them authoritative
#[derive(Debug, Clone, Default)]
pub struct StaticZone {
    records: Vec<ResourceRecord>,
}

impl StaticZone {
    pub fn new(records: Vec<ResourceRecord>) -> StaticZone {
        let records = records
            .into_iter()
            .map(|mut record| {
                record.authoritative = true;
                record
            })
            .collect();
        StaticZone { records }
    }
}

impl ZoneLookup for StaticZone {
    fn lookup(&self, question: &Question) -> Option<Vec<ResourceRecord>> {
        let found: Vec<_> = self
            .records
            .iter()
            .filter(|record| question.matches(record))
            .cloned()
            .collect();
        if found.is_empty() {
            None
        } else {
            Some(found)
        }
    }
}
