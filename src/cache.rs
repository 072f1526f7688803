use log::{debug, trace};
use std::convert::TryFrom;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::dns_parser::{Message, Question, ResourceRecord};

/// Answers seen in earlier responses, shared between concurrent lookups
///
/// Expired records are only dropped when a search runs into them.
#[derive(Debug, Default)]
pub struct Cache {
    records: Mutex<Vec<ResourceRecord>>,
}

impl Cache {
    pub fn new() -> Cache {
        Cache::default()
    }

    fn lock(&self) -> MutexGuard<Vec<ResourceRecord>> {
        // the store is a plain list, a panic elsewhere can't leave it half written
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores the answers of `response` to the questions it carries
    ///
    /// Authority and additional records, and answers for names nobody asked
    /// about, are never stored. Records with a ttl of 0 must not be cached
    /// either. A record already in the cache is replaced, which refreshes
    /// its expiry.
    pub fn insert(&self, response: &Message) {
        let records = response.answers.iter().filter(|record| {
            record.ttl > 0 && response.questions.iter().any(|q| q.matches(record))
        });

        let mut store = self.lock();
        for record in records {
            trace!("caching {} {} ttl {}", record.name, record.typ(), record.ttl);
            let existing = store.iter().position(|cached| same_record(cached, record));
            match existing {
                Some(idx) => store[idx] = record.clone(),
                None => store.push(record.clone()),
            }
        }
    }

    pub fn search(&self, question: &Question) -> Option<Vec<ResourceRecord>> {
        self.search_at(question, Instant::now())
    }

    /// Finds the records answering `question` that are still valid at `now`
    ///
    /// Expired records with the question's name and class are evicted on the
    /// way. The records handed out carry the seconds they have left as ttl.
    /// Returns `None` when nothing matches.
    pub fn search_at(&self, question: &Question, now: Instant) -> Option<Vec<ResourceRecord>> {
        let mut store = self.lock();
        let before = store.len();
        store.retain(|record| !(question.matches_owner(record) && record.is_expired_at(now)));
        if store.len() != before {
            debug!(
                "evicted {} expired records for {}",
                before - store.len(),
                question.qname
            );
        }

        let found: Vec<_> = store
            .iter()
            .filter(|record| question.matches(record))
            .map(|record| {
                let mut record = record.clone();
                if let Some(expires_at) = record.expires_at() {
                    record.ttl = remaining_secs(expires_at, now);
                }
                record
            })
            .collect();
        if found.is_empty() {
            None
        } else {
            Some(found)
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn same_record(a: &ResourceRecord, b: &ResourceRecord) -> bool {
    a.class == b.class && a.data == b.data && a.name.eq_ignore_case(&b.name)
}

fn remaining_secs(expires_at: Instant, now: Instant) -> u32 {
    let left = expires_at.saturating_duration_since(now).as_secs();
    u32::try_from(left).unwrap_or(u32::MAX)
}
