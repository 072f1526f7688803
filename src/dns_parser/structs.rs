use std::time::{Duration, Instant};

use super::error::required;
use super::{Class, Error, Name, RRData, Type};

/// A parsed chunk of data in the Query section of the packet
///
/// `qtype` and `qclass` are `None` when the packet carried a value that
/// isn't in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub qname: Name,
    pub qtype: Option<Type>,
    pub qclass: Option<Class>,
    /// Absolute position of the question in its packet
    pub offset: usize,
    pub length: usize,
}

impl Question {
    pub fn new(qname: Name, qtype: Type, qclass: Class) -> Question {
        Question {
            qname,
            qtype: Some(qtype),
            qclass: Some(qclass),
            offset: 0,
            length: 0,
        }
    }

    pub fn set_qtype(&mut self, value: u16) -> Result<(), Error> {
        self.qtype = Some(required("qtype", Type::from_value(value))?);
        Ok(())
    }

    pub fn set_qclass(&mut self, value: u16) -> Result<(), Error> {
        self.qclass = Some(required("qclass", Class::from_value(value))?);
        Ok(())
    }

    /// Whether `record` answers this question
    ///
    /// Names compare without regard to ASCII case, the `*` QTYPE matches any
    /// record type.
    pub fn matches(&self, record: &ResourceRecord) -> bool {
        self.matches_owner(record)
            && match self.qtype {
                Some(Type::All) => true,
                Some(qtype) => record.typ() == qtype,
                None => false,
            }
    }

    /// Whether `record` has this question's name and class
    pub fn matches_owner(&self, record: &ResourceRecord) -> bool {
        self.qclass.is_some()
            && record.class == self.qclass
            && record.name.eq_ignore_case(&self.qname)
    }
}

/// A single DNS record
///
/// `authoritative` tells where the record came from (our own zone data) and
/// is never written to the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: Name,
    pub class: Option<Class>,
    pub ttl: u32,
    pub data: RRData,
    pub offset: usize,
    pub length: usize,
    pub authoritative: bool,
    expires_at: Option<Instant>,
}

impl ResourceRecord {
    pub fn new(name: Name, class: Class, ttl: u32, data: RRData) -> ResourceRecord {
        ResourceRecord::with_class(name, Some(class), ttl, data)
    }

    pub(crate) fn with_class(
        name: Name,
        class: Option<Class>,
        ttl: u32,
        data: RRData,
    ) -> ResourceRecord {
        ResourceRecord {
            name,
            class,
            ttl,
            data,
            offset: 0,
            length: 0,
            authoritative: false,
            expires_at: Instant::now().checked_add(Duration::from_secs(u64::from(ttl))),
        }
    }

    pub fn typ(&self) -> Type {
        self.data.typ()
    }

    pub fn rdlength(&self) -> u16 {
        match self.data {
            RRData::A(..) => 4,
        }
    }

    /// When the record stops being usable, counted from when it was read
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| expires_at < now)
    }

    pub fn set_class(&mut self, value: u16) -> Result<(), Error> {
        self.class = Some(required("class", Class::from_value(value))?);
        Ok(())
    }
}
