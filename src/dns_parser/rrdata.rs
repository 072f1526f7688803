use std::fmt;
use std::net::Ipv4Addr;

use byteorder::{BigEndian, ByteOrder};

use super::{Error, Type};

/// Typed resource record data
///
/// Only host addresses are understood, every other record type is rejected
/// with `Error::UnsupportedRecordType` when reading or writing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RRData {
    A(Ipv4Addr),
}

impl RRData {
    pub fn typ(&self) -> Type {
        match *self {
            RRData::A(..) => Type::A,
        }
    }

    pub fn write_to(&self, buf: &mut Vec<u8>) {
        match *self {
            RRData::A(ip) => buf.extend_from_slice(&ip.octets()),
        }
    }

    pub fn parse(typ: Type, rdata: &[u8]) -> Result<RRData, Error> {
        match typ {
            Type::A => {
                if rdata.len() != 4 {
                    return Err(Error::WrongRdataLength);
                }
                Ok(RRData::A(Ipv4Addr::from(BigEndian::read_u32(rdata))))
            }
            typ => Err(Error::UnsupportedRecordType(typ.value())),
        }
    }

    /// Builds data of type `typ` from its text form, a dotted quad for A
    pub fn from_text(typ: Type, text: &str) -> Result<RRData, Error> {
        match typ {
            Type::A => {
                let mut octets = [0u8; 4];
                let mut parts = text.split('.');
                for octet in octets.iter_mut() {
                    let part = parts.next().ok_or(Error::WrongRdataLength)?;
                    let value: u32 = part
                        .parse()
                        .map_err(|_| Error::Protocol(format!("{:?} is not an address", text)))?;
                    *octet = (value & 0xFF) as u8;
                }
                if parts.next().is_some() {
                    return Err(Error::WrongRdataLength);
                }
                Ok(RRData::A(Ipv4Addr::from(octets)))
            }
            typ => Err(Error::UnsupportedRecordType(typ.value())),
        }
    }
}

impl fmt::Display for RRData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RRData::A(ip) => write!(f, "{}", ip),
        }
    }
}
