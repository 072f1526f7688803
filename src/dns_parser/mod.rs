//! RFC 1035 wire format: reading and writing whole DNS messages.

mod builder;
mod cursor;
mod enums;
mod error;
mod header;
mod message;
mod name;
mod parser;
mod rrdata;
mod structs;

pub use self::builder::{Additional, Answers, Builder, MoveTo, Nameservers, Questions};
pub use self::cursor::Cursor;
pub use self::enums::{Class, Opcode, ResponseCode, Type};
pub use self::error::{required, Error};
pub use self::header::{random_id, Header, HeaderFields, HEADER_LEN};
pub use self::message::{Message, MessageProperties};
pub use self::name::{Compression, Name, MAX_POINTER_HOPS};
pub use self::rrdata::RRData;
pub use self::structs::{Question, ResourceRecord};
