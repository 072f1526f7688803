use byteorder::{BigEndian, ByteOrder};
use rand::{thread_rng, Rng};

use super::error::required;
use super::{Error, Opcode, ResponseCode};

/// Size of the fixed header at the start of every packet
pub const HEADER_LEN: usize = 12;

mod flag {
    pub const QUERY: u16 = 0b1000_0000_0000_0000;
    pub const OPCODE_MASK: u16 = 0b0111_1000_0000_0000;
    pub const AUTHORITATIVE: u16 = 0b0000_0100_0000_0000;
    pub const TRUNCATED: u16 = 0b0000_0010_0000_0000;
    pub const RECURSION_DESIRED: u16 = 0b0000_0001_0000_0000;
    pub const RECURSION_AVAILABLE: u16 = 0b0000_0000_1000_0000;
    pub const RESERVED_MASK: u16 = 0b0000_0000_0111_0000;
    pub const RESPONSE_CODE_MASK: u16 = 0b0000_0000_0000_1111;
}

/// Represents parsed header of the packet
///
/// `opcode` and `response_code` are `None` when the packet carried a value
/// that isn't in the catalog. Such a header can be inspected but not
/// written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Assigned randomly on first write when absent
    pub id: Option<u16>,
    pub query: bool,
    pub opcode: Option<Opcode>,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    reserved: u8,
    pub response_code: Option<ResponseCode>,
    pub questions: u16,
    pub answers: u16,
    pub nameservers: u16,
    pub additional: u16,
}

/// A partial set of header values, `None` keeps what the header has
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    pub id: Option<u16>,
    pub query: Option<bool>,
    pub opcode: Option<Opcode>,
    pub authoritative: Option<bool>,
    pub truncated: Option<bool>,
    pub recursion_desired: Option<bool>,
    pub recursion_available: Option<bool>,
    pub response_code: Option<ResponseCode>,
    pub questions: Option<u16>,
    pub answers: Option<u16>,
    pub nameservers: Option<u16>,
    pub additional: Option<u16>,
}

impl Default for Header {
    fn default() -> Header {
        Header {
            id: None,
            query: true,
            opcode: Some(Opcode::StandardQuery),
            authoritative: false,
            truncated: false,
            recursion_desired: false,
            recursion_available: false,
            reserved: 0,
            response_code: Some(ResponseCode::NoError),
            questions: 0,
            answers: 0,
            nameservers: 0,
            additional: 0,
        }
    }
}

/// A random id in `1..=0xFFFF`, zero is never handed out
pub fn random_id() -> u16 {
    thread_rng().gen_range(1..=0xFFFF)
}

impl Header {
    pub fn parse(data: &[u8]) -> Result<Header, Error> {
        if data.len() < HEADER_LEN {
            return Err(Error::HeaderTooShort);
        }
        let flags = BigEndian::read_u16(&data[2..4]);
        Ok(Header {
            id: Some(BigEndian::read_u16(&data[..2])),
            query: flags & flag::QUERY == 0,
            opcode: Opcode::from_value(((flags & flag::OPCODE_MASK) >> 11) as u8),
            authoritative: flags & flag::AUTHORITATIVE != 0,
            truncated: flags & flag::TRUNCATED != 0,
            recursion_desired: flags & flag::RECURSION_DESIRED != 0,
            recursion_available: flags & flag::RECURSION_AVAILABLE != 0,
            reserved: ((flags & flag::RESERVED_MASK) >> 4) as u8,
            response_code: ResponseCode::from_value((flags & flag::RESPONSE_CODE_MASK) as u8),
            questions: BigEndian::read_u16(&data[4..6]),
            answers: BigEndian::read_u16(&data[6..8]),
            nameservers: BigEndian::read_u16(&data[8..10]),
            additional: BigEndian::read_u16(&data[10..12]),
        })
    }

    /// Writes the header into the first 12 bytes of `data`
    ///
    /// The reserved bits are always written as zero.
    pub fn write(&mut self, data: &mut [u8]) -> Result<(), Error> {
        if data.len() < HEADER_LEN {
            return Err(Error::HeaderTooShort);
        }
        let opcode = required("opcode", self.opcode)?;
        let response_code = required("rcode", self.response_code)?;
        let id = *self.id.get_or_insert_with(random_id);

        let mut flags = 0u16;
        flags |= u16::from(opcode.value()) << 11;
        flags |= u16::from(response_code.value());
        if !self.query {
            flags |= flag::QUERY;
        }
        if self.authoritative {
            flags |= flag::AUTHORITATIVE;
        }
        if self.truncated {
            flags |= flag::TRUNCATED;
        }
        if self.recursion_desired {
            flags |= flag::RECURSION_DESIRED;
        }
        if self.recursion_available {
            flags |= flag::RECURSION_AVAILABLE;
        }
        BigEndian::write_u16(&mut data[..2], id);
        BigEndian::write_u16(&mut data[2..4], flags);
        BigEndian::write_u16(&mut data[4..6], self.questions);
        BigEndian::write_u16(&mut data[6..8], self.answers);
        BigEndian::write_u16(&mut data[8..10], self.nameservers);
        BigEndian::write_u16(&mut data[10..12], self.additional);
        Ok(())
    }

    /// Applies `fields` and encodes the result
    pub fn encode(&mut self, fields: &HeaderFields) -> Result<[u8; HEADER_LEN], Error> {
        self.apply(fields);
        let mut buf = [0u8; HEADER_LEN];
        self.write(&mut buf)?;
        Ok(buf)
    }

    pub fn apply(&mut self, fields: &HeaderFields) {
        if let Some(id) = fields.id {
            self.id = Some(id);
        }
        if let Some(query) = fields.query {
            self.query = query;
        }
        if let Some(opcode) = fields.opcode {
            self.opcode = Some(opcode);
        }
        if let Some(authoritative) = fields.authoritative {
            self.authoritative = authoritative;
        }
        if let Some(truncated) = fields.truncated {
            self.truncated = truncated;
        }
        if let Some(recursion_desired) = fields.recursion_desired {
            self.recursion_desired = recursion_desired;
        }
        if let Some(recursion_available) = fields.recursion_available {
            self.recursion_available = recursion_available;
        }
        if let Some(response_code) = fields.response_code {
            self.response_code = Some(response_code);
        }
        if let Some(questions) = fields.questions {
            self.questions = questions;
        }
        if let Some(answers) = fields.answers {
            self.answers = answers;
        }
        if let Some(nameservers) = fields.nameservers {
            self.nameservers = nameservers;
        }
        if let Some(additional) = fields.additional {
            self.additional = additional;
        }
    }

    /// Sets the opcode from its wire value, which must be in the catalog
    pub fn set_opcode(&mut self, value: u8) -> Result<(), Error> {
        self.opcode = Some(required("opcode", Opcode::from_value(value))?);
        Ok(())
    }

    /// Sets the response code from its wire value, which must be in the catalog
    pub fn set_response_code(&mut self, value: u8) -> Result<(), Error> {
        self.response_code = Some(required("rcode", ResponseCode::from_value(value))?);
        Ok(())
    }

    /// The reserved `z` bits as read off the wire
    pub fn z(&self) -> u8 {
        self.reserved
    }

    pub fn question_count(data: &[u8]) -> u16 {
        BigEndian::read_u16(&data[4..6])
    }

    pub fn answer_count(data: &[u8]) -> u16 {
        BigEndian::read_u16(&data[6..8])
    }

    pub fn nameserver_count(data: &[u8]) -> u16 {
        BigEndian::read_u16(&data[8..10])
    }

    pub fn additional_count(data: &[u8]) -> u16 {
        BigEndian::read_u16(&data[10..12])
    }

    pub fn set_truncated(data: &mut [u8]) {
        data[2] |= (flag::TRUNCATED >> 8) as u8;
    }

    pub fn inc_questions(data: &mut [u8]) -> Option<u16> {
        Header::inc_count(&mut data[4..6])
    }

    pub fn inc_answers(data: &mut [u8]) -> Option<u16> {
        Header::inc_count(&mut data[6..8])
    }

    pub fn inc_nameservers(data: &mut [u8]) -> Option<u16> {
        Header::inc_count(&mut data[8..10])
    }

    pub fn inc_additional(data: &mut [u8]) -> Option<u16> {
        Header::inc_count(&mut data[10..12])
    }

    fn inc_count(count: &mut [u8]) -> Option<u16> {
        let value = BigEndian::read_u16(count).checked_add(1)?;
        BigEndian::write_u16(count, value);
        Some(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_query_header() {
        let data = b"\xb1\x6a\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00";
        let header = Header::parse(data).unwrap();
        assert_eq!(header.id, Some(0xb16a));
        assert!(header.query);
        assert_eq!(header.opcode, Some(Opcode::StandardQuery));
        assert!(!header.authoritative);
        assert!(!header.truncated);
        assert!(header.recursion_desired);
        assert!(!header.recursion_available);
        assert_eq!(header.response_code, Some(ResponseCode::NoError));
        assert_eq!(header.questions, 1);
        assert_eq!(header.answers, 0);
        assert_eq!(header.z(), 0);
    }

    #[test]
    fn parse_response_header() {
        let data = b"\x12\x34\x85\x83\x00\x01\x00\x02\x00\x03\x00\x04";
        let header = Header::parse(data).unwrap();
        assert!(!header.query);
        assert!(header.authoritative);
        assert!(header.recursion_desired);
        assert!(header.recursion_available);
        assert_eq!(header.response_code, Some(ResponseCode::NameError));
        assert_eq!(
            (header.questions, header.answers, header.nameservers, header.additional),
            (1, 2, 3, 4)
        );
    }

    #[test]
    fn unknown_codes_are_none() {
        // opcode 5, rcode 9
        let data = b"\x00\x01\x28\x09\x00\x00\x00\x00\x00\x00\x00\x00";
        let mut header = Header::parse(data).unwrap();
        assert_eq!(header.opcode, None);
        assert_eq!(header.response_code, None);
        let mut buf = [0u8; HEADER_LEN];
        assert_eq!(
            header.write(&mut buf),
            Err(Error::Protocol("opcode cannot be null".into()))
        );
    }

    #[test]
    fn too_short() {
        assert_eq!(Header::parse(&[0; 11]), Err(Error::HeaderTooShort));
    }

    #[test]
    fn round_trip_every_field() {
        let fields = HeaderFields {
            id: Some(0xbeef),
            query: Some(false),
            opcode: Some(Opcode::ServerStatus),
            authoritative: Some(true),
            truncated: Some(true),
            recursion_desired: Some(false),
            recursion_available: Some(true),
            response_code: Some(ResponseCode::Refused),
            questions: Some(1),
            answers: Some(2),
            nameservers: Some(300),
            additional: Some(0xffff),
        };
        let mut header = Header::default();
        let encoded = header.encode(&fields).unwrap();
        assert_eq!(encoded.len(), HEADER_LEN);
        assert_eq!(Header::parse(&encoded).unwrap(), header);
    }

    #[test]
    fn reserved_bits_are_never_written() {
        let data = b"\x00\x07\x01\x70\x00\x00\x00\x00\x00\x00\x00\x00";
        let mut header = Header::parse(data).unwrap();
        assert_eq!(header.z(), 7);
        let mut buf = [0u8; HEADER_LEN];
        header.write(&mut buf).unwrap();
        assert_eq!(buf[3], 0);
        assert_eq!(Header::parse(&buf).unwrap().z(), 0);
    }

    #[test]
    fn omitted_fields_keep_their_value() {
        let mut header = Header::default();
        header.recursion_desired = true;
        header.id = Some(42);
        let encoded = header
            .encode(&HeaderFields {
                authoritative: Some(true),
                ..Default::default()
            })
            .unwrap();
        let parsed = Header::parse(&encoded).unwrap();
        assert_eq!(parsed.id, Some(42));
        assert!(parsed.recursion_desired);
        assert!(parsed.authoritative);
    }

    #[test]
    fn missing_id_is_generated() {
        let mut header = Header::default();
        let encoded = header.encode(&HeaderFields::default()).unwrap();
        let id = header.id.unwrap();
        assert_ne!(id, 0);
        assert_eq!(Header::parse(&encoded).unwrap().id, Some(id));
    }

    #[test]
    fn setters_reject_unknown_values() {
        let mut header = Header::default();
        assert!(header.set_opcode(1).is_ok());
        assert_eq!(header.opcode, Some(Opcode::InverseQuery));
        assert_eq!(
            header.set_opcode(9),
            Err(Error::Protocol("opcode cannot be null".into()))
        );
        assert_eq!(header.opcode, Some(Opcode::InverseQuery));
        assert_eq!(
            header.set_response_code(12),
            Err(Error::Protocol("rcode cannot be null".into()))
        );
    }

    #[test]
    fn count_helpers() {
        let mut buf = [0u8; HEADER_LEN];
        Header::inc_questions(&mut buf);
        Header::inc_additional(&mut buf);
        Header::inc_additional(&mut buf);
        assert_eq!(Header::question_count(&buf), 1);
        assert_eq!(Header::answer_count(&buf), 0);
        assert_eq!(Header::additional_count(&buf), 2);
        Header::set_truncated(&mut buf);
        assert!(Header::parse(&buf).unwrap().truncated);
    }
}
