use log::trace;

use super::cursor::Cursor;
use super::header::HEADER_LEN;
use super::{Class, Error, Header, Message, Name, Question, RRData, ResourceRecord, Type};

impl Question {
    /// Reads the question starting at `offset` of `data`
    pub fn parse(data: &[u8], offset: usize) -> Result<Question, Error> {
        let mut cursor = Cursor::new(data, offset);
        let qname = Name::read(&mut cursor)?;
        let qtype = Type::from_value(cursor.read_u16()?);
        let qclass = Class::from_value(cursor.read_u16()?);
        Ok(Question {
            qname,
            qtype,
            qclass,
            offset,
            length: cursor.position() - offset,
        })
    }
}

impl ResourceRecord {
    /// Reads the record starting at `offset` of `data`
    ///
    /// Records whose data can't be interpreted fail as a whole, nothing is
    /// returned for them.
    pub fn parse(data: &[u8], offset: usize, authoritative: bool) -> Result<ResourceRecord, Error> {
        let mut cursor = Cursor::new(data, offset);
        let name = Name::read(&mut cursor)?;
        let typ = cursor.read_u16()?;
        let class = Class::from_value(cursor.read_u16()?);
        let ttl = cursor.read_u32()?;
        let rdlength = cursor.read_u16()?;
        let rdata = cursor.take(usize::from(rdlength))?;

        let typ = Type::from_value(typ).ok_or(Error::UnsupportedRecordType(typ))?;
        let data = RRData::parse(typ, rdata)?;

        let mut record = ResourceRecord::with_class(name, class, ttl, data);
        record.offset = offset;
        record.length = cursor.position() - offset;
        record.authoritative = authoritative;
        Ok(record)
    }

    /// Returns the offset right after the record at `offset`, whatever its type
    pub fn skip(data: &[u8], offset: usize) -> Result<usize, Error> {
        let mut cursor = Cursor::new(data, offset);
        Name::read(&mut cursor)?;
        // type, class, ttl
        cursor.skip(8)?;
        let rdlength = cursor.read_u16()?;
        cursor.skip(usize::from(rdlength))?;
        Ok(cursor.position())
    }
}

impl Message {
    /// Parses a whole packet
    ///
    /// Exactly as many entries as the header announces are read for every
    /// section. Any record that fails to parse fails the whole packet.
    pub fn parse(data: &[u8]) -> Result<Message, Error> {
        Message::parse_with(data, false)
    }

    /// Parses a packet, dropping records of types without data support
    ///
    /// The header counts of the result match the records that were kept.
    pub fn parse_lenient(data: &[u8]) -> Result<Message, Error> {
        Message::parse_with(data, true)
    }

    fn parse_with(data: &[u8], lenient: bool) -> Result<Message, Error> {
        let mut header = Header::parse(data)?;
        let mut offset = HEADER_LEN;

        let mut questions = Vec::new();
        for _ in 0..header.questions {
            let question = Question::parse(data, offset)?;
            offset += question.length;
            questions.push(question);
        }

        let answers = parse_records(data, &mut offset, header.answers, lenient)?;
        let nameservers = parse_records(data, &mut offset, header.nameservers, lenient)?;
        let additional = parse_records(data, &mut offset, header.additional, lenient)?;

        header.answers = answers.len() as u16;
        header.nameservers = nameservers.len() as u16;
        header.additional = additional.len() as u16;

        Ok(Message {
            header,
            questions,
            answers,
            nameservers,
            additional,
            length: offset,
        })
    }
}

fn parse_records(
    data: &[u8],
    offset: &mut usize,
    count: u16,
    lenient: bool,
) -> Result<Vec<ResourceRecord>, Error> {
    let mut records = Vec::new();
    for _ in 0..count {
        match ResourceRecord::parse(data, *offset, false) {
            Ok(record) => {
                *offset += record.length;
                records.push(record);
            }
            Err(Error::UnsupportedRecordType(typ)) if lenient => {
                trace!("skipping record of type {} at {}", typ, *offset);
                *offset = ResourceRecord::skip(data, *offset)?;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(records)
}
