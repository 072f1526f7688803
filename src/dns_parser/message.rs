use super::builder::{Additional, Answers, Builder, Nameservers};
use super::header::HeaderFields;
use super::{Error, Header, Opcode, Question, ResourceRecord, ResponseCode};

/// A whole DNS packet
///
/// The header counts always describe the sections once the message has
/// been parsed or encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub nameservers: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
    /// Size of the packet as last parsed or encoded
    pub length: usize,
}

/// Values to fill a message with, `None` keeps what the message has
#[derive(Debug, Clone, Default)]
pub struct MessageProperties {
    pub header: HeaderFields,
    pub questions: Option<Vec<Question>>,
    pub answers: Option<Vec<ResourceRecord>>,
    pub nameservers: Option<Vec<ResourceRecord>>,
    pub additional: Option<Vec<ResourceRecord>>,
}

impl Message {
    /// An empty standard query without an id
    pub fn new() -> Message {
        Message::default()
    }

    /// A standard query with a single question
    pub fn query(id: u16, question: Question, recursion: bool) -> Message {
        let mut message = Message::new();
        message.header.id = Some(id);
        message.header.recursion_desired = recursion;
        message.questions.push(question);
        message.sync_counts();
        message
    }

    /// An empty response to `query`
    ///
    /// Copies the id, opcode, recursion desired flag and the question
    /// section. Everything else is left for the resolver to fill in.
    pub fn response_to(query: &Message) -> Message {
        let mut response = Message::new();
        response.header.id = query.header.id;
        response.header.opcode = query.header.opcode.or(Some(Opcode::StandardQuery));
        response.header.recursion_desired = query.header.recursion_desired;
        response.header.query = false;
        response.questions = query.questions.clone();
        response.sync_counts();
        response
    }

    pub fn set_properties(&mut self, properties: MessageProperties) {
        self.header.apply(&properties.header);
        if let Some(questions) = properties.questions {
            self.questions = questions;
        }
        if let Some(answers) = properties.answers {
            self.answers = answers;
        }
        if let Some(nameservers) = properties.nameservers {
            self.nameservers = nameservers;
        }
        if let Some(additional) = properties.additional {
            self.additional = additional;
        }
        self.sync_counts();
    }

    /// Whether the message looks like a plain query
    ///
    /// Anything carrying response flags, a response code or records outside
    /// the question section is rejected.
    pub fn is_valid_query(&self) -> bool {
        let header = &self.header;
        header.query
            && !header.authoritative
            && !header.truncated
            && header.z() == 0
            && !header.recursion_available
            && header.response_code == Some(ResponseCode::NoError)
            && header.answers == 0
            && header.nameservers == 0
            && header.additional == 0
            && self.answers.is_empty()
            && self.nameservers.is_empty()
            && self.additional.is_empty()
    }

    /// Turns the message into a response in place
    ///
    /// Sections are left alone, they must be filled beforehand.
    pub fn set_as_response(
        &mut self,
        authoritative: bool,
        truncated: bool,
        recursion_available: bool,
        response_code: ResponseCode,
    ) {
        self.header.query = false;
        self.header.authoritative = authoritative;
        self.header.truncated = truncated;
        self.header.recursion_available = recursion_available;
        self.header.response_code = Some(response_code);
    }

    /// Encodes the message, compressing names across all sections
    ///
    /// Recomputes the header counts, the position of every entry and the
    /// message length.
    pub fn encode(&mut self) -> Result<Vec<u8>, Error> {
        self.encode_limited(None).map(|packet| packet.unwrap_or_else(|x| x))
    }

    /// Encodes the message, flagging it truncated when above `max_size`
    ///
    /// `Ok(Err(packet))` is a packet with the TC bit set.
    pub fn encode_limited(
        &mut self,
        max_size: Option<usize>,
    ) -> Result<Result<Vec<u8>, Vec<u8>>, Error> {
        let mut builder = Builder::new(&mut self.header)?;
        builder.set_max_size(max_size);

        for question in &mut self.questions {
            builder = builder.add_question(question)?;
        }
        let mut builder = builder.move_to::<Answers>();
        for answer in &mut self.answers {
            builder = builder.add_answer(answer)?;
        }
        let mut builder = builder.move_to::<Nameservers>();
        for nameserver in &mut self.nameservers {
            builder = builder.add_nameserver(nameserver)?;
        }
        let mut builder = builder.move_to::<Additional>();
        for additional in &mut self.additional {
            builder = builder.add_additional(additional)?;
        }

        self.sync_counts();
        let packet = builder.build();
        self.length = match packet {
            Ok(ref buf) | Err(ref buf) => buf.len(),
        };
        Ok(packet)
    }

    fn sync_counts(&mut self) {
        self.header.questions = self.questions.len() as u16;
        self.header.answers = self.answers.len() as u16;
        self.header.nameservers = self.nameservers.len() as u16;
        self.header.additional = self.additional.len() as u16;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dns_parser::{Class, Name, RRData, Type};
    use std::net::Ipv4Addr;

    fn question(name: &str) -> Question {
        Question::new(name.parse().unwrap(), Type::A, Class::IN)
    }

    fn a_record(name: &str, ip: [u8; 4]) -> ResourceRecord {
        ResourceRecord::new(name.parse().unwrap(), Class::IN, 300, RRData::A(Ipv4Addr::from(ip)))
    }

    fn valid_query() -> Message {
        Message::query(0x1234, question("example.com"), true)
    }

    #[test]
    fn query_validation() {
        assert!(valid_query().is_valid_query());

        let flips: [fn(&mut Message); 12] = [
            |m: &mut Message| m.header.query = false,
            |m: &mut Message| m.header.authoritative = true,
            |m: &mut Message| m.header.truncated = true,
            |m: &mut Message| m.header.recursion_available = true,
            |m: &mut Message| m.header.response_code = Some(ResponseCode::NameError),
            |m: &mut Message| m.header.response_code = None,
            |m: &mut Message| m.header.answers = 1,
            |m: &mut Message| m.header.nameservers = 1,
            |m: &mut Message| m.header.additional = 1,
            |m: &mut Message| m.answers.push(a_record("example.com", [1, 2, 3, 4])),
            |m: &mut Message| m.nameservers.push(a_record("example.com", [1, 2, 3, 4])),
            |m: &mut Message| m.additional.push(a_record("example.com", [1, 2, 3, 4])),
        ];
        for (idx, flip) in flips.iter().enumerate() {
            let mut message = valid_query();
            flip(&mut message);
            assert!(!message.is_valid_query(), "flip {} still valid", idx);
        }
    }

    #[test]
    fn reserved_bits_fail_validation() {
        let data = b"\x00\x01\x01\x10\x00\x00\x00\x00\x00\x00\x00\x00";
        let message = Message::parse(data).unwrap();
        assert!(!message.is_valid_query());
    }

    #[test]
    fn set_as_response_keeps_sections() {
        let mut message = valid_query();
        message.answers.push(a_record("example.com", [1, 2, 3, 4]));
        message.set_as_response(true, false, true, ResponseCode::NoError);
        assert!(!message.header.query);
        assert!(message.header.authoritative);
        assert!(message.header.recursion_available);
        assert_eq!(message.answers.len(), 1);
        assert_eq!(message.questions.len(), 1);
    }

    #[test]
    fn encode_example_query() {
        let mut message = Message::query(0xb16a, question("www.google.com"), true);
        let encoded = message.encode().unwrap();
        let expected: &[u8] = b"\xb1\x6a\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\
            \x03www\x06google\x03com\x00\x00\x01\x00\x01";
        assert_eq!(&encoded[..], expected);
        assert_eq!(message.length, expected.len());
        assert_eq!(message.questions[0].offset, 12);
        assert_eq!(message.questions[0].length, 20);
    }

    #[test]
    fn answers_point_into_the_question() {
        let query = Message::query(0xb16a, question("www.google.com"), true);
        let mut response = Message::response_to(&query);
        response.answers.push(a_record("www.google.com", [172, 217, 0, 4]));
        response.set_as_response(false, false, true, ResponseCode::NoError);

        let encoded = response.encode().unwrap();
        assert_eq!(&encoded[32..34], b"\xc0\x0c");
        assert_eq!(response.header.answers, 1);
        assert_eq!(response.answers[0].offset, 32);
        assert_eq!(response.answers[0].length, 16);

        let parsed = Message::parse(&encoded).unwrap();
        assert_eq!(parsed.answers[0].name.to_string(), "www.google.com");
        assert_eq!(parsed.answers[0].data.to_string(), "172.217.0.4");
        assert_eq!(parsed.header.id, Some(0xb16a));
    }

    #[test]
    fn compression_spans_sections() {
        let mut message = Message::new();
        message.questions.push(question("www.example.com"));
        message.answers.push(a_record("www.example.com", [1, 1, 1, 1]));
        message.nameservers.push(a_record("ns.example.com", [2, 2, 2, 2]));
        message.additional.push(a_record("mail.example.com", [3, 3, 3, 3]));
        let encoded = message.encode().unwrap();

        let parsed = Message::parse(&encoded).unwrap();
        assert_eq!(parsed.nameservers[0].name.to_string(), "ns.example.com");
        assert_eq!(parsed.additional[0].name.to_string(), "mail.example.com");
        assert_eq!(parsed.header.nameservers, 1);
        assert_eq!(parsed.header.additional, 1);
        // ns.example.com written as \x02ns + pointer
        let ns_offset = message.nameservers[0].offset;
        assert_eq!(&encoded[ns_offset..ns_offset + 5], b"\x02ns\xc0\x10");
    }

    #[test]
    fn counts_follow_sections() {
        let mut message = valid_query();
        message.header.answers = 7;
        message.answers.push(a_record("example.com", [1, 2, 3, 4]));
        message.encode().unwrap();
        assert_eq!(message.header.answers, 1);
        assert_eq!(message.header.questions, 1);
    }

    #[test]
    fn set_properties_fills_the_message() {
        let mut message = Message::new();
        message.set_properties(MessageProperties {
            header: HeaderFields {
                id: Some(9),
                recursion_desired: Some(true),
                ..Default::default()
            },
            questions: Some(vec![question("example.org")]),
            ..Default::default()
        });
        assert_eq!(message.header.id, Some(9));
        assert_eq!(message.header.questions, 1);
        let encoded = message.encode().unwrap();
        let parsed = Message::parse(&encoded).unwrap();
        assert_eq!(parsed.questions[0].qname, "example.org".parse::<Name>().unwrap());
        assert!(parsed.header.recursion_desired);
    }

    #[test]
    fn unresolved_question_fails_to_encode() {
        let mut message = valid_query();
        message.questions[0].qtype = None;
        assert_eq!(
            message.encode(),
            Err(Error::Protocol("qtype cannot be null".into()))
        );
    }

    #[test]
    fn oversized_packets_are_truncated() {
        let mut message = valid_query();
        for idx in 0..40 {
            message.answers.push(a_record(&format!("host{}.example.com", idx), [10, 0, 0, idx]));
        }
        let packet = message.encode_limited(Some(512)).unwrap();
        let truncated = packet.unwrap_err();
        assert!(Header::parse(&truncated).unwrap().truncated);
    }

    #[test]
    fn generated_id_is_kept() {
        let mut message = Message::new();
        message.questions.push(question("example.com"));
        let first = message.encode().unwrap();
        let second = message.encode().unwrap();
        assert_eq!(first, second);
        assert!(message.header.id.is_some());
    }
}
