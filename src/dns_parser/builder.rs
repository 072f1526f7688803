use std::marker::PhantomData;

use byteorder::{BigEndian, ByteOrder};

use super::cursor::{put_u16, put_u32};
use super::error::required;
use super::header::HEADER_LEN;
use super::name::Compression;
use super::{Error, Header, Question, ResourceRecord};

pub enum Questions {}
pub enum Answers {}
pub enum Nameservers {}
pub enum Additional {}

pub trait MoveTo<T> {}
impl<T> MoveTo<T> for T {}

impl MoveTo<Answers> for Questions {}

impl MoveTo<Nameservers> for Questions {}
impl MoveTo<Nameservers> for Answers {}

impl MoveTo<Additional> for Questions {}
impl MoveTo<Additional> for Answers {}
impl MoveTo<Additional> for Nameservers {}

/// Allows to build a DNS packet
///
/// Sections must be written in packet order, which the type parameter
/// enforces. All names share one compression table, so a name can point
/// at any name written before it.
pub struct Builder<S> {
    buf: Vec<u8>,
    max_size: Option<usize>,
    names: Compression,
    _state: PhantomData<S>,
}

impl Builder<Questions> {
    /// Starts a packet with `header`
    ///
    /// Section counts are taken from what is added afterwards, not from
    /// `header`. If the header has no id yet, the generated one is stored
    /// back into it.
    pub fn new(header: &mut Header) -> Result<Builder<Questions>, Error> {
        let mut head = header.clone();
        head.questions = 0;
        head.answers = 0;
        head.nameservers = 0;
        head.additional = 0;

        let mut buf = Vec::with_capacity(512);
        buf.extend([0u8; HEADER_LEN].iter());
        head.write(&mut buf[..HEADER_LEN])?;
        header.id = head.id;

        Ok(Builder {
            buf,
            max_size: Some(512),
            names: Compression::new(),
            _state: PhantomData,
        })
    }
}

impl<T> Builder<T> {
    fn write_rr(&mut self, record: &mut ResourceRecord) -> Result<(), Error> {
        let class = required("class", record.class)?;
        let start = self.buf.len();

        record.name.write_to(&mut self.buf, &mut self.names);
        put_u16(&mut self.buf, record.typ().value());
        put_u16(&mut self.buf, class.value());
        put_u32(&mut self.buf, record.ttl);

        let size_offset = self.buf.len();
        put_u16(&mut self.buf, 0);

        let data_offset = self.buf.len();
        record.data.write_to(&mut self.buf);
        let data_size = self.buf.len() - data_offset;

        BigEndian::write_u16(
            &mut self.buf[size_offset..size_offset + 2],
            data_size as u16,
        );

        record.offset = start;
        record.length = self.buf.len() - start;
        Ok(())
    }

    /// Returns the final packet
    ///
    /// When packet is not truncated method returns `Ok(packet)`. If
    /// packet is truncated the method returns `Err(packet)`. In both
    /// cases the packet is fully valid.
    ///
    /// In the server implementation you may use
    /// `x.build().unwrap_or_else(|x| x)`.
    pub fn build(mut self) -> Result<Vec<u8>, Vec<u8>> {
        match self.max_size {
            Some(max_size) if self.buf.len() > max_size => {
                Header::set_truncated(&mut self.buf[..HEADER_LEN]);
                Err(self.buf)
            }
            _ => Ok(self.buf),
        }
    }

    pub fn move_to<U>(self) -> Builder<U>
    where
        T: MoveTo<U>,
    {
        Builder {
            buf: self.buf,
            max_size: self.max_size,
            names: self.names,
            _state: PhantomData,
        }
    }

    pub fn set_max_size(&mut self, max_size: Option<usize>) {
        self.max_size = max_size;
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        Header::question_count(&self.buf) == 0
            && Header::answer_count(&self.buf) == 0
            && Header::nameserver_count(&self.buf) == 0
            && Header::additional_count(&self.buf) == 0
    }
}

impl<T: MoveTo<Questions>> Builder<T> {
    /// Adds a question to the packet
    ///
    /// Records where the question landed in `question`.
    pub fn add_question(self, question: &mut Question) -> Result<Builder<Questions>, Error> {
        let qtype = required("qtype", question.qtype)?;
        let qclass = required("qclass", question.qclass)?;
        let mut builder = self.move_to::<Questions>();

        let start = builder.buf.len();
        question.qname.write_to(&mut builder.buf, &mut builder.names);
        put_u16(&mut builder.buf, qtype.value());
        put_u16(&mut builder.buf, qclass.value());
        question.offset = start;
        question.length = builder.buf.len() - start;

        Header::inc_questions(&mut builder.buf)
            .ok_or_else(|| Error::Protocol("too many questions".into()))?;
        Ok(builder)
    }
}

impl<T: MoveTo<Answers>> Builder<T> {
    pub fn add_answer(self, record: &mut ResourceRecord) -> Result<Builder<Answers>, Error> {
        let mut builder = self.move_to::<Answers>();

        builder.write_rr(record)?;
        Header::inc_answers(&mut builder.buf)
            .ok_or_else(|| Error::Protocol("too many answers".into()))?;

        Ok(builder)
    }
}

impl<T: MoveTo<Nameservers>> Builder<T> {
    pub fn add_nameserver(
        self,
        record: &mut ResourceRecord,
    ) -> Result<Builder<Nameservers>, Error> {
        let mut builder = self.move_to::<Nameservers>();

        builder.write_rr(record)?;
        Header::inc_nameservers(&mut builder.buf)
            .ok_or_else(|| Error::Protocol("too many nameservers".into()))?;

        Ok(builder)
    }
}

impl Builder<Additional> {
    pub fn add_additional(self, record: &mut ResourceRecord) -> Result<Builder<Additional>, Error> {
        let mut builder = self.move_to::<Additional>();

        builder.write_rr(record)?;
        Header::inc_additional(&mut builder.buf)
            .ok_or_else(|| Error::Protocol("too many additional records".into()))?;

        Ok(builder)
    }
}
