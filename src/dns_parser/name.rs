use std::fmt;
use std::str::FromStr;

use super::cursor::Cursor;
use super::Error;

/// Upper bound on compression pointers followed while reading one name
///
/// A name can't have more than 127 labels, so a well formed packet never
/// needs more hops than that.
pub const MAX_POINTER_HOPS: usize = 127;

const MAX_LABEL_LEN: usize = 63;
const MAX_NAME_LEN: usize = 255;
const POINTER_MASK: u8 = 0b1100_0000;
const MAX_POINTER_OFFSET: usize = 0x3FFF;

/// A domain name as a sequence of labels
///
/// Label bytes are mapped one to one onto chars, names are kept exactly as
/// they were read (no case folding). The root name has no labels and
/// displays as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Name {
    labels: Vec<String>,
}

impl Name {
    pub fn root() -> Name {
        Name { labels: Vec::new() }
    }

    pub fn from_labels<I, S>(labels: I) -> Result<Name, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let mut wire_len = 1;
        for label in &labels {
            if label.is_empty() {
                return Err(Error::UnknownLabelFormat);
            }
            if label.chars().any(|c| c as u32 > 0xFF) {
                return Err(Error::LabelIsNotAscii);
            }
            if label.chars().count() > MAX_LABEL_LEN {
                return Err(Error::LabelTooLong(label.clone()));
            }
            wire_len += label.chars().count() + 1;
        }
        if wire_len > MAX_NAME_LEN {
            return Err(Error::NameTooLong);
        }
        Ok(Name { labels })
    }

    /// Reads a name starting at `offset` of the packet `original`
    ///
    /// Returns the name and the offset right after it. A name ends either
    /// with a zero length octet or with a pointer, never both.
    pub fn scan(original: &[u8], offset: usize) -> Result<(Name, usize), Error> {
        let mut cursor = Cursor::new(original, offset);
        let name = Name::read(&mut cursor)?;
        Ok((name, cursor.position()))
    }

    pub fn read(cursor: &mut Cursor) -> Result<Name, Error> {
        let mut labels = Vec::new();
        let mut wire_len = 1;
        let mut hops = 0;
        let mut end = None;
        let mut reader = *cursor;

        loop {
            let byte = reader.read_u8()?;
            if byte == 0 {
                break;
            } else if byte & POINTER_MASK == POINTER_MASK {
                let low = reader.read_u8()?;
                if end.is_none() {
                    end = Some(reader.position());
                }
                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(Error::CompressionLoop(MAX_POINTER_HOPS));
                }
                let target = (usize::from(byte & !POINTER_MASK) << 8) | usize::from(low);
                reader.set_position(target);
            } else if byte & POINTER_MASK == 0 {
                let label = reader.take(usize::from(byte))?;
                wire_len += label.len() + 1;
                if wire_len > MAX_NAME_LEN {
                    return Err(Error::NameTooLong);
                }
                labels.push(label.iter().map(|&b| char::from(b)).collect());
            } else {
                return Err(Error::UnknownLabelFormat);
            }
        }

        cursor.set_position(end.unwrap_or_else(|| reader.position()));
        Ok(Name { labels })
    }

    /// Encodes the name for a packet position `offset`
    ///
    /// The longest suffix already present in `table` is replaced by a
    /// pointer. Labels written literally are added to `table` so that later
    /// names can point at them. An empty table gives the plain encoding.
    pub fn encode(&self, offset: usize, table: &mut Compression) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.wire_len());
        for (idx, label) in self.labels.iter().enumerate() {
            let suffix = &self.labels[idx..];
            if let Some(target) = table.find(suffix) {
                buf.push(POINTER_MASK | (target >> 8) as u8);
                buf.push(target as u8);
                return buf;
            }
            table.insert(suffix, offset + buf.len());
            buf.push(label.chars().count() as u8);
            buf.extend(label.chars().map(|c| c as u8));
        }
        buf.push(0);
        buf
    }

    pub fn write_to(&self, buf: &mut Vec<u8>, table: &mut Compression) {
        let encoded = self.encode(buf.len(), table);
        buf.extend_from_slice(&encoded);
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// The name made of the last `count` labels
    pub fn suffix(&self, count: usize) -> Name {
        let start = self.labels.len().saturating_sub(count);
        Name {
            labels: self.labels[start..].to_vec(),
        }
    }

    /// Size of the uncompressed encoding
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.chars().count() + 1).sum::<usize>() + 1
    }

    pub fn eq_ignore_case(&self, other: &Name) -> bool {
        self.labels.len() == other.labels.len()
            && self
                .labels
                .iter()
                .zip(&other.labels)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl FromStr for Name {
    type Err = Error;

    /// Parses a dot separated name, a trailing dot is allowed
    fn from_str(name: &str) -> Result<Name, Error> {
        let name = name.strip_suffix('.').unwrap_or(name);
        if name.is_empty() {
            return Ok(Name::root());
        }
        Name::from_labels(name.split('.'))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.labels.join("."))
    }
}

/// Names already written to a packet, by label suffix
///
/// One table is threaded through every name of a message so that answers
/// can point back into the question section.
#[derive(Debug, Clone, Default)]
pub struct Compression {
    suffixes: Vec<(Vec<String>, u16)>,
}

impl Compression {
    pub fn new() -> Compression {
        Compression::default()
    }

    fn find(&self, suffix: &[String]) -> Option<u16> {
        self.suffixes
            .iter()
            .find(|(known, _)| known.as_slice() == suffix)
            .map(|&(_, offset)| offset)
    }

    fn insert(&mut self, suffix: &[String], offset: usize) {
        if offset <= MAX_POINTER_OFFSET {
            self.suffixes.push((suffix.to_vec(), offset as u16));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }
}
