use byteorder::{BigEndian, ByteOrder};

use super::Error;

/// Bounds-checked big-endian reader over a whole packet
///
/// The cursor always sees the complete packet so that compression pointers
/// can be followed from any position.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8], pos: usize) -> Cursor<'a> {
        Cursor { data, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn original(&self) -> &'a [u8] {
        self.data
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        let byte = *self.data.get(self.pos).ok_or(Error::UnexpectedEOF)?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let end = self.pos.checked_add(len).ok_or(Error::UnexpectedEOF)?;
        if end > self.data.len() {
            return Err(Error::UnexpectedEOF);
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.take(len).map(|_| ())
    }
}

/// Appends `value` to `buf` in network byte order
pub fn put_u16(buf: &mut Vec<u8>, value: u16) {
    let mut bytes = [0u8; 2];
    BigEndian::write_u16(&mut bytes, value);
    buf.extend_from_slice(&bytes);
}

/// Appends `value` to `buf` in network byte order
pub fn put_u32(buf: &mut Vec<u8>, value: u32) {
    let mut bytes = [0u8; 4];
    BigEndian::write_u32(&mut bytes, value);
    buf.extend_from_slice(&bytes);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reads_big_endian() {
        let data = [0x12, 0x34, 0x00, 0x00, 0x00, 0x9a, 0xff];
        let mut cursor = Cursor::new(&data, 0);
        assert_eq!(cursor.read_u16().unwrap(), 0x1234);
        assert_eq!(cursor.read_u32().unwrap(), 0x9a);
        assert_eq!(cursor.read_u8().unwrap(), 0xff);
        assert_eq!(cursor.position(), 7);
    }

    #[test]
    fn ttl_uses_every_byte() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut cursor = Cursor::new(&data, 0);
        assert_eq!(cursor.read_u32().unwrap(), 0x0102_0304);
    }

    #[test]
    fn writes_big_endian() {
        let mut buf = Vec::new();
        put_u16(&mut buf, 0xb16a);
        put_u32(&mut buf, 0x9a);
        assert_eq!(buf, vec![0xb1, 0x6a, 0x00, 0x00, 0x00, 0x9a]);
    }

    #[test]
    fn out_of_bounds() {
        let data = [0x00, 0x01, 0x02];
        let mut cursor = Cursor::new(&data, 2);
        assert_eq!(cursor.read_u16(), Err(Error::UnexpectedEOF));
        // a failed read doesn't move the cursor
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.read_u8().unwrap(), 0x02);
        assert_eq!(cursor.read_u8(), Err(Error::UnexpectedEOF));
    }
}
