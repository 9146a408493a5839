//! Binary serialization/deserialization trait for authorization wire types.
//!
//! All integers on the wire are big-endian.
use crate::util::Result;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io;
use std::io::{Read, Write};

/// An object that may be serialized and deserialized.
pub trait Serializable<T> {
    /// Reads the object from serialized form.
    ///
    /// # Errors
    /// Propagates IO errors or invalid data.
    fn read(reader: &mut dyn Read) -> Result<T>
    where
        Self: Sized;
    /// Writes the object to serialized form.
    ///
    /// # Errors
    /// IO errors.
    fn write(&self, writer: &mut dyn Write) -> io::Result<()>;
}

impl Serializable<u8> for u8 {
    fn read(reader: &mut dyn Read) -> Result<u8> {
        Ok(reader.read_u8()?)
    }
    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_u8(*self)
    }
}

impl Serializable<u16> for u16 {
    fn read(reader: &mut dyn Read) -> Result<u16> {
        Ok(reader.read_u16::<BigEndian>()?)
    }
    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_u16::<BigEndian>(*self)
    }
}

impl Serializable<u32> for u32 {
    fn read(reader: &mut dyn Read) -> Result<u32> {
        Ok(reader.read_u32::<BigEndian>()?)
    }
    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_u32::<BigEndian>(*self)
    }
}

impl Serializable<u64> for u64 {
    fn read(reader: &mut dyn Read) -> Result<u64> {
        Ok(reader.read_u64::<BigEndian>()?)
    }
    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_u64::<BigEndian>(*self)
    }
}
