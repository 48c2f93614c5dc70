// Code generated by structwire-gen; DO NOT EDIT.
// Source: sensor.toml

#[allow(dead_code)]
pub type Celsius = f32;

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub magic: u32,
    pub offset: i16,
}

#[allow(dead_code, clippy::unnecessary_cast, clippy::useless_conversion, clippy::redundant_closure_call)]
impl Header {
    /// Bytes occupied by the fixed-size fields.
    pub const WIRE_FIXED_SIZE: usize = 6;

    /// Decode a `Header` from a reader.
    pub fn read_from<R: ::std::io::Read + ?Sized>(r: &mut R) -> ::std::io::Result<Self> {
        let mut buf: ::std::vec::Vec<u8> = ::std::vec![0u8; 6];
        ::std::io::Read::read_exact(r, &mut buf[..6])?;
        let f_magic: u32 = u32::from(buf[0]) | u32::from(buf[1]) << 8 | u32::from(buf[2]) << 16 | u32::from(buf[3]) << 24;
        let f_offset: i16 = (u16::from(buf[4]) | u16::from(buf[5]) << 8) as i16;
        ::std::result::Result::Ok(Self { magic: f_magic, offset: f_offset })
    }

    /// Encode into `w`; returns the number of bytes written.
    pub fn write_to<W: ::std::io::Write + ?Sized>(&self, w: &mut W) -> ::std::io::Result<usize> {
        let mut buf: ::std::vec::Vec<u8> = ::std::vec::Vec::with_capacity(6usize);
        {
            let v: u32 = self.magic;
            buf.extend_from_slice(&[v as u8, (v >> 8) as u8, (v >> 16) as u8, (v >> 24) as u8]);
        }
        {
            let v: u16 = self.offset as u16;
            buf.extend_from_slice(&[v as u8, (v >> 8) as u8]);
        }
        ::std::io::Write::write_all(w, &buf)?;
        ::std::result::Result::Ok(buf.len())
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub count: u8,
    pub samples: Vec<Celsius>,
    pub crc: u16,
}

#[allow(dead_code, clippy::unnecessary_cast, clippy::useless_conversion, clippy::redundant_closure_call)]
impl Reading {
    /// Bytes occupied by the fixed-size fields.
    pub const WIRE_FIXED_SIZE: usize = 3;

    /// Decode a `Reading` from a reader.
    pub fn read_from<R: ::std::io::Read + ?Sized>(r: &mut R) -> ::std::io::Result<Self> {
        let mut buf: ::std::vec::Vec<u8> = ::std::vec![0u8; 2];
        ::std::io::Read::read_exact(r, &mut buf[..1])?;
        let f_count: u8 = buf[0];
        let len_samples: usize = ::std::option::Option::Some(u64::from(f_count))
            .and_then(|v| <usize as ::core::convert::TryFrom<u64>>::try_from(v).ok())
            .ok_or_else(|| ::std::io::Error::new(::std::io::ErrorKind::InvalidData, "length of 'samples' is out of range"))?;
        let nbytes_samples = len_samples.checked_mul(4).ok_or_else(|| ::std::io::Error::new(::std::io::ErrorKind::InvalidData, "byte length of 'samples' overflows usize"))?;
        {
            let mut filled = 0usize;
            while filled < nbytes_samples {
                let end = nbytes_samples.min(filled.saturating_add(65536));
                if buf.len() < end {
                    buf.resize(end, 0);
                }
                ::std::io::Read::read_exact(r, &mut buf[filled..end])?;
                filled = end;
            }
        }
        let mut f_samples: ::std::vec::Vec<Celsius> = ::std::vec![::core::default::Default::default(); len_samples];
        for (i, v) in f_samples.iter_mut().enumerate() {
            let p = i * 4;
            *v = f32::from_bits(u32::from(buf[p]) | u32::from(buf[p + 1]) << 8 | u32::from(buf[p + 2]) << 16 | u32::from(buf[p + 3]) << 24) as Celsius;
        }
        ::std::io::Read::read_exact(r, &mut buf[..2])?;
        let f_crc: u16 = u16::from(buf[0]) | u16::from(buf[1]) << 8;
        ::std::result::Result::Ok(Self { count: f_count, samples: f_samples, crc: f_crc })
    }

    /// Encode into `w`; returns the number of bytes written.
    pub fn write_to<W: ::std::io::Write + ?Sized>(&self, w: &mut W) -> ::std::io::Result<usize> {
        let len_samples: usize = ::std::option::Option::Some(u64::from(self.count))
            .and_then(|v| <usize as ::core::convert::TryFrom<u64>>::try_from(v).ok())
            .ok_or_else(|| ::std::io::Error::new(::std::io::ErrorKind::InvalidInput, "length of 'samples' is out of range"))?;
        if self.samples.len() != len_samples {
            return ::std::result::Result::Err(::std::io::Error::new(::std::io::ErrorKind::InvalidInput, ::std::format!("'samples' holds {} elements, its length expression requires {}", self.samples.len(), len_samples)));
        }
        let mut buf: ::std::vec::Vec<u8> = ::std::vec::Vec::with_capacity(3usize.saturating_add(len_samples.saturating_mul(4)));
        {
            let v: u8 = self.count;
            buf.push(v);
        }
        for e in self.samples.iter() {
            let v: u32 = e.to_bits();
            buf.extend_from_slice(&[v as u8, (v >> 8) as u8, (v >> 16) as u8, (v >> 24) as u8]);
        }
        {
            let v: u16 = self.crc;
            buf.extend_from_slice(&[v as u8, (v >> 8) as u8]);
        }
        ::std::io::Write::write_all(w, &buf)?;
        ::std::result::Result::Ok(buf.len())
    }
}
