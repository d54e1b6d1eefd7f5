use nom::{
    bytes::complete::take, combinator::map_res, number::complete::be_u32, sequence::tuple,
    IResult,
};

use super::{crc::calculate_crc, DecodeError};

pub(crate) mod idat;
pub(crate) mod iend;
pub(crate) mod ihdr;
pub(crate) mod plte;
pub(crate) mod trns;

#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug)]
pub(crate) enum Chunk<'a> {
    IHDR(ihdr::IHDRChunk),
    PLTE(plte::PLTEChunk),
    tRNS(trns::tRNSChunk<'a>),
    IDAT(idat::IDATChunk<'a>),
    IEND,
    Unknown(RawChunk<'a>),
}

pub(crate) fn iter_chunks(source: &[u8]) -> ChunkIter<'_> {
    ChunkIter {
        source,
        finished: false,
    }
}

pub(crate) struct ChunkIter<'a> {
    source: &'a [u8],
    finished: bool,
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = Result<Chunk<'a>, DecodeError>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.source.is_empty() {
            return None;
        }
        match parse_chunk(self.source) {
            Ok((rest, chunk)) => {
                self.source = rest;
                if matches!(chunk, Chunk::IEND) {
                    self.finished = true;
                }
                Some(Ok(chunk))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

fn parse_chunk(input: &[u8]) -> Result<(&[u8], Chunk<'_>), DecodeError> {
    let (rest, raw) = raw_chunk(input).map_err(|_| DecodeError::Truncated)?;
    raw.verify_crc()?;
    let chunk = match raw.chunk_type {
        ihdr::HEADER => Chunk::IHDR(parse_body(&raw)?),
        plte::HEADER => Chunk::PLTE(parse_body(&raw)?),
        trns::HEADER => Chunk::tRNS(parse_body(&raw)?),
        idat::HEADER => Chunk::IDAT(parse_body(&raw)?),
        iend::HEADER => Chunk::IEND,
        _ => Chunk::Unknown(raw),
    };
    Ok((rest, chunk))
}

fn parse_body<'a, C: ParseableChunk<'a>>(raw: &RawChunk<'a>) -> Result<C, DecodeError> {
    C::from_bytes(raw.data)
        .map(|(_, chunk)| chunk)
        .map_err(|_| DecodeError::MalformedChunk(raw.name()))
}

#[derive(Debug)]
pub(crate) struct RawChunk<'a> {
    chunk_type: &'a [u8; 4],
    data: &'a [u8],
    crc: u32,
}
impl RawChunk<'_> {
    pub(crate) fn name(&self) -> String {
        String::from_utf8_lossy(self.chunk_type).into_owned()
    }

    /// Bit 5 of the first type byte is clear for chunks a decoder must understand.
    pub(crate) fn is_critical(&self) -> bool {
        self.chunk_type[0] & 0x20 == 0
    }

    fn verify_crc(&self) -> Result<(), DecodeError> {
        let crc = calculate_crc(self.chunk_type.iter().chain(self.data).copied());
        if crc != self.crc {
            return Err(DecodeError::Crc(self.name()));
        }
        Ok(())
    }
}

fn raw_chunk<'a>(input: &'a [u8]) -> IResult<&'a [u8], RawChunk<'a>> {
    let (input, length) = be_u32(input)?;
    let (input, (chunk_type, data, crc)) = tuple((
        map_res(take(4usize), |bytes: &'a [u8]| <&'a [u8; 4]>::try_from(bytes)),
        take(length as usize),
        be_u32,
    ))(input)?;
    Ok((
        input,
        RawChunk {
            chunk_type,
            data,
            crc,
        },
    ))
}

/// Frames `data` as a chunk: big-endian length, type, data and CRC over type + data.
pub(crate) fn write_chunk(chunk_type: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(data.len() + 12);
    bytes.extend((data.len() as u32).to_be_bytes());
    bytes.extend(chunk_type);
    bytes.extend(data);
    let crc = calculate_crc(bytes[4..].iter().copied()).to_be_bytes();
    bytes.extend(crc);
    bytes
}

pub(crate) trait ParseableChunk<'a>: Sized {
    fn from_bytes(chunk_data: &'a [u8]) -> IResult<&'a [u8], Self>;
}

pub(crate) trait WritableChunk {
    fn to_bytes(&self) -> Vec<u8>;
}
