use super::{write_chunk, ParseableChunk, WritableChunk};
use nom::IResult;

pub(crate) const HEADER: &[u8; 4] = b"IDAT";

/// One slice of the zlib stream. An image may split its data over several.
#[derive(Debug)]
pub(crate) struct IDATChunk<'a> {
    pub(crate) data: &'a [u8],
}
impl<'a> ParseableChunk<'a> for IDATChunk<'a> {
    fn from_bytes(chunk_data: &'a [u8]) -> IResult<&'a [u8], Self> {
        Ok((&chunk_data[0..0], IDATChunk { data: chunk_data }))
    }
}
impl WritableChunk for IDATChunk<'_> {
    fn to_bytes(&self) -> Vec<u8> {
        write_chunk(HEADER, self.data)
    }
}
