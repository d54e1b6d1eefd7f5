use nom::{
    bytes::complete::take,
    combinator::map,
    error::{make_error, ErrorKind},
    multi::count,
    IResult,
};

use super::ParseableChunk;

pub(crate) const HEADER: &[u8; 4] = b"PLTE";

#[derive(Debug, Clone)]
pub(crate) struct PLTEChunk {
    colors: Vec<[u8; 3]>,
}
impl PLTEChunk {
    pub(crate) fn get_color(&self, index: u8) -> Option<[u8; 3]> {
        self.colors.get(index as usize).copied()
    }
}
impl<'a> ParseableChunk<'a> for PLTEChunk {
    fn from_bytes(chunk_data: &'a [u8]) -> IResult<&'a [u8], Self> {
        // 1 to 256 entries of three bytes each
        if chunk_data.len() % 3 != 0 || !(3..=256 * 3).contains(&chunk_data.len()) {
            return Err(nom::Err::Error(make_error(chunk_data, ErrorKind::LengthValue)));
        }
        let (rest, colors) = count(
            map(take(3usize), |entry: &[u8]| [entry[0], entry[1], entry[2]]),
            chunk_data.len() / 3,
        )(chunk_data)?;
        Ok((rest, PLTEChunk { colors }))
    }
}
