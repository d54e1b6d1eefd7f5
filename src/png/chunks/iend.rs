use super::{write_chunk, WritableChunk};

pub(crate) const HEADER: &[u8; 4] = b"IEND";

pub(crate) struct IENDChunk;
impl WritableChunk for IENDChunk {
    fn to_bytes(&self) -> Vec<u8> {
        write_chunk(HEADER, &[])
    }
}
