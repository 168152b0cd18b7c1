//! The Exp-Golomb bit reader used by [`crate::avc`] to pull width/height and
//! profile/level fields out of a raw SPS NAL unit payload.
use std::io::Read;

use byteorder::ReadBytesExt;

use crate::Result;

#[derive(Debug)]
pub(crate) struct AvcBitReader<R> {
    stream: R,
    byte: u8,
    bit_offset: usize,
}
impl<R: Read> AvcBitReader<R> {
    pub fn new(stream: R) -> Self {
        AvcBitReader {
            stream,
            byte: 0,
            bit_offset: 8,
        }
    }

    pub fn read_bit(&mut self) -> Result<u8> {
        if self.bit_offset == 8 {
            self.byte = track_io!(self.stream.read_u8())?;
            self.bit_offset = 0;
        }
        let bit = (self.byte >> (7 - self.bit_offset)) & 0b1;
        self.bit_offset += 1;
        Ok(bit)
    }

    pub fn read_ue(&mut self) -> Result<u64> {
        track!(self.read_exp_golomb_code())
    }

    fn read_exp_golomb_code(&mut self) -> Result<u64> {
        let mut leading_zeros = 0;
        while 0 == track!(self.read_bit())? {
            leading_zeros += 1;
        }
        let mut n = 0;
        for _ in 0..leading_zeros {
            let bit = track!(self.read_bit())?;
            n = (n << 1) | u64::from(bit);
        }
        n += 2u64.pow(leading_zeros) - 1;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_a_zero_valued_exp_golomb_code() {
        let mut r = AvcBitReader::new(&[0b1000_0000u8][..]);
        assert_eq!(r.read_ue().unwrap(), 0);
    }

    #[test]
    fn reads_a_multi_bit_exp_golomb_code() {
        // 011 010 -> leading_zeros=1, payload bit=1, n = 1 + (2^1 - 1) = 2
        let mut r = AvcBitReader::new(&[0b0110_1000u8][..]);
        assert_eq!(r.read_ue().unwrap(), 2);
    }
}
