//! Packed-bit helpers for navigation payloads.
//!
//! Bit positions are 0-based and counted MSB-first from the start of the
//! buffer, matching the RTKLIB convention.

/// Extract `len` bits starting at `pos` as an unsigned integer.
pub fn getbitu(buf: &[u8], pos: usize, len: usize) -> u32 {
    assert!(len >= 1 && len <= 32, "field length out of range: {len}");
    assert!(pos + len <= buf.len() * 8, "field exceeds payload");

    let mut bits: u32 = 0;
    for i in pos..pos + len {
        bits = (bits << 1) | ((buf[i / 8] >> (7 - i % 8)) & 1) as u32;
    }
    bits
}

/// Extract a two's-complement signed field.
pub fn getbits(buf: &[u8], pos: usize, len: usize) -> i32 {
    let bits = getbitu(buf, pos, len);
    if len == 32 || bits & (1 << (len - 1)) == 0 {
        return bits as i32;
    }
    (bits | (u32::MAX << len)) as i32
}

/// Extract a GLONASS sign-magnitude field: MSB is the sign, the rest the
/// magnitude.
pub fn getbitg(buf: &[u8], pos: usize, len: usize) -> i32 {
    let sign = getbitu(buf, pos, 1);
    let mag = getbitu(buf, pos + 1, len - 1) as i32;
    if sign != 0 { -mag } else { mag }
}

/// Store `val` as `len` unsigned bits starting at `pos`.
pub fn setbitu(buf: &mut [u8], pos: usize, len: usize, val: u32) {
    assert!(len >= 1 && len <= 32, "field length out of range: {len}");
    assert!(pos + len <= buf.len() * 8, "field exceeds payload");

    let mut mask: u32 = 1 << (len - 1);
    for i in pos..pos + len {
        if val & mask != 0 {
            buf[i / 8] |= 1 << (7 - i % 8);
        } else {
            buf[i / 8] &= !(1 << (7 - i % 8));
        }
        mask >>= 1;
    }
}

/// Store a sign-magnitude value (inverse of [`getbitg`]).
pub fn setbitg(buf: &mut [u8], pos: usize, len: usize, val: i32) {
    setbitu(buf, pos, 1, (val < 0) as u32);
    setbitu(buf, pos + 1, len - 1, val.unsigned_abs());
}

/// Pack a slice of 0/1 symbols MSB-first into bytes.
pub fn pack_bits(bits: &[u8], buf: &mut [u8]) {
    assert!(buf.len() * 8 >= bits.len());
    for (i, &b) in bits.iter().enumerate() {
        if b != 0 {
            buf[i / 8] |= 1 << (7 - i % 8);
        } else {
            buf[i / 8] &= !(1 << (7 - i % 8));
        }
    }
}

pub fn hex_str(data: &[u8], num_bits: usize) -> String {
    let mut s = String::new();
    for byte in &data[0..num_bits.div_ceil(8)] {
        s.push_str(&format!("{byte:02x}"));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_getbitu_across_bytes() {
        let buf = [0b1010_1100, 0b0101_0011];
        assert_eq!(getbitu(&buf, 0, 4), 0b1010);
        assert_eq!(getbitu(&buf, 6, 4), 0b0001);
        assert_eq!(getbitu(&buf, 8, 8), 0b0101_0011);
    }

    #[test]
    fn test_getbits_sign_extension() {
        let mut buf = [0u8; 4];
        setbitu(&mut buf, 3, 8, 0xff);
        assert_eq!(getbits(&buf, 3, 8), -1);
        setbitu(&mut buf, 3, 8, 0x7f);
        assert_eq!(getbits(&buf, 3, 8), 127);
    }

    #[test]
    fn test_sign_magnitude_round_trip() {
        let mut buf = [0u8; 11];
        for val in [-1234, -1, 0, 1, 1234] {
            setbitg(&mut buf, 17, 13, val);
            assert_eq!(getbitg(&buf, 17, 13), val);
        }
    }

    #[test]
    fn test_pack_bits() {
        let bits = [1, 0, 1, 0, 1, 1, 0, 0, 1, 1];
        let mut buf = [0u8; 2];
        pack_bits(&bits, &mut buf);
        assert_eq!(buf[0], 0b1010_1100);
        assert_eq!(getbitu(&buf, 8, 2), 0b11);
    }
}
