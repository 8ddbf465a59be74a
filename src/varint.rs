//! Varint and zigzag primitives shared by both engines.

/// Longest varint that can carry a 64-bit value.
pub const MAX_VARINT_LEN: usize = 10;

/// Encodes `n` as a minimal-length varint into `buf`, returning the length.
///
/// Groups are emitted least significant first; every byte except the last
/// has its top bit set. Zero encodes as a single zero byte.
pub fn encode_varint(mut n: u64, buf: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut len = 0;
    loop {
        // Read least significant 7 bits
        let mut b = (n & 0b0111_1111) as u8;
        n >>= 7;
        // Set top bit when not yet done
        if n != 0 {
            b |= 0b1000_0000;
        }
        buf[len] = b;
        len += 1;
        if n == 0 {
            return len;
        }
    }
}

/// Number of bytes [`encode_varint`] produces for `n`.
pub fn varint_len(n: u64) -> usize {
    let bits = 64 - (n | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Zigzag-maps a two's complement integer held in the low `width` bytes of
/// `value`.
///
/// The sign bit is tested at the declared width rather than at bit 63, so
/// the same routine serves 8, 16, 32 and 64-bit fields. `width` must be in
/// `1..=8`.
#[inline]
pub fn zigzag_encode(value: u64, width: usize) -> u64 {
    let bits = width * 8;
    let sign_bit = 0x80u64 << (bits - 8);
    let xor_mask = u64::MAX >> (64 - bits);
    if value & sign_bit != 0 {
        ((value ^ xor_mask) << 1) | 1
    } else {
        value << 1
    }
}

/// Inverse of [`zigzag_encode`], producing the sign-extended 64-bit value.
///
/// Truncating the result to any narrower width yields that width's value.
#[inline]
pub fn zigzag_decode(n: u64) -> u64 {
    (n >> 1) ^ (n & 1).wrapping_neg()
}

/// Zigzag-maps a 64-bit signed integer.
#[inline]
pub fn to_zigzag64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Inverse of [`to_zigzag64`].
#[inline]
pub fn from_zigzag64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ (-((n & 1) as i64))
}
