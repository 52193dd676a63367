// isocdmak/src/iso/endian.rs
//! Byte-order helpers for ISO 9660 numeric fields.
//!
//! "Both-endian" fields store a value twice: little-endian first, then
//! big-endian. The widened value returned here serializes to exactly that
//! layout when written with `to_le_bytes`.

/// Widens a 16-bit value into its 4-byte both-endian form.
pub const fn both_endian_u16(value: u16) -> u32 {
    value as u32 | (swap_u16(value) as u32) << 16
}

/// Widens a 32-bit value into its 8-byte both-endian form.
pub const fn both_endian_u32(value: u32) -> u64 {
    value as u64 | (swap_u32(value) as u64) << 32
}

/// Reverses the byte order of a 16-bit value.
pub const fn swap_u16(value: u16) -> u16 {
    value.swap_bytes()
}

/// Reverses the byte order of a 32-bit value.
pub const fn swap_u32(value: u32) -> u32 {
    value.swap_bytes()
}

/// Both-endian 16-bit field bytes.
pub fn both_u16_bytes(value: u16) -> [u8; 4] {
    both_endian_u16(value).to_le_bytes()
}

/// Both-endian 32-bit field bytes.
pub fn both_u32_bytes(value: u32) -> [u8; 8] {
    both_endian_u32(value).to_le_bytes()
}
