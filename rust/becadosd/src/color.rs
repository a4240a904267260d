/// Cell colors for the combined schedule. Order is part of the contract:
/// a key always maps to the same index.
pub const PALETTE: [&str; 10] = [
    "#93c5fd", // blue
    "#86efac", // green
    "#fca5a5", // red
    "#fcd34d", // amber
    "#c4b5fd", // violet
    "#f9a8d4", // pink
    "#5eead4", // teal
    "#fdba74", // orange
    "#a5b4fc", // indigo
    "#bef264", // lime
];

/// Rolling `hash * 31 + unit` over UTF-16 code units, wrapping at 32 bits.
pub fn key_hash(key: &str) -> i32 {
    key.encode_utf16().fold(0i32, |hash, unit| {
        (unit as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    })
}

pub fn palette_index(key: &str) -> usize {
    (key_hash(key).unsigned_abs() as usize) % PALETTE.len()
}

pub fn color_for(key: &str) -> &'static str {
    PALETTE[palette_index(key)]
}
