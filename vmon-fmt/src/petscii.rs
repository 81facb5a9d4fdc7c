//! Byte to glyph mapping for the text columns of memory displays.
//!
//! Only the printable ASCII subset is rendered; graphics characters and
//! control codes show as `.`.

/// A PETSCII byte in the uppercase/graphics character set.
pub fn petscii(byte: u8) -> char {
    match byte {
        0x20..=0x5f => byte as char,
        0xa0 => ' ',
        0xc1..=0xda => (byte - 0x80) as char,
        _ => '.',
    }
}

/// A screen code as stored in video memory; the reverse bit is ignored.
pub fn screen_code(byte: u8) -> char {
    match byte & 0x7f {
        code @ 0x00..=0x1f => (code + 0x40) as char,
        code @ 0x20..=0x3f => code as char,
        _ => '.',
    }
}

pub fn to_text(bytes: &[u8], screen: bool) -> String {
    let glyph = if screen { screen_code } else { petscii };
    bytes.iter().map(|&b| glyph(b)).collect()
}
