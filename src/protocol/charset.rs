//! # Character Tables
//!
//! Maps printer bytes to Unicode characters for glyph lookup.
//!
//! Each of the four character table slots (`ESC t`) holds an Epson code page
//! id assigned with `ESC ( t`. The active slot is expanded into a 256-entry
//! translation map; `ESC R` then patches twelve ASCII positions with one of
//! the international character sets.
//!
//! Supported code pages: 437 (US), 850 (Multilingual), 860 (Portuguese),
//! 863 (Canadian French), 865 (Nordic) and 866 (Cyrillic). Other ids fall
//! back to 437.

/// Code pages with a translation table.
pub const SUPPORTED_CODEPAGES: [u16; 6] = [437, 850, 860, 863, 865, 866];

/// Code page used when a table slot holds an unknown id.
pub const DEFAULT_CODEPAGE: u16 = 437;

/// Epson code page ids in `ESC ( t` order. Id 0 is the italic table.
pub const EPSON_CODEPAGES: [u16; 16] = [
    0, 437, 932, 850, 851, 853, 855, 860, 863, 865, 852, 857, 862, 864, 866, 869,
];

/// Look up the code page behind an `ESC ( t` selector.
pub fn epson_codepage(selector: u8) -> Option<u16> {
    EPSON_CODEPAGES.get(selector as usize).copied()
}

/// A full byte-to-character translation table.
pub type CharMap = [char; 256];

// ============================================================================
// CODE PAGE TABLES
// ============================================================================

/// 0x00-0x1F as printed glyphs (when not consumed as control codes)
const LOW_GRAPHICS: &str = concat!(
    " ☺☻♥♦♣♠•◘○◙♂♀♪♫☼",
    "►◄↕‼¶§▬↨↑↓→←∟↔▲▼",
);

/// 0xB0-0xFF shared by the DOS Latin pages derived from 437
const CP437_GRAPHICS: &str = concat!(
    "░▒▓│┤╡╢╖╕╣║╗╝╜╛┐",
    "└┴┬├─┼╞╟╚╔╩╦╠═╬╧",
    "╨╤╥╙╘╒╓╫╪┘┌█▄▌▐▀",
    "αßΓπΣσµτΦΘΩδ∞φε∩",
    "≡±≥≤⌠⌡÷≈°∙·√ⁿ²■\u{A0}",
);

const CP437_UPPER: &str = concat!(
    "ÇüéâäàåçêëèïîìÄÅ",
    "ÉæÆôöòûùÿÖÜ¢£¥₧ƒ",
    "áíóúñÑªº¿⌐¬½¼¡«»",
);

const CP850_UPPER: &str = concat!(
    "ÇüéâäàåçêëèïîìÄÅ",
    "ÉæÆôöòûùÿÖÜø£Ø×ƒ",
    "áíóúñÑªº¿®¬½¼¡«»",
    "░▒▓│┤ÁÂÀ©╣║╗╝¢¥┐",
    "└┴┬├─┼ãÃ╚╔╩╦╠═╬¤",
    "ðÐÊËÈıÍÎÏ┘┌█▄¦Ì▀",
    "ÓßÔÒõÕµþÞÚÛÙýÝ¯´",
    "\u{AD}±‗¾¶§÷¸°¨·¹³²■\u{A0}",
);

const CP860_UPPER: &str = concat!(
    "ÇüéâãàÁçêÊèÍÔìÃÂ",
    "ÉÀÈôõòÚùÌÕÜ¢£Ù₧Ó",
    "áíóúñÑªº¿Ò¬½¼¡«»",
);

const CP863_UPPER: &str = concat!(
    "ÇüéâÂà¶çêëèïî‗À§",
    "ÉÈÊôËÏûù¤ÔÜ¢£ÙÛƒ",
    "¦´óú¨¸³¯Î⌐¬½¼¾«»",
);

const CP865_UPPER: &str = concat!(
    "ÇüéâäàåçêëèïîìÄÅ",
    "ÉæÆôöòûùÿÖÜø£Ø₧ƒ",
    "áíóúñÑªº¿⌐¬½¼¡«¤",
);

const CP866_UPPER: &str = concat!(
    "АБВГДЕЖЗИЙКЛМНОП",
    "РСТУФХЦЧШЩЪЫЬЭЮЯ",
    "абвгдежзийклмноп",
    "░▒▓│┤╡╢╖╕╣║╗╝╜╛┐",
    "└┴┬├─┼╞╟╚╔╩╦╠═╬╧",
    "╨╤╥╙╘╒╓╫╪┘┌█▄▌▐▀",
    "рстуфхцчшщъыьэюя",
    "ЁёЄєЇїЎў°∙·√№¤■\u{A0}",
);

/// Characters for 0x80-0xFF of `codepage`, or `None` if unsupported.
///
/// The returned iterator yields exactly 128 characters.
pub fn upper_half(codepage: u16) -> Option<impl Iterator<Item = char>> {
    let (head, tail) = match codepage {
        437 => (CP437_UPPER, CP437_GRAPHICS),
        850 => (CP850_UPPER, ""),
        860 => (CP860_UPPER, CP437_GRAPHICS),
        863 => (CP863_UPPER, CP437_GRAPHICS),
        865 => (CP865_UPPER, CP437_GRAPHICS),
        866 => (CP866_UPPER, ""),
        _ => return None,
    };
    Some(head.chars().chain(tail.chars()))
}

/// Build the translation map for `codepage`.
///
/// Unsupported code pages (and the italic table id 0) use 437.
pub fn char_map(codepage: u16) -> CharMap {
    let upper = upper_half(codepage).or_else(|| {
        if codepage != 0 {
            log::warn!(
                "Code page {} not supported, using {}",
                codepage,
                DEFAULT_CODEPAGE
            );
        }
        upper_half(DEFAULT_CODEPAGE)
    });

    let mut map = [' '; 256];
    for (slot, ch) in map.iter_mut().zip(LOW_GRAPHICS.chars()) {
        *slot = ch;
    }
    for byte in 0x20u8..0x7F {
        map[byte as usize] = byte as char;
    }
    map[0x7F] = '⌂';
    if let Some(upper) = upper {
        for (slot, ch) in map[0x80..].iter_mut().zip(upper) {
            *slot = ch;
        }
    }
    map
}

// ============================================================================
// INTERNATIONAL CHARACTER SETS
// ============================================================================

/// Byte positions replaced by `ESC R`.
pub const INTERNATIONAL_POSITIONS: [u8; 12] = [
    0x23, 0x24, 0x40, 0x5B, 0x5C, 0x5D, 0x5E, 0x60, 0x7B, 0x7C, 0x7D, 0x7E,
];

/// The fifteen `ESC R` sets, in selector order (`ESC R 64` is entry 14).
pub const INTERNATIONAL_SETS: [[char; 12]; 15] = [
    // USA
    ['#', '$', '@', '[', '\\', ']', '^', '`', '{', '|', '}', '~'],
    // France
    ['#', '$', 'à', '°', 'ç', '§', '^', '`', 'é', 'ù', 'è', '¨'],
    // Germany
    ['#', '$', '§', 'Ä', 'Ö', 'Ü', '^', '`', 'ä', 'ö', 'ü', 'ß'],
    // United Kingdom
    ['£', '$', '@', '[', '\\', ']', '^', '`', '{', '|', '}', '~'],
    // Denmark I
    ['#', '$', '@', 'Æ', 'Ø', 'Å', '^', '`', 'æ', 'ø', 'å', '~'],
    // Sweden
    ['#', '¤', 'É', 'Ä', 'Ö', 'Å', 'Ü', 'é', 'ä', 'ö', 'å', 'ü'],
    // Italy
    ['#', '$', '@', '°', '\\', 'é', '^', 'ù', 'à', 'ò', 'è', 'ì'],
    // Spain I
    ['₧', '$', '@', '¡', 'Ñ', '¿', '^', '`', '¨', 'ñ', '}', '~'],
    // Japan
    ['#', '$', '@', '[', '¥', ']', '^', '`', '{', '|', '}', '~'],
    // Norway
    ['#', '¤', 'É', 'Æ', 'Ø', 'Å', 'Ü', 'é', 'æ', 'ø', 'å', 'ü'],
    // Denmark II
    ['#', '$', 'É', 'Æ', 'Ø', 'Å', 'Ü', 'é', 'æ', 'ø', 'å', 'ü'],
    // Spain II
    ['#', '$', 'á', '¡', 'Ñ', '¿', 'é', '`', 'í', 'ñ', 'ó', 'ú'],
    // Latin America
    ['#', '$', 'á', '¡', 'Ñ', '¿', 'é', 'ü', 'í', 'ñ', 'ó', 'ú'],
    // Korea
    ['#', '$', '@', '[', '₩', ']', '^', '`', '{', '|', '}', '~'],
    // Legal
    ['#', '$', '§', '°', '\'', '"', '¶', '`', '©', '®', '†', '™'],
];

/// Look up an `ESC R` set: 0-13, or 64 for Legal.
pub fn international_set(selector: u8) -> Option<&'static [char; 12]> {
    match selector {
        0..=13 => INTERNATIONAL_SETS.get(selector as usize),
        64 => INTERNATIONAL_SETS.get(14),
        _ => None,
    }
}

/// Patch `map` with an international set. Returns `false` for an unknown
/// selector, leaving `map` untouched.
pub fn apply_international(map: &mut CharMap, selector: u8) -> bool {
    let Some(set) = international_set(selector) else {
        return false;
    };
    for (&pos, &ch) in INTERNATIONAL_POSITIONS.iter().zip(set) {
        map[pos as usize] = ch;
    }
    true
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_have_128_entries() {
        for cp in SUPPORTED_CODEPAGES {
            let count = upper_half(cp).map(|it| it.count());
            assert_eq!(count, Some(128), "code page {}", cp);
        }
        assert_eq!(LOW_GRAPHICS.chars().count(), 32);
    }

    #[test]
    fn test_cp437_map() {
        let map = char_map(437);
        assert_eq!(map[b'A' as usize], 'A');
        assert_eq!(map[0x01], '☺');
        assert_eq!(map[0x7F], '⌂');
        assert_eq!(map[0x80], 'Ç');
        assert_eq!(map[0x82], 'é');
        assert_eq!(map[0xC9], '╔');
        assert_eq!(map[0xDB], '█');
        assert_eq!(map[0xE3], 'π');
        assert_eq!(map[0xF8], '°');
        assert_eq!(map[0xFF], '\u{A0}');
    }

    #[test]
    fn test_other_code_pages() {
        assert_eq!(char_map(850)[0x9B], 'ø');
        assert_eq!(char_map(850)[0xB5], 'Á');
        assert_eq!(char_map(860)[0x84], 'ã');
        assert_eq!(char_map(863)[0x86], '¶');
        assert_eq!(char_map(865)[0x9D], 'Ø');
        assert_eq!(char_map(865)[0xC9], '╔');
        assert_eq!(char_map(866)[0x80], 'А');
        assert_eq!(char_map(866)[0xEF], 'я');
    }

    #[test]
    fn test_unsupported_code_page_falls_back() {
        assert_eq!(char_map(932), char_map(437));
        assert_eq!(char_map(0), char_map(437));
    }

    #[test]
    fn test_epson_codepage_ids() {
        assert_eq!(epson_codepage(0), Some(0));
        assert_eq!(epson_codepage(1), Some(437));
        assert_eq!(epson_codepage(3), Some(850));
        assert_eq!(epson_codepage(14), Some(866));
        assert_eq!(epson_codepage(16), None);
    }

    #[test]
    fn test_international_sets() {
        let mut map = char_map(437);
        assert!(apply_international(&mut map, 2));
        assert_eq!(map[0x40], '§');
        assert_eq!(map[0x5B], 'Ä');
        assert_eq!(map[0x7E], 'ß');
        assert_eq!(map[b'A' as usize], 'A');

        assert!(apply_international(&mut map, 64));
        assert_eq!(map[0x7E], '™');

        assert!(apply_international(&mut map, 0));
        assert_eq!(map, char_map(437));
    }

    #[test]
    fn test_unknown_international_set() {
        let mut map = char_map(437);
        assert!(!apply_international(&mut map, 14));
        assert!(!apply_international(&mut map, 63));
        assert_eq!(map, char_map(437));
    }
}
