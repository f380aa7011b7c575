//! Font metrics and text decoding for the content-stream interpreter.

use super::cmap::ToUnicodeMap;
use crate::pdf::{
    lookup, lookup_number, name, number, resolve, resolve_array, resolve_dict, stream_bytes,
};
use lopdf::{Dictionary, Document, Object};
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

const DEFAULT_ASCENT: f64 = 0.8;
const DEFAULT_DESCENT: f64 = -0.2;
const DEFAULT_WIDTH: f64 = 556.0;
const DEFAULT_CID_WIDTH: f64 = 1000.0;
const COURIER_WIDTH: f64 = 600.0;

/// Helvetica advance widths for codes 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, //
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, //
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, //
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// WinAnsi codes 0x80..=0x9F; everything else in the encoding is Latin-1.
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

/// MacRoman codes 0x80..=0xFF.
const MAC_ROMAN_HIGH: [char; 128] = [
    'Ä', 'Å', 'Ç', 'É', 'Ñ', 'Ö', 'Ü', 'á', 'à', 'â', 'ä', 'ã', 'å', 'ç', 'é', 'è', //
    'ê', 'ë', 'í', 'ì', 'î', 'ï', 'ñ', 'ó', 'ò', 'ô', 'ö', 'õ', 'ú', 'ù', 'û', 'ü', //
    '†', '°', '¢', '£', '§', '•', '¶', 'ß', '®', '©', '™', '´', '¨', '≠', 'Æ', 'Ø', //
    '∞', '±', '≤', '≥', '¥', 'µ', '∂', '∑', '∏', 'π', '∫', 'ª', 'º', 'Ω', 'æ', 'ø', //
    '¿', '¡', '¬', '√', 'ƒ', '≈', '∆', '«', '»', '…', '\u{00A0}', 'À', 'Ã', 'Õ', 'Œ', 'œ', //
    '–', '—', '“', '”', '‘', '’', '÷', '◊', 'ÿ', 'Ÿ', '⁄', '¤', '‹', '›', 'ﬁ', 'ﬂ', //
    '‡', '·', '‚', '„', '‰', 'Â', 'Ê', 'Á', 'Ë', 'È', 'Í', 'Î', 'Ï', 'Ì', 'Ó', 'Ô', //
    '\u{F8FF}', 'Ò', 'Ú', 'Û', 'Ù', 'ı', 'ˆ', '˜', '¯', '˘', '˙', '˚', '¸', '˝', '˛', 'ˇ',
];

/// Code-to-character table of a simple font before `Differences` apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseEncoding {
    WinAnsi,
    MacRoman,
    Standard,
}

impl BaseEncoding {
    /// Encoding for a predefined name. Unknown names read as WinAnsi.
    pub fn from_name(name: &[u8]) -> Self {
        match name {
            b"MacRomanEncoding" => BaseEncoding::MacRoman,
            b"StandardEncoding" => BaseEncoding::Standard,
            _ => BaseEncoding::WinAnsi,
        }
    }

    pub fn char(self, code: u32) -> Option<char> {
        match self {
            BaseEncoding::WinAnsi => win_ansi_char(code),
            BaseEncoding::MacRoman => mac_roman_char(code),
            BaseEncoding::Standard => standard_char(code),
        }
    }
}

/// One decoded character code.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub code: u32,
    pub code_len: u8,
    pub text: String,
    /// Advance in thousandths of text space units.
    pub width: f64,
}

impl Glyph {
    /// Word spacing applies to the single-byte code 32 only.
    pub fn is_word_space(&self) -> bool {
        self.code_len == 1 && self.code == 32
    }
}

#[derive(Debug, Clone)]
enum Metrics {
    Simple {
        first_char: u32,
        widths: Vec<f64>,
        fallback: Fallback,
    },
    Composite {
        default_width: f64,
        /// `(first, last, width)` runs from the `W` array.
        ranges: Vec<(u32, u32, f64)>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Fallback {
    Helvetica,
    Courier,
}

#[derive(Debug, Clone)]
pub struct FontInfo {
    metrics: Metrics,
    to_unicode: Option<ToUnicodeMap>,
    encoding: BaseEncoding,
    differences: HashMap<u32, String>,
    /// Fraction of the font size above the baseline.
    pub ascent: f64,
    /// Fraction of the font size below the baseline (negative).
    pub descent: f64,
}

impl Default for FontInfo {
    /// Helvetica with WinAnsi encoding, used when a font cannot be read.
    fn default() -> Self {
        Self {
            metrics: Metrics::Simple {
                first_char: 0,
                widths: Vec::new(),
                fallback: Fallback::Helvetica,
            },
            to_unicode: None,
            encoding: BaseEncoding::WinAnsi,
            differences: HashMap::new(),
            ascent: DEFAULT_ASCENT,
            descent: DEFAULT_DESCENT,
        }
    }
}

impl FontInfo {
    pub fn load(doc: &Document, font: &Dictionary) -> Self {
        let subtype = lookup(doc, font, b"Subtype").and_then(name).unwrap_or_default();
        let to_unicode = match lookup(doc, font, b"ToUnicode") {
            Some(Object::Stream(stream)) => {
                Some(ToUnicodeMap::parse(&stream_bytes(stream))).filter(|m| !m.is_empty())
            }
            _ => None,
        };

        if subtype == b"Type0" {
            let descendant = lookup(doc, font, b"DescendantFonts")
                .and_then(|obj| resolve_array(doc, obj))
                .and_then(|items| items.first())
                .and_then(|first| resolve_dict(doc, first));
            let (ascent, descent) = descendant
                .map(|d| descriptor_metrics(doc, d))
                .unwrap_or((DEFAULT_ASCENT, DEFAULT_DESCENT));
            let metrics = Metrics::Composite {
                default_width: descendant
                    .and_then(|d| lookup_number(doc, d, b"DW"))
                    .unwrap_or(DEFAULT_CID_WIDTH),
                ranges: descendant
                    .and_then(|d| lookup(doc, d, b"W"))
                    .and_then(|w| resolve_array(doc, w))
                    .map(|w| cid_width_ranges(doc, w))
                    .unwrap_or_default(),
            };
            return Self {
                metrics,
                to_unicode,
                encoding: BaseEncoding::WinAnsi,
                differences: HashMap::new(),
                ascent,
                descent,
            };
        }

        let base_font = lookup(doc, font, b"BaseFont").and_then(name).unwrap_or_default();
        let fallback = if String::from_utf8_lossy(base_font).contains("Courier") {
            Fallback::Courier
        } else {
            Fallback::Helvetica
        };
        let widths = lookup(doc, font, b"Widths")
            .and_then(|w| resolve_array(doc, w))
            .map(|items| {
                items
                    .iter()
                    .map(|item| resolve(doc, item).and_then(number).unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default();
        let first_char = lookup_number(doc, font, b"FirstChar").unwrap_or(0.0).max(0.0) as u32;
        let (ascent, descent) = descriptor_metrics(doc, font);

        Self {
            metrics: Metrics::Simple {
                first_char,
                widths,
                fallback,
            },
            to_unicode,
            encoding: base_encoding(doc, font),
            differences: encoding_differences(doc, font),
            ascent,
            descent,
        }
    }

    fn is_composite(&self) -> bool {
        matches!(self.metrics, Metrics::Composite { .. })
    }

    /// Split a shown string into glyphs with their Unicode text and width.
    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        let default_len = if self.is_composite() { 2 } else { 1 };
        let codes: Vec<(u32, u8, Option<String>)> = match &self.to_unicode {
            Some(cmap) => cmap.decode(bytes, default_len),
            None => bytes
                .chunks(default_len as usize)
                .map(|chunk| {
                    let code = chunk.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
                    (code, chunk.len() as u8, None)
                })
                .collect(),
        };

        codes
            .into_iter()
            .map(|(code, code_len, mapped)| {
                let text = mapped.unwrap_or_else(|| self.fallback_text(code));
                let width = self.width(code, &text);
                Glyph {
                    code,
                    code_len,
                    text,
                    width,
                }
            })
            .collect()
    }

    fn fallback_text(&self, code: u32) -> String {
        if self.is_composite() {
            return char::from_u32(code)
                .filter(|c| !c.is_control())
                .map(String::from)
                .unwrap_or_default();
        }
        if let Some(text) = self.differences.get(&code) {
            return text.clone();
        }
        self.encoding.char(code).map(String::from).unwrap_or_default()
    }

    fn width(&self, code: u32, text: &str) -> f64 {
        match &self.metrics {
            Metrics::Composite {
                default_width,
                ranges,
            } => ranges
                .iter()
                .find(|(first, last, _)| (*first..=*last).contains(&code))
                .map_or(*default_width, |(_, _, w)| *w),
            Metrics::Simple {
                first_char,
                widths,
                fallback,
            } => {
                if let Some(w) = code
                    .checked_sub(*first_char)
                    .and_then(|i| widths.get(i as usize))
                {
                    return *w;
                }
                match fallback {
                    Fallback::Courier => COURIER_WIDTH,
                    Fallback::Helvetica => helvetica_width(text),
                }
            }
        }
    }
}

/// Helvetica width of a decoded character, using its unaccented base letter.
fn helvetica_width(text: &str) -> f64 {
    text.nfd()
        .next()
        .map(|c| c as u32)
        .filter(|c| (32..=126).contains(c))
        .map_or(DEFAULT_WIDTH, |c| f64::from(HELVETICA_WIDTHS[(c - 32) as usize]))
}

fn win_ansi_char(code: u32) -> Option<char> {
    match code {
        0..=31 | 127 => None,
        0x80..=0x9F => WIN_ANSI_HIGH[(code - 0x80) as usize],
        0x20..=0xFF => char::from_u32(code),
        _ => None,
    }
}

fn mac_roman_char(code: u32) -> Option<char> {
    match code {
        0x20..=0x7E => char::from_u32(code),
        0x80..=0xFF => Some(MAC_ROMAN_HIGH[(code - 0x80) as usize]),
        _ => None,
    }
}

fn standard_char(code: u32) -> Option<char> {
    let c = match code {
        0x27 => '’',
        0x60 => '‘',
        0x20..=0x7E => return char::from_u32(code),
        0xA1 => '¡',
        0xA2 => '¢',
        0xA3 => '£',
        0xA4 => '⁄',
        0xA5 => '¥',
        0xA6 => 'ƒ',
        0xA7 => '§',
        0xA8 => '¤',
        0xA9 => '\'',
        0xAA => '“',
        0xAB => '«',
        0xAC => '‹',
        0xAD => '›',
        0xAE => 'ﬁ',
        0xAF => 'ﬂ',
        0xB1 => '–',
        0xB2 => '†',
        0xB3 => '‡',
        0xB4 => '·',
        0xB6 => '¶',
        0xB7 => '•',
        0xB8 => '‚',
        0xB9 => '„',
        0xBA => '”',
        0xBB => '»',
        0xBC => '…',
        0xBD => '‰',
        0xBF => '¿',
        0xC1 => '`',
        0xC2 => '´',
        0xC3 => 'ˆ',
        0xC4 => '˜',
        0xC5 => '¯',
        0xC6 => '˘',
        0xC7 => '˙',
        0xC8 => '¨',
        0xCA => '˚',
        0xCB => '¸',
        0xCD => '˝',
        0xCE => '˛',
        0xCF => 'ˇ',
        0xD0 => '—',
        0xE1 => 'Æ',
        0xE3 => 'ª',
        0xE8 => 'Ł',
        0xE9 => 'Ø',
        0xEA => 'Œ',
        0xEB => 'º',
        0xF1 => 'æ',
        0xF5 => 'ı',
        0xF8 => 'ł',
        0xF9 => 'ø',
        0xFA => 'œ',
        0xFB => 'ß',
        _ => return None,
    };
    Some(c)
}

/// `/Encoding` name, or the `/BaseEncoding` of an encoding dictionary.
/// Fonts without either read as WinAnsi.
fn base_encoding(doc: &Document, font: &Dictionary) -> BaseEncoding {
    let encoding = match lookup(doc, font, b"Encoding") {
        Some(e) => e,
        None => return BaseEncoding::WinAnsi,
    };
    let encoding_name = match encoding {
        Object::Dictionary(dict) => lookup(doc, dict, b"BaseEncoding").and_then(name),
        other => name(other),
    };
    encoding_name.map_or(BaseEncoding::WinAnsi, BaseEncoding::from_name)
}

fn descriptor_metrics(doc: &Document, font: &Dictionary) -> (f64, f64) {
    let descriptor = match lookup(doc, font, b"FontDescriptor").and_then(|d| resolve_dict(doc, d))
    {
        Some(d) => d,
        None => return (DEFAULT_ASCENT, DEFAULT_DESCENT),
    };
    let ascent = lookup_number(doc, descriptor, b"Ascent")
        .filter(|a| *a > 0.0)
        .map_or(DEFAULT_ASCENT, |a| a / 1000.0);
    let descent = lookup_number(doc, descriptor, b"Descent")
        .filter(|d| *d < 0.0)
        .map_or(DEFAULT_DESCENT, |d| d / 1000.0);
    (ascent, descent)
}

/// Parse a CID `W` array: `c [w1 w2 ...]` and `c_first c_last w` groups.
fn cid_width_ranges(doc: &Document, items: &[Object]) -> Vec<(u32, u32, f64)> {
    let mut ranges = Vec::new();
    let mut i = 0;
    while i < items.len() {
        let first = match resolve(doc, &items[i]).and_then(number) {
            Some(n) if n >= 0.0 => n as u32,
            _ => break,
        };
        match items.get(i + 1).and_then(|o| resolve(doc, o)) {
            Some(Object::Array(widths)) => {
                for (offset, w) in widths.iter().enumerate() {
                    if let Some(w) = resolve(doc, w).and_then(number) {
                        let code = first + offset as u32;
                        ranges.push((code, code, w));
                    }
                }
                i += 2;
            }
            Some(last) => {
                let last = number(last).unwrap_or(0.0).max(0.0) as u32;
                let w = items
                    .get(i + 2)
                    .and_then(|o| resolve(doc, o))
                    .and_then(number)
                    .unwrap_or(DEFAULT_CID_WIDTH);
                ranges.push((first, last, w));
                i += 3;
            }
            None => break,
        }
    }
    ranges
}

fn encoding_differences(doc: &Document, font: &Dictionary) -> HashMap<u32, String> {
    let mut map = HashMap::new();
    let encoding = match lookup(doc, font, b"Encoding").and_then(|e| resolve_dict(doc, e)) {
        Some(e) => e,
        None => return map,
    };
    let differences = match lookup(doc, encoding, b"Differences")
        .and_then(|d| resolve_array(doc, d))
    {
        Some(d) => d,
        None => return map,
    };

    let mut code = 0u32;
    for item in differences {
        match resolve(doc, item) {
            Some(Object::Name(glyph)) => {
                if let Some(text) = glyph_name_text(&String::from_utf8_lossy(glyph)) {
                    map.insert(code, text);
                }
                code += 1;
            }
            Some(other) => {
                if let Some(n) = number(other) {
                    code = n.max(0.0) as u32;
                }
            }
            None => {}
        }
    }
    map
}

/// Unicode text for an Adobe glyph name, covering the names Spanish text needs.
fn glyph_name_text(glyph: &str) -> Option<String> {
    if let Some(hex) = glyph.strip_prefix("uni") {
        let units: Vec<u16> = hex
            .as_bytes()
            .chunks(4)
            .filter_map(|chunk| u16::from_str_radix(std::str::from_utf8(chunk).ok()?, 16).ok())
            .collect();
        if !units.is_empty() {
            return Some(String::from_utf16_lossy(&units));
        }
    }
    if glyph.len() == 1 && glyph.is_ascii() {
        return Some(glyph.to_string());
    }

    let named = match glyph {
        "space" | "nbspace" => ' ',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "period" => '.',
        "comma" => ',',
        "colon" => ':',
        "semicolon" => ';',
        "hyphen" | "minus" => '-',
        "slash" => '/',
        "parenleft" => '(',
        "parenright" => ')',
        "plus" => '+',
        "at" => '@',
        "underscore" => '_',
        "quotesingle" | "quoteright" => '\'',
        "ordfeminine" => 'ª',
        "ordmasculine" => 'º',
        "exclamdown" => '¡',
        "questiondown" => '¿',
        "germandbls" => 'ß',
        _ => return accented(glyph),
    };
    Some(named.to_string())
}

fn accented(glyph: &str) -> Option<String> {
    const MARKS: [(&str, char); 6] = [
        ("acute", '\u{0301}'),
        ("grave", '\u{0300}'),
        ("dieresis", '\u{0308}'),
        ("tilde", '\u{0303}'),
        ("circumflex", '\u{0302}'),
        ("cedilla", '\u{0327}'),
    ];
    MARKS.iter().find_map(|(suffix, mark)| {
        let base = glyph.strip_suffix(suffix)?;
        let mut chars = base.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) if letter.is_ascii_alphabetic() => {
                Some([letter, *mark].iter().collect::<String>().nfc().collect())
            }
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    fn text_of(font: &FontInfo, bytes: &[u8]) -> String {
        font.decode(bytes).into_iter().map(|g| g.text).collect()
    }

    #[test]
    fn test_default_font_is_helvetica_win_ansi() {
        let font = FontInfo::default();
        let glyphs = font.decode(b"Ana \xc1");
        assert_eq!(
            glyphs.iter().map(|g| g.text.as_str()).collect::<String>(),
            "Ana Á"
        );
        assert_eq!(glyphs[0].width, 667.0);
        assert_eq!(glyphs[3].width, 278.0);
        assert!(glyphs[3].is_word_space());
        // Accented letters use the width of their base letter.
        assert_eq!(glyphs[4].width, 667.0);
    }

    #[test]
    fn test_simple_font_widths_array() {
        let mut doc = Document::with_version("1.7");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => "Arial",
            "FirstChar" => 65,
            "Widths" => vec![700.into(), 650.into()],
        });
        let dict = match doc.get_object(font_id).unwrap() {
            Object::Dictionary(d) => d.clone(),
            _ => unreachable!(),
        };
        let font = FontInfo::load(&doc, &dict);
        let glyphs = font.decode(b"ABC");
        assert_eq!(glyphs[0].width, 700.0);
        assert_eq!(glyphs[1].width, 650.0);
        // Outside the Widths array: Helvetica metrics.
        assert_eq!(glyphs[2].width, 722.0);
    }

    #[test]
    fn test_courier_is_monospaced() {
        let doc = Document::with_version("1.7");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier-Bold",
        };
        let font = FontInfo::load(&doc, &dict);
        assert!(font.decode(b"iW").iter().all(|g| g.width == 600.0));
    }

    #[test]
    fn test_differences_override_encoding() {
        let doc = Document::with_version("1.7");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => dictionary! {
                "Type" => "Encoding",
                "Differences" => vec![
                    1.into(),
                    Object::Name(b"Oacute".to_vec()),
                    Object::Name(b"ntilde".to_vec()),
                    Object::Name(b"uni00C9".to_vec()),
                ],
            },
        };
        let font = FontInfo::load(&doc, &dict);
        assert_eq!(text_of(&font, b"\x01\x02\x03A"), "ÓñÉA");
    }

    #[test]
    fn test_composite_font_with_to_unicode() {
        let mut doc = Document::with_version("1.7");
        let cmap = doc.add_object(Stream::new(
            dictionary! {},
            b"1 begincodespacerange <0000> <FFFF> endcodespacerange
1 beginbfrange <0010> <0012> <004A> endbfrange"
                .to_vec(),
        ));
        let descendant = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "DW" => 500,
            "W" => vec![
                0x10.into(),
                vec![Object::Integer(610)].into(),
                0x11.into(), 0x12.into(), 480.into(),
            ],
            "FontDescriptor" => dictionary! { "Ascent" => 900, "Descent" => -250 },
        });
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(descendant)],
            "ToUnicode" => Object::Reference(cmap),
        };

        let font = FontInfo::load(&doc, &dict);
        let glyphs = font.decode(&[0x00, 0x10, 0x00, 0x11, 0x00, 0x12, 0x00, 0x20]);
        assert_eq!(
            glyphs.iter().map(|g| g.text.as_str()).collect::<String>(),
            "JKL "
        );
        assert_eq!(
            glyphs.iter().map(|g| g.width).collect::<Vec<_>>(),
            vec![610.0, 480.0, 480.0, 500.0]
        );
        assert!(!glyphs[3].is_word_space());
        assert_eq!(font.ascent, 0.9);
        assert_eq!(font.descent, -0.25);
    }

    #[test]
    fn test_mac_roman_encoding() {
        let doc = Document::with_version("1.7");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => "ArialMT",
            "Encoding" => "MacRomanEncoding",
        };
        let font = FontInfo::load(&doc, &dict);
        assert_eq!(text_of(&font, b"Juan P\x8Erez Nu\x96ez"), "Juan Pérez Nuñez");
        assert_eq!(text_of(&font, b"\xE7\xEE\xD0"), "ÁÓ–");
        // Width comes from the base letter.
        assert_eq!(font.decode(b"\x8E")[0].width, 556.0);
    }

    #[test]
    fn test_base_encoding_under_differences() {
        let doc = Document::with_version("1.7");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Times-Roman",
            "Encoding" => dictionary! {
                "Type" => "Encoding",
                "BaseEncoding" => "MacRomanEncoding",
                "Differences" => vec![0x80.into(), Object::Name(b"Ntilde".to_vec())],
            },
        };
        let font = FontInfo::load(&doc, &dict);
        assert_eq!(text_of(&font, b"\x80\x87"), "Ñá");
    }

    #[test]
    fn test_standard_encoding() {
        let doc = Document::with_version("1.7");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "StandardEncoding",
        };
        let font = FontInfo::load(&doc, &dict);
        assert_eq!(text_of(&font, b"D'Ors \xE9\xFB\xA1"), "D’Ors Øß¡");
        // Unassigned codes decode to nothing.
        assert_eq!(text_of(&font, b"\xC1\xE0"), "`");
    }

    #[test]
    fn test_unknown_encoding_name_is_win_ansi() {
        assert_eq!(BaseEncoding::from_name(b"WinAnsiEncoding"), BaseEncoding::WinAnsi);
        assert_eq!(BaseEncoding::from_name(b"MacExpertEncoding"), BaseEncoding::WinAnsi);
        assert_eq!(BaseEncoding::MacRoman.char(0x41), Some('A'));
        assert_eq!(BaseEncoding::MacRoman.char(0x7F), None);
    }

    #[test]
    fn test_glyph_names() {
        assert_eq!(glyph_name_text("eacute").as_deref(), Some("é"));
        assert_eq!(glyph_name_text("Udieresis").as_deref(), Some("Ü"));
        assert_eq!(glyph_name_text("seven").as_deref(), Some("7"));
        assert_eq!(glyph_name_text("uni00D1").as_deref(), Some("Ñ"));
        assert_eq!(glyph_name_text("g123"), None);
    }
}
