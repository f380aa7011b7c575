//! Minimal `ToUnicode` CMap reader (`bfchar`, `bfrange`, `codespacerange`).

use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToUnicodeMap {
    map: HashMap<(u8, u32), String>,
    /// Code lengths in bytes declared by the codespace ranges, ascending.
    code_lengths: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    Keyword(String),
}

impl ToUnicodeMap {
    pub fn parse(data: &[u8]) -> Self {
        let tokens = tokenize(data);
        let mut cmap = ToUnicodeMap::default();
        let mut i = 0;

        while i < tokens.len() {
            match &tokens[i] {
                Token::Keyword(k) if k == "begincodespacerange" => {
                    i += 1;
                    while let (Some(Token::Hex(lo)), Some(Token::Hex(_))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        let len = lo.len() as u8;
                        if len > 0 && !cmap.code_lengths.contains(&len) {
                            cmap.code_lengths.push(len);
                        }
                        i += 2;
                    }
                }
                Token::Keyword(k) if k == "beginbfchar" => {
                    i += 1;
                    while let (Some(Token::Hex(src)), Some(Token::Hex(dst))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        cmap.insert(src, code_value(src), utf16_text(dst));
                        i += 2;
                    }
                }
                Token::Keyword(k) if k == "beginbfrange" => {
                    i += 1;
                    i = cmap.parse_ranges(&tokens, i);
                }
                _ => i += 1,
            }
        }

        cmap.code_lengths.sort_unstable();
        cmap
    }

    fn parse_ranges(&mut self, tokens: &[Token], mut i: usize) -> usize {
        loop {
            let (lo, hi) = match (tokens.get(i), tokens.get(i + 1)) {
                (Some(Token::Hex(lo)), Some(Token::Hex(hi))) => (lo, hi),
                _ => return i,
            };
            let (start, end) = (code_value(lo), code_value(hi));
            i += 2;
            match tokens.get(i) {
                Some(Token::Hex(dst)) => {
                    let mut units = utf16_units(dst);
                    for code in start..=end.min(start.saturating_add(0xFFFF)) {
                        self.insert(lo, code, String::from_utf16_lossy(&units));
                        if let Some(last) = units.last_mut() {
                            *last = last.wrapping_add(1);
                        }
                    }
                    i += 1;
                }
                Some(Token::ArrayStart) => {
                    i += 1;
                    let mut code = start;
                    while let Some(Token::Hex(dst)) = tokens.get(i) {
                        if code <= end {
                            self.insert(lo, code, utf16_text(dst));
                        }
                        code = code.saturating_add(1);
                        i += 1;
                    }
                    if let Some(Token::ArrayEnd) = tokens.get(i) {
                        i += 1;
                    }
                }
                _ => return i,
            }
        }
    }

    fn insert(&mut self, src: &[u8], code: u32, text: String) {
        let len = src.len() as u8;
        self.map.insert((len, code), text);
        if len > 0 && !self.code_lengths.contains(&len) {
            self.code_lengths.push(len);
            self.code_lengths.sort_unstable();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Split `bytes` into `(code, byte_length, text)` using the declared code
    /// lengths, shortest first; unmapped codes yield `None` text.
    pub fn decode(&self, bytes: &[u8], default_len: u8) -> Vec<(u32, u8, Option<String>)> {
        let lengths: Vec<u8> = if self.code_lengths.is_empty() {
            vec![default_len]
        } else {
            self.code_lengths.clone()
        };

        let mut out = Vec::new();
        let mut pos = 0;
        while pos < bytes.len() {
            let mut matched = None;
            for &len in &lengths {
                let end = pos + len as usize;
                if end > bytes.len() {
                    break;
                }
                let code = code_value(&bytes[pos..end]);
                if let Some(text) = self.map.get(&(len, code)) {
                    matched = Some((code, len, Some(text.clone())));
                    break;
                }
            }
            let (code, len, text) = matched.unwrap_or_else(|| {
                let len = lengths[0].min((bytes.len() - pos) as u8).max(1);
                (code_value(&bytes[pos..pos + len as usize]), len, None)
            });
            out.push((code, len, text));
            pos += len as usize;
        }
        out
    }
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => u16::from(*single),
            _ => 0,
        })
        .collect()
}

fn utf16_text(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let c = data[i];
        match c {
            b'<' if data.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if data.get(i + 1) == Some(&b'>') => i += 2,
            b'<' => {
                let start = i + 1;
                let end = data[start..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map_or(data.len(), |p| start + p);
                tokens.push(Token::Hex(parse_hex(&data[start..end])));
                i = end + 1;
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'(' => {
                // Literal strings only appear in the CMap header; skip them.
                let mut depth = 0usize;
                while i < data.len() {
                    match data[i] {
                        b'\\' => i += 1,
                        b'(' => depth += 1,
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                i += 1;
            }
            c if c.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !b"<>[]()%/".contains(&data[i])
                {
                    i += 1;
                }
                if i == start {
                    // Lone delimiter such as '/'.
                    i += 1;
                } else {
                    let word = String::from_utf8_lossy(&data[start..i]).into_owned();
                    tokens.push(Token::Keyword(word));
                }
            }
        }
    }
    tokens
}

fn parse_hex(digits: &[u8]) -> Vec<u8> {
    let nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|&d| (d as char).to_digit(16).map(|v| v as u8))
        .collect();
    nibbles
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => (hi << 4) | lo,
            [hi] => hi << 4,
            _ => 0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CMapName /Adobe-Identity-UCS def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020>
<0011> <00C1>
endbfchar
2 beginbfrange
<0024> <0026> <0041>
<0030> <0031> [<00E9> <00F1>]
endbfrange
endcmap";

    #[test]
    fn test_parse_bfchar_and_ranges() {
        let cmap = ToUnicodeMap::parse(SAMPLE);
        assert_eq!(cmap.code_lengths, vec![2]);

        let decoded: String = cmap
            .decode(&[0x00, 0x24, 0x00, 0x03, 0x00, 0x11, 0x00, 0x26, 0x00, 0x30, 0x00, 0x31], 2)
            .into_iter()
            .filter_map(|(_, _, text)| text)
            .collect();
        assert_eq!(decoded, "A ÁCéñ");
    }

    #[test]
    fn test_unmapped_code_has_no_text() {
        let cmap = ToUnicodeMap::parse(SAMPLE);
        let decoded = cmap.decode(&[0x01, 0x00], 2);
        assert_eq!(decoded, vec![(0x0100, 2, None)]);
    }

    #[test]
    fn test_single_byte_codes() {
        let cmap = ToUnicodeMap::parse(
            b"1 begincodespacerange <00> <FF> endcodespacerange
1 beginbfchar <41> <0058> endbfchar",
        );
        let decoded = cmap.decode(b"AA", 1);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].2.as_deref(), Some("X"));
    }

    #[test]
    fn test_parse_hex_odd_length() {
        assert_eq!(parse_hex(b"4"), vec![0x40]);
        assert_eq!(parse_hex(b"0 0 4 1"), vec![0x00, 0x41]);
    }
}
