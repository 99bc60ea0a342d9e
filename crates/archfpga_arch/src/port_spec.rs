//! Parsing of port references such as `clb[3:0].I[7:0]` and `io[1:1].in`.
//!
//! Annotation strings name one or more whitespace-separated port references;
//! site pin mappings name exactly one. Both share the tokenizer below.

use archfpga_common::{ArchError, ArchResult, SourceLoc};
use std::ops::Range;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Name(String),
    Int(u32),
    Open,
    Close,
    Dot,
    Colon,
}

fn tokenize(spec: &str, loc: &SourceLoc) -> ArchResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let flush = |word: &mut String, tokens: &mut Vec<Token>| -> ArchResult<()> {
        if word.is_empty() {
            return Ok(());
        }
        let token = if word.chars().all(|c| c.is_ascii_digit()) {
            Token::Int(word.parse().map_err(|_| {
                ArchError::malformed(format!("pin index '{word}' is out of range in '{spec}'"), loc)
            })?)
        } else {
            Token::Name(word.clone())
        };
        tokens.push(token);
        word.clear();
        Ok(())
    };
    for c in spec.chars() {
        let punct = match c {
            '[' => Some(Token::Open),
            ']' => Some(Token::Close),
            '.' => Some(Token::Dot),
            ':' => Some(Token::Colon),
            c if c.is_whitespace() => None,
            c => {
                word.push(c);
                continue;
            }
        };
        flush(&mut word, &mut tokens)?;
        tokens.extend(punct);
    }
    flush(&mut word, &mut tokens)?;
    Ok(tokens)
}

/// An inclusive `[msb:lsb]` index range as written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitRange {
    /// First index written.
    pub msb: u32,
    /// Second index written (equal to `msb` for `[n]`).
    pub lsb: u32,
}

impl BitRange {
    /// Lowest index of the range.
    pub fn low(self) -> u32 {
        self.msb.min(self.lsb)
    }

    /// Highest index of the range.
    pub fn high(self) -> u32 {
        self.msb.max(self.lsb)
    }
}

/// A parsed `instance[range].port[range]` reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstPort {
    /// Instance (pb_type, block or sub-tile) name.
    pub instance: String,
    /// Optional instance range.
    pub instance_range: Option<BitRange>,
    /// Port name.
    pub port: String,
    /// Optional pin range.
    pub pin_range: Option<BitRange>,
}

struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
    spec: &'t str,
    loc: &'t SourceLoc,
}

impl Cursor<'_> {
    fn error(&self, what: &str) -> ArchError {
        ArchError::malformed(format!("{what}: {}", self.spec), self.loc)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn name(&mut self, what: &str) -> ArchResult<String> {
        match self.tokens.get(self.pos) {
            Some(Token::Name(n)) => {
                self.pos += 1;
                Ok(n.clone())
            }
            _ => Err(self.error(what)),
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> ArchResult<()> {
        if self.peek() == Some(&token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(what))
        }
    }

    fn int(&mut self, what: &str) -> ArchResult<u32> {
        match self.tokens.get(self.pos) {
            Some(Token::Int(v)) => {
                self.pos += 1;
                Ok(*v)
            }
            _ => Err(self.error(what)),
        }
    }

    /// Parses an optional `[a]` or `[a:b]`.
    fn range(&mut self) -> ArchResult<Option<BitRange>> {
        if self.peek() != Some(&Token::Open) {
            return Ok(None);
        }
        self.pos += 1;
        let msb = self.int("No integer to indicate most significant pin index")?;
        let lsb = if self.peek() == Some(&Token::Colon) {
            self.pos += 1;
            self.int("No integer to indicate least significant pin index")?
        } else {
            msb
        };
        self.expect(Token::Close, "No closing bracket")?;
        Ok(Some(BitRange { msb, lsb }))
    }

    fn at_end(&self) -> bool {
        self.pos == self.tokens.len()
    }
}

impl InstPort {
    /// Parses a single reference.
    pub fn parse(spec: &str, loc: &SourceLoc) -> ArchResult<Self> {
        let tokens = tokenize(spec, loc)?;
        let mut cursor = Cursor {
            tokens: &tokens,
            pos: 0,
            spec,
            loc,
        };
        let instance = cursor.name("Missing instance name")?;
        let instance_range = cursor.range()?;
        cursor.expect(Token::Dot, "No dot is present to separate type name and port name")?;
        let port = cursor.name("No port name is present")?;
        let pin_range = cursor.range()?;
        if !cursor.at_end() {
            return Err(cursor.error("Unexpected tokens after port reference"));
        }
        Ok(Self {
            instance,
            instance_range,
            port,
            pin_range,
        })
    }

    /// Parses every whitespace-separated reference in `list`.
    pub fn parse_list(list: &str, loc: &SourceLoc) -> ArchResult<Vec<Self>> {
        list.split_whitespace()
            .map(|spec| Self::parse(spec, loc))
            .collect()
    }
}

/// Resolves a site pin reference to a half-open range of absolute pin
/// indices on `owner`.
///
/// `lookup` maps a port name to `(absolute_first_pin_index, num_pins)`.
/// A capacity range after the owner name is accepted and ignored, a missing
/// pin range selects the whole port, and a reversed range is normalized.
pub fn resolve_pin_range(
    spec: &str,
    owner: &str,
    lookup: impl Fn(&str) -> Option<(u32, u32)>,
    loc: &SourceLoc,
) -> ArchResult<Range<u32>> {
    let parsed = InstPort::parse(spec, loc)?;
    if parsed.instance != owner {
        return Err(ArchError::unknown(
            format!("Wrong physical type name of the port: {spec} (expected '{owner}')"),
            loc,
        ));
    }
    let (first, num_pins) = lookup(&parsed.port).ok_or_else(|| {
        ArchError::unknown(
            format!("Port {} for {owner} could not be found: {spec}", parsed.port),
            loc,
        )
    })?;
    let (low, high) = match parsed.pin_range {
        None => return Ok(first..first + num_pins),
        Some(range) => (range.low(), range.high()),
    };
    if high >= num_pins {
        return Err(ArchError::shape(
            format!(
                "Pin index {high} is out of range for port '{}' with {num_pins} pins: {spec}",
                parsed.port
            ),
            loc,
        ));
    }
    Ok(first + low..first + high + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_reference() {
        let p = InstPort::parse("clb[3:0].I[7:2]", &SourceLoc::UNKNOWN).unwrap();
        assert_eq!(p.instance, "clb");
        assert_eq!(p.instance_range, Some(BitRange { msb: 3, lsb: 0 }));
        assert_eq!(p.port, "I");
        assert_eq!(p.pin_range.unwrap().low(), 2);
        assert_eq!(p.pin_range.unwrap().high(), 7);
    }

    #[test]
    fn parse_plain_and_single_bit() {
        let p = InstPort::parse("lut4.in", &SourceLoc::UNKNOWN).unwrap();
        assert_eq!((p.instance.as_str(), p.port.as_str()), ("lut4", "in"));
        assert!(p.pin_range.is_none());
        let p = InstPort::parse("ff.D[0]", &SourceLoc::UNKNOWN).unwrap();
        assert_eq!(p.pin_range, Some(BitRange { msb: 0, lsb: 0 }));
    }

    #[test]
    fn parse_list_splits_on_whitespace() {
        let list =
            InstPort::parse_list("mem.addr  mem.data\n mem.we", &SourceLoc::UNKNOWN).unwrap();
        let ports: Vec<_> = list.iter().map(|p| p.port.as_str()).collect();
        assert_eq!(ports, vec!["addr", "data", "we"]);
    }

    #[test]
    fn missing_dot_rejected() {
        let err = InstPort::parse("lut4in", &SourceLoc::at_line(3)).unwrap_err();
        assert!(err.message().contains("No dot"));
        assert!(InstPort::parse("a.b[3", &SourceLoc::UNKNOWN).is_err());
        assert!(InstPort::parse("a.b[1:0]x", &SourceLoc::UNKNOWN).is_err());
    }

    fn ports(name: &str) -> Option<(u32, u32)> {
        match name {
            "in" => Some((0, 6)),
            "out" => Some((6, 2)),
            _ => None,
        }
    }

    #[test]
    fn range_whole_port() {
        let r = resolve_pin_range("io.out", "io", ports, &SourceLoc::UNKNOWN).unwrap();
        assert_eq!(r, 6..8);
    }

    #[test]
    fn range_skips_capacity_and_swaps() {
        let r = resolve_pin_range("io[3:3].in[1:4]", "io", ports, &SourceLoc::UNKNOWN).unwrap();
        assert_eq!(r, 1..5);
        let r = resolve_pin_range("io.in[4:1]", "io", ports, &SourceLoc::UNKNOWN).unwrap();
        assert_eq!(r, 1..5);
        let r = resolve_pin_range("io.out[1]", "io", ports, &SourceLoc::UNKNOWN).unwrap();
        assert_eq!(r, 7..8);
    }

    #[test]
    fn range_errors() {
        let loc = SourceLoc::UNKNOWN;
        assert!(matches!(
            resolve_pin_range("clb.in", "io", ports, &loc),
            Err(ArchError::UnknownReference { .. })
        ));
        assert!(matches!(
            resolve_pin_range("io.clk", "io", ports, &loc),
            Err(ArchError::UnknownReference { .. })
        ));
        assert!(matches!(
            resolve_pin_range("io.in[6]", "io", ports, &loc),
            Err(ArchError::Shape { .. })
        ));
    }
}
