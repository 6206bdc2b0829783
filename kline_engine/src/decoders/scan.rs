// @file: kline_engine/src/decoders/scan.rs
// @description: Tokenizing-scan backend. Walks the raw bytes once and assigns fields straight from token spans.
// @author: LAS.

use log::trace;
use crate::core::decoder::{all_or_nothing, assemble_record, ElementCursor, KlineDecoder, Pulled};
use crate::core::error::{DecodeError, JsonKind, RecordDefect};
use crate::core::models::Kline;
use crate::core::schema::{RecordSchema, Slot};


//
// SCANNER
//

struct Scanner<'a> {
    buf: &'a [u8],
    pos: usize,
}

// A scanned string token. `start..end` excludes the quotes.
struct StringSpan {
    start: usize,
    end: usize,
    escaped: bool,
}

impl<'a> Scanner<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Scanner { buf, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while let Some(b' ' | b'\n' | b'\r' | b'\t') = self.peek() {
            self.pos += 1;
        }
    }

    fn error(&self, what: &str) -> DecodeError {
        DecodeError::payload(format!("{} at byte {}", what, self.pos))
    }

    fn kind_at(&self) -> Option<JsonKind> {
        match self.peek()? {
            b'"' => Some(JsonKind::String),
            b'[' => Some(JsonKind::Array),
            b'{' => Some(JsonKind::Object),
            b't' | b'f' => Some(JsonKind::Bool),
            b'n' => Some(JsonKind::Null),
            b'-' | b'0'..=b'9' => Some(JsonKind::Number),
            _ => None,
        }
    }

    //
    // TOKENS
    //

    fn scan_string(&mut self) -> Result<StringSpan, DecodeError> {
        // #1. Opening quote
        if self.peek() != Some(b'"') {
            return Err(self.error("expected string"));
        }
        self.pos += 1;
        let start: usize = self.pos;
        let mut escaped: bool = false;

        // #2. Body, validating escapes and rejecting raw control bytes
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string")),
                Some(b'"') => {
                    let end: usize = self.pos;
                    self.pos += 1;
                    return Ok(StringSpan { start, end, escaped });
                }
                Some(b'\\') => {
                    escaped = true;
                    self.pos += 1;
                    match self.peek() {
                        Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => self.pos += 1,
                        Some(b'u') => {
                            self.pos += 1;
                            for _ in 0..4 {
                                match self.peek() {
                                    Some(b) if b.is_ascii_hexdigit() => self.pos += 1,
                                    _ => return Err(self.error("invalid unicode escape")),
                                }
                            }
                        }
                        _ => return Err(self.error("invalid escape")),
                    }
                }
                Some(b) if b < 0x20 => return Err(self.error("control character in string")),
                Some(_) => self.pos += 1,
            }
        }
    }

    // Returns the number's byte range and whether it is integral (no fraction, no exponent).
    fn scan_number(&mut self) -> Result<(usize, usize, bool), DecodeError> {
        let start: usize = self.pos;
        let mut integral: bool = true;

        if self.peek() == Some(b'-') {
            self.pos += 1;
        }

        // #1. Integer part: a lone zero or a non-zero leading digit
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => self.skip_digits(),
            _ => return Err(self.error("invalid number")),
        }

        // #2. Fraction
        if self.peek() == Some(b'.') {
            integral = false;
            self.pos += 1;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.error("invalid number"));
            }
            self.skip_digits();
        }

        // #3. Exponent
        if let Some(b'e' | b'E') = self.peek() {
            integral = false;
            self.pos += 1;
            if let Some(b'+' | b'-') = self.peek() {
                self.pos += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.error("invalid number"));
            }
            self.skip_digits();
        }

        Ok((start, self.pos, integral))
    }

    fn skip_digits(&mut self) {
        while let Some(b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
    }

    fn scan_literal(&mut self) -> Result<(), DecodeError> {
        let rest: &[u8] = &self.buf[self.pos..];
        for literal in [&b"true"[..], &b"false"[..], &b"null"[..]] {
            if rest.starts_with(literal) {
                self.pos += literal.len();
                return Ok(());
            }
        }
        Err(self.error("invalid literal"))
    }

    // A skipped string must still be text serde_json would accept
    fn check_string(&self, span: &StringSpan, scratch: &mut Vec<u8>) -> Result<(), DecodeError> {
        let raw: &[u8] = &self.buf[span.start..span.end];
        if std::str::from_utf8(raw).is_err() {
            return Err(self.error("invalid UTF-8 in string"));
        }
        if span.escaped {
            unescape_into(raw, scratch).map_err(|msg| self.error(msg))?;
        }
        Ok(())
    }

    fn check_number(&self, start: usize, end: usize, integral: bool) -> Result<(), DecodeError> {
        if number_in_range(&self.buf[start..end], integral) {
            Ok(())
        } else {
            Err(self.error("number out of range"))
        }
    }

    fn scan_key(&mut self, scratch: &mut Vec<u8>) -> Result<(), DecodeError> {
        self.skip_ws();
        let span: StringSpan = self.scan_string()?;
        self.check_string(&span, scratch)?;
        self.skip_ws();
        if self.peek() != Some(b':') {
            return Err(self.error("expected ':'"));
        }
        self.pos += 1;
        Ok(())
    }

    // Passes over one complete value of any shape, validating strings and
    // numbers as it goes. `nesting` holds the expected closing bracket of each
    // open container; `scratch` receives unescaped text that is then dropped.
    fn skip_value(&mut self, nesting: &mut Vec<u8>, scratch: &mut Vec<u8>) -> Result<(), DecodeError> {
        nesting.clear();

        loop {
            // #1. One value, or the opening of a non-empty container
            self.skip_ws();
            match self.peek() {
                Some(b'[') => {
                    self.pos += 1;
                    self.skip_ws();
                    if self.peek() == Some(b']') {
                        self.pos += 1;
                    } else {
                        nesting.push(b']');
                        continue;
                    }
                }
                Some(b'{') => {
                    self.pos += 1;
                    self.skip_ws();
                    if self.peek() == Some(b'}') {
                        self.pos += 1;
                    } else {
                        nesting.push(b'}');
                        self.scan_key(scratch)?;
                        continue;
                    }
                }
                Some(b'"') => {
                    let span: StringSpan = self.scan_string()?;
                    self.check_string(&span, scratch)?;
                }
                Some(b't' | b'f' | b'n') => self.scan_literal()?,
                Some(b'-' | b'0'..=b'9') => {
                    let (start, end, integral) = self.scan_number()?;
                    self.check_number(start, end, integral)?;
                }
                _ => return Err(self.error("expected value")),
            }

            // #2. Close finished containers until a separator asks for the next value
            loop {
                let closer: u8 = match nesting.last() {
                    Some(&closer) => closer,
                    None => return Ok(()),
                };
                self.skip_ws();
                match self.peek() {
                    Some(b',') => {
                        self.pos += 1;
                        if closer == b'}' {
                            self.scan_key(scratch)?;
                        }
                        break;
                    }
                    Some(b) if b == closer => {
                        self.pos += 1;
                        nesting.pop();
                    }
                    _ => return Err(self.error("expected ',' or closing bracket")),
                }
            }
        }
    }
}


//
// TOKEN CONVERSION
//

// Base-10 i64 from an integral number token. `-0` and out-of-range
// magnitudes are rejected, matching how serde_json classifies them.
fn parse_i64(text: &[u8]) -> Option<i64> {
    let (negative, digits) = match text.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, text),
    };
    if digits.is_empty() {
        return None;
    }

    let mut magnitude: u64 = 0;
    for &d in digits {
        if !d.is_ascii_digit() {
            return None;
        }
        magnitude = magnitude.checked_mul(10)?.checked_add(u64::from(d - b'0'))?;
    }

    if !negative {
        return i64::try_from(magnitude).ok();
    }
    match magnitude {
        0 => None,
        m if m == i64::MIN.unsigned_abs() => Some(i64::MIN),
        m => i64::try_from(m).ok().map(|v| -v),
    }
}

// Integers in i64 range are always representable; anything else must parse
// to a finite f64, as serde_json requires.
fn number_in_range(text: &[u8], integral: bool) -> bool {
    if integral && parse_i64(text).is_some() {
        return true;
    }
    std::str::from_utf8(text)
        .ok()
        .and_then(|t| t.parse::<f64>().ok())
        .map_or(false, f64::is_finite)
}

fn hex4(raw: &[u8], at: usize) -> Option<u32> {
    let digits: &[u8] = raw.get(at..at + 4)?;
    let text: &str = std::str::from_utf8(digits).ok()?;
    u32::from_str_radix(text, 16).ok()
}

// Resolves JSON escapes of an already-validated string body into `out`.
fn unescape_into(raw: &[u8], out: &mut Vec<u8>) -> Result<(), &'static str> {
    out.clear();
    let mut i: usize = 0;

    while i < raw.len() {
        let b: u8 = raw[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }

        let escape: u8 = raw.get(i + 1).copied().ok_or("truncated escape")?;
        i += 2;
        let simple: Option<u8> = match escape {
            b'"' => Some(b'"'),
            b'\\' => Some(b'\\'),
            b'/' => Some(b'/'),
            b'b' => Some(0x08),
            b'f' => Some(0x0c),
            b'n' => Some(b'\n'),
            b'r' => Some(b'\r'),
            b't' => Some(b'\t'),
            b'u' => None,
            _ => return Err("invalid escape"),
        };
        if let Some(byte) = simple {
            out.push(byte);
            continue;
        }

        let first: u32 = hex4(raw, i).ok_or("invalid unicode escape")?;
        i += 4;
        let code: u32 = match first {
            0xD800..=0xDBFF => {
                if raw.get(i) != Some(&b'\\') || raw.get(i + 1) != Some(&b'u') {
                    return Err("lone leading surrogate in hex escape");
                }
                let second: u32 = hex4(raw, i + 2).ok_or("invalid unicode escape")?;
                if !(0xDC00..=0xDFFF).contains(&second) {
                    return Err("invalid surrogate pair in hex escape");
                }
                i += 6;
                0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00)
            }
            0xDC00..=0xDFFF => return Err("lone trailing surrogate in hex escape"),
            other => other,
        };
        let ch: char = char::from_u32(code).ok_or("invalid unicode escape")?;
        let mut utf8: [u8; 4] = [0; 4];
        out.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
    }

    Ok(())
}


//
// CURSOR
//

struct ScanCursor<'s, 'a> {
    scanner: &'s mut Scanner<'a>,
    nesting: &'s mut Vec<u8>,
    unescaped: &'s mut Vec<u8>,
    first: bool,
    done: bool,
}

impl ScanCursor<'_, '_> {
    // The wrong-class value is still consumed, so a syntax error inside it
    // surfaces as a payload error rather than a type error.
    fn mismatch(&mut self, kind: JsonKind) -> Result<Pulled, DecodeError> {
        self.scanner.skip_value(self.nesting, self.unescaped)?;
        Ok(Pulled::Mismatch(kind))
    }

    fn decimal(&mut self) -> Result<String, DecodeError> {
        let span: StringSpan = self.scanner.scan_string()?;
        let buf: &[u8] = self.scanner.buf;
        let raw: &[u8] = &buf[span.start..span.end];

        // #1. Fast path: copy the span as-is
        if !span.escaped {
            return std::str::from_utf8(raw)
                .map(str::to_owned)
                .map_err(|_| self.scanner.error("invalid UTF-8 in string"));
        }

        // #2. Escaped content goes through the reusable scratch buffer
        unescape_into(raw, self.unescaped).map_err(|msg| self.scanner.error(msg))?;
        std::str::from_utf8(self.unescaped.as_slice())
            .map(str::to_owned)
            .map_err(|_| self.scanner.error("invalid UTF-8 in string"))
    }
}

impl ElementCursor for ScanCursor<'_, '_> {
    fn pull(&mut self, slot: Slot) -> Result<Pulled, DecodeError> {
        if self.done {
            return Ok(Pulled::End);
        }

        // #1. Separator or closing bracket
        self.scanner.skip_ws();
        if self.scanner.peek() == Some(b']') {
            self.scanner.pos += 1;
            self.done = true;
            return Ok(Pulled::End);
        }
        if self.first {
            self.first = false;
        } else if self.scanner.peek() == Some(b',') {
            self.scanner.pos += 1;
            self.scanner.skip_ws();
        } else {
            return Err(self.scanner.error("expected ',' or ']'"));
        }

        // #2. Convert the token in place
        let kind: JsonKind = self.scanner.kind_at().ok_or_else(|| self.scanner.error("expected value"))?;
        match slot {
            Slot::Int(_) => {
                if kind != JsonKind::Number {
                    return self.mismatch(kind);
                }
                let (start, end, integral) = self.scanner.scan_number()?;
                if integral {
                    if let Some(value) = parse_i64(&self.scanner.buf[start..end]) {
                        return Ok(Pulled::Int(value));
                    }
                }
                self.scanner.check_number(start, end, integral)?;
                Ok(Pulled::Mismatch(JsonKind::Number))
            }
            Slot::Decimal(_) => {
                if kind != JsonKind::String {
                    return self.mismatch(kind);
                }
                self.decimal().map(Pulled::Decimal)
            }
            Slot::Skip => {
                self.scanner.skip_value(self.nesting, self.unescaped)?;
                Ok(Pulled::Skipped)
            }
        }
    }

    fn finish(&mut self) -> Result<(), DecodeError> {
        while let Pulled::Skipped = self.pull(Slot::Skip)? {}
        Ok(())
    }
}


//
// DECODER
//

/// Production backend. Keeps its bracket stack and unescape buffer across
/// calls, so one instance serves many decodes but must not be shared
/// between threads.
#[derive(Debug, Default)]
pub struct ScanDecoder {
    nesting: Vec<u8>,
    unescaped: Vec<u8>,
}

impl ScanDecoder {
    pub fn new() -> Self {
        ScanDecoder::default()
    }

    fn run(&mut self, payload: &[u8], schema: &RecordSchema, out: &mut Vec<Kline>) -> Result<(), DecodeError> {
        let mut scanner: Scanner = Scanner::new(payload);

        // #1. Outer array
        scanner.skip_ws();
        match scanner.kind_at() {
            Some(JsonKind::Array) => scanner.pos += 1,
            Some(kind) => return Err(DecodeError::payload(format!("expected an array, found {}", kind))),
            None if scanner.peek().is_none() => return Err(DecodeError::payload("empty payload")),
            None => return Err(scanner.error("expected value")),
        }

        scanner.skip_ws();
        if scanner.peek() == Some(b']') {
            scanner.pos += 1;
        } else {
            // #2. One record per element
            let mut record: usize = 0;
            loop {
                scanner.skip_ws();
                match scanner.kind_at() {
                    Some(JsonKind::Array) => {
                        scanner.pos += 1;
                        let mut cursor = ScanCursor {
                            scanner: &mut scanner,
                            nesting: &mut self.nesting,
                            unescaped: &mut self.unescaped,
                            first: true,
                            done: false,
                        };
                        let kline: Kline =
                            assemble_record(schema, record, &mut cursor).map_err(|e| e.in_record(record))?;
                        out.push(kline);
                    }
                    Some(kind) => {
                        return Err(DecodeError::MalformedRecord {
                            record,
                            defect: RecordDefect::NotAnArray(kind),
                        });
                    }
                    None => return Err(scanner.error("expected value").in_record(record)),
                }
                record += 1;

                scanner.skip_ws();
                match scanner.peek() {
                    Some(b',') => scanner.pos += 1,
                    Some(b']') => {
                        scanner.pos += 1;
                        break;
                    }
                    _ => return Err(scanner.error("expected ',' or ']'")),
                }
            }
        }

        // #3. Nothing but whitespace may follow
        scanner.skip_ws();
        if scanner.pos != payload.len() {
            return Err(scanner.error("trailing characters"));
        }

        trace!("scan decoder produced {} records from {} bytes", out.len(), payload.len());
        Ok(())
    }
}

impl KlineDecoder for ScanDecoder {
    fn name(&self) -> &'static str {
        "scan"
    }

    fn decode_into(&mut self, payload: &[u8], schema: &RecordSchema, out: &mut Vec<Kline>) -> Result<(), DecodeError> {
        all_or_nothing(out, |out| self.run(payload, schema, out))
    }
}
