//! Regex surface lexer. Runs a small state stack — regular,
//! inside a character class, and just-after-backslash — over the pattern
//! bytes and emits a flat token stream; [super::ast] inserts explicit
//! concatenation and runs the shunting-yard parse over it.
use crate::error::MalformedRegex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSpec {
    pub ranges: Vec<(u32, u32)>,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Class(ClassSpec),
    Pipe,
    Star,
    Plus,
    Question,
    LParen,
    RParen,
}

fn single_char_class(c: char) -> ClassSpec {
    ClassSpec {
        ranges: vec![(c as u32, c as u32 + 1)],
        negated: false,
    }
}

fn any_char_class() -> ClassSpec {
    ClassSpec {
        ranges: vec![(0, 0x0011_0000)],
        negated: false,
    }
}

fn digit_class() -> ClassSpec {
    ClassSpec {
        ranges: vec![(b'0' as u32, b'9' as u32 + 1)],
        negated: false,
    }
}

/// Expand a backslash escape to the literal character or class it denotes.
/// `\d` is expanded to `[0-9]` rather than left as a no-op.
fn escape(c: char, position: usize) -> Result<EscapeResult, MalformedRegex> {
    Ok(match c {
        '\\' | '|' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '.' | '^' | '$' | '-' => {
            EscapeResult::Char(c)
        }
        'n' => EscapeResult::Char('\n'),
        't' => EscapeResult::Char('\t'),
        'r' => EscapeResult::Char('\r'),
        'd' => EscapeResult::Class(digit_class()),
        other => {
            return Err(MalformedRegex::new(
                position,
                format!("unknown escape '\\{}'", other),
            ))
        }
    })
}

enum EscapeResult {
    Char(char),
    Class(ClassSpec),
}

/// Lex `pattern` into a flat token stream, each token paired with the
/// char index it starts at so downstream parse errors can report a real
/// position instead of a constant.
pub fn lex(pattern: &str) -> Result<Vec<(Token, usize)>, MalformedRegex> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        let start = i;
        {
            match c {
                '\\' => {
                    i += 1;
                    let escaped = *chars
                        .get(i)
                        .ok_or_else(|| MalformedRegex::new(i, "dangling backslash"))?;
                    match escape(escaped, i)? {
                        EscapeResult::Char(ch) => {
                            tokens.push((Token::Class(single_char_class(ch)), start))
                        }
                        EscapeResult::Class(spec) => tokens.push((Token::Class(spec), start)),
                    }
                    i += 1;
                }
                '.' => {
                    tokens.push((Token::Class(any_char_class()), start));
                    i += 1;
                }
                '|' => {
                    tokens.push((Token::Pipe, start));
                    i += 1;
                }
                '*' => {
                    tokens.push((Token::Star, start));
                    i += 1;
                }
                '+' => {
                    tokens.push((Token::Plus, start));
                    i += 1;
                }
                '?' => {
                    tokens.push((Token::Question, start));
                    i += 1;
                }
                '(' => {
                    tokens.push((Token::LParen, start));
                    i += 1;
                }
                ')' => {
                    tokens.push((Token::RParen, start));
                    i += 1;
                }
                '[' => {
                    let (spec, consumed) = lex_class(&chars, i)?;
                    tokens.push((Token::Class(spec), start));
                    i += consumed;
                }
                ']' => {
                    return Err(MalformedRegex::new(i, "unmatched ']'"));
                }
                ch => {
                    tokens.push((Token::Class(single_char_class(ch)), start));
                    i += 1;
                }
            }
        }
    }
    Ok(tokens)
}

/// Lex a bracket expression `[...]`/`[^...]` starting at `chars[start] == '['`
/// into a flattened, still-possibly-overlapping, set of ranges. Returns the
/// spec and the number of source characters consumed.
fn lex_class(chars: &[char], start: usize) -> Result<(ClassSpec, usize), MalformedRegex> {
    let mut i = start + 1;
    let mut negated = false;
    if chars.get(i) == Some(&'^') {
        negated = true;
        i += 1;
    }
    let mut ranges = Vec::new();
    let class_start = i;
    loop {
        match chars.get(i) {
            None => return Err(MalformedRegex::new(start, "unterminated character class")),
            Some(']') if i > class_start => {
                i += 1;
                break;
            }
            _ => {}
        }
        let lo_char = read_class_atom(chars, &mut i)?;
        if chars.get(i) == Some(&'-') && chars.get(i + 1) != Some(&']') && chars.get(i + 1).is_some()
        {
            i += 1;
            let hi_char = read_class_atom(chars, &mut i)?;
            if hi_char < lo_char {
                return Err(MalformedRegex::new(
                    i,
                    format!("bad range '{}-{}'", lo_char as u8 as char, hi_char as u8 as char),
                ));
            }
            ranges.push((lo_char, hi_char + 1));
        } else {
            ranges.push((lo_char, lo_char + 1));
        }
    }
    if ranges.is_empty() {
        return Err(MalformedRegex::new(start, "empty character class"));
    }
    Ok((ClassSpec { ranges, negated }, i - start))
}

fn read_class_atom(chars: &[char], i: &mut usize) -> Result<u32, MalformedRegex> {
    match chars.get(*i) {
        None => Err(MalformedRegex::new(*i, "unterminated character class")),
        Some('\\') => {
            *i += 1;
            let escaped = *chars
                .get(*i)
                .ok_or_else(|| MalformedRegex::new(*i, "dangling backslash in class"))?;
            let result = match escape(escaped, *i)? {
                EscapeResult::Char(ch) => ch as u32,
                EscapeResult::Class(_) => {
                    return Err(MalformedRegex::new(
                        *i,
                        "class escape not allowed inside a character class",
                    ))
                }
            };
            *i += 1;
            Ok(result)
        }
        Some(ch) => {
            let cp = *ch as u32;
            *i += 1;
            Ok(cp)
        }
    }
}
