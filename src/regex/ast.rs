//! Regex AST and the shunting-yard parser that builds it from the token
//! stream produced by [super::lexer]. Precedence, lowest to
//! highest: `|` < concatenation < postfix `* + ?`.
use crate::error::MalformedRegex;
use crate::regex::lexer::{lex, ClassSpec, Token};

#[derive(Debug, Clone)]
pub enum RegexAst {
    Class(ClassSpec),
    Concat(Box<RegexAst>, Box<RegexAst>),
    Union(Box<RegexAst>, Box<RegexAst>),
    Star(Box<RegexAst>),
    Plus(Box<RegexAst>),
    Question(Box<RegexAst>),
}

impl RegexAst {
    /// Collect every class-interval this AST references, for insertion into
    /// the shared range map before NFA construction.
    pub fn collect_intervals(&self, out: &mut Vec<(u32, u32)>) {
        match self {
            RegexAst::Class(spec) => out.extend_from_slice(&spec.ranges),
            RegexAst::Concat(a, b) | RegexAst::Union(a, b) => {
                a.collect_intervals(out);
                b.collect_intervals(out);
            }
            RegexAst::Star(a) | RegexAst::Plus(a) | RegexAst::Question(a) => {
                a.collect_intervals(out)
            }
        }
    }
}

/// Whether a token can end an atom (so a following atom-starting token
/// implies an inserted concatenation operator).
fn ends_atom(token: &Token) -> bool {
    matches!(
        token,
        Token::Class(_) | Token::RParen | Token::Star | Token::Plus | Token::Question
    )
}

fn starts_atom(token: &Token) -> bool {
    matches!(token, Token::Class(_) | Token::LParen)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Pipe,
    Concat,
    LParen,
}

impl Op {
    fn precedence(self) -> u8 {
        match self {
            Op::Pipe => 1,
            Op::Concat => 2,
            Op::LParen => 0,
        }
    }
}

/// Parse a pattern into a [RegexAst]: lex it, insert explicit concatenation
/// operators between adjacent atoms, then run the shunting-yard algorithm
/// over the resulting stream, building the AST directly (the output stack
/// holds partial ASTs instead of plain values).
pub fn parse(pattern: &str) -> Result<RegexAst, MalformedRegex> {
    #[derive(Debug, Clone)]
    enum Item {
        Atom(Token),
        Concat,
        Op(Token),
    }

    let raw_tokens = lex(pattern)?;
    if raw_tokens.is_empty() {
        return Err(MalformedRegex::new(0, "empty pattern"));
    }
    let mut stream: Vec<(Item, usize)> = Vec::with_capacity(raw_tokens.len() * 2);
    for (i, (token, position)) in raw_tokens.into_iter().enumerate() {
        if i > 0 {
            let needs_concat = {
                let prev_is_atom_end = matches!(
                    stream.last(),
                    Some((Item::Atom(t), _)) if ends_atom(t)
                ) || matches!(stream.last(), Some((Item::Op(Token::RParen), _)))
                    || matches!(
                        stream.last(),
                        Some((Item::Op(t), _)) if matches!(t, Token::Star | Token::Plus | Token::Question)
                    );
                prev_is_atom_end && starts_atom(&token)
            };
            if needs_concat {
                stream.push((Item::Concat, position));
            }
        }
        match token {
            Token::Class(spec) => stream.push((Item::Atom(Token::Class(spec)), position)),
            other @ (Token::LParen | Token::RParen | Token::Pipe | Token::Star
            | Token::Plus
            | Token::Question) => stream.push((Item::Op(other), position)),
        }
    }

    let mut output: Vec<RegexAst> = Vec::new();
    let mut ops: Vec<Op> = Vec::new();

    let apply = |ops: &mut Vec<Op>, output: &mut Vec<RegexAst>, position: usize| -> Result<(), MalformedRegex> {
        let op = ops.pop().expect("apply called with empty operator stack");
        match op {
            Op::LParen => Err(MalformedRegex::new(position, "unmatched '('")),
            Op::Pipe => {
                let b = output
                    .pop()
                    .ok_or_else(|| MalformedRegex::new(position, "dangling '|'"))?;
                let a = output
                    .pop()
                    .ok_or_else(|| MalformedRegex::new(position, "dangling '|'"))?;
                output.push(RegexAst::Union(Box::new(a), Box::new(b)));
                Ok(())
            }
            Op::Concat => {
                let b = output
                    .pop()
                    .ok_or_else(|| MalformedRegex::new(position, "malformed concatenation"))?;
                let a = output
                    .pop()
                    .ok_or_else(|| MalformedRegex::new(position, "malformed concatenation"))?;
                output.push(RegexAst::Concat(Box::new(a), Box::new(b)));
                Ok(())
            }
        }
    };

    for (item, position) in stream {
        match item {
            Item::Atom(Token::Class(spec)) => output.push(RegexAst::Class(spec)),
            Item::Atom(_) => unreachable!("only Class atoms are pushed"),
            Item::Concat => {
                while matches!(ops.last(), Some(op) if op.precedence() >= Op::Concat.precedence())
                {
                    apply(&mut ops, &mut output, position)?;
                }
                ops.push(Op::Concat);
            }
            Item::Op(Token::Pipe) => {
                while matches!(ops.last(), Some(op) if op.precedence() >= Op::Pipe.precedence()) {
                    apply(&mut ops, &mut output, position)?;
                }
                ops.push(Op::Pipe);
            }
            Item::Op(Token::LParen) => ops.push(Op::LParen),
            Item::Op(Token::RParen) => {
                loop {
                    match ops.last() {
                        Some(Op::LParen) => {
                            ops.pop();
                            break;
                        }
                        Some(_) => apply(&mut ops, &mut output, position)?,
                        None => return Err(MalformedRegex::new(position, "unmatched ')'")),
                    }
                }
            }
            Item::Op(postfix @ (Token::Star | Token::Plus | Token::Question)) => {
                let inner = output
                    .pop()
                    .ok_or_else(|| MalformedRegex::new(position, "dangling postfix operator"))?;
                output.push(match postfix {
                    Token::Star => RegexAst::Star(Box::new(inner)),
                    Token::Plus => RegexAst::Plus(Box::new(inner)),
                    Token::Question => RegexAst::Question(Box::new(inner)),
                    _ => unreachable!(),
                });
            }
            Item::Op(Token::Class(_)) => unreachable!("Class never wrapped as Op"),
        }
    }

    let end_position = pattern.chars().count();
    while !ops.is_empty() {
        apply(&mut ops, &mut output, end_position)?;
    }

    if output.len() != 1 {
        return Err(MalformedRegex::new(end_position, "malformed expression"));
    }
    Ok(output.pop().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_alternation() {
        let ast = parse("a|b|c").unwrap();
        assert!(matches!(ast, RegexAst::Union(_, _)));
    }

    #[test]
    fn parses_star_over_group() {
        let ast = parse("(ab)*").unwrap();
        assert!(matches!(ast, RegexAst::Star(_)));
    }

    #[test]
    fn rejects_dangling_postfix() {
        assert!(parse("*a").is_err());
    }

    #[test]
    fn rejects_unmatched_parens() {
        assert!(parse("(a").is_err());
        assert!(parse("a)").is_err());
    }

    #[test]
    fn malformed_regex_reports_real_position_not_zero() {
        let err = parse("ab)").unwrap_err();
        assert_eq!(err.position, 2);

        let err = parse("a|").unwrap_err();
        assert_eq!(err.position, 2);
    }
}
