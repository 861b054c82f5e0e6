use crate::errors::SyntaxError;

/// Longest expression accepted by the lexer.
pub const MAX_EXPRESSION_LEN: usize = 4096;

/// Punctuation allowed inside string literals besides word characters and spaces.
const STRING_PUNCTUATION: &str = "\\/,:%-.+*#@!?()[]{}|^$=<>&;~";

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Assign,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Int(value) => value.to_string(),
            Token::Float(value) => value.to_string(),
            Token::Str(value) => format!("'{value}'"),
            Token::Ident(name) => name.clone(),
            other => other.symbol().to_string(),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::DoubleStar => "**",
            Token::Slash => "/",
            Token::DoubleSlash => "//",
            Token::Percent => "%",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::Assign => "=",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Dot => ".",
            Token::Int(_) | Token::Float(_) | Token::Str(_) | Token::Ident(_) => "",
        }
    }

    pub fn is_ident(&self, name: &str) -> bool {
        matches!(self, Token::Ident(ident) if ident == name)
    }
}

/// Token with the char offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Split an expression into tokens, rejecting anything outside the repertoire.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, SyntaxError> {
    let chars: Vec<char> = source.chars().collect();
    if chars.len() > MAX_EXPRESSION_LEN {
        return Err(SyntaxError::new(
            format!("expression longer than {MAX_EXPRESSION_LEN} characters"),
            MAX_EXPRESSION_LEN,
        ));
    }

    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        let ch = chars[pos];
        let start = pos;
        let token = match ch {
            ' ' => {
                pos += 1;
                continue;
            }
            '0'..='9' => {
                let (token, next) = lex_number(&chars, pos)?;
                pos = next;
                token
            }
            '\'' | '"' => {
                let (token, next) = lex_string(&chars, pos)?;
                pos = next;
                token
            }
            ch if ch == '_' || ch.is_ascii_alphabetic() => {
                while pos < chars.len() && (chars[pos] == '_' || chars[pos].is_ascii_alphanumeric())
                {
                    pos += 1;
                }
                Token::Ident(chars[start..pos].iter().collect())
            }
            _ => {
                let next = chars.get(pos + 1).copied();
                let (token, width) = match (ch, next) {
                    ('*', Some('*')) => (Token::DoubleStar, 2),
                    ('/', Some('/')) => (Token::DoubleSlash, 2),
                    ('=', Some('=')) => (Token::EqEq, 2),
                    ('!', Some('=')) => (Token::NotEq, 2),
                    ('<', Some('=')) => (Token::Le, 2),
                    ('>', Some('=')) => (Token::Ge, 2),
                    ('+', _) => (Token::Plus, 1),
                    ('-', _) => (Token::Minus, 1),
                    ('*', _) => (Token::Star, 1),
                    ('/', _) => (Token::Slash, 1),
                    ('%', _) => (Token::Percent, 1),
                    ('<', _) => (Token::Lt, 1),
                    ('>', _) => (Token::Gt, 1),
                    ('=', _) => (Token::Assign, 1),
                    ('(', _) => (Token::LParen, 1),
                    (')', _) => (Token::RParen, 1),
                    ('[', _) => (Token::LBracket, 1),
                    (']', _) => (Token::RBracket, 1),
                    ('{', _) => (Token::LBrace, 1),
                    ('}', _) => (Token::RBrace, 1),
                    (',', _) => (Token::Comma, 1),
                    (':', _) => (Token::Colon, 1),
                    ('.', _) => (Token::Dot, 1),
                    (other, _) => {
                        return Err(SyntaxError::new(
                            format!("unexpected character {other:?}"),
                            pos,
                        ));
                    }
                };
                pos += width;
                token
            }
        };
        tokens.push(Spanned {
            token,
            position: start,
        });
    }
    Ok(tokens)
}

fn lex_number(chars: &[char], start: usize) -> Result<(Token, usize), SyntaxError> {
    let mut pos = start;
    while pos < chars.len() && chars[pos].is_ascii_digit() {
        pos += 1;
    }
    let is_float = chars.get(pos) == Some(&'.')
        && chars.get(pos + 1).is_some_and(|ch| ch.is_ascii_digit());
    if is_float {
        pos += 1;
        while pos < chars.len() && chars[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    if chars.get(pos).is_some_and(|ch| ch.is_ascii_alphabetic() || *ch == '_') {
        return Err(SyntaxError::new("invalid number literal", start));
    }

    let text: String = chars[start..pos].iter().collect();
    let token = if is_float {
        text.parse()
            .map(Token::Float)
            .map_err(|_| SyntaxError::new("invalid number literal", start))?
    } else {
        text.parse()
            .map(Token::Int)
            .map_err(|_| SyntaxError::new("integer literal too large", start))?
    };
    Ok((token, pos))
}

fn lex_string(chars: &[char], start: usize) -> Result<(Token, usize), SyntaxError> {
    let quote = chars[start];
    let mut pos = start + 1;
    let mut text = String::new();
    while let Some(&ch) = chars.get(pos) {
        if ch == quote {
            return Ok((Token::Str(text), pos + 1));
        }
        if !(ch.is_alphanumeric() || ch == '_' || ch == ' ' || STRING_PUNCTUATION.contains(ch)) {
            return Err(SyntaxError::new(
                format!("character {ch:?} is not allowed in string literals"),
                pos,
            ));
        }
        text.push(ch);
        pos += 1;
    }
    Err(SyntaxError::new("unterminated string literal", start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .expect("tokenize")
            .into_iter()
            .map(|spanned| spanned.token)
            .collect()
    }

    #[test]
    fn operators_prefer_the_longest_match() {
        assert_eq!(
            kinds("a ** b // c <= d == e"),
            vec![
                Token::Ident("a".into()),
                Token::DoubleStar,
                Token::Ident("b".into()),
                Token::DoubleSlash,
                Token::Ident("c".into()),
                Token::Le,
                Token::Ident("d".into()),
                Token::EqEq,
                Token::Ident("e".into()),
            ]
        );
    }

    #[test]
    fn numbers_and_strings() {
        assert_eq!(
            kinds("12 1.5 'a b' \"%Y-%m-%d\""),
            vec![
                Token::Int(12),
                Token::Float(1.5),
                Token::Str("a b".into()),
                Token::Str("%Y-%m-%d".into()),
            ]
        );
        assert_eq!(kinds("x.y"), vec![
            Token::Ident("x".into()),
            Token::Dot,
            Token::Ident("y".into())
        ]);
    }

    #[test]
    fn rejects_outside_repertoire() {
        assert!(tokenize("a\tb").is_err());
        assert!(tokenize("'unterminated").is_err());
        assert!(tokenize("'it\\'s'").is_err());
        assert!(tokenize("a; b").is_err());
        assert!(tokenize("`x`").is_err());
        assert!(tokenize("1abc").is_err());
        assert!(tokenize(&"a".repeat(MAX_EXPRESSION_LEN + 1)).is_err());
    }
}
