use crate::functions::Builtin;
use crate::lexer::{Spanned, Token, tokenize};

pub(crate) const KEYWORDS: &[&str] = &[
    "and", "or", "not", "in", "is", "if", "else", "True", "False", "None",
];
pub(crate) const LOCALS: &[&str] = &["this", "field", "param", "fake"];

/// Whitelist check run before any expression is parsed or evaluated.
///
/// Accepts only the token repertoire of the language; every bare name must be
/// a keyword, a row local or an approved builtin, and attribute access is
/// limited to `fake.<generator>`, `param.get` and builtins in method form.
pub fn is_safe(expression: &str) -> bool {
    match tokenize(expression) {
        Ok(tokens) => !tokens.is_empty() && (0..tokens.len()).all(|index| allowed(&tokens, index)),
        Err(_) => false,
    }
}

fn allowed(tokens: &[Spanned], index: usize) -> bool {
    let Token::Ident(name) = &tokens[index].token else {
        return true;
    };
    let previous = index.checked_sub(1).map(|i| &tokens[i].token);
    let next = tokens.get(index + 1).map(|spanned| &spanned.token);

    if previous == Some(&Token::Dot) {
        if name.starts_with('_') {
            return false;
        }
        return match attribute_owner(tokens, index) {
            Some("fake") => true,
            Some("param") => name == "get",
            _ => Builtin::from_name(name).is_some(),
        };
    }
    if next == Some(&Token::Assign) {
        return !name.starts_with('_');
    }
    KEYWORDS.contains(&name.as_str())
        || LOCALS.contains(&name.as_str())
        || Builtin::from_name(name).is_some()
}

/// Bare name the attribute at `index` hangs off, if it is one.
fn attribute_owner(tokens: &[Spanned], index: usize) -> Option<&str> {
    let owner = index.checked_sub(2)?;
    let chained = owner
        .checked_sub(1)
        .is_some_and(|i| tokens[i].token == Token::Dot);
    match &tokens[owner].token {
        Token::Ident(name) if !chained => Some(name.as_str()),
        _ => None,
    }
}
