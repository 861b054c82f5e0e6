use crate::ast::{BinOp, BoolOp, CmpOp, Expr, Literal, UnaryOp};
use crate::errors::SyntaxError;
use crate::functions::Builtin;
use crate::lexer::{Spanned, Token, tokenize};

/// Deepest nesting accepted before parsing gives up.
pub const MAX_DEPTH: usize = 64;

type Kwargs = Vec<(String, Expr)>;

/// Parse a whole expression.
pub fn parse(source: &str) -> Result<Expr, SyntaxError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(SyntaxError::new("empty expression", 0));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        end: source.chars().count(),
    };
    let expr = parser.expression()?;
    if let Some(spanned) = parser.tokens.get(parser.pos) {
        return Err(unexpected(spanned));
    }
    if expr.height() > MAX_DEPTH {
        return Err(SyntaxError::new(too_deep_message(), 0));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|spanned| &spanned.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|spanned| &spanned.token)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|spanned| spanned.position)
            .unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|spanned| spanned.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().is_some_and(|token| token.is_ident(keyword)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), SyntaxError> {
        if self.eat(token) {
            return Ok(());
        }
        Err(self.error(format!("expected '{}'", token.describe())))
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        match self.tokens.get(self.pos) {
            Some(spanned) => SyntaxError::new(
                format!("{} near '{}'", message.into(), spanned.token.describe()),
                spanned.position,
            ),
            None => SyntaxError::new(format!("{} at end of expression", message.into()), self.end),
        }
    }

    fn expect_name(&mut self) -> Result<String, SyntaxError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error("expected a name")),
        }
    }

    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        if self.depth >= MAX_DEPTH {
            return Err(SyntaxError::new(too_deep_message(), self.position()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Count one more node on a left-leaning operator or postfix chain.
    fn link(&self, links: &mut usize) -> Result<(), SyntaxError> {
        *links += 1;
        if self.depth + *links > MAX_DEPTH {
            return Err(SyntaxError::new(too_deep_message(), self.position()));
        }
        Ok(())
    }

    fn expression(&mut self) -> Result<Expr, SyntaxError> {
        self.nested(Self::conditional)
    }

    fn conditional(&mut self) -> Result<Expr, SyntaxError> {
        let body = self.or_expr()?;
        if !self.eat_keyword("if") {
            return Ok(body);
        }
        let test = self.or_expr()?;
        if !self.eat_keyword("else") {
            return Err(self.error("expected 'else'"));
        }
        let orelse = self.expression()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            body: Box::new(body),
            orelse: Box::new(orelse),
        })
    }

    fn or_expr(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.and_expr()?;
        let mut values = vec![first];
        while self.eat_keyword("or") {
            values.push(self.and_expr()?);
        }
        Ok(bool_op(BoolOp::Or, values))
    }

    fn and_expr(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.not_expr()?;
        let mut values = vec![first];
        while self.eat_keyword("and") {
            values.push(self.not_expr()?);
        }
        Ok(bool_op(BoolOp::And, values))
    }

    fn not_expr(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat_keyword("not") {
            let operand = self.nested(Self::not_expr)?;
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, SyntaxError> {
        let left = self.arith()?;
        let mut comparisons = Vec::new();
        while let Some(op) = self.comparison_op() {
            comparisons.push((op, self.arith()?));
        }
        if comparisons.is_empty() {
            return Ok(left);
        }
        Ok(Expr::Compare {
            left: Box::new(left),
            comparisons,
        })
    }

    fn comparison_op(&mut self) -> Option<CmpOp> {
        let (op, width) = match self.peek()? {
            Token::EqEq => (CmpOp::Eq, 1),
            Token::NotEq => (CmpOp::NotEq, 1),
            Token::Lt => (CmpOp::Lt, 1),
            Token::Le => (CmpOp::Le, 1),
            Token::Gt => (CmpOp::Gt, 1),
            Token::Ge => (CmpOp::Ge, 1),
            token if token.is_ident("in") => (CmpOp::In, 1),
            token if token.is_ident("not") => {
                if !self.peek_at(1)?.is_ident("in") {
                    return None;
                }
                (CmpOp::NotIn, 2)
            }
            token if token.is_ident("is") => {
                if self.peek_at(1).is_some_and(|next| next.is_ident("not")) {
                    (CmpOp::IsNot, 2)
                } else {
                    (CmpOp::Is, 1)
                }
            }
            _ => return None,
        };
        self.pos += width;
        Some(op)
    }

    fn arith(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.term()?;
        let mut links = 0;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(left),
            };
            self.link(&mut links)?;
            self.pos += 1;
            let right = self.term()?;
            left = binary(op, left, right);
        }
    }

    fn term(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.factor()?;
        let mut links = 0;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::DoubleSlash) => BinOp::FloorDiv,
                Some(Token::Percent) => BinOp::Mod,
                _ => return Ok(left),
            };
            self.link(&mut links)?;
            self.pos += 1;
            let right = self.factor()?;
            left = binary(op, left, right);
        }
    }

    fn factor(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Pos,
            _ => return self.power(),
        };
        self.pos += 1;
        let operand = self.nested(Self::factor)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn power(&mut self) -> Result<Expr, SyntaxError> {
        let base = self.postfix()?;
        if !self.eat(&Token::DoubleStar) {
            return Ok(base);
        }
        let exponent = self.nested(Self::factor)?;
        Ok(binary(BinOp::Pow, base, exponent))
    }

    fn postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.atom()?;
        let mut links = 0;
        loop {
            if matches!(
                self.peek(),
                Some(Token::LParen | Token::LBracket | Token::Dot)
            ) {
                self.link(&mut links)?;
            }
            match self.peek() {
                Some(Token::LParen) => {
                    let Expr::Global(func) = expr else {
                        return Err(self.error("expression is not callable"));
                    };
                    self.pos += 1;
                    let (args, kwargs) = self.arguments()?;
                    expr = Expr::Call { func, args, kwargs };
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    expr = self.subscript(expr)?;
                }
                Some(Token::Dot) => {
                    self.pos += 1;
                    let name = self.expect_name()?;
                    let func = Builtin::from_name(&name)
                        .filter(|_| !name.starts_with('_'))
                        .ok_or_else(|| self.error(format!("unknown method '{name}'")))?;
                    self.expect(&Token::LParen)?;
                    let (mut args, kwargs) = self.arguments()?;
                    args.insert(0, expr);
                    expr = Expr::Call { func, args, kwargs };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn subscript(&mut self, value: Expr) -> Result<Expr, SyntaxError> {
        let lower = if self.peek() == Some(&Token::Colon) {
            None
        } else {
            Some(Box::new(self.expression()?))
        };
        if !self.eat(&Token::Colon) {
            self.expect(&Token::RBracket)?;
            let index = lower.ok_or_else(|| self.error("empty subscript"))?;
            return Ok(Expr::Subscript {
                value: Box::new(value),
                index,
            });
        }
        let upper = if self.peek() == Some(&Token::RBracket) {
            None
        } else {
            Some(Box::new(self.expression()?))
        };
        self.expect(&Token::RBracket)?;
        Ok(Expr::Slice {
            value: Box::new(value),
            lower,
            upper,
        })
    }

    /// Call arguments after the opening parenthesis.
    fn arguments(&mut self) -> Result<(Vec<Expr>, Kwargs), SyntaxError> {
        let mut args = Vec::new();
        let mut kwargs: Kwargs = Vec::new();
        while !self.eat(&Token::RParen) {
            let keyword = match (self.peek(), self.peek_at(1)) {
                (Some(Token::Ident(name)), Some(Token::Assign)) => Some(name.clone()),
                _ => None,
            };
            match keyword {
                Some(name) => {
                    if kwargs.iter().any(|(existing, _)| *existing == name) {
                        return Err(self.error(format!("keyword argument repeated: {name}")));
                    }
                    self.pos += 2;
                    kwargs.push((name, self.expression()?));
                }
                None => {
                    if !kwargs.is_empty() {
                        return Err(self.error("positional argument follows keyword argument"));
                    }
                    args.push(self.expression()?);
                }
            }
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RParen)?;
                break;
            }
        }
        Ok((args, kwargs))
    }

    fn sequence(&mut self, close: &Token) -> Result<Vec<Expr>, SyntaxError> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.expression()?);
            if !self.eat(&Token::Comma) {
                self.expect(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn atom(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.pos;
        let Some(token) = self.advance() else {
            return Err(self.error("unexpected end of expression"));
        };
        let expr = match token {
            Token::Int(value) => Expr::Literal(Literal::Int(value)),
            Token::Float(value) => Expr::Literal(Literal::Float(value)),
            Token::Str(value) => Expr::Literal(Literal::Str(value)),
            Token::LParen => self.nested(Self::parenthesized)?,
            Token::LBracket => Expr::List(self.nested(|p| p.sequence(&Token::RBracket))?),
            Token::LBrace => Expr::Dict(self.nested(Self::dict)?),
            Token::Ident(name) => self.name(&name, start)?,
            other => return Err(unexpected(&Spanned {
                token: other,
                position: self.tokens[start].position,
            })),
        };
        Ok(expr)
    }

    fn parenthesized(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat(&Token::RParen) {
            return Ok(Expr::Tuple(Vec::new()));
        }
        let first = self.expression()?;
        if self.eat(&Token::RParen) {
            return Ok(first);
        }
        self.expect(&Token::Comma)?;
        let mut items = vec![first];
        items.extend(self.sequence(&Token::RParen)?);
        Ok(Expr::Tuple(items))
    }

    fn dict(&mut self) -> Result<Vec<(Expr, Expr)>, SyntaxError> {
        let mut entries = Vec::new();
        while !self.eat(&Token::RBrace) {
            let key = self.expression()?;
            self.expect(&Token::Colon)?;
            let value = self.expression()?;
            entries.push((key, value));
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RBrace)?;
                break;
            }
        }
        Ok(entries)
    }

    fn name(&mut self, name: &str, start: usize) -> Result<Expr, SyntaxError> {
        let expr = match name {
            "True" => Expr::Literal(Literal::Bool(true)),
            "False" => Expr::Literal(Literal::Bool(false)),
            "None" => Expr::Literal(Literal::None),
            "this" => Expr::This,
            "field" => Expr::Field,
            "param" if self.peek() == Some(&Token::Dot) => {
                self.pos += 1;
                let method = self.expect_name()?;
                if method != "get" {
                    return Err(self.error(format!("param has no method '{method}'")));
                }
                self.expect(&Token::LParen)?;
                let (args, kwargs) = self.arguments()?;
                if !kwargs.is_empty() || args.is_empty() || args.len() > 2 {
                    return Err(self.error("param.get() takes a name and an optional default"));
                }
                Expr::ParamCall { args }
            }
            "param" => Expr::Param,
            "fake" => {
                self.expect(&Token::Dot)?;
                let method = self.expect_name()?;
                if method.starts_with('_') {
                    return Err(self.error(format!("fake has no method '{method}'")));
                }
                self.expect(&Token::LParen)?;
                let (args, kwargs) = self.arguments()?;
                Expr::FakeCall {
                    method,
                    args,
                    kwargs,
                }
            }
            other => match Builtin::from_name(other) {
                Some(builtin) => Expr::Global(builtin),
                None => {
                    return Err(SyntaxError::new(
                        format!("name '{other}' is not defined"),
                        self.tokens[start].position,
                    ));
                }
            },
        };
        Ok(expr)
    }
}

fn too_deep_message() -> String {
    format!("expression nested deeper than {MAX_DEPTH} levels")
}

fn unexpected(spanned: &Spanned) -> SyntaxError {
    SyntaxError::new(
        format!("unexpected '{}'", spanned.token.describe()),
        spanned.position,
    )
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn bool_op(op: BoolOp, mut values: Vec<Expr>) -> Expr {
    if values.len() == 1 {
        return values.remove(0);
    }
    Expr::BoolOp { op, values }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_operator_precedence() {
        let expr = parse("1 + 2 * 3 ** 2").expect("parse");
        let Expr::Binary { op: BinOp::Add, right, .. } = expr else {
            panic!("expected addition at the root");
        };
        let Expr::Binary { op: BinOp::Mul, right, .. } = *right else {
            panic!("expected multiplication");
        };
        assert!(matches!(*right, Expr::Binary { op: BinOp::Pow, .. }));
    }

    #[test]
    fn method_form_prepends_the_receiver() {
        let expr = parse("this.replace('a', 'b')").expect("parse");
        let Expr::Call { func, args, .. } = expr else {
            panic!("expected call");
        };
        assert_eq!(func, Builtin::Replace);
        assert_eq!(args.len(), 3);
        assert_eq!(args[0], Expr::This);
    }

    #[test]
    fn slices_and_subscripts() {
        assert!(matches!(parse("this[1:]").expect("parse"), Expr::Slice { upper: None, .. }));
        assert!(matches!(parse("this[:2]").expect("parse"), Expr::Slice { lower: None, .. }));
        assert!(matches!(parse("field['a']").expect("parse"), Expr::Subscript { .. }));
    }

    #[test]
    fn rejects_malformed_expressions() {
        for source in [
            "this +",
            "upper(this",
            "this()",
            "fake.name",
            "1 if this",
            "round(ndigits=1, 2)",
            "this.nope()",
            "param.get()",
            "this[]",
        ] {
            assert!(parse(source).is_err(), "{source} should not parse");
        }
    }

    #[test]
    fn deep_nesting_is_bounded() {
        let source = format!("{}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert!(parse(&source).is_err());
        let source = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert!(parse(&source).is_ok());
    }

    #[test]
    fn long_operator_chains_are_bounded() {
        let err = parse(&format!("1{}", "+1".repeat(2040))).expect_err("addition chain");
        assert!(err.to_string().contains("nested deeper than"), "{err}");
        assert!(parse(&format!("2{}", "*2".repeat(MAX_DEPTH + 1))).is_err());
        assert!(parse(&format!("1{}", " + 1".repeat(20))).is_ok());
    }

    #[test]
    fn long_postfix_chains_are_bounded() {
        assert!(parse(&format!("[[0]]{}", "[0]".repeat(1300))).is_err());
        assert!(parse(&format!("this{}", ".upper()".repeat(MAX_DEPTH + 1))).is_err());
        assert!(parse("[[0]][0][0]").is_ok());
    }

    #[test]
    fn mixed_chains_are_bounded_by_tree_height() {
        // Every level adds four left-leaning nodes but stays shallow on its own.
        let source = format!("{}1{}", "(".repeat(20), ") + 1 + 1 + 1 + 1".repeat(20));
        let err = parse(&source).expect_err("tall tree");
        assert_eq!(err.position, 0);
        let source = format!("{}1{}", "(".repeat(5), ") + 1 + 1 + 1 + 1".repeat(5));
        assert!(parse(&source).is_ok());
    }
}
