use crate::functions::Builtin;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Is,
    IsNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// Expression tree; the only names it can reach are the row locals and the
/// approved builtins.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    This,
    Field,
    Param,
    Global(Builtin),
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Chained comparison, `a < b <= c`.
    Compare {
        left: Box<Expr>,
        comparisons: Vec<(CmpOp, Expr)>,
    },
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
    },
    Not(Box<Expr>),
    Conditional {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Call {
        func: Builtin,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
    FakeCall {
        method: String,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
    /// `param.get(name[, default])`.
    ParamCall {
        args: Vec<Expr>,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        value: Box<Expr>,
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
    },
}

impl Expr {
    /// Direct sub-expressions, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Literal(_) | Expr::This | Expr::Field | Expr::Param | Expr::Global(_) => {
                Vec::new()
            }
            Expr::List(items) | Expr::Tuple(items) | Expr::ParamCall { args: items } => {
                items.iter().collect()
            }
            Expr::Dict(entries) => entries
                .iter()
                .flat_map(|(key, value)| [key, value])
                .collect(),
            Expr::Unary { operand, .. } => vec![operand],
            Expr::Binary { left, right, .. } => vec![left, right],
            Expr::Compare { left, comparisons } => std::iter::once(left.as_ref())
                .chain(comparisons.iter().map(|(_, expr)| expr))
                .collect(),
            Expr::BoolOp { values, .. } => values.iter().collect(),
            Expr::Not(operand) => vec![operand],
            Expr::Conditional { test, body, orelse } => vec![test, body, orelse],
            Expr::Call { args, kwargs, .. } | Expr::FakeCall { args, kwargs, .. } => args
                .iter()
                .chain(kwargs.iter().map(|(_, expr)| expr))
                .collect(),
            Expr::Subscript { value, index } => vec![value, index],
            Expr::Slice {
                value,
                lower,
                upper,
            } => std::iter::once(value.as_ref())
                .chain(lower.as_deref())
                .chain(upper.as_deref())
                .collect(),
        }
    }

    /// Number of nodes on the longest root-to-leaf path, computed without recursion.
    pub fn height(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1)];
        while let Some((expr, level)) = pending.pop() {
            deepest = deepest.max(level);
            pending.extend(expr.children().into_iter().map(|child| (child, level + 1)));
        }
        deepest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_counts_the_longest_path() {
        let leaf = Expr::Literal(Literal::Int(1));
        assert_eq!(leaf.height(), 1);
        let sum = Expr::Binary {
            op: BinOp::Add,
            left: Box::new(Expr::Not(Box::new(leaf.clone()))),
            right: Box::new(leaf),
        };
        assert_eq!(sum.height(), 3);
    }
}
