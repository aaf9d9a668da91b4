//! Expression compilation and evaluation.
//!
//! Sources are compiled once into a small syntax tree and evaluated per
//! frame. The grammar, loosest binding first:
//!
//! ```text
//! expr       := additive (("<" | "<=" | ">" | ">=" | "==" | "!=") additive)*
//! additive   := term (("+" | "-") term)*
//! term       := unary (("*" | "/" | "%") unary)*
//! unary      := ("+" | "-") unary | power
//! power      := primary ("^" unary)?
//! primary    := number | ident | ident "(" args ")" | "(" expr ")"
//! ```

use crate::builtins::{self, Builtin};
use crate::context::ExpressionContext;
use crate::error::ExpressionError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    LParen,
    RParen,
    Comma,
}

fn tokenize(src: &str) -> Result<Vec<Token>, ExpressionError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            // Exponent, only when followed by digits
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().collect();
            let value = text
                .parse::<f64>()
                .map_err(|_| ExpressionError::Parse(format!("bad number '{}'", text)))?;
            tokens.push(Token::Num(value));
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }

        let next = chars.get(i + 1).copied();
        let (token, len) = match (c, next) {
            ('<', Some('=')) => (Token::Le, 2),
            ('>', Some('=')) => (Token::Ge, 2),
            ('=', Some('=')) => (Token::EqEq, 2),
            ('!', Some('=')) => (Token::Ne, 2),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('^', _) => (Token::Caret, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            (',', _) => (Token::Comma, 1),
            _ => {
                return Err(ExpressionError::Parse(format!(
                    "unexpected character '{}' at offset {}",
                    c, i
                )))
            }
        };
        tokens.push(token);
        i += len;
    }

    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl BinOp {
    fn apply(self, a: f64, b: f64) -> Result<f64, ExpressionError> {
        let truth = |v: bool| if v { 1.0 } else { 0.0 };
        Ok(match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => return builtins::divide(a, b),
            Self::Rem => return builtins::modulo(a, b),
            Self::Pow => a.powf(b),
            Self::Lt => truth(a < b),
            Self::Le => truth(a <= b),
            Self::Gt => truth(a > b),
            Self::Ge => truth(a >= b),
            Self::Eq => truth(a == b),
            Self::Ne => truth(a != b),
        })
    }
}

#[derive(Debug, Clone)]
enum Node {
    Const(f64),
    Time,
    Neg(Box<Node>),
    Binary(BinOp, Box<Node>, Box<Node>),
    /// `if(c, a, b)` / `ifnot(c, a, b)`; only the taken branch is evaluated.
    Select {
        cond: Box<Node>,
        when_true: Box<Node>,
        when_false: Box<Node>,
        negate: bool,
    },
    Call(&'static Builtin, Vec<Node>),
}

impl Node {
    fn eval(&self, ctx: &ExpressionContext) -> Result<f64, ExpressionError> {
        match self {
            Node::Const(v) => Ok(*v),
            Node::Time => Ok(ctx.t),
            Node::Neg(inner) => Ok(-inner.eval(ctx)?),
            Node::Binary(op, lhs, rhs) => op.apply(lhs.eval(ctx)?, rhs.eval(ctx)?),
            Node::Select {
                cond,
                when_true,
                when_false,
                negate,
            } => {
                let c = cond.eval(ctx)?;
                // NaN counts as false, like any other comparison with NaN
                let taken = (c != 0.0 && !c.is_nan()) != *negate;
                if taken {
                    when_true.eval(ctx)
                } else {
                    when_false.eval(ctx)
                }
            }
            Node::Call(builtin, args) => {
                let values = args
                    .iter()
                    .map(|a| a.eval(ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                (builtin.func)(&values)
            }
        }
    }
}

/// Deepest nesting of parentheses, calls, unary signs and chained operators
/// accepted. Bounds the recursion of parsing, evaluation and drop.
const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, wanted: Token) -> Result<(), ExpressionError> {
        match self.next() {
            Some(t) if t == wanted => Ok(()),
            Some(t) => Err(ExpressionError::Parse(format!(
                "expected {:?}, found {:?}",
                wanted, t
            ))),
            None => Err(ExpressionError::Parse(format!(
                "expected {:?}, found end of input",
                wanted
            ))),
        }
    }

    /// Go one level deeper into the tree being built.
    fn descend(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExpressionError::Parse("expression nested too deeply".into()));
        }
        Ok(())
    }

    fn parse_expr(&mut self) -> Result<Node, ExpressionError> {
        let entry = self.depth;
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinOp::Lt,
                Some(Token::Le) => BinOp::Le,
                Some(Token::Gt) => BinOp::Gt,
                Some(Token::Ge) => BinOp::Ge,
                Some(Token::EqEq) => BinOp::Eq,
                Some(Token::Ne) => BinOp::Ne,
                _ => break,
            };
            self.pos += 1;
            self.descend()?;
            let rhs = self.parse_additive()?;
            lhs = Node::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        self.depth = entry;
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Node, ExpressionError> {
        let entry = self.depth;
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            self.descend()?;
            let rhs = self.parse_term()?;
            lhs = Node::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        self.depth = entry;
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Node, ExpressionError> {
        let entry = self.depth;
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Rem,
                _ => break,
            };
            self.pos += 1;
            self.descend()?;
            let rhs = self.parse_unary()?;
            lhs = Node::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        self.depth = entry;
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Node, ExpressionError> {
        let negate = match self.peek() {
            Some(Token::Minus) => true,
            Some(Token::Plus) => false,
            _ => return self.parse_power(),
        };
        self.pos += 1;
        self.descend()?;
        let operand = self.parse_unary()?;
        self.depth -= 1;
        Ok(if negate {
            Node::Neg(Box::new(operand))
        } else {
            operand
        })
    }

    fn parse_power(&mut self) -> Result<Node, ExpressionError> {
        let base = self.parse_primary()?;
        if self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            self.descend()?;
            let exponent = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Node::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Node, ExpressionError> {
        match self.next() {
            Some(Token::Num(v)) => Ok(Node::Const(v)),
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                self.depth -= 1;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    self.descend()?;
                    let args = self.parse_args()?;
                    self.depth -= 1;
                    return Self::call(&name, args);
                }
                if name == "t" {
                    return Ok(Node::Time);
                }
                builtins::constant(&name)
                    .map(Node::Const)
                    .ok_or(ExpressionError::Undefined(name))
            }
            Some(t) => Err(ExpressionError::Parse(format!("unexpected token {:?}", t))),
            None => Err(ExpressionError::Parse("unexpected end of input".into())),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Node>, ExpressionError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                Some(t) => {
                    return Err(ExpressionError::Parse(format!(
                        "expected ',' or ')', found {:?}",
                        t
                    )))
                }
                None => return Err(ExpressionError::Parse("unclosed argument list".into())),
            }
        }
    }

    fn call(name: &str, mut args: Vec<Node>) -> Result<Node, ExpressionError> {
        let arity_error = |expected: usize, got: usize| {
            ExpressionError::Parse(format!(
                "{}() takes {} arguments, got {}",
                name, expected, got
            ))
        };

        if name == "if" || name == "ifnot" {
            if args.len() != 3 {
                return Err(arity_error(3, args.len()));
            }
            let when_false = args.pop().map(Box::new);
            let when_true = args.pop().map(Box::new);
            let cond = args.pop().map(Box::new);
            if let (Some(cond), Some(when_true), Some(when_false)) = (cond, when_true, when_false) {
                return Ok(Node::Select {
                    cond,
                    when_true,
                    when_false,
                    negate: name == "ifnot",
                });
            }
        }

        let builtin =
            builtins::lookup(name).ok_or_else(|| ExpressionError::Undefined(format!("{}()", name)))?;
        if builtin.arity != args.len() {
            return Err(arity_error(builtin.arity, args.len()));
        }
        Ok(Node::Call(builtin, args))
    }
}

/// A compiled expression that can be evaluated with a context.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    root: Node,
}

impl Expression {
    /// Compile `source`. Fails on syntax errors, unknown identifiers and
    /// wrong argument counts.
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(ExpressionError::Parse("empty expression".into()));
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let root = parser.parse_expr()?;
        if let Some(extra) = parser.peek() {
            return Err(ExpressionError::Parse(format!(
                "unexpected trailing {:?}",
                extra
            )));
        }
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// The source text this expression was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate the expression and return a finite scalar.
    pub fn evaluate(&self, ctx: &ExpressionContext) -> Result<f64, ExpressionError> {
        let value = self.root.eval(ctx)?;
        if !value.is_finite() {
            return Err(ExpressionError::NotANumber(value));
        }
        Ok(value)
    }
}

/// Compile and evaluate `source` with `t` bound to `time_seconds`.
pub fn evaluate(source: &str, time_seconds: f64) -> Result<f64, ExpressionError> {
    Expression::parse(source)?.evaluate(&ExpressionContext::at_time(time_seconds))
}
