use invoker_agent::{ToolContext, ToolError, TypedTool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const DEFAULT_PRECISION: u32 = 10;
const MAX_PRECISION: u32 = 15;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CalculatorArgs {
    /// Arithmetic expression, e.g. `2 + 2` or `sqrt(16) * pi`.
    pub expression: String,
    /// Decimal places in `formatted` (0 to 15, default 10).
    #[serde(default)]
    pub precision: Option<u32>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CalculatorOutput {
    pub expression: String,
    pub result: f64,
    pub formatted: String,
}

pub struct Calculator;

impl TypedTool for Calculator {
    type Args = CalculatorArgs;
    type Output = CalculatorOutput;

    const NAME: &'static str = "calculator";
    const DESCRIPTION: &'static str = "Evaluate an arithmetic expression. Supports + - * / % ^, \
        parentheses, pi, e, and functions such as sqrt, abs, ln, log, sin, cos, min and max.";

    async fn run(&self, args: Self::Args, _ctx: ToolContext) -> Result<Self::Output, ToolError> {
        let precision = args.precision.unwrap_or(DEFAULT_PRECISION);
        if precision > MAX_PRECISION {
            return Err(ToolError::InvalidArgument(format!(
                "precision must be at most {MAX_PRECISION}, got {precision}"
            )));
        }

        let result = evaluate(&args.expression)?;
        Ok(CalculatorOutput {
            formatted: format_number(result, precision),
            expression: args.expression,
            result,
        })
    }
}

/// Evaluates `expression` with the usual precedence; `^` and `**` bind right.
pub fn evaluate(expression: &str) -> Result<f64, ToolError> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expression()?;
    if let Some(token) = parser.peek() {
        return Err(ToolError::InvalidArgument(format!(
            "unexpected {token} in expression"
        )));
    }
    if !value.is_finite() {
        return Err(ToolError::ExecutionFailed(format!(
            "expression does not evaluate to a finite number: {expression}"
        )));
    }
    Ok(value)
}

fn format_number(value: f64, precision: u32) -> String {
    let text = format!("{value:.prec$}", prec = precision as usize);
    let text = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    };
    if text == "-0" {
        "0".to_string()
    } else {
        text
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    Pow,
    LParen,
    RParen,
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {n}"),
            Token::Ident(name) => write!(f, "identifier '{name}'"),
            Token::Op(op) => write!(f, "'{op}'"),
            Token::Pow => f.write_str("'^'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ToolError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // exponent: 1e3, 2.5E-4
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
                let number = text.parse::<f64>().map_err(|_| {
                    ToolError::InvalidArgument(format!("invalid number '{text}'"))
                })?;
                tokens.push(Token::Number(number));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(ident.to_lowercase()));
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Pow);
                i += 2;
            }
            '^' => {
                tokens.push(Token::Pow);
                i += 1;
            }
            '+' | '-' | '*' | '/' | '%' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            other => {
                return Err(ToolError::InvalidArgument(format!(
                    "unexpected character '{other}' in expression"
                )))
            }
        }
    }

    if tokens.is_empty() {
        return Err(ToolError::InvalidArgument("expression is empty".to_string()));
    }
    Ok(tokens)
}

/// Parenthesis, function-call and exponent nesting allowed before giving up.
const MAX_DEPTH: usize = 128;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ToolError>,
    ) -> Result<T, ToolError> {
        if self.depth >= MAX_DEPTH {
            return Err(ToolError::InvalidArgument(
                "expression nested too deeply".to_string(),
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), ToolError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(ToolError::InvalidArgument(format!(
                "expected {expected}, found {token}"
            ))),
            None => Err(ToolError::InvalidArgument(format!(
                "expected {expected}, found end of expression"
            ))),
        }
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<f64, ToolError> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<f64, ToolError> {
        let mut value = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/' | '%'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                '*' => value * rhs,
                _ if rhs == 0.0 => {
                    return Err(ToolError::ExecutionFailed("division by zero".to_string()))
                }
                '/' => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    // unary := ('+' | '-')* power
    fn unary(&mut self) -> Result<f64, ToolError> {
        let mut negate = false;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            negate ^= *op == '-';
            self.pos += 1;
        }
        let value = self.power()?;
        Ok(if negate { -value } else { value })
    }

    // power := primary ('^' unary)?
    fn power(&mut self) -> Result<f64, ToolError> {
        let base = self.primary()?;
        if let Some(Token::Pow) = self.peek() {
            self.pos += 1;
            let exponent = self.nested(Self::unary)?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, ToolError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => self.nested(|parser| {
                let value = parser.expression()?;
                parser.expect(Token::RParen)?;
                Ok(value)
            }),
            Some(Token::Ident(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.pos += 1;
                    let args = self.nested(|parser| {
                        let mut args = vec![parser.expression()?];
                        while let Some(Token::Comma) = parser.peek() {
                            parser.pos += 1;
                            args.push(parser.expression()?);
                        }
                        parser.expect(Token::RParen)?;
                        Ok(args)
                    })?;
                    apply_function(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(token) => Err(ToolError::InvalidArgument(format!(
                "unexpected {token} in expression"
            ))),
            None => Err(ToolError::InvalidArgument(
                "unexpected end of expression".to_string(),
            )),
        }
    }
}

fn constant(name: &str) -> Result<f64, ToolError> {
    match name {
        "pi" => Ok(std::f64::consts::PI),
        "e" => Ok(std::f64::consts::E),
        "tau" => Ok(std::f64::consts::TAU),
        _ => Err(ToolError::InvalidArgument(format!(
            "unknown identifier '{name}'"
        ))),
    }
}

fn apply_function(name: &str, args: &[f64]) -> Result<f64, ToolError> {
    let unary = |f: fn(f64) -> f64| -> Result<f64, ToolError> {
        match args {
            [x] => Ok(f(*x)),
            _ => Err(arity(name, 1, args.len())),
        }
    };
    let binary = |f: fn(f64, f64) -> f64| -> Result<f64, ToolError> {
        match args {
            [a, b] => Ok(f(*a, *b)),
            _ => Err(arity(name, 2, args.len())),
        }
    };

    match name {
        "sqrt" => unary(f64::sqrt),
        "abs" => unary(f64::abs),
        "exp" => unary(f64::exp),
        "ln" => unary(f64::ln),
        "log" | "log10" => unary(f64::log10),
        "log2" => unary(f64::log2),
        "sin" => unary(f64::sin),
        "cos" => unary(f64::cos),
        "tan" => unary(f64::tan),
        "asin" => unary(f64::asin),
        "acos" => unary(f64::acos),
        "atan" => unary(f64::atan),
        "floor" => unary(f64::floor),
        "ceil" => unary(f64::ceil),
        "round" => unary(f64::round),
        "min" => binary(f64::min),
        "max" => binary(f64::max),
        "pow" => binary(f64::powf),
        _ => Err(ToolError::InvalidArgument(format!(
            "unknown function '{name}'"
        ))),
    }
}

fn arity(name: &str, expected: usize, got: usize) -> ToolError {
    ToolError::InvalidArgument(format!(
        "{name} takes {expected} argument(s), got {got}"
    ))
}
