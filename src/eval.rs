use std::{borrow::Cow, fmt::Display, num::ParseIntError, sync::LazyLock};

use miette::{Diagnostic, SourceSpan};
use regex::bytes::{Match, Regex};
use thiserror::Error;

/// First `<digits> <op> <digits>` run anywhere in a line. Digits and blanks are
/// ASCII only; the line is matched as raw bytes.
static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+)[\t\n\f\r ]*([-+*/])[\t\n\f\r ]*([0-9]+)")
        .expect("expression pattern is valid")
});

#[derive(Error, Debug, Diagnostic)]
pub enum EvalError {
    #[error("invalid expression: {text}")]
    #[diagnostic(
        code(line_calc::invalid_expression),
        help("expected `<int> <op> <int>` where op is one of `+ - * /`")
    )]
    InvalidExpression { text: String },

    #[error("invalid number: {literal}")]
    #[diagnostic(code(line_calc::invalid_number))]
    InvalidNumber {
        literal: String,

        #[source_code]
        src: String,

        #[label("this operand")]
        span: SourceSpan,

        #[source]
        source: ParseIntError,
    },

    #[error("division by zero")]
    #[diagnostic(code(line_calc::division_by_zero))]
    DivisionByZero,

    #[error("unsupported operator: {symbol}")]
    #[diagnostic(code(line_calc::unsupported_operator))]
    UnsupportedOperator { symbol: String },

    #[error("`{operation}` does not fit in a 64-bit integer")]
    #[diagnostic(code(line_calc::overflow))]
    Overflow { operation: ParsedOperation },
}

impl EvalError {
    fn invalid_expression(expression: &[u8]) -> Self {
        EvalError::InvalidExpression {
            text: String::from_utf8_lossy(expression).into_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    pub fn from_symbol(symbol: &[u8]) -> Option<Self> {
        match symbol {
            b"+" => Some(Op::Add),
            b"-" => Some(Op::Sub),
            b"*" => Some(Op::Mul),
            b"/" => Some(Op::Div),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Op::Add => '+',
            Op::Sub => '-',
            Op::Mul => '*',
            Op::Div => '/',
        }
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Two operands and the operator between them, as found in one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedOperation {
    pub lhs: i64,
    pub op: Op,
    pub rhs: i64,
}

impl ParsedOperation {
    /// Extracts the first operation found in `expression`. Anything around the
    /// match is ignored.
    pub fn parse(expression: &[u8]) -> Result<Self, EvalError> {
        let Some(captures) = EXPRESSION.captures(expression) else {
            return Err(EvalError::invalid_expression(expression));
        };
        let (Some(lhs), Some(op), Some(rhs)) = (captures.get(1), captures.get(2), captures.get(3))
        else {
            return Err(EvalError::invalid_expression(expression));
        };

        let lhs = parse_operand(expression, lhs)?;
        let rhs = parse_operand(expression, rhs)?;
        let op = Op::from_symbol(op.as_bytes()).ok_or_else(|| EvalError::UnsupportedOperator {
            symbol: String::from_utf8_lossy(op.as_bytes()).into_owned(),
        })?;

        Ok(ParsedOperation { lhs, op, rhs })
    }

    /// Integer division truncates toward zero.
    pub fn apply(&self) -> Result<i64, EvalError> {
        let ParsedOperation { lhs, op, rhs } = *self;
        let value = match op {
            Op::Add => lhs.checked_add(rhs),
            Op::Sub => lhs.checked_sub(rhs),
            Op::Mul => lhs.checked_mul(rhs),
            Op::Div => {
                if rhs == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                lhs.checked_div(rhs)
            }
        };
        value.ok_or(EvalError::Overflow { operation: *self })
    }
}

impl Display for ParsedOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op, self.rhs)
    }
}

fn parse_operand(whole: &[u8], operand: Match<'_>) -> Result<i64, EvalError> {
    let literal: Cow<'_, str> = String::from_utf8_lossy(operand.as_bytes());
    literal.parse().map_err(|source| EvalError::InvalidNumber {
        literal: literal.to_string(),
        src: String::from_utf8_lossy(whole).into_owned(),
        span: SourceSpan::from(operand.range()),
        source,
    })
}

/// Evaluates the first `<int> <op> <int>` found in `expression`.
pub fn calculate(expression: impl AsRef<[u8]>) -> Result<i64, EvalError> {
    ParsedOperation::parse(expression.as_ref())?.apply()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_each_operator() {
        assert_eq!(calculate("3+4").unwrap(), 7);
        assert_eq!(calculate("10 - 25").unwrap(), -15);
        assert_eq!(calculate("6 * 7").unwrap(), 42);
        assert_eq!(calculate("10 / 2").unwrap(), 5);
    }

    #[test]
    fn division_truncates() {
        assert_eq!(calculate("7/2").unwrap(), 3);
        assert_eq!(calculate("1/3").unwrap(), 0);
    }

    #[test]
    fn ignores_text_around_the_first_match() {
        assert_eq!(calculate("result: 12 * 3 please").unwrap(), 36);
        assert_eq!(calculate("1+1 and 9*9").unwrap(), 2);
        // `2*3` is the first digit-op-digit run; the trailing `+4` is never seen
        assert_eq!(calculate("2*3+4").unwrap(), 6);
    }

    #[test]
    fn whitespace_between_tokens() {
        assert_eq!(calculate("8\t-\t3").unwrap(), 5);
        assert_eq!(calculate("8    *2").unwrap(), 16);
    }

    #[test]
    fn leading_zeros_are_decimal() {
        assert_eq!(calculate("010+010").unwrap(), 20);
    }

    #[test]
    fn minus_sign_is_an_operator_not_a_sign() {
        let parsed = ParsedOperation::parse(b"-5 - -3").unwrap_err();
        assert!(matches!(parsed, EvalError::InvalidExpression { .. }));

        let parsed = ParsedOperation::parse(b"5--3").unwrap_err();
        assert!(matches!(parsed, EvalError::InvalidExpression { .. }));
    }

    #[test]
    fn rejects_lines_without_an_operation() {
        match calculate("hell").unwrap_err() {
            EvalError::InvalidExpression { text } => assert_eq!(text, "hell"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(calculate("").is_err());
        assert!(calculate("3+").is_err());
        assert!(calculate("3 % 4").is_err());
    }

    #[test]
    fn division_by_zero() {
        assert!(matches!(
            calculate("7/0").unwrap_err(),
            EvalError::DivisionByZero
        ));
        assert!(matches!(
            calculate("7 / 000").unwrap_err(),
            EvalError::DivisionByZero
        ));
    }

    #[test]
    fn operand_out_of_range() {
        match calculate("99999999999999999999 + 1").unwrap_err() {
            EvalError::InvalidNumber { literal, span, .. } => {
                assert_eq!(literal, "99999999999999999999");
                assert_eq!(span.offset(), 0);
                assert_eq!(span.len(), 20);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(calculate("9223372036854775807 + 0").unwrap(), i64::MAX);
    }

    #[test]
    fn result_out_of_range() {
        match calculate("9223372036854775807 + 1").unwrap_err() {
            EvalError::Overflow { operation } => {
                assert_eq!(operation.to_string(), "9223372036854775807 + 1");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(calculate("4294967296 * 4294967296").is_err());
    }

    #[test]
    fn parses_into_parts() {
        let parsed = ParsedOperation::parse(b"x 12 / 4 y").unwrap();
        assert_eq!(
            parsed,
            ParsedOperation {
                lhs: 12,
                op: Op::Div,
                rhs: 4
            }
        );
    }

    #[test]
    fn matches_on_raw_bytes() {
        assert_eq!(calculate(b"\xff\xfe 2+2 \x80").unwrap(), 4);
    }

    #[test]
    fn non_ascii_digits_are_not_operands() {
        // Arabic-Indic digits
        assert!(calculate("٣+٤").is_err());
    }

    #[test]
    fn op_symbols() {
        for op in [Op::Add, Op::Sub, Op::Mul, Op::Div] {
            let symbol = op.to_string();
            assert_eq!(Op::from_symbol(symbol.as_bytes()), Some(op));
        }
        assert_eq!(Op::from_symbol(b"%"), None);
    }
}
