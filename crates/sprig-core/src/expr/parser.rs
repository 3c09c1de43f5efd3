//! nom parsers for binding expressions and loop headers.
//!
//! Precedence, lowest first: `||`, `&&`, equality, comparison, additive,
//! multiplicative, unary, postfix (`.name`, `[index]`, `(args)`).

use nom::{
	IResult, Parser,
	branch::alt,
	bytes::complete::{tag, take_while},
	character::complete::{char, digit1, multispace0, multispace1, satisfy},
	combinator::{all_consuming, map, map_res, opt, recognize, value},
	error::ErrorKind,
	multi::separated_list0,
	sequence::{delimited, pair, preceded, terminated},
};

use super::{BinaryOp, Expr, LoopHeader, UnaryOp};
use crate::error::ExprError;
use crate::value::Value;

type ParseError<'a> = nom::error::Error<&'a str>;

// ============================================================================
// Entry points
// ============================================================================

pub(super) fn parse_expression(source: &str) -> Result<Expr, ExprError> {
	let result: IResult<&str, Expr> =
		all_consuming(terminated(expression, multispace0)).parse(source);
	result
		.map(|(_, expr)| expr)
		.map_err(|err| syntax_error(source, err))
}

pub(super) fn parse_loop_header(source: &str) -> Result<LoopHeader, ExprError> {
	let invalid = || ExprError::InvalidLoop(source.to_string());

	let header: IResult<&str, (&str, Option<&str>)> = alt((
		delimited(
			(multispace0, char('('), multispace0),
			pair(
				identifier,
				opt(preceded((multispace0, char(','), multispace0), identifier)),
			),
			(multispace0, char(')')),
		),
		map(preceded(multispace0, identifier), |item| (item, None)),
	))
	.parse(source);
	let (rest, (item, index)) = header.map_err(|_| invalid())?;

	let keyword: IResult<&str, &str> =
		delimited(multispace0, alt((tag("in"), tag("of"))), multispace1).parse(rest);
	let (rest, _) = keyword.map_err(|_| invalid())?;

	Ok(LoopHeader {
		item: item.to_string(),
		index: index.map(str::to_string),
		source: parse_expression(rest)?,
	})
}

fn syntax_error(source: &str, err: nom::Err<ParseError<'_>>) -> ExprError {
	let remaining = match &err {
		nom::Err::Error(e) | nom::Err::Failure(e) => e.input,
		nom::Err::Incomplete(_) => "",
	};
	let message = match remaining.chars().next() {
		None => "unexpected end of input".to_string(),
		Some(c) => format!("unexpected `{c}`"),
	};
	ExprError::Syntax {
		source_text: source.to_string(),
		offset: source.len() - remaining.len(),
		message,
	}
}

// ============================================================================
// Binary operators
// ============================================================================

fn expression(input: &str) -> IResult<&str, Expr> {
	binary_level(input, and_level, or_operator)
}

fn and_level(input: &str) -> IResult<&str, Expr> {
	binary_level(input, equality_level, and_operator)
}

fn equality_level(input: &str) -> IResult<&str, Expr> {
	binary_level(input, comparison_level, equality_operator)
}

fn comparison_level(input: &str) -> IResult<&str, Expr> {
	binary_level(input, additive_level, comparison_operator)
}

fn additive_level(input: &str) -> IResult<&str, Expr> {
	binary_level(input, multiplicative_level, additive_operator)
}

fn multiplicative_level(input: &str) -> IResult<&str, Expr> {
	binary_level(input, unary, multiplicative_operator)
}

/// Parses `operand (operator operand)*`, folding to the left.
fn binary_level<'a>(
	input: &'a str,
	operand: fn(&'a str) -> IResult<&'a str, Expr>,
	operator: fn(&'a str) -> IResult<&'a str, BinaryOp>,
) -> IResult<&'a str, Expr> {
	let (mut input, mut lhs) = operand(input)?;
	loop {
		match operator(input) {
			Ok((rest, op)) => {
				let (rest, rhs) = operand(rest)?;
				lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
				input = rest;
			}
			Err(nom::Err::Error(_)) => return Ok((input, lhs)),
			Err(err) => return Err(err),
		}
	}
}

fn or_operator(input: &str) -> IResult<&str, BinaryOp> {
	preceded(multispace0, value(BinaryOp::Or, tag("||"))).parse(input)
}

fn and_operator(input: &str) -> IResult<&str, BinaryOp> {
	preceded(multispace0, value(BinaryOp::And, tag("&&"))).parse(input)
}

fn equality_operator(input: &str) -> IResult<&str, BinaryOp> {
	preceded(
		multispace0,
		alt((
			value(BinaryOp::Eq, tag("===")),
			value(BinaryOp::Ne, tag("!==")),
			value(BinaryOp::Eq, tag("==")),
			value(BinaryOp::Ne, tag("!=")),
		)),
	)
	.parse(input)
}

fn comparison_operator(input: &str) -> IResult<&str, BinaryOp> {
	preceded(
		multispace0,
		alt((
			value(BinaryOp::Le, tag("<=")),
			value(BinaryOp::Ge, tag(">=")),
			value(BinaryOp::Lt, tag("<")),
			value(BinaryOp::Gt, tag(">")),
		)),
	)
	.parse(input)
}

fn additive_operator(input: &str) -> IResult<&str, BinaryOp> {
	preceded(
		multispace0,
		alt((
			value(BinaryOp::Add, char('+')),
			value(BinaryOp::Sub, char('-')),
		)),
	)
	.parse(input)
}

fn multiplicative_operator(input: &str) -> IResult<&str, BinaryOp> {
	preceded(
		multispace0,
		alt((
			value(BinaryOp::Mul, char('*')),
			value(BinaryOp::Div, char('/')),
			value(BinaryOp::Rem, char('%')),
		)),
	)
	.parse(input)
}

// ============================================================================
// Unary and postfix
// ============================================================================

fn unary_operator(input: &str) -> IResult<&str, UnaryOp> {
	preceded(
		multispace0,
		alt((
			value(UnaryOp::Not, char('!')),
			value(UnaryOp::Neg, char('-')),
		)),
	)
	.parse(input)
}

fn unary(input: &str) -> IResult<&str, Expr> {
	match unary_operator(input) {
		Ok((rest, op)) => {
			let (rest, operand) = unary(rest)?;
			Ok((rest, Expr::Unary(op, Box::new(operand))))
		}
		Err(nom::Err::Error(_)) => postfix(input),
		Err(err) => Err(err),
	}
}

fn member_suffix(input: &str) -> IResult<&str, &str> {
	preceded((multispace0, char('.'), multispace0), identifier).parse(input)
}

fn index_suffix(input: &str) -> IResult<&str, Expr> {
	delimited(
		(multispace0, char('[')),
		expression,
		(multispace0, char(']')),
	)
	.parse(input)
}

fn call_suffix(input: &str) -> IResult<&str, Vec<Expr>> {
	delimited(
		(multispace0, char('(')),
		separated_list0(preceded(multispace0, char(',')), expression),
		(multispace0, char(')')),
	)
	.parse(input)
}

fn postfix(input: &str) -> IResult<&str, Expr> {
	let (mut input, mut expr) = primary(input)?;
	loop {
		match member_suffix(input) {
			Ok((rest, member)) => {
				expr = Expr::Member(Box::new(expr), member.to_string());
				input = rest;
				continue;
			}
			Err(nom::Err::Error(_)) => {}
			Err(err) => return Err(err),
		}

		match index_suffix(input) {
			Ok((rest, index)) => {
				expr = Expr::Index(Box::new(expr), Box::new(index));
				input = rest;
				continue;
			}
			Err(nom::Err::Error(_)) => {}
			Err(err) => return Err(err),
		}

		match call_suffix(input) {
			Ok((rest, args)) => {
				// Only a bare method name can be called.
				let Expr::Ident(name) = expr else {
					return Err(nom::Err::Failure(ParseError::new(input, ErrorKind::Verify)));
				};
				expr = Expr::Call(name, args);
				input = rest;
			}
			Err(nom::Err::Error(_)) => return Ok((input, expr)),
			Err(err) => return Err(err),
		}
	}
}

// ============================================================================
// Primaries
// ============================================================================

fn primary(input: &str) -> IResult<&str, Expr> {
	preceded(
		multispace0,
		alt((number, string_literal, parenthesized, name_or_keyword)),
	)
	.parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
	recognize(pair(
		satisfy(|c: char| c.is_ascii_alphabetic() || c == '_' || c == '$'),
		take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$'),
	))
	.parse(input)
}

fn name_or_keyword(input: &str) -> IResult<&str, Expr> {
	map(identifier, |name| match name {
		"true" => Expr::Literal(Value::Bool(true)),
		"false" => Expr::Literal(Value::Bool(false)),
		"null" => Expr::Literal(Value::Null),
		"undefined" => Expr::Literal(Value::Undefined),
		_ => Expr::Ident(name.to_string()),
	})
	.parse(input)
}

fn number(input: &str) -> IResult<&str, Expr> {
	map_res(
		recognize(pair(digit1, opt(pair(char('.'), digit1)))),
		|text: &str| match text.parse::<i64>() {
			Ok(n) => Ok(Value::Int(n)),
			Err(_) => text.parse::<f64>().map(Value::Float),
		},
	)
	.map(Expr::Literal)
	.parse(input)
}

fn string_literal(input: &str) -> IResult<&str, Expr> {
	map(
		alt((
			delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
			delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
		)),
		|text: &str| Expr::Literal(Value::from(text)),
	)
	.parse(input)
}

fn parenthesized(input: &str) -> IResult<&str, Expr> {
	delimited(char('('), expression, (multispace0, char(')'))).parse(input)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn ident(name: &str) -> Box<Expr> {
		Box::new(Expr::Ident(name.to_string()))
	}

	fn int(n: i64) -> Box<Expr> {
		Box::new(Expr::Literal(Value::Int(n)))
	}

	#[rstest]
	fn test_multiplication_binds_tighter_than_addition() {
		assert_eq!(
			parse_expression("a + b * 2").unwrap(),
			Expr::Binary(
				BinaryOp::Add,
				ident("a"),
				Box::new(Expr::Binary(BinaryOp::Mul, ident("b"), int(2))),
			)
		);
	}

	#[rstest]
	fn test_subtraction_is_left_associative() {
		assert_eq!(
			parse_expression("10 - 3 - 2").unwrap(),
			Expr::Binary(
				BinaryOp::Sub,
				Box::new(Expr::Binary(BinaryOp::Sub, int(10), int(3))),
				int(2),
			)
		);
	}

	#[rstest]
	fn test_postfix_chain() {
		assert_eq!(
			parse_expression(" todos[ i ].title ").unwrap(),
			Expr::Member(
				Box::new(Expr::Index(ident("todos"), ident("i"))),
				"title".to_string(),
			)
		);
	}

	#[rstest]
	#[case("'it''s'", 4)]
	#[case("a +", 3)]
	#[case("items.", 5)]
	#[case("a b", 2)]
	#[case("", 0)]
	fn test_syntax_error_offset(#[case] source: &str, #[case] offset: usize) {
		match parse_expression(source) {
			Err(ExprError::Syntax {
				offset: actual,
				source_text,
				..
			}) => {
				assert_eq!(actual, offset);
				assert_eq!(source_text, source);
			}
			other => panic!("expected syntax error, got {other:?}"),
		}
	}

	#[rstest]
	fn test_call_on_member_is_rejected() {
		assert!(matches!(
			parse_expression("a.b(1)"),
			Err(ExprError::Syntax { .. })
		));
	}

	#[rstest]
	#[case("item in items", "item", None)]
	#[case("todo of todos", "todo", None)]
	#[case("(item, i) in items", "item", Some("i"))]
	#[case("( row ,idx )in rows", "row", Some("idx"))]
	fn test_loop_header(#[case] source: &str, #[case] item: &str, #[case] index: Option<&str>) {
		let header = parse_loop_header(source).unwrap();
		assert_eq!(header.item, item);
		assert_eq!(header.index.as_deref(), index);
	}

	#[rstest]
	#[case("items")]
	#[case("item items")]
	#[case("(a, b, c) in items")]
	#[case("item inside")]
	fn test_invalid_loop_header(#[case] source: &str) {
		assert_eq!(
			parse_loop_header(source),
			Err(ExprError::InvalidLoop(source.to_string()))
		);
	}
}
