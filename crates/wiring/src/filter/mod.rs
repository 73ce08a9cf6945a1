//! Requirement filters in the RFC 1960 string syntax.
//!
//! Filters are parsed once, when a requirement is constructed, and matched
//! against capability attributes during candidate evaluation. Comparison is
//! typed by the attribute value: the filter operand is converted to the
//! attribute's type before comparing.

use std::fmt;

use crate::attrs::{AttrValue, Attributes};
use crate::error::ConfigurationError;
use crate::version::Version;

#[cfg(test)]
mod tests;

/// Comparison operator of a simple filter item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
	Equal,
	Approx,
	GreaterEq,
	LessEq,
}

/// Parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
	And(Vec<Filter>),
	Or(Vec<Filter>),
	Not(Box<Filter>),
	/// `(attr=*)`
	Present(String),
	Compare { attr: String, op: Op, value: String },
	/// `(attr=a*b*c)`; an empty first or last part leaves that end open.
	Substring { attr: String, parts: Vec<String> },
}

impl Filter {
	/// Parses a filter string.
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::InvalidFilter`] with the character offset
	/// of the first syntax error.
	pub fn parse(raw: &str) -> Result<Self, ConfigurationError> {
		let mut parser = Parser {
			raw,
			chars: raw.chars().collect(),
			pos: 0,
		};
		let filter = parser.filter()?;
		parser.skip_ws();
		if parser.pos != parser.chars.len() {
			return Err(parser.error("trailing input"));
		}
		Ok(filter)
	}

	/// Returns true when the attributes satisfy this filter.
	pub fn matches(&self, attrs: &Attributes) -> bool {
		match self {
			Self::And(items) => items.iter().all(|f| f.matches(attrs)),
			Self::Or(items) => items.iter().any(|f| f.matches(attrs)),
			Self::Not(inner) => !inner.matches(attrs),
			Self::Present(attr) => lookup(attrs, attr).is_some(),
			Self::Compare { attr, op, value } => {
				lookup(attrs, attr).is_some_and(|v| compare(v, *op, value))
			}
			Self::Substring { attr, parts } => {
				lookup(attrs, attr).is_some_and(|v| substring(v, parts))
			}
		}
	}
}

fn lookup<'a>(attrs: &'a Attributes, name: &str) -> Option<&'a AttrValue> {
	attrs.get(name).or_else(|| {
		attrs
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value)
	})
}

fn compare(value: &AttrValue, op: Op, operand: &str) -> bool {
	match value {
		AttrValue::String(s) => match op {
			Op::Equal => s == operand,
			Op::Approx => normalize(s) == normalize(operand),
			Op::GreaterEq => s.as_str() >= operand,
			Op::LessEq => s.as_str() <= operand,
		},
		AttrValue::Long(n) => operand
			.trim()
			.parse::<i64>()
			.is_ok_and(|rhs| ordered(n.cmp(&rhs), op)),
		AttrValue::Double(n) => operand
			.trim()
			.parse::<f64>()
			.ok()
			.and_then(|rhs| n.partial_cmp(&rhs))
			.is_some_and(|ord| ordered(ord, op)),
		AttrValue::Version(v) => {
			Version::parse(operand).is_ok_and(|rhs| ordered(v.cmp(&rhs), op))
		}
		AttrValue::List(items) => items.iter().any(|item| compare(item, op, operand)),
	}
}

fn ordered(ord: std::cmp::Ordering, op: Op) -> bool {
	use std::cmp::Ordering::*;
	match op {
		Op::Equal | Op::Approx => ord == Equal,
		Op::GreaterEq => ord != Less,
		Op::LessEq => ord != Greater,
	}
}

fn normalize(s: &str) -> String {
	s.chars()
		.filter(|c| !c.is_whitespace())
		.flat_map(char::to_lowercase)
		.collect()
}

fn substring(value: &AttrValue, parts: &[String]) -> bool {
	match value {
		AttrValue::String(s) => wildcard(s, parts),
		AttrValue::List(items) => items.iter().any(|item| substring(item, parts)),
		_ => false,
	}
}

fn wildcard(text: &str, parts: &[String]) -> bool {
	let Some((first, rest)) = parts.split_first() else {
		return false;
	};
	let Some(mut remaining) = text.strip_prefix(first.as_str()) else {
		return false;
	};
	let Some((last, middle)) = rest.split_last() else {
		return remaining.is_empty();
	};
	for part in middle {
		match remaining.find(part.as_str()) {
			Some(idx) => remaining = &remaining[idx + part.len()..],
			None => return false,
		}
	}
	remaining.ends_with(last.as_str())
}

struct Parser<'a> {
	raw: &'a str,
	chars: Vec<char>,
	pos: usize,
}

impl Parser<'_> {
	fn error(&self, reason: &'static str) -> ConfigurationError {
		ConfigurationError::InvalidFilter {
			filter: self.raw.to_string(),
			offset: self.pos,
			reason,
		}
	}

	fn peek(&self) -> Option<char> {
		self.chars.get(self.pos).copied()
	}

	fn skip_ws(&mut self) {
		while self.peek().is_some_and(char::is_whitespace) {
			self.pos += 1;
		}
	}

	fn expect(&mut self, c: char, reason: &'static str) -> Result<(), ConfigurationError> {
		if self.peek() == Some(c) {
			self.pos += 1;
			Ok(())
		} else {
			Err(self.error(reason))
		}
	}

	fn filter(&mut self) -> Result<Filter, ConfigurationError> {
		self.skip_ws();
		self.expect('(', "expected '('")?;
		self.skip_ws();
		let filter = match self.peek() {
			Some('&') => {
				self.pos += 1;
				Filter::And(self.list()?)
			}
			Some('|') => {
				self.pos += 1;
				Filter::Or(self.list()?)
			}
			Some('!') => {
				self.pos += 1;
				Filter::Not(Box::new(self.filter()?))
			}
			Some(_) => self.item()?,
			None => return Err(self.error("unexpected end of filter")),
		};
		self.skip_ws();
		self.expect(')', "expected ')'")?;
		Ok(filter)
	}

	fn list(&mut self) -> Result<Vec<Filter>, ConfigurationError> {
		let mut items = Vec::new();
		self.skip_ws();
		while self.peek() == Some('(') {
			items.push(self.filter()?);
			self.skip_ws();
		}
		if items.is_empty() {
			return Err(self.error("empty filter list"));
		}
		Ok(items)
	}

	fn item(&mut self) -> Result<Filter, ConfigurationError> {
		let start = self.pos;
		while let Some(c) = self.peek() {
			if matches!(c, '=' | '<' | '>' | '~' | '(' | ')') {
				break;
			}
			self.pos += 1;
		}
		let attr: String = self.chars[start..self.pos].iter().collect();
		let attr = attr.trim().to_string();
		if attr.is_empty() {
			return Err(self.error("missing attribute name"));
		}

		let op = match self.peek() {
			Some('=') => {
				self.pos += 1;
				Op::Equal
			}
			Some('~') => {
				self.pos += 1;
				self.expect('=', "expected '=' after '~'")?;
				Op::Approx
			}
			Some('>') => {
				self.pos += 1;
				self.expect('=', "expected '=' after '>'")?;
				Op::GreaterEq
			}
			Some('<') => {
				self.pos += 1;
				self.expect('=', "expected '=' after '<'")?;
				Op::LessEq
			}
			_ => return Err(self.error("expected operator")),
		};

		let parts = self.value()?;
		if op != Op::Equal || parts.len() == 1 {
			return Ok(Filter::Compare {
				attr,
				op,
				value: parts.join("*"),
			});
		}
		if parts.iter().all(String::is_empty) && parts.len() == 2 {
			return Ok(Filter::Present(attr));
		}
		Ok(Filter::Substring { attr, parts })
	}

	/// Reads a value up to the closing paren, split on unescaped `*`.
	fn value(&mut self) -> Result<Vec<String>, ConfigurationError> {
		let mut parts = vec![String::new()];
		loop {
			match self.peek() {
				None => return Err(self.error("unterminated value")),
				Some(')') => break,
				Some('(') => return Err(self.error("unescaped '(' in value")),
				Some('\\') => {
					self.pos += 1;
					let Some(escaped) = self.peek() else {
						return Err(self.error("dangling escape"));
					};
					if let Some(current) = parts.last_mut() {
						current.push(escaped);
					}
					self.pos += 1;
				}
				Some('*') => {
					parts.push(String::new());
					self.pos += 1;
				}
				Some(c) => {
					if let Some(current) = parts.last_mut() {
						current.push(c);
					}
					self.pos += 1;
				}
			}
		}
		Ok(parts)
	}
}

impl fmt::Display for Filter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::And(items) | Self::Or(items) => {
				f.write_str(if matches!(self, Self::And(_)) { "(&" } else { "(|" })?;
				for item in items {
					write!(f, "{item}")?;
				}
				f.write_str(")")
			}
			Self::Not(inner) => write!(f, "(!{inner})"),
			Self::Present(attr) => write!(f, "({attr}=*)"),
			Self::Compare { attr, op, value } => {
				let op = match op {
					Op::Equal => "=",
					Op::Approx => "~=",
					Op::GreaterEq => ">=",
					Op::LessEq => "<=",
				};
				write!(f, "({attr}{op}{})", escape(value))
			}
			Self::Substring { attr, parts } => {
				let joined: Vec<String> = parts.iter().map(|p| escape(p)).collect();
				write!(f, "({attr}={})", joined.join("*"))
			}
		}
	}
}

fn escape(value: &str) -> String {
	let mut out = String::with_capacity(value.len());
	for c in value.chars() {
		if matches!(c, '(' | ')' | '*' | '\\') {
			out.push('\\');
		}
		out.push(c);
	}
	out
}
