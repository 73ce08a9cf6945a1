use std::fmt;

use indexmap::IndexMap;

use crate::version::Version;

/// Typed attribute value carried by capabilities and requirements.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
	String(String),
	Long(i64),
	Double(f64),
	Version(Version),
	List(Vec<AttrValue>),
}

/// Declaration-ordered attribute map.
pub type Attributes = IndexMap<String, AttrValue>;

/// Declaration-ordered directive map.
pub type Directives = IndexMap<String, String>;

impl AttrValue {
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_version(&self) -> Option<&Version> {
		match self {
			Self::Version(v) => Some(v),
			_ => None,
		}
	}
}

impl From<&str> for AttrValue {
	fn from(value: &str) -> Self {
		Self::String(value.to_string())
	}
}

impl From<String> for AttrValue {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

impl From<i64> for AttrValue {
	fn from(value: i64) -> Self {
		Self::Long(value)
	}
}

impl From<f64> for AttrValue {
	fn from(value: f64) -> Self {
		Self::Double(value)
	}
}

impl From<Version> for AttrValue {
	fn from(value: Version) -> Self {
		Self::Version(value)
	}
}

impl fmt::Display for AttrValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::String(s) => f.write_str(s),
			Self::Long(n) => write!(f, "{n}"),
			Self::Double(n) => write!(f, "{n}"),
			Self::Version(v) => write!(f, "{v}"),
			Self::List(items) => {
				f.write_str("[")?;
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{item}")?;
				}
				f.write_str("]")
			}
		}
	}
}
