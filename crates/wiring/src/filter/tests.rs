use pretty_assertions::assert_eq;

use super::*;

fn attrs(pairs: &[(&str, AttrValue)]) -> Attributes {
	pairs
		.iter()
		.map(|(k, v)| (k.to_string(), v.clone()))
		.collect()
}

fn package(name: &str, version: &str) -> Attributes {
	attrs(&[
		("osgi.wiring.package", name.into()),
		("version", Version::parse(version).unwrap().into()),
	])
}

#[test]
fn parses_nested_composites() {
	let filter = Filter::parse("(&(osgi.wiring.package=org.acme)(|(version>=1.0)(!(x=*))))").unwrap();
	let Filter::And(items) = &filter else {
		panic!("expected conjunction, got {filter:?}");
	};
	assert_eq!(items.len(), 2);
	assert!(matches!(items[1], Filter::Or(_)));
}

#[test]
fn version_range_matches_typed_attribute() {
	let filter =
		Filter::parse("(&(osgi.wiring.package=org.acme)(version>=1.2)(!(version>=2.0)))").unwrap();
	assert!(filter.matches(&package("org.acme", "1.2.0")));
	assert!(filter.matches(&package("org.acme", "1.9.9")));
	assert!(!filter.matches(&package("org.acme", "2.0.0")));
	assert!(!filter.matches(&package("org.acme", "1.1")));
	assert!(!filter.matches(&package("org.other", "1.5")));
}

#[test]
fn presence_and_substring() {
	let present = Filter::parse("(vendor=*)").unwrap();
	assert_eq!(present, Filter::Present("vendor".into()));
	assert!(present.matches(&attrs(&[("vendor", "acme".into())])));
	assert!(!present.matches(&attrs(&[])));

	let sub = Filter::parse("(name=org.*.impl*)").unwrap();
	assert!(sub.matches(&attrs(&[("name", "org.acme.impl".into())])));
	assert!(sub.matches(&attrs(&[("name", "org.acme.implx".into())])));
	assert!(!sub.matches(&attrs(&[("name", "com.acme.impl".into())])));
}

#[test]
fn numeric_and_list_comparisons() {
	let filter = Filter::parse("(size<=10)").unwrap();
	assert!(filter.matches(&attrs(&[("size", AttrValue::Long(10))])));
	assert!(!filter.matches(&attrs(&[("size", AttrValue::Long(11))])));
	assert!(!filter.matches(&attrs(&[("size", AttrValue::Double(10.5))])));

	let list = Filter::parse("(tags=fast)").unwrap();
	let tagged = attrs(&[("tags", AttrValue::List(vec!["slow".into(), "fast".into()]))]);
	assert!(list.matches(&tagged));
}

#[test]
fn approximate_ignores_case_and_whitespace() {
	let filter = Filter::parse("(title~=Hello World)").unwrap();
	assert!(filter.matches(&attrs(&[("title", "helloworld".into())])));
}

#[test]
fn attribute_lookup_falls_back_to_case_insensitive() {
	let filter = Filter::parse("(Vendor=acme)").unwrap();
	assert!(filter.matches(&attrs(&[("vendor", "acme".into())])));
}

#[test]
fn escapes_are_literal() {
	let filter = Filter::parse(r"(name=a\*b\(c\))").unwrap();
	assert_eq!(
		filter,
		Filter::Compare {
			attr: "name".into(),
			op: Op::Equal,
			value: "a*b(c)".into(),
		}
	);
	assert!(filter.matches(&attrs(&[("name", "a*b(c)".into())])));
}

#[test]
fn reports_offset_of_syntax_errors() {
	for (raw, offset) in [("", 0), ("(a=b", 4), ("(&)", 2), ("(=b)", 1), ("(a=b))", 5), ("(a>b)", 3)] {
		match Filter::parse(raw) {
			Err(ConfigurationError::InvalidFilter { offset: got, .. }) => {
				assert_eq!(got, offset, "offset for {raw:?}");
			}
			other => panic!("{raw:?} should fail, got {other:?}"),
		}
	}
}

#[test]
fn display_is_reparseable() {
	let raw = r"(&(a=x\*y)(|(b>=1)(c=pre*post))(!(d=*)))";
	let filter = Filter::parse(raw).unwrap();
	assert_eq!(Filter::parse(&filter.to_string()).unwrap(), filter);
}
