//! Relation-tagged `Link` header parsing and page termination.
//!
//! The header is a comma-separated list of `<url>; rel="name"` entries. Only the `next`
//! and `last` relations drive pagination.

// self
use crate::_prelude::*;

/// One `<target>; rel="..."` entry of a `Link` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
	/// Target URL exactly as written between the angle brackets.
	pub target: String,
	/// Relation names from the `rel` parameter.
	pub relations: Vec<String>,
}
impl Link {
	/// Returns true if the entry carries `relation` (case-insensitive).
	pub fn has_relation(&self, relation: &str) -> bool {
		self.relations.iter().any(|candidate| candidate.eq_ignore_ascii_case(relation))
	}
}

/// Parses every well-formed entry of a `Link` header; malformed fragments are skipped.
pub fn parse(header: &str) -> Vec<Link> {
	let mut links = Vec::new();
	let mut rest = header;

	while let Some(open) = rest.find('<') {
		let after_open = &rest[open + 1..];
		let Some(close) = after_open.find('>') else {
			break;
		};
		let target = after_open[..close].trim();
		let (params, remainder) = split_params(&after_open[close + 1..]);

		links.push(Link { target: target.to_owned(), relations: relations(params) });

		rest = remainder;
	}

	links
}

/// Target of the first entry tagged with `relation`.
pub fn find<'a>(links: &'a [Link], relation: &str) -> Option<&'a str> {
	links.iter().find(|link| link.has_relation(relation)).map(|link| link.target.as_str())
}

/// Decides which page follows `fetched`, given that response's `Link` header.
///
/// Without a `last` relation the crawl stops. When `last` points at the page just
/// fetched the crawl stops as well, even if a `next` relation is present.
pub fn next_page(fetched: &Url, header: &str) -> Option<String> {
	let links = parse(header);
	let last = find(&links, "last")?;

	if is_same_url(fetched, last) {
		return None;
	}

	find(&links, "next").map(str::to_owned)
}

fn is_same_url(fetched: &Url, target: &str) -> bool {
	fetched.as_str() == target || Url::parse(target).is_ok_and(|target| &target == fetched)
}

// Splits off the parameter section of one entry, up to the next comma outside quotes.
fn split_params(input: &str) -> (&str, &str) {
	let mut quoted = false;

	for (idx, ch) in input.char_indices() {
		match ch {
			'"' => quoted = !quoted,
			',' if !quoted => return (&input[..idx], &input[idx + 1..]),
			_ => {},
		}
	}

	(input, "")
}

fn relations(params: &str) -> Vec<String> {
	params
		.split(';')
		.filter_map(|param| param.split_once('='))
		.filter(|(key, _)| key.trim().eq_ignore_ascii_case("rel"))
		.flat_map(|(_, value)| {
			value.trim().trim_matches('"').split_whitespace().map(str::to_owned).collect::<Vec<_>>()
		})
		.collect()
}
