//! `selected_facets` query-string handling.
//!
//! Facet filters travel in the collection URL as repeated
//! `selected_facets=<name>:<value>` parameters. The loader treats the
//! resulting URL as an opaque endpoint; this module only builds and parses
//! it so that checkbox toggles can be turned into a fresh endpoint for
//! `Loader::reset`.

use std::fmt;

/// Query parameter carrying facet selections.
pub const FACET_PARAM: &str = "selected_facets";

/// One `<name>:<value>` facet selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Facet {
    pub name: String,
    pub value: String,
}

impl Facet {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parse a decoded `name:value` pair. The name ends at the first colon.
    pub fn parse(raw: &str) -> Option<Self> {
        let (name, value) = raw.split_once(':')?;
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name, value))
    }

    fn to_param(&self) -> String {
        format!(
            "{}={}:{}",
            FACET_PARAM,
            urlencoding::encode(&self.name),
            urlencoding::encode(&self.value)
        )
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.value)
    }
}

/// Ordered set of selected facets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetSelection {
    facets: Vec<Facet>,
}

impl FacetSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every `selected_facets` parameter from a query string
    /// (with or without the leading `?`).
    pub fn parse_query(query: &str) -> Self {
        let mut selection = Self::new();
        for (key, value) in query_pairs(query.trim_start_matches('?')) {
            if key != FACET_PARAM {
                continue;
            }
            if let Some(facet) = Facet::parse(&value) {
                selection.select(facet);
            }
        }
        selection
    }

    /// Collect the facets selected in a full URL.
    pub fn from_url(url: &str) -> Self {
        let (without_fragment, _) = split_fragment(url);
        match without_fragment.split_once('?') {
            Some((_, query)) => Self::parse_query(query),
            None => Self::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.facets.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Facet> {
        self.facets.iter()
    }

    pub fn is_selected(&self, facet: &Facet) -> bool {
        self.facets.contains(facet)
    }

    /// Add a facet. Returns false if it was already selected.
    pub fn select(&mut self, facet: Facet) -> bool {
        if self.is_selected(&facet) {
            return false;
        }
        self.facets.push(facet);
        true
    }

    /// Remove a facet. Returns false if it was not selected.
    pub fn deselect(&mut self, facet: &Facet) -> bool {
        let before = self.facets.len();
        self.facets.retain(|f| f != facet);
        self.facets.len() != before
    }

    /// Flip a facet, as a checkbox click would. Returns the new state.
    pub fn toggle(&mut self, facet: Facet) -> bool {
        if self.deselect(&facet) {
            false
        } else {
            self.select(facet)
        }
    }

    /// Values selected for one facet name, in selection order.
    pub fn values_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.facets
            .iter()
            .filter(move |f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Render as `selected_facets=a:b&selected_facets=c:d`.
    pub fn to_query(&self) -> String {
        self.facets
            .iter()
            .map(Facet::to_param)
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Replace the facet parameters of `url` with this selection, keeping
    /// every other parameter and the fragment.
    pub fn apply_to(&self, url: &str) -> String {
        let (without_fragment, fragment) = split_fragment(url);
        let (base, query) = without_fragment
            .split_once('?')
            .unwrap_or((without_fragment, ""));

        let mut params: Vec<String> = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter(|pair| decode(pair.split('=').next().unwrap_or_default()) != FACET_PARAM)
            .map(str::to_string)
            .collect();
        params.extend(self.facets.iter().map(Facet::to_param));

        let mut out = base.to_string();
        if !params.is_empty() {
            out.push('?');
            out.push_str(&params.join("&"));
        }
        if let Some(fragment) = fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

impl FromIterator<Facet> for FacetSelection {
    fn from_iter<I: IntoIterator<Item = Facet>>(iter: I) -> Self {
        let mut selection = Self::new();
        for facet in iter {
            selection.select(facet);
        }
        selection
    }
}

fn split_fragment(url: &str) -> (&str, Option<&str>) {
    match url.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (url, None),
    }
}

fn query_pairs(query: &str) -> impl Iterator<Item = (String, String)> + '_ {
    query.split('&').filter(|pair| !pair.is_empty()).map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (decode(key), decode(value))
    })
}

/// Form-style decoding: `+` is a space. Invalid UTF-8 is kept verbatim.
fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}
