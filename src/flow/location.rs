use std::collections::BTreeMap;

/// The page address as the flow sees it: where it reads prefill parameters
/// from and what it rewrites once a submission succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Everything before the query string, e.g. `https://example.com/contact`.
    pub base: String,
    pub query: Vec<(String, String)>,
    pub fragment: Option<String>,
}

impl Location {
    pub fn parse(href: &str) -> Self {
        let (rest, fragment) = match href.split_once('#') {
            Some((rest, frag)) => (rest, Some(frag.to_string())),
            None => (href, None),
        };
        let (base, query) = match rest.split_once('?') {
            Some((base, query)) => (base, query),
            None => (rest, ""),
        };

        let query = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Self {
            base: base.to_string(),
            query,
            fragment,
        }
    }

    /// Query parameters keyed by name; the first occurrence of a key wins.
    pub fn params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        for (k, v) in &self.query {
            params.entry(k.clone()).or_insert_with(|| v.clone());
        }
        params
    }

    pub fn has_query(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn without_query(&self) -> Self {
        Self {
            base: self.base.clone(),
            query: Vec::new(),
            fragment: None,
        }
    }

    pub fn with_fragment(mut self, fragment: &str) -> Self {
        self.fragment = Some(fragment.to_string());
        self
    }

    pub fn href(&self) -> String {
        let mut href = self.base.clone();
        if !self.query.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.query.iter())
                .finish();
            href.push('?');
            href.push_str(&query);
        }
        if let Some(fragment) = &self.fragment {
            href.push('#');
            href.push_str(fragment);
        }
        href
    }
}
