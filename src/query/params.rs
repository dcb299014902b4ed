//! # Query Parameters
//!
//! Ordered multi-valued query-string parameters. Keys match ignoring ASCII
//! case; a key may carry any number of values.

/// Decoded query-string parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a raw query string (`a=1&b=2`, optional leading `?`)
    pub fn parse(query_string: &str) -> Self {
        let raw = query_string.strip_prefix('?').unwrap_or(query_string);
        let pairs = form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    /// Appends one value for `key`
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Builder form of `push`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Every value given for `key`, in order
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Whether `key` appears at all
    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    /// Returns true when no parameter was given
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decodes_and_keeps_repeats() {
        let params = QueryParams::parse("?$filter=name%20eq%20'a'&$FILTER=x+eq+1&$top=5");
        assert_eq!(params.get_all("$filter"), vec!["name eq 'a'", "x eq 1"]);
        assert_eq!(params.get_all("$top"), vec!["5"]);
        assert!(params.contains("$TOP"));
        assert!(!params.contains("$skip"));
    }

    #[test]
    fn test_from_pairs() {
        let params: QueryParams = vec![("$count", "true")].into_iter().collect();
        assert_eq!(params.get_all("$count"), vec!["true"]);
    }
}
