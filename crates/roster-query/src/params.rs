use std::collections::BTreeMap;
use std::fmt;

/// Static, endpoint-specific request parameters (`mode=cumulative`,
/// `group_by=month`, ...) carried alongside the pagination state.
///
/// Stored as a typed map rather than a raw query fragment. The
/// canonical form is order-independent, so two parameter sets that
/// differ only in insertion order share one cache identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraParams(BTreeMap<String, String>);

/// A pair in the flat `k=v&k2=v2` form that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamsError {
    pub pair: String,
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed parameter pair: {:?}", self.pair)
    }
}

impl std::error::Error for ParamsError {}

impl ExtraParams {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse the legacy flat form, splitting on `&` then `=`. A pair
    /// with no `=`, an empty key or an empty value is an error rather
    /// than a silent drop.
    pub fn parse(s: &str) -> Result<Self, ParamsError> {
        let mut params = Self::new();
        if s.is_empty() {
            return Ok(params);
        }
        for pair in s.split('&') {
            match pair.split_once('=') {
                Some((k, v)) if !k.is_empty() && !v.is_empty() => params.insert(k, v),
                _ => {
                    return Err(ParamsError {
                        pair: pair.to_string(),
                    });
                }
            }
        }
        Ok(params)
    }

    /// The `k=v&k2=v2` string in map order; the `params` component of
    /// the cache key.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            out.push_str(k);
            out.push('=');
            out.push_str(v);
        }
        out
    }
}
