use std::collections::HashMap;

/// A case-insensitive HTTP header map.
///
/// Header names are canonicalized on insert (`content-type` is stored and
/// emitted as `Content-Type`), so lookups work regardless of the casing a
/// client or handler used. Inserting a name that is already present replaces
/// the previous value; a header can therefore never appear twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    map: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header, replacing any existing value for the same name.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.map.insert(canonicalize(name.as_ref()), value.into());
    }

    /// Retrieves a header value by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(&canonicalize(name)).map(|v| v.as_str())
    }

    /// Removes a header, returning its previous value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.map.remove(&canonicalize(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&canonicalize(name))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over all `(name, value)` pairs in canonical form.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Canonicalizes a header name: first letter of each dash-separated segment
/// uppercased, the rest lowercased (`x-custom-header` -> `X-Custom-Header`).
fn canonicalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for ch in name.chars() {
        if ch == '-' {
            out.push('-');
            upper_next = true;
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch.to_ascii_lowercase());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_names() {
        assert_eq!(canonicalize("content-type"), "Content-Type");
        assert_eq!(canonicalize("CONTENT-LENGTH"), "Content-Length");
        assert_eq!(canonicalize("x-custom-header"), "X-Custom-Header");
    }

    #[test]
    fn insert_replaces() {
        let mut headers = Headers::new();
        headers.insert("Content-Length", "10");
        headers.insert("content-length", "42");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("CONTENT-LENGTH"), Some("42"));
    }
}
