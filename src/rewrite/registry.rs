use std::collections::HashMap;
use std::sync::Arc;

/// A whole-body rewrite function for one content type.
///
/// Total over the input: it either produces a replacement body or an error.
/// On error the interceptor keeps the original bytes, so a broken transform
/// can never break a response.
pub type Transform = Arc<dyn Fn(&[u8]) -> anyhow::Result<Vec<u8>> + Send + Sync>;

/// Maps normalized content types to body transforms.
///
/// Built once at startup, then shared immutably (`Arc`) across all
/// connections. Lookups are exact-match on the normalized type: parameters
/// after `;` are stripped, surrounding whitespace trimmed and the type
/// lowercased, so `"text/html; charset=utf-8"` finds the transform
/// registered for `"text/html"`. There is no wildcard matching.
#[derive(Clone, Default)]
pub struct TransformRegistry {
    transforms: HashMap<String, Transform>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a transform for `content_type`, replacing any previous
    /// registration for the same normalized type.
    pub fn register<F>(&mut self, content_type: &str, transform: F)
    where
        F: Fn(&[u8]) -> anyhow::Result<Vec<u8>> + Send + Sync + 'static,
    {
        self.transforms
            .insert(normalize(content_type), Arc::new(transform));
    }

    /// Finds the transform for `content_type`, if one was registered.
    ///
    /// Read-only; safe to call from any number of concurrent requests.
    pub fn lookup(&self, content_type: &str) -> Option<Transform> {
        self.transforms.get(&normalize(content_type)).cloned()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("content_types", &self.transforms.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Strips MIME parameters and normalizes case: `"Text/HTML; charset=utf-8"`
/// becomes `"text/html"`.
fn normalize(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_parameters() {
        assert_eq!(normalize("text/html; charset=utf-8"), "text/html");
        assert_eq!(normalize("  Text/CSS  "), "text/css");
        assert_eq!(normalize("application/json"), "application/json");
    }
}
