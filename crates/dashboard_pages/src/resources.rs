use tracing::warn;

/// Resource names a page can select from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceCatalog {
    names: Vec<String>,
}

impl ResourceCatalog {
    /// Blank names and the dot-segments `.` and `..` are skipped: browsers
    /// resolve the latter away even when percent-encoded, so such a resource
    /// could never be restored from a URL.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::default();
        for name in names {
            let name = name.into();
            if name == "." || name == ".." {
                warn!(resource = %name, "skipping resource name that cannot appear in a url path");
                continue;
            }
            if !name.is_empty() && !catalog.names.contains(&name) {
                catalog.names.push(name);
            }
        }
        catalog
    }

    /// Exact match first, then a case-insensitive one. Returns the catalog's
    /// spelling.
    pub fn find(&self, name: &str) -> Option<&str> {
        self.names
            .iter()
            .find(|known| *known == name)
            .or_else(|| self.names.iter().find(|known| known.eq_ignore_ascii_case(name)))
            .map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
