use std::collections::HashMap;

/// Symbol to company display name lookup.
#[derive(Debug, Clone, Default)]
pub struct CompanyDirectory {
    names: HashMap<String, String>,
}

impl CompanyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys are stored trimmed and upper-cased, matching normalized price symbols.
    pub fn insert(&mut self, symbol: impl Into<String>, name: impl Into<String>) {
        let name = name.into();
        if !name.trim().is_empty() {
            self.names.insert(normalize_symbol(&symbol.into()), name);
        }
    }

    /// Display name for `symbol`, falling back to the symbol itself.
    pub fn display_name<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.names.get(symbol).map(String::as_str).unwrap_or(symbol)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(s, n)| (s.as_str(), n.as_str()))
    }
}

fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

impl<S: Into<String>, N: Into<String>> FromIterator<(S, N)> for CompanyDirectory {
    fn from_iter<I: IntoIterator<Item = (S, N)>>(iter: I) -> Self {
        let mut directory = Self::new();
        for (symbol, name) in iter {
            directory.insert(symbol, name);
        }
        directory
    }
}
