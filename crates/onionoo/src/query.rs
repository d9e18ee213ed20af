//! Onionoo query parameters.

use std::fmt;

/// The Onionoo resource to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Summary,
    Details,
}

impl DocumentKind {
    pub fn path(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Details => "details",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Filter and projection parameters for one Onionoo request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnionooQuery {
    /// `relay` or `bridge`.
    pub kind: Option<String>,
    pub running: Option<bool>,
    pub search: Option<String>,
    pub lookup: Option<String>,
    pub flag: Option<String>,
    pub fields: Vec<String>,
    pub limit: Option<u32>,
}

impl OnionooQuery {
    /// All relays, running or not.
    pub fn relays() -> Self {
        Self {
            kind: Some("relay".to_string()),
            ..Self::default()
        }
    }

    pub fn running(mut self, running: bool) -> Self {
        self.running = Some(running);
        self
    }

    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn lookup(mut self, lookup: impl Into<String>) -> Self {
        self.lookup = Some(lookup.into());
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string pairs in a fixed order. Unset parameters are omitted.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(kind) = &self.kind {
            params.push(("type", kind.clone()));
        }
        if let Some(running) = self.running {
            params.push(("running", running.to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(lookup) = &self.lookup {
            params.push(("lookup", lookup.clone()));
        }
        if let Some(flag) = &self.flag {
            params.push(("flag", flag.clone()));
        }
        if !self.fields.is_empty() {
            params.push(("fields", self.fields.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }

    /// Cache key covering the document kind and every parameter, unset ones
    /// included, so distinct queries never share an entry.
    pub fn cache_key(&self, document: DocumentKind) -> String {
        fn opt<T: ToString>(value: &Option<T>) -> String {
            value.as_ref().map_or_else(|| "-".to_string(), ToString::to_string)
        }

        format!(
            "{document};type={};running={};search={};lookup={};flag={};fields={};limit={}",
            opt(&self.kind),
            opt(&self.running),
            opt(&self.search),
            opt(&self.lookup),
            opt(&self.flag),
            self.fields.join(","),
            opt(&self.limit),
        )
    }
}
