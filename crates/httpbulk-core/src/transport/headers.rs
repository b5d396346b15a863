//! Response header storage and raw header-line parsing.

/// Response headers with case-insensitive lookup. Preserves arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Feed one raw header line as delivered by libcurl.
    ///
    /// A status line (`HTTP/...`) starts a new response, so after redirects
    /// only the final response's headers remain. Returns the status code
    /// when `line` is a status line.
    pub(crate) fn push_line(&mut self, line: &str) -> Option<u32> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if line.starts_with("HTTP/") {
            self.clear();
            return parse_status_line(line);
        }
        if let Some((name, value)) = line.split_once(':') {
            self.insert(name.trim(), value.trim());
        }
        None
    }
}

/// Status code from a line like `HTTP/1.1 304 Not Modified`.
pub(crate) fn parse_status_line(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse().ok()
}
