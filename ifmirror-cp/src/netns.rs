//! Process-wide default network namespace.

/// Mutable default namespace name; empty means "no namespace". State lives
/// for the process lifetime only.
#[derive(Debug, Default)]
pub struct DefaultNs {
    name: String,
}

impl DefaultNs {
    pub fn new() -> Self {
        DefaultNs::default()
    }

    /// Overwrite the default. An empty name clears it.
    pub fn set(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn get(&self) -> &str {
        &self.name
    }

    /// Namespace a new pair should be created in: the request's own value,
    /// or the current default when the request leaves it empty.
    pub fn resolve<'a>(&'a self, requested: &'a str) -> &'a str {
        if requested.is_empty() {
            &self.name
        } else {
            requested
        }
    }
}
