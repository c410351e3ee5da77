/// Options shared by every adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Separates the segments of a property path.
    property_separator: char,
    /// Names starting with this character mark the key field of a columnar format.
    key_marker: char,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            property_separator: '.',
            key_marker: '@',
        }
    }
}

impl AdapterConfig {
    pub fn with_property_separator(mut self, separator: char) -> Self {
        self.property_separator = separator;
        self
    }

    pub fn with_key_marker(mut self, marker: char) -> Self {
        self.key_marker = marker;
        self
    }

    #[inline]
    pub fn property_separator(&self) -> char {
        self.property_separator
    }

    #[inline]
    pub fn key_marker(&self) -> char {
        self.key_marker
    }
}
