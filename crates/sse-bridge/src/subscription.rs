//! Parsing of the `sse-swap` attribute.

use smallvec::SmallVec;

/// Event names an element wants re-dispatched, in attribute order.
///
/// Entries are trimmed but never filtered: `"done,,progress"` yields an
/// empty-string entry, which registers a listener for the empty event type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubscriptionList {
    names: SmallVec<[String; 4]>,
}

impl SubscriptionList {
    pub fn parse(attribute: &str) -> Self {
        Self {
            names: attribute
                .split(',')
                .map(|name| name.trim().to_string())
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.iter().any(|candidate| candidate == name)
    }
}

impl<'a> IntoIterator for &'a SubscriptionList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}
