use crate::variables::JsonVariables;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// A table of `feature id -> variables`, as written in a local variables file.
///
/// ```toml
/// [settings]
/// punctuation-enabled = true
///
/// [home-screen]
/// sections = ["top-sites", "recent"]
/// ```
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalVariables {
    features: BTreeMap<String, JsonVariables>,
}

impl LocalVariables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, JsonVariables> {
        self.features
    }
}

impl Deref for LocalVariables {
    type Target = BTreeMap<String, JsonVariables>;

    fn deref(&self) -> &Self::Target {
        &self.features
    }
}

impl DerefMut for LocalVariables {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.features
    }
}

impl FromIterator<(String, JsonVariables)> for LocalVariables {
    fn from_iter<I: IntoIterator<Item = (String, JsonVariables)>>(iter: I) -> Self {
        Self { features: iter.into_iter().collect() }
    }
}
