//! Fixed, ordered set of subjects fetched together.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::ConfigError;

/// Profile shown at the top of the page.
pub const DEFAULT_PROFILE_ID: &str = "402607131016036352";

/// Friends roster shown below the profile.
pub const DEFAULT_FRIEND_IDS: [&str; 6] = [
    "1091415573990219806",
    "1271926225904078952",
    "1139275573261258884",
    "998924038439190638",
    "943174184278847560",
    "1292960011471032393",
];

/// Subject ids go into a URL path segment verbatim, so only ASCII
/// alphanumerics, `-` and `_` are accepted.
pub fn is_valid_subject_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Ordered, duplicate-free subject identifiers. Membership is fixed once
/// built; clones share the same backing slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster(Arc<[String]>);

impl Roster {
    pub fn new<I, S>(ids: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        {
            let mut seen = HashSet::with_capacity(ids.len());
            for id in &ids {
                if !is_valid_subject_id(id) {
                    return Err(ConfigError::Invalid(format!(
                        "roster contains an invalid subject id {id:?}"
                    )));
                }
                if !seen.insert(id.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "roster lists subject {id} more than once"
                    )));
                }
            }
        }
        Ok(Self(ids.into()))
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self(DEFAULT_FRIEND_IDS.iter().map(|s| (*s).to_string()).collect())
    }
}
