use std::collections::BTreeSet;
use std::fmt;

/// ArUco marker identifier as reported by the detector.
pub type MarkerId = i32;

/// Set of marker ids, either detected in one frame or configured as the ids of interest.
///
/// Iterates in ascending id order so log lines are stable from frame to frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerSet {
    ids: BTreeSet<MarkerId>,
}

/// The configured ids a presence policy tracks.
pub type InterestSet = MarkerSet;

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: MarkerId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = MarkerId> + '_ {
        self.ids.iter().copied()
    }

    /// Ids in `self` that are absent from `other`.
    pub fn missing_from<'a>(&'a self, other: &'a MarkerSet) -> impl Iterator<Item = MarkerId> + 'a {
        self.ids.difference(&other.ids).copied()
    }

    pub fn is_subset(&self, other: &MarkerSet) -> bool {
        self.ids.is_subset(&other.ids)
    }
}

impl FromIterator<MarkerId> for MarkerSet {
    fn from_iter<I: IntoIterator<Item = MarkerId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for MarkerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, id) in self.ids.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{id}")?;
        }
        f.write_str("]")
    }
}
