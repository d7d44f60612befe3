use std::{
    collections::BTreeSet,
    fmt::Debug,
    hash::Hash,
    ops::Deref,
};

/// Identifier of something that occupies a resource.
///
/// Applications are the usual sharers of a node, nodes are the sharers of a
/// rack. The ordering of ids fixes the position of each sharer within a slice
/// cycle, so it has to be stable across refreshes.
pub trait Sharer: Ord + Hash + Clone + Debug {}

macro_rules! impl_sharer {
    ($($t:ty),*) => {
        $(
            impl Sharer for $t {}
        )*
    };
}

impl_sharer!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, String);

impl Sharer for &str {}

/// What a segment records about the time it covers.
///
/// A claim contributes to every segment it covers: a fresh segment is seeded
/// from the contribution, an existing one absorbs it. Two time-adjacent
/// segments are coalesced whenever their payloads compare equal.
pub trait Payload: Clone + PartialEq + Debug {
    /// What a single claim adds.
    type Contribution;

    /// Payload of a segment covered by nothing but the given contribution.
    fn seed(contribution: &Self::Contribution) -> Self;

    /// Folds the contribution into the payload.
    fn absorb(&mut self, contribution: &Self::Contribution);
}

/// Ordered set of sharers active during a segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SharerSet<S: Sharer>(BTreeSet<S>);

impl<S: Sharer> Deref for SharerSet<S> {
    type Target = BTreeSet<S>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S: Sharer> FromIterator<S> for SharerSet<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<S: Sharer> SharerSet<S> {
    /// Position of the sharer in the sorted set, `None` if absent.
    pub fn rank(&self, sharer: &S) -> Option<usize> {
        self.0
            .contains(sharer)
            .then(|| self.0.range(..sharer).count())
    }

    /// Whether more than one sharer is active.
    pub fn is_shared(&self) -> bool {
        self.0.len() > 1
    }
}

impl<S: Sharer> Payload for SharerSet<S> {
    type Contribution = S;

    fn seed(sharer: &S) -> Self {
        Self(BTreeSet::from([sharer.clone()]))
    }

    fn absorb(&mut self, sharer: &S) {
        self.0.insert(sharer.clone());
    }
}

/// Aggregated numeric load, used when a rack is tracked as a single resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Load(pub u64);

impl Payload for Load {
    type Contribution = u64;

    fn seed(load: &u64) -> Self {
        Self(*load)
    }

    fn absorb(&mut self, load: &u64) {
        self.0 = self.0.saturating_add(*load);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sharer_rank_follows_ordering() {
        let set: SharerSet<&str> = ["app_3", "app_1", "app_2"].into_iter().collect();
        assert_eq!(set.rank(&"app_1"), Some(0));
        assert_eq!(set.rank(&"app_2"), Some(1));
        assert_eq!(set.rank(&"app_3"), Some(2));
        assert_eq!(set.rank(&"app_0"), None);
        assert!(set.is_shared());
    }

    #[test]
    fn seed_and_absorb() {
        let mut set = SharerSet::seed(&7u32);
        assert!(!set.is_shared());
        set.absorb(&7);
        assert_eq!(set.len(), 1);
        set.absorb(&3);
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![3, 7]);

        let mut load = Load::seed(&2);
        load.absorb(&3);
        assert_eq!(load, Load(5));
        load.absorb(&u64::MAX);
        assert_eq!(load, Load(u64::MAX));
    }
}
