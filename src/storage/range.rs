use std::cmp::Ordering;
use std::ops::Bound;

/// Lower and upper bounds over indexed key values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyRange<K> {
    /// Smallest key admitted by the range.
    pub lower: Bound<K>,
    /// Largest key admitted by the range.
    pub upper: Bound<K>,
}

impl<K> Default for KeyRange<K> {
    fn default() -> Self {
        Self::all()
    }
}

impl<K> KeyRange<K> {
    /// Range covering every key.
    pub fn all() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    /// Range from explicit bounds.
    pub fn new(lower: Bound<K>, upper: Bound<K>) -> Self {
        Self { lower, upper }
    }

    /// Closed range `[lower, upper]`.
    pub fn between(lower: K, upper: K) -> Self {
        Self::new(Bound::Included(lower), Bound::Included(upper))
    }

    /// Keys greater than or equal to `lower`.
    pub fn at_least(lower: K) -> Self {
        Self::new(Bound::Included(lower), Bound::Unbounded)
    }

    /// Keys less than or equal to `upper`.
    pub fn at_most(upper: K) -> Self {
        Self::new(Bound::Unbounded, Bound::Included(upper))
    }

    /// Moves the bound that iteration starts from to `key`.
    ///
    /// Forward scans start at the lower bound, reverse scans at the upper one;
    /// the opposite bound is left as it was.
    pub fn resume_from(mut self, key: K, inclusive: bool, reverse: bool) -> Self {
        let bound = if inclusive {
            Bound::Included(key)
        } else {
            Bound::Excluded(key)
        };
        if reverse {
            self.upper = bound;
        } else {
            self.lower = bound;
        }
        self
    }

    /// Borrowed view of both bounds, suitable for `BTreeMap::range`.
    pub fn as_bounds(&self) -> (Bound<&K>, Bound<&K>) {
        (self.lower.as_ref(), self.upper.as_ref())
    }
}

impl<K: Ord> KeyRange<K> {
    /// Returns `true` when `key` lies inside both bounds.
    pub fn contains(&self, key: &K) -> bool {
        let above_lower = match &self.lower {
            Bound::Unbounded => true,
            Bound::Included(lo) => key >= lo,
            Bound::Excluded(lo) => key > lo,
        };
        let below_upper = match &self.upper {
            Bound::Unbounded => true,
            Bound::Included(hi) => key <= hi,
            Bound::Excluded(hi) => key < hi,
        };
        above_lower && below_upper
    }

    /// Returns `true` when no key can satisfy both bounds.
    pub fn is_empty(&self) -> bool {
        bounds_are_empty(self.lower.as_ref(), self.upper.as_ref())
    }
}

/// Returns `true` when `(lower, upper)` admits no key.
///
/// `BTreeMap::range` panics on inverted bounds, so callers check this first.
pub(crate) fn bounds_are_empty<K: Ord>(lower: Bound<&K>, upper: Bound<&K>) -> bool {
    let (lo, hi) = match (lower, upper) {
        (Bound::Unbounded, _) | (_, Bound::Unbounded) => return false,
        (Bound::Included(lo) | Bound::Excluded(lo), Bound::Included(hi) | Bound::Excluded(hi)) => {
            (lo, hi)
        }
    };
    match lo.cmp(hi) {
        Ordering::Greater => true,
        Ordering::Equal => !matches!((lower, upper), (Bound::Included(_), Bound::Included(_))),
        Ordering::Less => false,
    }
}
