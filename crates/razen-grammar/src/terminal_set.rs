use razen_yellow::KindId;

/// Bitset over the terminals of one grammar.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TerminalSet {
    bits: Box<[u64]>,
}

impl TerminalSet {
    const BITS_PER_SLOT: usize = u64::BITS as usize;

    /// An empty set able to hold ids below `capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { bits: vec![0; capacity.div_ceil(Self::BITS_PER_SLOT)].into_boxed_slice() }
    }

    #[inline]
    fn slot(kind: KindId) -> (usize, u64) {
        let index = kind.index();
        (index / Self::BITS_PER_SLOT, 1 << (index % Self::BITS_PER_SLOT))
    }

    /// Returns `true` if `kind` was not yet present.
    pub fn insert(&mut self, kind: KindId) -> bool {
        let (slot, mask) = Self::slot(kind);
        let fresh = self.bits[slot] & mask == 0;
        self.bits[slot] |= mask;
        fresh
    }

    pub fn remove(&mut self, kind: KindId) {
        let (slot, mask) = Self::slot(kind);
        if let Some(bits) = self.bits.get_mut(slot) {
            *bits &= !mask;
        }
    }

    #[inline]
    pub fn contains(&self, kind: KindId) -> bool {
        let (slot, mask) = Self::slot(kind);
        self.bits.get(slot).is_some_and(|bits| bits & mask != 0)
    }

    /// Returns `true` if `self` grew.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let mut changed = false;
        for (bits, other) in self.bits.iter_mut().zip(other.bits.iter()) {
            let merged = *bits | other;
            changed |= merged != *bits;
            *bits = merged;
        }
        changed
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.bits.iter().zip(other.bits.iter()).any(|(a, b)| a & b != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&bits| bits == 0)
    }

    pub fn len(&self) -> usize {
        self.bits.iter().map(|bits| bits.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = KindId> + '_ {
        self.bits.iter().enumerate().flat_map(|(slot, &bits)| {
            (0..Self::BITS_PER_SLOT)
                .filter(move |bit| bits & (1 << bit) != 0)
                .map(move |bit| KindId((slot * Self::BITS_PER_SLOT + bit) as u16))
        })
    }
}

impl FromIterator<KindId> for TerminalSet {
    fn from_iter<I: IntoIterator<Item = KindId>>(iter: I) -> Self {
        let kinds: Vec<KindId> = iter.into_iter().collect();
        let capacity = kinds.iter().map(|kind| kind.index() + 1).max().unwrap_or(0);
        let mut set = Self::with_capacity(capacity);
        for kind in kinds {
            set.insert(kind);
        }
        set
    }
}
