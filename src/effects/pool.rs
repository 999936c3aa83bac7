/// A fixed capacity arena of particle records.
///
/// All slots are allocated up front. The first `live` slots are in use; spawning hands out
/// the next free slot for the caller to initialize and truncating simply forgets the tail,
/// so steady state animation never allocates.
#[derive(Debug, Clone)]
pub struct ParticlePool<T> {
    slots: Vec<T>,
    live: usize,
}

impl<T: Default + Clone> ParticlePool<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { slots: vec![T::default(); capacity], live: 0 }
    }
}

impl<T> ParticlePool<T> {
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Claim the next free slot, or `None` if the arena is full. The slot still holds
    /// whatever a previous occupant left in it.
    pub fn spawn(&mut self) -> Option<&mut T> {
        let slot = self.slots.get_mut(self.live)?;
        self.live += 1;
        Some(slot)
    }

    /// Release every slot past `len`.
    pub fn truncate(&mut self, len: usize) {
        self.live = self.live.min(len);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots[..self.live].iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots[..self.live].iter_mut()
    }
}
