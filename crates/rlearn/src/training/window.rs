//! Fixed-capacity ring buffer of recent episode statistics.

/// The most recent `capacity` completed episodes, in completion order.
///
/// Rewards and lengths live in two parallel arenas allocated once; `head`
/// points at the oldest entry. Pushing into a full window overwrites the
/// oldest slot.
#[derive(Clone, Debug)]
pub struct RollingWindow {
    rewards: Vec<f64>,
    lengths: Vec<f64>,
    head: usize,
    len: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RollingWindow capacity must be at least 1");
        Self {
            rewards: vec![0.0; capacity],
            lengths: vec![0.0; capacity],
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.rewards.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Append an episode, evicting the oldest one when full.
    pub fn push(&mut self, reward: f64, length: f64) {
        let capacity = self.capacity();
        if self.len < capacity {
            let slot = (self.head + self.len) % capacity;
            self.rewards[slot] = reward;
            self.lengths[slot] = length;
            self.len += 1;
        } else {
            self.rewards[self.head] = reward;
            self.lengths[self.head] = length;
            self.head = (self.head + 1) % capacity;
        }
    }

    /// Drop every entry, keeping the allocation.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    fn slot(&self, i: usize) -> usize {
        (self.head + i) % self.capacity()
    }

    /// Iterate `(reward, length)` pairs from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        (0..self.len).map(move |i| {
            let slot = self.slot(i);
            (self.rewards[slot], self.lengths[slot])
        })
    }

    /// Newest `(reward, length)` pair
    pub fn latest(&self) -> Option<(f64, f64)> {
        if self.len == 0 {
            return None;
        }
        let slot = self.slot(self.len - 1);
        Some((self.rewards[slot], self.lengths[slot]))
    }

    /// Mean reward and mean length, or `None` when empty.
    pub fn mean(&self) -> Option<(f64, f64)> {
        if self.len == 0 {
            return None;
        }
        let (reward_sum, length_sum) = self
            .iter()
            .fold((0.0, 0.0), |(r, l), (reward, length)| (r + reward, l + length));
        let n = self.len as f64;
        Some((reward_sum / n, length_sum / n))
    }

    /// Lowest reward currently held
    pub fn min_reward(&self) -> Option<f64> {
        self.iter().map(|(reward, _)| reward).reduce(f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut window = RollingWindow::new(3);
        assert!(window.is_empty());
        window.push(1.0, 10.0);
        window.push(2.0, 20.0);
        assert!(!window.is_full());
        window.push(3.0, 30.0);
        assert!(window.is_full());
        assert_eq!(window.mean(), Some((2.0, 20.0)));
    }

    #[test]
    fn test_eviction_keeps_chronological_order() {
        let mut window = RollingWindow::new(3);
        for i in 1..=5 {
            window.push(i as f64, i as f64 * 10.0);
        }
        let rewards: Vec<f64> = window.iter().map(|(r, _)| r).collect();
        assert_eq!(rewards, vec![3.0, 4.0, 5.0]);
        assert_eq!(window.latest(), Some((5.0, 50.0)));
        assert_eq!(window.min_reward(), Some(3.0));
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_clear() {
        let mut window = RollingWindow::new(2);
        window.push(1.0, 1.0);
        window.push(2.0, 1.0);
        window.push(3.0, 1.0);
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.mean(), None);
        assert_eq!(window.latest(), None);
        window.push(7.0, 2.0);
        assert_eq!(window.iter().collect::<Vec<_>>(), vec![(7.0, 2.0)]);
    }

    #[test]
    fn test_capacity_one() {
        let mut window = RollingWindow::new(1);
        window.push(1.0, 1.0);
        window.push(4.0, 2.0);
        assert!(window.is_full());
        assert_eq!(window.mean(), Some((4.0, 2.0)));
    }
}
