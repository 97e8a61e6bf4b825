//! CPU clock cycle counts.

/// A count of CPU clock cycles.
///
/// The timer chip and the scheduler's per-quantum budget are both expressed
/// in cycles of the emulated CPU clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Cycles(pub u64);

impl Cycles {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u32> for Cycles {
    fn from(count: u32) -> Self {
        Self(u64::from(count))
    }
}

impl core::ops::Add for Cycles {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl core::ops::AddAssign for Cycles {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl core::ops::Sub for Cycles {
    type Output = Self;

    /// Saturates at zero.
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtraction_saturates() {
        assert_eq!(Cycles::new(3) - Cycles::new(5), Cycles::ZERO);
        assert_eq!(Cycles::new(5) - Cycles::new(3), Cycles::new(2));
    }

    #[test]
    fn accumulates() {
        let mut total = Cycles::ZERO;
        total += Cycles::from(7u32);
        total += Cycles::new(2);
        assert_eq!(total.get(), 9);
    }
}
