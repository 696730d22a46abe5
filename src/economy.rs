use serde::Serialize;

pub(crate) const STARTING_COINS: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct Wallet {
    coins: u32,
}

impl Default for Wallet {
    fn default() -> Self {
        Self {
            coins: STARTING_COINS,
        }
    }
}

impl Wallet {
    #[cfg(test)]
    pub(crate) fn with_coins(coins: u32) -> Self {
        Self { coins }
    }

    pub(crate) fn coins(&self) -> u32 {
        self.coins
    }

    /// The single affordability check, shared by the menu and every spend.
    pub(crate) fn can_afford(&self, cost: u32) -> bool {
        self.coins >= cost
    }

    /// Debits `cost` if affordable; otherwise leaves the balance untouched.
    pub(crate) fn spend(&mut self, cost: u32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.coins -= cost;
        true
    }

    pub(crate) fn credit(&mut self, amount: u32) {
        self.coins = self.coins.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spend_requires_funds() {
        let mut w = Wallet::with_coins(5);
        assert!(!w.spend(10));
        assert_eq!(w.coins(), 5);
        assert!(w.spend(5));
        assert_eq!(w.coins(), 0);
    }

    #[test]
    fn credit_saturates() {
        let mut w = Wallet::with_coins(u32::MAX - 1);
        w.credit(10);
        assert_eq!(w.coins(), u32::MAX);
    }

    #[test]
    fn starts_at_one_hundred() {
        assert_eq!(Wallet::default().coins(), 100);
    }
}
