//! The budget thresholds the summary is computed against.

use rust_decimal::Decimal;

/// The monthly expense ceiling and the savings goal.
///
/// The values are configured when the server starts, see the `server` binary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetConfig {
    /// The expense budget. Spending above this amount is reported as 100% spent.
    pub expense_ceiling: Decimal,
    /// The savings target.
    pub savings_goal: Decimal,
}

impl BudgetConfig {
    /// The default expense ceiling, 2500.00.
    pub fn default_expense_ceiling() -> Decimal {
        Decimal::new(2500_00, 2)
    }

    /// The default savings goal, 30000.00.
    pub fn default_savings_goal() -> Decimal {
        Decimal::new(30000_00, 2)
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            expense_ceiling: Self::default_expense_ceiling(),
            savings_goal: Self::default_savings_goal(),
        }
    }
}
