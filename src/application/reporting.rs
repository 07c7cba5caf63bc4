use serde::{Deserialize, Serialize};

use crate::domain::{Cents, Totals, Transaction, TransactionType, compute_totals};

/// Balance summary shown alongside the transaction list: total income,
/// total expenses and net balance, plus how many entries fed each total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub total_income: Cents,
    pub total_expense: Cents,
    pub net: Cents,
    pub income_count: usize,
    pub expense_count: usize,
}

impl SummaryReport {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let Totals {
            income,
            expense,
            net,
        } = compute_totals(transactions);

        let income_count = transactions
            .iter()
            .filter(|t| t.transaction_type == TransactionType::Income)
            .count();

        Self {
            total_income: income,
            total_expense: expense,
            net,
            income_count,
            expense_count: transactions.len() - income_count,
        }
    }

    pub fn transaction_count(&self) -> usize {
        self.income_count + self.expense_count
    }

    pub fn totals(&self) -> Totals {
        Totals {
            income: self.total_income,
            expense: self.total_expense,
            net: self.net,
        }
    }
}
