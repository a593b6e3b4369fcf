//! Account domain types and balance mechanics.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use saldo_shared::types::{AccountId, AuditStamp};

use crate::context::PostingContext;
use crate::error::LedgerError;

/// Account classification in the chart of accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned (cash, receivables, inventory).
    Asset,
    /// Obligations owed (payables, loans).
    Liability,
    /// Owner's residual interest.
    Equity,
    /// Income earned.
    Revenue,
    /// Costs incurred.
    Expense,
}

impl AccountType {
    /// The side on which this account type increases.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }
}

/// Normal-balance side of an account.
///
/// - Debit-normal (Asset, Expense): balance += debit - credit
/// - Credit-normal (Liability, Equity, Revenue): balance += credit - debit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Account increases on the debit side.
    Debit,
    /// Account increases on the credit side.
    Credit,
}

impl NormalBalance {
    /// Calculates the signed balance change for a movement.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Unique account code (e.g., "1100").
    pub code: String,
    /// Display name (e.g., "Accounts Receivable").
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Reporting category within the type.
    pub category: String,
    /// Parent account in the tree, if any.
    pub parent: Option<AccountId>,
    /// Whether this is a non-postable group node.
    pub is_group: bool,
}

/// A chart of accounts entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Unique account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Reporting category within the type.
    pub category: String,
    /// Parent account in the tree (id reference, never a live handle).
    pub parent: Option<AccountId>,
    /// Group accounts structure the tree and reject postings.
    pub is_group: bool,
    /// Inactive accounts reject postings.
    pub is_active: bool,
    /// Running balance, mutated only by `apply_movement`.
    pub balance: Decimal,
    /// Optimistic-lock version, incremented on every movement.
    pub version: i64,
    /// Audit metadata.
    pub audit: AuditStamp,
}

impl Account {
    /// Creates a new account with a zero balance.
    #[must_use]
    pub fn create(input: CreateAccountInput, ctx: &PostingContext) -> Self {
        Self {
            id: AccountId::new(),
            code: input.code,
            name: input.name,
            account_type: input.account_type,
            category: input.category,
            parent: input.parent,
            is_group: input.is_group,
            is_active: true,
            balance: Decimal::ZERO,
            version: 0,
            audit: AuditStamp::new(ctx.actor, ctx.at),
        }
    }

    /// Returns true if journal lines may target this account.
    #[must_use]
    pub fn is_postable(&self) -> bool {
        !self.is_group && self.is_active
    }

    /// Validates that this account can appear on a journal line.
    ///
    /// # Errors
    ///
    /// Returns `GroupAccount` or `InactiveAccount` when the account rejects
    /// postings.
    pub fn ensure_postable(&self) -> Result<(), LedgerError> {
        if self.is_group {
            return Err(LedgerError::GroupAccount(self.id));
        }
        if !self.is_active {
            return Err(LedgerError::InactiveAccount(self.id));
        }
        Ok(())
    }

    /// Applies one posted journal line's movement to the running balance.
    ///
    /// This is the only operation allowed to mutate `balance`. The caller is
    /// responsible for invoking it exactly once per posted line (idempotency
    /// via line identity).
    ///
    /// # Errors
    ///
    /// Returns `GroupAccount`/`InactiveAccount` without mutating anything.
    pub fn apply_movement(
        &mut self,
        debit: Decimal,
        credit: Decimal,
        ctx: &PostingContext,
    ) -> Result<Decimal, LedgerError> {
        self.ensure_postable()?;

        let change = self.account_type.normal_balance().balance_change(debit, credit);
        self.balance += change;
        self.version += 1;
        self.audit = self.audit.touched(ctx.actor, ctx.at);

        Ok(self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use saldo_shared::types::ActorId;

    fn ctx() -> PostingContext {
        PostingContext::new(ActorId::new(), Utc::now())
    }

    fn account(account_type: AccountType) -> Account {
        Account::create(
            CreateAccountInput {
                code: "1100".to_string(),
                name: "Accounts Receivable".to_string(),
                account_type,
                category: "current".to_string(),
                parent: None,
                is_group: false,
            },
            &ctx(),
        )
    }

    #[test]
    fn test_normal_balance_by_type() {
        assert_eq!(AccountType::Asset.normal_balance(), NormalBalance::Debit);
        assert_eq!(AccountType::Expense.normal_balance(), NormalBalance::Debit);
        assert_eq!(AccountType::Liability.normal_balance(), NormalBalance::Credit);
        assert_eq!(AccountType::Equity.normal_balance(), NormalBalance::Credit);
        assert_eq!(AccountType::Revenue.normal_balance(), NormalBalance::Credit);
    }

    #[test]
    fn test_debit_normal_movement() {
        let mut acc = account(AccountType::Asset);
        let balance = acc.apply_movement(dec!(500.00), dec!(0), &ctx()).unwrap();
        assert_eq!(balance, dec!(500.00));

        let balance = acc.apply_movement(dec!(0), dec!(200.00), &ctx()).unwrap();
        assert_eq!(balance, dec!(300.00));
    }

    #[test]
    fn test_credit_normal_movement() {
        let mut acc = account(AccountType::Revenue);
        let balance = acc.apply_movement(dec!(0), dec!(500.00), &ctx()).unwrap();
        assert_eq!(balance, dec!(500.00));

        let balance = acc.apply_movement(dec!(100.00), dec!(0), &ctx()).unwrap();
        assert_eq!(balance, dec!(400.00));
    }

    #[test]
    fn test_group_account_rejects_movement() {
        let mut acc = account(AccountType::Asset);
        acc.is_group = true;

        let result = acc.apply_movement(dec!(100), dec!(0), &ctx());
        assert!(matches!(result, Err(LedgerError::GroupAccount(_))));
        assert_eq!(acc.balance, Decimal::ZERO);
        assert_eq!(acc.version, 0);
    }

    #[test]
    fn test_inactive_account_rejects_movement() {
        let mut acc = account(AccountType::Asset);
        acc.is_active = false;

        let result = acc.apply_movement(dec!(100), dec!(0), &ctx());
        assert!(matches!(result, Err(LedgerError::InactiveAccount(_))));
        assert_eq!(acc.balance, Decimal::ZERO);
    }

    #[test]
    fn test_movement_increments_version() {
        let mut acc = account(AccountType::Asset);
        acc.apply_movement(dec!(10), dec!(0), &ctx()).unwrap();
        acc.apply_movement(dec!(10), dec!(0), &ctx()).unwrap();
        assert_eq!(acc.version, 2);
    }

    /// Strategy for generating amounts in cents.
    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn account_type_strategy() -> impl Strategy<Value = AccountType> {
        prop_oneof![
            Just(AccountType::Asset),
            Just(AccountType::Liability),
            Just(AccountType::Equity),
            Just(AccountType::Revenue),
            Just(AccountType::Expense),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A debit and a matching credit on the same account cancel out,
        /// regardless of the account's normal side.
        #[test]
        fn prop_equal_debit_credit_cancels(
            account_type in account_type_strategy(),
            amount in amount_strategy(),
        ) {
            let change = account_type
                .normal_balance()
                .balance_change(amount, amount);
            prop_assert_eq!(change, Decimal::ZERO);
        }

        /// The balance change always equals the signed delta for the
        /// account's normal side.
        #[test]
        fn prop_balance_change_formula(
            account_type in account_type_strategy(),
            debit in amount_strategy(),
            credit in amount_strategy(),
        ) {
            let change = account_type.normal_balance().balance_change(debit, credit);
            let expected = match account_type.normal_balance() {
                NormalBalance::Debit => debit - credit,
                NormalBalance::Credit => credit - debit,
            };
            prop_assert_eq!(change, expected);
        }

        /// Applying a sequence of movements accumulates exactly the sum of
        /// their signed changes.
        #[test]
        fn prop_movements_accumulate(
            account_type in account_type_strategy(),
            movements in prop::collection::vec((amount_strategy(), amount_strategy()), 1..20),
        ) {
            let mut acc = account(account_type);
            let mut expected = Decimal::ZERO;
            for (debit, credit) in &movements {
                acc.apply_movement(*debit, *credit, &ctx()).unwrap();
                expected += account_type.normal_balance().balance_change(*debit, *credit);
            }
            prop_assert_eq!(acc.balance, expected);
            prop_assert_eq!(acc.version, movements.len() as i64);
        }
    }
}
