//! Reward pool custody
//!
//! The escrow balance only ever decreases after the initial deposit, and it
//! leaves custody in exactly one step: [`Escrow::settle`] checks the whole
//! batch of transfers before touching the balance.

use crate::{
    types::{Transfer, TransferKind},
    Error, Result,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Escrowed reward pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escrow {
    /// Amount deposited at creation
    deposited: Decimal,

    /// Amount currently held
    balance: Decimal,

    /// Committed transfers, payouts first then the refund
    disbursements: Vec<Transfer>,
}

impl Escrow {
    /// Take custody of a deposit
    pub fn deposit(amount: Decimal) -> Result<Self> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidConfiguration(format!(
                "Escrow deposit must be positive, got {}",
                amount
            )));
        }

        Ok(Self {
            deposited: amount,
            balance: amount,
            disbursements: Vec::new(),
        })
    }

    /// Amount deposited at creation
    pub fn deposited(&self) -> Decimal {
        self.deposited
    }

    /// Amount currently held
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Committed transfers
    pub fn disbursements(&self) -> &[Transfer] {
        &self.disbursements
    }

    /// True once the pool has been fully distributed
    pub fn is_settled(&self) -> bool {
        !self.disbursements.is_empty() && self.balance.is_zero()
    }

    /// Total paid out to winners so far
    pub fn total_payouts(&self) -> Decimal {
        self.sum_of(TransferKind::Payout)
    }

    /// Total refunded to the sponsor so far
    pub fn total_refunds(&self) -> Decimal {
        self.sum_of(TransferKind::Refund)
    }

    /// Release the entire balance through `transfers`
    ///
    /// All-or-nothing: on error the escrow is unchanged.
    pub fn settle(&mut self, transfers: Vec<Transfer>) -> Result<()> {
        if self.is_settled() {
            return Err(Error::InvariantViolation(
                "Escrow already settled".to_string(),
            ));
        }

        if let Some(negative) = transfers.iter().find(|t| t.amount.is_sign_negative()) {
            return Err(Error::InvariantViolation(format!(
                "Negative transfer of {} to {}",
                negative.amount, negative.recipient
            )));
        }

        let total: Decimal = transfers.iter().map(|t| t.amount).sum();
        if total != self.balance {
            return Err(Error::InvariantViolation(format!(
                "Transfers total {} but escrow holds {}",
                total, self.balance
            )));
        }

        self.balance = Decimal::ZERO;
        self.disbursements = transfers;

        Ok(())
    }

    /// Check that deposits equal balance plus disbursements
    pub fn check_conservation(&self) -> Result<()> {
        let disbursed: Decimal = self.disbursements.iter().map(|t| t.amount).sum();
        if self.balance + disbursed != self.deposited {
            return Err(Error::InvariantViolation(format!(
                "Escrow holds {} and disbursed {}, deposit was {}",
                self.balance, disbursed, self.deposited
            )));
        }
        Ok(())
    }

    fn sum_of(&self, kind: TransferKind) -> Decimal {
        self.disbursements
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.amount)
            .sum()
    }
}
