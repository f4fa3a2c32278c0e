//! Transfer protocol - the single write path to balances
//!
//! Every variant (user transfer, funding, external payment/receipt,
//! settlement interest) reduces to the same pattern: debit and/or credit
//! under row locks, append exactly one movement, one transaction.

use crate::account::validation;
use crate::account::{Account, AccountRef, AccountStore};
use crate::db::Database;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{LedgerStore, Movement, MovementKind, NewMovement};
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

/// Result of a completed movement: post-commit snapshots plus the ledger row
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// Debited account after the movement (None for external source)
    pub from: Option<Account>,
    /// Credited account after the movement (None for external sink)
    pub to: Option<Account>,
    pub movement: Movement,
}

/// Transfer protocol over the account store and movement log
#[derive(Clone)]
pub struct TransferProtocol {
    db: Arc<Database>,
    accounts: AccountStore,
    ledger: LedgerStore,
}

impl TransferProtocol {
    pub fn new(db: Arc<Database>) -> Self {
        let pool = db.pool().clone();
        Self {
            db,
            accounts: AccountStore::new(pool.clone()),
            ledger: LedgerStore::new(pool),
        }
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    /// Execute an account-to-account transfer
    ///
    /// 1. Resolve both references (NotFound if either is unknown)
    /// 2. Reject self-transfers
    /// 3. Reject non-positive or over-precise amounts
    /// 4. Check funds under the row lock, never before it
    /// 5. Debit, credit, append one `transfer` movement - all or nothing
    pub async fn execute(
        &self,
        from_ref: &AccountRef,
        to_ref: &AccountRef,
        amount: Decimal,
        note: Option<&str>,
    ) -> LedgerResult<TransferOutcome> {
        let from = self.accounts.resolve(from_ref).await?;
        let to = self.accounts.resolve(to_ref).await?;

        if from.id == to.id {
            return Err(LedgerError::SelfTransfer);
        }
        validation::ensure_amount(amount)?;

        let mut tx = self.db.begin().await?;

        // Lock both rows in id order so concurrent opposite-direction
        // transfers on the same pair cannot deadlock.
        let (src, dst) = self.lock_pair(&mut tx, from.id, to.id).await?;

        if !src.covers(amount) {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: src.balance,
            });
        }

        let (updated_src, updated_dst, movement) = self
            .apply_movement(
                &mut tx,
                Some((src.id, src.balance - amount)),
                Some((dst.id, dst.balance + amount)),
                amount,
                MovementKind::Transfer,
                note,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            movement_id = %movement.id,
            from = %src.owner,
            to = %dst.owner,
            %amount,
            "Transfer completed"
        );

        Ok(TransferOutcome {
            from: updated_src,
            to: updated_dst,
            movement,
        })
    }

    /// Fund an account from the external source (`system_credit`)
    pub async fn fund(
        &self,
        to_ref: &AccountRef,
        amount: Decimal,
        note: Option<&str>,
    ) -> LedgerResult<TransferOutcome> {
        self.credit_external(to_ref, amount, MovementKind::SystemCredit, note)
            .await
    }

    /// Credit an account from an external receipt
    pub async fn receive_external(
        &self,
        to_ref: &AccountRef,
        amount: Decimal,
        note: Option<&str>,
    ) -> LedgerResult<TransferOutcome> {
        self.credit_external(to_ref, amount, MovementKind::ExternalReceipt, note)
            .await
    }

    /// Pay an external sink, optionally with a surcharge added to the debit
    ///
    /// The movement records the total (amount + surcharge), so conservation
    /// holds: the debit equals what the single ledger row says left.
    pub async fn pay_external(
        &self,
        from_ref: &AccountRef,
        amount: Decimal,
        surcharge: Option<Decimal>,
        note: Option<&str>,
    ) -> LedgerResult<TransferOutcome> {
        validation::ensure_amount(amount)?;
        let surcharge = surcharge.unwrap_or(Decimal::ZERO);
        if surcharge < Decimal::ZERO || !validation::has_money_scale(surcharge) {
            return Err(LedgerError::Validation(format!(
                "surcharge must be a non-negative 2-dp amount, got {}",
                surcharge
            )));
        }
        let total = amount + surcharge;

        let from = self.accounts.resolve(from_ref).await?;

        let mut tx = self.db.begin().await?;
        let src = self.accounts.lock_for_update(&mut tx, from.id).await?;

        if !src.covers(total) {
            return Err(LedgerError::InsufficientFunds {
                required: total,
                available: src.balance,
            });
        }

        let (updated_src, _, movement) = self
            .apply_movement(
                &mut tx,
                Some((src.id, src.balance - total)),
                None,
                total,
                MovementKind::ExternalPayment,
                note,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            movement_id = %movement.id,
            from = %src.owner,
            %total,
            "External payment completed"
        );

        Ok(TransferOutcome {
            from: updated_src,
            to: None,
            movement,
        })
    }

    /// Apply settlement interest to one account inside the caller's
    /// whole-run transaction
    ///
    /// Positive interest credits (`interest_credit`); negative interest
    /// debits (`interest_debit`), clamped at the current balance so the
    /// balance never goes below zero. Returns the signed applied amount
    /// (zero means the clamp swallowed the whole debit and no movement
    /// was appended).
    pub async fn apply_interest(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        account: &Account,
        interest: Decimal,
    ) -> LedgerResult<Decimal> {
        let applied = clamp_debit_to_balance(account.balance, interest);
        if applied == Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        if applied > Decimal::ZERO {
            self.apply_movement(
                tx,
                None,
                Some((account.id, account.balance + applied)),
                applied,
                MovementKind::InterestCredit,
                None,
            )
            .await?;
        } else {
            self.apply_movement(
                tx,
                Some((account.id, account.balance + applied)),
                None,
                -applied,
                MovementKind::InterestDebit,
                None,
            )
            .await?;
        }

        Ok(applied)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn credit_external(
        &self,
        to_ref: &AccountRef,
        amount: Decimal,
        kind: MovementKind,
        note: Option<&str>,
    ) -> LedgerResult<TransferOutcome> {
        validation::ensure_amount(amount)?;
        let to = self.accounts.resolve(to_ref).await?;

        let mut tx = self.db.begin().await?;
        let dst = self.accounts.lock_for_update(&mut tx, to.id).await?;

        let (_, updated_dst, movement) = self
            .apply_movement(
                &mut tx,
                None,
                Some((dst.id, dst.balance + amount)),
                amount,
                kind,
                note,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            movement_id = %movement.id,
            to = %dst.owner,
            %amount,
            kind = %kind,
            "Credit completed"
        );

        Ok(TransferOutcome {
            from: None,
            to: updated_dst,
            movement,
        })
    }

    /// Lock two account rows in ascending id order, return (from, to)
    async fn lock_pair(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        from_id: Uuid,
        to_id: Uuid,
    ) -> LedgerResult<(Account, Account)> {
        let (first, second) = if from_id < to_id {
            (from_id, to_id)
        } else {
            (to_id, from_id)
        };

        let a = self.accounts.lock_for_update(tx, first).await?;
        let b = self.accounts.lock_for_update(tx, second).await?;

        if a.id == from_id { Ok((a, b)) } else { Ok((b, a)) }
    }

    /// The debit/credit/movement-append pattern shared by every variant
    ///
    /// `debit`/`credit` carry (account id, new balance) computed by the
    /// caller under the row lock. Balance updates and the movement insert
    /// happen in the caller's transaction, so any failure rolls back all
    /// of it.
    async fn apply_movement(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        debit: Option<(Uuid, Decimal)>,
        credit: Option<(Uuid, Decimal)>,
        amount: Decimal,
        kind: MovementKind,
        note: Option<&str>,
    ) -> LedgerResult<(Option<Account>, Option<Account>, Movement)> {
        let mut updated_debit = None;
        if let Some((id, new_balance)) = debit {
            updated_debit = Some(self.accounts.update_balance(tx, id, new_balance).await?);
        }

        let mut updated_credit = None;
        if let Some((id, new_balance)) = credit {
            updated_credit = Some(self.accounts.update_balance(tx, id, new_balance).await?);
        }

        let movement = self
            .ledger
            .append(
                tx,
                NewMovement {
                    from_account_id: debit.map(|(id, _)| id),
                    to_account_id: credit.map(|(id, _)| id),
                    amount,
                    kind,
                    note: note.map(|s| s.to_string()),
                },
            )
            .await?;

        Ok((updated_debit, updated_credit, movement))
    }
}

/// Clamp policy for debit-type interest: a negative interest amount is
/// capped at the current balance, so applying it never produces a negative
/// balance. Positive interest passes through untouched.
pub fn clamp_debit_to_balance(balance: Decimal, interest: Decimal) -> Decimal {
    if interest < Decimal::ZERO && -interest > balance {
        -balance
    } else {
        interest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_clamp_passes_credit_through() {
        assert_eq!(clamp_debit_to_balance(d("100"), d("6.66")), d("6.66"));
        assert_eq!(clamp_debit_to_balance(d("0"), d("1.00")), d("1.00"));
    }

    #[test]
    fn test_clamp_caps_debit_at_balance() {
        assert_eq!(clamp_debit_to_balance(d("5.00"), d("-8.00")), d("-5.00"));
        assert_eq!(clamp_debit_to_balance(d("0"), d("-8.00")), d("0"));
    }

    #[test]
    fn test_clamp_leaves_covered_debit() {
        assert_eq!(clamp_debit_to_balance(d("100.00"), d("-8.00")), d("-8.00"));
        assert_eq!(clamp_debit_to_balance(d("8.00"), d("-8.00")), d("-8.00"));
    }
}
