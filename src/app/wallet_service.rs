//! Balance-moving operations: sweeps coin exchanges and USD withdrawals.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{
    Account, AccountRepository, AppError, EXCHANGE_FEE_RATE, ExchangeQuote, ExchangeReceipt,
    ExchangeRequest, LedgerEntry, SWEEPS_COIN_TO_USD_RATE, StorageError, Transaction,
    TransactionKind, TransactionStatus, ValidationError, WithdrawalReceipt, WithdrawalRequest,
};

/// Price an exchange of `amount_coin` sweeps coins at the platform rate.
///
/// Gross and fee are rounded to cents; the net amount is their difference.
/// Amounts too small to be worth a cent are rejected.
pub fn quote(amount_coin: f64) -> Result<ExchangeQuote, AppError> {
    if !amount_coin.is_finite() || amount_coin <= 0.0 {
        return Err(invalid_amount("amountCoin", "Amount must be greater than 0"));
    }

    let gross_cash = round_cents(amount_coin * SWEEPS_COIN_TO_USD_RATE);
    let fee = round_cents(gross_cash * EXCHANGE_FEE_RATE);
    let net_cash = round_cents(gross_cash - fee);
    if net_cash <= 0.0 {
        return Err(invalid_amount(
            "amountCoin",
            "Amount is too small to exchange for at least $0.01",
        ));
    }

    Ok(ExchangeQuote {
        amount_coin,
        gross_cash,
        fee,
        net_cash,
        rate: SWEEPS_COIN_TO_USD_RATE,
        fee_rate: EXCHANGE_FEE_RATE,
    })
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn invalid_amount(field: &str, message: &str) -> AppError {
    AppError::Validation(ValidationError::InvalidField {
        field: field.to_string(),
        message: message.to_string(),
    })
}

/// Executes exchanges and withdrawals against the account repository
pub struct WalletService {
    accounts: Arc<dyn AccountRepository>,
    /// Serializes read-check-commit cycles on balances
    lock: Mutex<()>,
}

impl WalletService {
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self {
            accounts,
            lock: Mutex::new(()),
        }
    }

    async fn load_account(&self, user_id: &str) -> Result<Account, AppError> {
        self.accounts
            .get_account(user_id)
            .await?
            .ok_or_else(|| AppError::Storage(StorageError::NotFound(user_id.to_string())))
    }

    /// Debit coins, credit the net USD amount, collect the fee and record the move.
    #[instrument(skip(self, request), fields(amount_coin = request.amount_coin))]
    pub async fn exchange(
        &self,
        user_id: &str,
        request: &ExchangeRequest,
    ) -> Result<ExchangeReceipt, AppError> {
        request.validate()?;
        let quote = quote(request.amount_coin)?;

        let _guard = self.lock.lock().await;
        let mut account = self.load_account(user_id).await?;

        if account.sweeps_coins < quote.amount_coin {
            warn!(
                user_id = %user_id,
                available = account.sweeps_coins,
                "Exchange rejected: insufficient sweeps coins"
            );
            return Err(AppError::InsufficientFunds {
                requested: quote.amount_coin,
                available: account.sweeps_coins,
            });
        }

        account.sweeps_coins -= quote.amount_coin;
        account.usd_balance = round_cents(account.usd_balance + quote.net_cash);

        let entry = LedgerEntry {
            account,
            house_fee: quote.fee,
            transaction: Transaction {
                id: Uuid::now_v7().to_string(),
                kind: TransactionKind::Exchange,
                status: TransactionStatus::Completed,
                date: Utc::now(),
                amount_coin: -quote.amount_coin,
                amount_cash: quote.net_cash,
                user_id: user_id.to_string(),
                exchange_rate: Some(quote.rate),
            },
        };
        let house_balance = self.accounts.commit_entry(&entry).await?;

        info!(
            id = %entry.transaction.id,
            net_cash = quote.net_cash,
            fee = quote.fee,
            house_balance,
            "Exchange completed"
        );

        Ok(ExchangeReceipt {
            account: entry.account,
            transaction: entry.transaction,
            quote,
        })
    }

    /// Debit USD for payout and record a pending `withdrawal` transaction.
    #[instrument(skip(self, request), fields(amount_cash = request.amount_cash))]
    pub async fn withdraw(
        &self,
        user_id: &str,
        request: &WithdrawalRequest,
    ) -> Result<WithdrawalReceipt, AppError> {
        request.validate()?;
        if !request.amount_cash.is_finite() {
            return Err(invalid_amount("amountCash", "Amount must be a finite number"));
        }
        let amount = round_cents(request.amount_cash);
        if amount <= 0.0 {
            return Err(invalid_amount("amountCash", "Amount must be at least $0.01"));
        }

        let _guard = self.lock.lock().await;
        let mut account = self.load_account(user_id).await?;

        if account.usd_balance < amount {
            warn!(
                user_id = %user_id,
                available = account.usd_balance,
                "Withdrawal rejected: insufficient USD balance"
            );
            return Err(AppError::InsufficientFunds {
                requested: amount,
                available: account.usd_balance,
            });
        }

        account.usd_balance = round_cents(account.usd_balance - amount);

        let entry = LedgerEntry {
            account,
            house_fee: 0.0,
            transaction: Transaction {
                id: Uuid::now_v7().to_string(),
                kind: TransactionKind::Withdrawal,
                status: TransactionStatus::Pending,
                date: Utc::now(),
                amount_coin: 0.0,
                amount_cash: -amount,
                user_id: user_id.to_string(),
                exchange_rate: None,
            },
        };
        self.accounts.commit_entry(&entry).await?;

        info!(id = %entry.transaction.id, amount, "Withdrawal initiated");

        Ok(WithdrawalReceipt {
            account: entry.account,
            transaction: entry.transaction,
            method: request.method.clone(),
        })
    }
}
