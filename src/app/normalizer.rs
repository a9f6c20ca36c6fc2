//! Mapping of stored transactions into screening entries.

use chrono::SecondsFormat;

use crate::domain::{ScreeningTransaction, ScreeningTransactionType, Transaction, TransactionKind};

/// Convert one stored transaction into its screening entry.
///
/// The primary magnitude is the coin amount when it is non-zero, otherwise
/// the cash amount. Records with both amounts zero are kept with amount 0.
#[must_use]
pub fn normalize_transaction(tx: &Transaction) -> ScreeningTransaction {
    let amount = if tx.amount_coin != 0.0 {
        tx.amount_coin.abs()
    } else {
        tx.amount_cash.abs()
    };

    ScreeningTransaction {
        transaction_id: tx.id.clone(),
        user_id: tx.user_id.clone(),
        transaction_type: screening_type(tx.kind),
        amount,
        timestamp: tx.date.to_rfc3339_opts(SecondsFormat::Millis, true),
        exchange_rate: tx.exchange_rate,
    }
}

/// Normalize a batch, preserving order and length.
#[must_use]
pub fn normalize_transactions(transactions: &[Transaction]) -> Vec<ScreeningTransaction> {
    transactions.iter().map(normalize_transaction).collect()
}

fn screening_type(kind: TransactionKind) -> ScreeningTransactionType {
    match kind {
        TransactionKind::Deposit => ScreeningTransactionType::Deposit,
        TransactionKind::Withdrawal => ScreeningTransactionType::Withdrawal,
        // unknown stored kinds are screened as exchanges
        TransactionKind::Exchange | TransactionKind::Unknown => ScreeningTransactionType::Exchange,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn tx(kind: TransactionKind, amount_coin: f64, amount_cash: f64) -> Transaction {
        Transaction::new("txn_1", kind, "user_1", amount_coin, amount_cash)
            .with_date(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap())
    }

    #[test]
    fn test_coin_amount_takes_precedence() {
        let entry = normalize_transaction(&tx(TransactionKind::Exchange, -200.0, 2.0));
        assert_eq!(entry.amount, 200.0);
    }

    #[test]
    fn test_cash_amount_used_when_coin_is_zero() {
        let entry = normalize_transaction(&tx(TransactionKind::Withdrawal, 0.0, -1500.0));
        assert_eq!(entry.amount, 1500.0);
    }

    #[test]
    fn test_both_zero_yields_zero_amount() {
        let entry = normalize_transaction(&tx(TransactionKind::Deposit, 0.0, 0.0));
        assert_eq!(entry.amount, 0.0);
    }

    #[test]
    fn test_type_mapping_is_total() {
        let cases = [
            (TransactionKind::Deposit, ScreeningTransactionType::Deposit),
            (TransactionKind::Withdrawal, ScreeningTransactionType::Withdrawal),
            (TransactionKind::Exchange, ScreeningTransactionType::Exchange),
            (TransactionKind::Unknown, ScreeningTransactionType::Exchange),
        ];
        for (kind, expected) in cases {
            assert_eq!(normalize_transaction(&tx(kind, 1.0, 0.0)).transaction_type, expected);
        }
    }

    #[test]
    fn test_fields_pass_through() {
        let source = tx(TransactionKind::Exchange, -200.0, 0.0).with_exchange_rate(0.24);
        let entry = normalize_transaction(&source);

        assert_eq!(entry.transaction_id, "txn_1");
        assert_eq!(entry.user_id, "user_1");
        assert_eq!(entry.timestamp, "2024-05-01T12:30:00.000Z");
        assert_eq!(entry.exchange_rate, Some(0.24));

        let without_rate = normalize_transaction(&tx(TransactionKind::Deposit, 5.0, 0.0));
        assert_eq!(without_rate.exchange_rate, None);
    }

    #[test]
    fn test_batch_preserves_order_and_count() {
        let batch = vec![
            Transaction::new("a", TransactionKind::Deposit, "u", 0.0, 0.0),
            Transaction::new("b", TransactionKind::Withdrawal, "u", 0.0, 0.0),
            Transaction::new("c", TransactionKind::Exchange, "u", 0.0, 0.0),
        ];
        let entries = normalize_transactions(&batch);
        let ids: Vec<&str> = entries.iter().map(|e| e.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let source = tx(TransactionKind::Withdrawal, 0.0, -75.5);
        assert_eq!(normalize_transaction(&source), normalize_transaction(&source));
    }
}
