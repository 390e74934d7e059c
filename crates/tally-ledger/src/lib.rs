//! In-memory ledger of shared group expenses.
//!
//! A [`Ledger`] stores transactions (who paid, how much, who shares the
//! cost) and computes net balances per person. Amounts arrive as decimal
//! strings and are held as integer cents; per-receiver shares are computed
//! at micro-cent precision so three-way splits and the like stay exact.
//!
//! Invariants on [`Ledger::balances`]:
//! - Conservation: the balances sum to zero within $0.01. Any rounding
//!   residual is corrected on the largest creditor (or largest debtor for
//!   a negative residual).
//! - Everyone mentioned by any transaction appears in the output, even
//!   when their net is zero.
//! - A transfer is a transaction whose payer is not among the receivers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Maximum accepted amount: 999,999,999,999.99 (12 integer digits).
const MAX_INT_DIGITS: usize = 12;

/// Micro-cents per cent, the internal share precision.
const MICRO: i128 = 1_000_000;

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),

    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("amount exceeds maximum allowed value")]
    AmountTooLarge,

    #[error("receivers list cannot be empty")]
    NoReceivers,

    #[error("transaction {index} is invalid: {source}")]
    InvalidTransaction {
        index: usize,
        #[source]
        source: Box<LedgerError>,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Transaction
// ─────────────────────────────────────────────────────────────────────────────

/// A single expense as supplied by the caller (or the LLM's tool call).
///
/// `amount` is a decimal string ("10.50", not 10.5) with at most two
/// fraction digits. `description` is accepted but not stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub payer: String,
    pub amount: String,
    pub receivers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredTransaction {
    payer: String,
    amount_cents: i64,
    receivers: Vec<String>,
}

/// Parses a decimal amount string into cents.
fn parse_amount(raw: &str) -> Result<i64, LedgerError> {
    let s = raw.trim();
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };

    let digits_only = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    if int_part.is_empty() || !digits_only(int_part) || !digits_only(frac_part) {
        return Err(LedgerError::InvalidAmount(raw.to_string()));
    }
    if frac_part.len() > 2 {
        return Err(LedgerError::InvalidAmount(raw.to_string()));
    }
    if int_part.len() > MAX_INT_DIGITS {
        return Err(LedgerError::AmountTooLarge);
    }

    let dollars: i64 = int_part
        .parse()
        .map_err(|_| LedgerError::InvalidAmount(raw.to_string()))?;
    let frac_cents: i64 = match frac_part.len() {
        0 => 0,
        1 => frac_part.parse::<i64>().unwrap_or(0) * 10,
        _ => frac_part.parse().unwrap_or(0),
    };

    let cents = dollars * 100 + frac_cents;
    if negative || cents == 0 {
        return Err(LedgerError::NonPositiveAmount);
    }
    Ok(cents)
}

/// Divides rounding half away from zero, matching financial-grade
/// ROUND_HALF_UP semantics for both signs. `d` must be positive.
fn div_round_half_away(n: i128, d: i128) -> i128 {
    let q = n / d;
    let r = n % d;
    if 2 * r.abs() >= d {
        q + n.signum()
    } else {
        q
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ledger
// ─────────────────────────────────────────────────────────────────────────────

/// The in-memory record of group expense transactions.
#[derive(Debug, Default)]
pub struct Ledger {
    transactions: Vec<StoredTransaction>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Validates and records one transaction.
    pub fn add_transaction(&mut self, txn: &Transaction) -> Result<(), LedgerError> {
        let amount_cents = parse_amount(&txn.amount)?;
        if txn.receivers.is_empty() {
            return Err(LedgerError::NoReceivers);
        }
        self.transactions.push(StoredTransaction {
            payer: txn.payer.clone(),
            amount_cents,
            receivers: txn.receivers.clone(),
        });
        Ok(())
    }

    /// Records a batch of transactions. The first invalid entry aborts with
    /// an error naming its index; entries validated before it stay recorded.
    pub fn add_transactions(&mut self, transactions: &[Transaction]) -> Result<(), LedgerError> {
        for (index, txn) in transactions.iter().enumerate() {
            self.add_transaction(txn).map_err(|source| {
                LedgerError::InvalidTransaction { index, source: Box::new(source) }
            })?;
        }
        Ok(())
    }

    /// Computes net balances in dollars for everyone mentioned so far.
    ///
    /// Positive means the person is owed money, negative means they owe.
    pub fn balances(&self) -> BTreeMap<String, f64> {
        // Net position per person in micro-cents.
        let mut net: BTreeMap<String, i128> = BTreeMap::new();

        for txn in &self.transactions {
            let amount_micro = i128::from(txn.amount_cents) * MICRO;
            let share = div_round_half_away(amount_micro, txn.receivers.len() as i128);

            *net.entry(txn.payer.clone()).or_default() += amount_micro;
            for receiver in &txn.receivers {
                *net.entry(receiver.clone()).or_default() -= share;
            }
        }

        // Quantize each person's net to whole cents.
        let mut cents: BTreeMap<String, i128> = net
            .into_iter()
            .map(|(person, micro)| (person, div_round_half_away(micro, MICRO)))
            .collect();

        // Correct any residual on the largest creditor or debtor so the
        // balances stay zero-sum.
        let residual: i128 = cents.values().sum();
        if residual != 0 {
            let candidate = if residual > 0 {
                cents.iter().max_by_key(|(_, v)| **v).map(|(k, _)| k.clone())
            } else {
                cents.iter().min_by_key(|(_, v)| **v).map(|(k, _)| k.clone())
            };
            if let Some(person) = candidate {
                *cents.get_mut(&person).expect("candidate came from the map") -= residual;
            }
        }

        let final_sum: i128 = cents.values().sum();
        if final_sum != 0 {
            warn!("zero-sum violation in balances: {} cents", final_sum);
        }

        cents
            .into_iter()
            .map(|(person, c)| (person, c as f64 / 100.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(payer: &str, amount: &str, receivers: &[&str]) -> Transaction {
        Transaction {
            payer: payer.to_string(),
            amount: amount.to_string(),
            receivers: receivers.iter().map(|s| s.to_string()).collect(),
            description: None,
        }
    }

    #[test]
    fn add_valid_transaction() {
        let mut ledger = Ledger::new();
        ledger.add_transaction(&txn("Alice", "10.00", &["Alice", "Bob"])).unwrap();
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn rejects_negative_amount() {
        let mut ledger = Ledger::new();
        let err = ledger
            .add_transaction(&txn("Alice", "-10.00", &["Alice", "Bob"]))
            .unwrap_err();
        assert!(matches!(err, LedgerError::NonPositiveAmount));
    }

    #[test]
    fn rejects_zero_amount() {
        let mut ledger = Ledger::new();
        let err = ledger.add_transaction(&txn("Alice", "0.00", &["Bob"])).unwrap_err();
        assert!(matches!(err, LedgerError::NonPositiveAmount));
    }

    #[test]
    fn rejects_garbage_amount() {
        let mut ledger = Ledger::new();
        let err = ledger.add_transaction(&txn("Alice", "ten dollars", &["Bob"])).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
    }

    #[test]
    fn rejects_too_many_fraction_digits() {
        let mut ledger = Ledger::new();
        let err = ledger.add_transaction(&txn("Alice", "10.005", &["Bob"])).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
    }

    #[test]
    fn rejects_oversized_amount() {
        let mut ledger = Ledger::new();
        let err = ledger
            .add_transaction(&txn("Alice", "1000000000000.00", &["Bob"]))
            .unwrap_err();
        assert!(matches!(err, LedgerError::AmountTooLarge));
    }

    #[test]
    fn rejects_empty_receivers() {
        let mut ledger = Ledger::new();
        let err = ledger.add_transaction(&txn("Alice", "10.00", &[])).unwrap_err();
        assert!(matches!(err, LedgerError::NoReceivers));
    }

    #[test]
    fn batch_error_names_the_offending_index() {
        let mut ledger = Ledger::new();
        let batch = vec![
            txn("Alice", "10.00", &["Alice", "Bob"]),
            txn("Bob", "oops", &["Alice"]),
        ];
        let err = ledger.add_transactions(&batch).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransaction { index: 1, .. }));
        // The valid first entry was already recorded.
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn simple_split() {
        let mut ledger = Ledger::new();
        ledger.add_transaction(&txn("Alice", "10.00", &["Alice", "Bob"])).unwrap();
        ledger.add_transaction(&txn("Bob", "20.00", &["Alice", "Bob"])).unwrap();
        let balances = ledger.balances();
        assert_eq!(balances["Alice"], -5.00);
        assert_eq!(balances["Bob"], 5.00);
    }

    #[test]
    fn three_way_split_is_zero_sum() {
        let mut ledger = Ledger::new();
        ledger.add_transaction(&txn("Alice", "50.00", &["Alice", "Bob", "Charlie"])).unwrap();
        ledger.add_transaction(&txn("Bob", "30.00", &["Alice", "Bob", "Charlie"])).unwrap();
        ledger.add_transaction(&txn("Charlie", "20.00", &["Alice", "Bob", "Charlie"])).unwrap();
        let sum: f64 = ledger.balances().values().sum();
        assert!(sum.abs() < 0.01);
    }

    #[test]
    fn rounding_stays_zero_sum() {
        let mut ledger = Ledger::new();
        ledger.add_transaction(&txn("Alice", "10.01", &["Alice", "Bob"])).unwrap();
        ledger.add_transaction(&txn("Bob", "20.02", &["Alice", "Bob"])).unwrap();
        let sum: f64 = ledger.balances().values().sum();
        assert!(sum.abs() < 0.01);
    }

    #[test]
    fn uneven_split_corrects_residual() {
        let mut ledger = Ledger::new();
        // 10.00 / 3 = 3.3333...; the rounded shares pick up a residual cent.
        ledger.add_transaction(&txn("Alice", "10.00", &["Bob", "Charlie", "Dave"])).unwrap();
        let balances = ledger.balances();
        // Each share rounds to 3.33; the leftover cent lands on Alice.
        assert_eq!(balances["Alice"], 9.99);
        assert_eq!(balances["Bob"], -3.33);
        assert_eq!(balances["Charlie"], -3.33);
        assert_eq!(balances["Dave"], -3.33);
        let sum: f64 = balances.values().sum();
        assert!(sum.abs() < 0.01);
    }

    #[test]
    fn single_payer_everyone_owes() {
        let mut ledger = Ledger::new();
        ledger
            .add_transaction(&txn("Alice", "100.00", &["Alice", "Bob", "Charlie", "Dave"]))
            .unwrap();
        let balances = ledger.balances();
        assert_eq!(balances["Alice"], 75.00);
        assert_eq!(balances["Bob"], -25.00);
        assert_eq!(balances["Charlie"], -25.00);
        assert_eq!(balances["Dave"], -25.00);
    }

    #[test]
    fn transfer_settles_a_debt() {
        let mut ledger = Ledger::new();
        ledger.add_transaction(&txn("Alice", "30.00", &["Alice", "Bob"])).unwrap();
        // Bob pays his share directly to Alice: payer not in receivers.
        ledger.add_transaction(&txn("Bob", "15.00", &["Alice"])).unwrap();
        let balances = ledger.balances();
        assert_eq!(balances["Bob"], 0.00);
        assert_eq!(balances["Alice"], 0.00);
    }

    #[test]
    fn partial_settlement_sequence() {
        let mut ledger = Ledger::new();
        ledger.add_transaction(&txn("Alice", "30.00", &["Alice", "Bob", "Charlie"])).unwrap();
        ledger.add_transaction(&txn("Bob", "10.00", &["Alice"])).unwrap();
        let balances = ledger.balances();
        assert_eq!(balances["Bob"], 0.00);
        assert_eq!(balances["Charlie"], -10.00);
        assert_eq!(balances["Alice"], 10.00);
    }

    #[test]
    fn amount_without_fraction_digits() {
        let mut ledger = Ledger::new();
        ledger.add_transaction(&txn("Alice", "10", &["Alice", "Bob"])).unwrap();
        assert_eq!(ledger.balances()["Bob"], -5.00);
    }
}
