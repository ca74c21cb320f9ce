//! Optional external extraction assist.
//!
//! Some deployments have a smarter free-text extractor available (an AI
//! service, a vendor API). The pipeline may call it, but its output is
//! untrusted input: everything goes through [`validate_guess`] before any
//! part of it is shown to a reviewer, and nothing from it is ever written
//! to storage directly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound for a believable single payment, in won. Anything above is
/// treated as extraction garbage.
pub const MAX_PLAUSIBLE_AMOUNT: i64 = 1_000_000_000;

/// Upper bound for a believable single-order quantity.
pub const MAX_PLAUSIBLE_QUANTITY: i64 = 1_000_000;

/// One guessed product line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLine {
    pub name: String,
    pub quantity: i64,
}

/// Structured guess returned by an external extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistGuess {
    #[serde(default)]
    pub product_lines: Vec<ProductLine>,
    #[serde(default)]
    pub amounts: Vec<i64>,
    #[serde(default)]
    pub contact: Option<String>,
}

/// Validation failures for an assist guess.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssistError {
    #[error("Amount out of plausible range: {0}")]
    AmountOutOfRange(i64),

    #[error("Product line has an empty name")]
    EmptyProductName,

    #[error("Quantity out of plausible range: {0}")]
    QuantityOutOfRange(i64),
}

/// A callable external extractor. Implementations may do anything (RPC,
/// subprocess, model call); the pipeline only sees the validated guess.
pub trait ExtractionAssist: Send + Sync {
    fn extract(&self, text: &str) -> anyhow::Result<AssistGuess>;
}

/// Range and required-field checks applied to every assist result before
/// the pipeline uses any part of it.
pub fn validate_guess(guess: &AssistGuess) -> Result<(), AssistError> {
    for &amount in &guess.amounts {
        if amount <= 0 || amount > MAX_PLAUSIBLE_AMOUNT {
            return Err(AssistError::AmountOutOfRange(amount));
        }
    }
    for line in &guess.product_lines {
        if line.name.trim().is_empty() {
            return Err(AssistError::EmptyProductName);
        }
        if line.quantity <= 0 || line.quantity > MAX_PLAUSIBLE_QUANTITY {
            return Err(AssistError::QuantityOutOfRange(line.quantity));
        }
    }
    Ok(())
}
