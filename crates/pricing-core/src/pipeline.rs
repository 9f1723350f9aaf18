//! # Modifier Pipeline
//!
//! Applies the modifiers of one phase to a running value and records what
//! each of them did.
//!
//! ## Phase Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  base ──► [before-VAT modifiers] ──► intermediate ──► VAT is based here │
//! │                                            │                            │
//! │                                            ▼                            │
//! │                           [after-VAT modifiers] ──► exclusive (per unit)│
//! │                                                                         │
//! │  Within a phase: insertion order, each step sees the previous result.   │
//! │  Adding 1.00 then +10% is not the same as +10% then adding 1.00.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::trace;

use crate::decimal::RoundingMode;
use crate::error::MoneyResult;
use crate::modifier::Modifier;
use crate::money::Money;
use crate::types::ModifierKind;

/// When a modifier runs relative to the VAT computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    BeforeVat,
    AfterVat,
}

impl Phase {
    pub fn of(modifier: &Modifier) -> Phase {
        if modifier.is_before_vat() {
            Phase::BeforeVat
        } else {
            Phase::AfterVat
        }
    }
}

/// One ledger entry: the signed effect of a single modifier application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Modification {
    pub kind: ModifierKind,
    pub key: Option<String>,
    /// `result - input` for that step.
    pub amount: Money,
}

/// Stable filter of `modifiers` down to one phase.
pub fn phase_modifiers(modifiers: &[Modifier], phase: Phase) -> impl Iterator<Item = &Modifier> {
    modifiers.iter().filter(move |m| Phase::of(m) == phase)
}

/// Left-folds `modifiers` over `base`.
///
/// A modifier returning `None` leaves the running value untouched and is not
/// logged. When `ledger` is given, every other step appends its delta,
/// including zero deltas.
pub fn apply_phase<'a, I>(
    base: Money,
    modifiers: I,
    rounding: RoundingMode,
    mut ledger: Option<&mut Vec<Modification>>,
) -> MoneyResult<Money>
where
    I: IntoIterator<Item = &'a Modifier>,
{
    let mut running = base;
    for modifier in modifiers {
        let Some(result) = modifier.apply(&running, rounding)? else {
            trace!(kind = %modifier.kind(), key = ?modifier.key(), "Modifier declined");
            continue;
        };

        let delta = result.minus(&running)?;
        if let Some(entries) = ledger.as_deref_mut() {
            trace!(kind = %modifier.kind(), key = ?modifier.key(), delta = %delta, "Modifier applied");
            entries.push(Modification {
                kind: modifier.kind(),
                key: modifier.key().map(str::to_string),
                amount: delta,
            });
        }
        running = result;
    }
    Ok(running)
}

// =============================================================================
// Unit Tests
// =============================================================================
