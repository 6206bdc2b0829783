// @file: kline_engine/src/core/schema.rs
// @description: Declarative positional schemas mapping inner-array indices to Kline fields.
// @author: LAS.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::core::error::SchemaError;


//
// FIELD KINDS & TARGETS
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Int64,
    DecimalString,
    SkippedDecimalString,
    Terminator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KlineField {
    OpenTime,
    Open,
    High,
    Low,
    Close,
    Volume,
    CloseTime,
    QuoteAssetVolume,
    TradeCount,
    TakerBuyBaseVolume,
    TakerBuyQuoteVolume,
}

impl KlineField {
    pub fn is_integer(self) -> bool {
        matches!(self, KlineField::OpenTime | KlineField::CloseTime | KlineField::TradeCount)
    }
}

impl fmt::Display for KlineField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label: &str = match self {
            KlineField::OpenTime => "open_time",
            KlineField::Open => "open",
            KlineField::High => "high",
            KlineField::Low => "low",
            KlineField::Close => "close",
            KlineField::Volume => "volume",
            KlineField::CloseTime => "close_time",
            KlineField::QuoteAssetVolume => "quote_asset_volume",
            KlineField::TradeCount => "trade_count",
            KlineField::TakerBuyBaseVolume => "taker_buy_base_volume",
            KlineField::TakerBuyQuoteVolume => "taker_buy_quote_volume",
        };
        f.write_str(label)
    }
}


//
// RECORD KINDS
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    // All eleven columns of /api/v3/klines
    Full,
    // OHLC plus open/close time, as served by premium index klines
    Reduced,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordKind::Full => f.pad("full"),
            RecordKind::Reduced => f.pad("reduced"),
        }
    }
}

impl FromStr for RecordKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(RecordKind::Full),
            "reduced" => Ok(RecordKind::Reduced),
            other => Err(SchemaError::UnknownRecordKind(other.to_string())),
        }
    }
}


//
// SCHEMA DECLARATION
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub position: i64,
    pub kind: FieldKind,
    pub target: Option<KlineField>,
}

impl FieldSpec {
    pub fn int(position: i64, target: KlineField) -> Self {
        FieldSpec { position, kind: FieldKind::Int64, target: Some(target) }
    }

    pub fn decimal(position: i64, target: KlineField) -> Self {
        FieldSpec { position, kind: FieldKind::DecimalString, target: Some(target) }
    }

    pub fn skipped(position: i64) -> Self {
        FieldSpec { position, kind: FieldKind::SkippedDecimalString, target: None }
    }

    pub fn terminator(position: i64) -> Self {
        FieldSpec { position, kind: FieldKind::Terminator, target: None }
    }
}

// What the decoder does with the element at a given position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Int(KlineField),
    Decimal(KlineField),
    Skip,
}

impl Slot {
    pub fn field_kind(self) -> FieldKind {
        match self {
            Slot::Int(_) => FieldKind::Int64,
            Slot::Decimal(_) => FieldKind::DecimalString,
            Slot::Skip => FieldKind::SkippedDecimalString,
        }
    }
}


//
// BUILT-IN LAYOUTS
//

// /api/v3/klines, /fapi/v1/klines, /dapi/v1/klines
const FULL_SLOTS: [Slot; 11] = [
    Slot::Int(KlineField::OpenTime),
    Slot::Decimal(KlineField::Open),
    Slot::Decimal(KlineField::High),
    Slot::Decimal(KlineField::Low),
    Slot::Decimal(KlineField::Close),
    Slot::Decimal(KlineField::Volume),
    Slot::Int(KlineField::CloseTime),
    Slot::Decimal(KlineField::QuoteAssetVolume),
    Slot::Int(KlineField::TradeCount),
    Slot::Decimal(KlineField::TakerBuyBaseVolume),
    Slot::Decimal(KlineField::TakerBuyQuoteVolume),
];

// /fapi/v1/premiumIndexKlines: volume column present but ignored
const REDUCED_SLOTS: [Slot; 7] = [
    Slot::Int(KlineField::OpenTime),
    Slot::Decimal(KlineField::Open),
    Slot::Decimal(KlineField::High),
    Slot::Decimal(KlineField::Low),
    Slot::Decimal(KlineField::Close),
    Slot::Skip,
    Slot::Int(KlineField::CloseTime),
];

const REDUCED_TERMINATOR: usize = 7;


//
// VALIDATED SCHEMA
//

/// Immutable, validated positional schema. Build once and share it
/// (`Arc<RecordSchema>` or `&'static`) across decode calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    kind: RecordKind,
    fields: Vec<(usize, FieldKind)>,
    slots: Vec<Slot>,
    terminator: Option<usize>,
}

impl RecordSchema {
    pub fn new(kind: RecordKind, specs: &[FieldSpec]) -> Result<Self, SchemaError> {
        if specs.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut fields: Vec<(usize, FieldKind)> = Vec::with_capacity(specs.len());
        let mut targets: Vec<(usize, FieldKind, KlineField)> = Vec::with_capacity(specs.len());
        let mut terminator: Option<usize> = None;

        // #1. Position checks, in declaration order
        for spec in specs {
            let position: usize = usize::try_from(spec.position)
                .map_err(|_| SchemaError::NegativePosition(spec.position))?;

            if fields.iter().any(|(p, _)| *p == position) {
                return Err(SchemaError::DuplicatePosition(position));
            }
            if let Some(&(previous, _)) = fields.last() {
                if position < previous {
                    return Err(SchemaError::OutOfOrder { previous, position });
                }
            }
            if let Some(t) = terminator {
                return Err(SchemaError::TerminatorNotLast { terminator: t, position });
            }

            // #2. Kind/target agreement
            match spec.kind {
                FieldKind::Int64 | FieldKind::DecimalString => {
                    let target: KlineField = spec.target.ok_or(SchemaError::MissingTarget {
                        position,
                        kind: spec.kind,
                    })?;
                    let wants_integer: bool = spec.kind == FieldKind::Int64;
                    if target.is_integer() != wants_integer {
                        return Err(SchemaError::KindMismatch { position, kind: spec.kind, target });
                    }
                    if targets.iter().any(|(_, _, t)| *t == target) {
                        return Err(SchemaError::DuplicateTarget(target));
                    }
                    targets.push((position, spec.kind, target));
                }
                FieldKind::SkippedDecimalString => {}
                FieldKind::Terminator => terminator = Some(position),
            }

            fields.push((position, spec.kind));
        }

        // #3. Dense lookup table up to the highest required position
        let required_len: usize = targets.iter().map(|(p, _, _)| p + 1).max().unwrap_or(0);
        let mut slots: Vec<Slot> = vec![Slot::Skip; required_len];
        for (position, kind, target) in targets {
            slots[position] = match kind {
                FieldKind::Int64 => Slot::Int(target),
                _ => Slot::Decimal(target),
            };
        }

        Ok(RecordSchema { kind, fields, slots, terminator })
    }

    pub fn full() -> Self {
        Self::builtin(RecordKind::Full)
    }

    pub fn reduced() -> Self {
        Self::builtin(RecordKind::Reduced)
    }

    pub fn for_kind(kind: RecordKind) -> Self {
        Self::builtin(kind)
    }

    // Built from literal slot tables so no validation path can fail here.
    // `tests::schema_validation` checks each table against `RecordSchema::new`.
    fn builtin(kind: RecordKind) -> Self {
        let (slots, terminator): (&[Slot], Option<usize>) = match kind {
            RecordKind::Full => (&FULL_SLOTS, None),
            RecordKind::Reduced => (&REDUCED_SLOTS, Some(REDUCED_TERMINATOR)),
        };

        let mut fields: Vec<(usize, FieldKind)> = slots
            .iter()
            .enumerate()
            .map(|(position, slot)| (position, slot.field_kind()))
            .collect();
        if let Some(position) = terminator {
            fields.push((position, FieldKind::Terminator));
        }

        RecordSchema { kind, fields, slots: slots.to_vec(), terminator }
    }

    //
    // ACCESSORS
    //

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn fields(&self) -> &[(usize, FieldKind)] {
        &self.fields
    }

    // Number of leading inner-array elements a record must have.
    // Scanning stops once this many elements have been consumed.
    pub fn required_len(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, position: usize) -> Slot {
        self.slots.get(position).copied().unwrap_or(Slot::Skip)
    }

    pub fn terminator(&self) -> Option<usize> {
        self.terminator
    }
}
