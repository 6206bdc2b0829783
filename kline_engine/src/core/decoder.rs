// @file: kline_engine/src/core/decoder.rs
// @description: Positional decoder contract and the schema-driven record assembly shared by every backend.
// @author: LAS.

use crate::core::error::{DecodeError, JsonKind, RecordDefect};
use crate::core::models::Kline;
use crate::core::schema::{RecordSchema, Slot};


//
// ELEMENT CURSOR
//

// What a backend hands back for one inner-array element.
#[derive(Debug)]
pub enum Pulled {
    Int(i64),
    Decimal(String),
    Skipped,
    // Element present but of the wrong JSON class for the requested slot
    Mismatch(JsonKind),
    // The inner array is exhausted
    End,
}

/// One inner array, walked left to right by `assemble_record`.
///
/// The backend converts the element according to `slot` while it still has the
/// raw token in hand, so no generic value is built for skipped positions.
pub trait ElementCursor {
    fn pull(&mut self, slot: Slot) -> Result<Pulled, DecodeError>;

    // Consume any elements left after the early exit, up to the closing bracket.
    fn finish(&mut self) -> Result<(), DecodeError>;
}


//
// RECORD ASSEMBLY
//

pub fn assemble_record<C: ElementCursor>(
    schema: &RecordSchema,
    record: usize,
    cursor: &mut C,
) -> Result<Kline, DecodeError> {
    let mut kline: Kline = Kline::default();
    let required: usize = schema.required_len();
    let mut position: usize = 0;

    // #1. Walk positions until the highest required one has been consumed
    while position < required {
        let slot: Slot = schema.slot(position);

        match cursor.pull(slot)? {
            Pulled::Int(value) => {
                if let Slot::Int(field) = slot {
                    kline.set_int(field, value);
                }
            }
            Pulled::Decimal(value) => {
                if let Slot::Decimal(field) = slot {
                    kline.set_decimal(field, value);
                }
            }
            Pulled::Skipped => {}
            Pulled::Mismatch(found) => {
                return Err(DecodeError::FieldType {
                    record,
                    position,
                    expected: slot.field_kind(),
                    found,
                });
            }
            Pulled::End => {
                return Err(DecodeError::MalformedRecord {
                    record,
                    defect: RecordDefect::TooShort { required, found: position },
                });
            }
        }

        position += 1;
    }

    // #2. Early exit: trailing elements are passed over, never converted
    cursor.finish()?;

    Ok(kline)
}

//
// DECODER CONTRACT
//

/// A backend adapter: raw array-of-arrays bytes in, ordered `Kline`s out.
///
/// Decoders may keep scratch buffers between calls, which is why decoding takes
/// `&mut self`. An instance is never shared; concurrent callers each own one.
pub trait KlineDecoder: Send {
    fn name(&self) -> &'static str;

    /// Appends the decoded records to `out`. On error `out` is truncated back to
    /// the length it had on entry.
    fn decode_into(
        &mut self,
        payload: &[u8],
        schema: &RecordSchema,
        out: &mut Vec<Kline>,
    ) -> Result<(), DecodeError>;

    fn decode(
        &mut self,
        payload: &[u8],
        schema: &RecordSchema,
        capacity_hint: Option<usize>,
    ) -> Result<Vec<Kline>, DecodeError> {
        let mut out: Vec<Kline> = Vec::with_capacity(capacity_hint.unwrap_or(0));
        self.decode_into(payload, schema, &mut out)?;
        Ok(out)
    }
}

// Runs `body` and rolls `out` back if it fails, keeping decode all-or-nothing.
pub(crate) fn all_or_nothing<F>(out: &mut Vec<Kline>, body: F) -> Result<(), DecodeError>
where
    F: FnOnce(&mut Vec<Kline>) -> Result<(), DecodeError>,
{
    let mark: usize = out.len();
    let result = body(out);
    if result.is_err() {
        out.truncate(mark);
    }
    result
}
