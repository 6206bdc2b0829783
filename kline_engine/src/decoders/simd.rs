// @file: kline_engine/src/decoders/simd.rs
// @description: SIMD backend on simd-json's tape parser, reusing its buffers across calls.
// @author: LAS.

use simd_json::prelude::*;
use simd_json::{BorrowedValue, Buffers, StaticNode};
use crate::core::decoder::{all_or_nothing, assemble_record, ElementCursor, KlineDecoder, Pulled};
use crate::core::error::{DecodeError, JsonKind, RecordDefect};
use crate::core::models::Kline;
use crate::core::schema::{RecordSchema, Slot};


//
// VALUE HELPERS
//

fn kind_of(value: &BorrowedValue) -> JsonKind {
    match value {
        BorrowedValue::Static(StaticNode::Null) => JsonKind::Null,
        BorrowedValue::Static(StaticNode::Bool(_)) => JsonKind::Bool,
        BorrowedValue::Static(_) => JsonKind::Number,
        BorrowedValue::String(_) => JsonKind::String,
        BorrowedValue::Array(_) => JsonKind::Array,
        BorrowedValue::Object(_) => JsonKind::Object,
    }
}

struct SimdCursor<'v, 'a> {
    elements: std::slice::Iter<'v, BorrowedValue<'a>>,
}

impl ElementCursor for SimdCursor<'_, '_> {
    fn pull(&mut self, slot: Slot) -> Result<Pulled, DecodeError> {
        let value: &BorrowedValue = match self.elements.next() {
            Some(v) => v,
            None => return Ok(Pulled::End),
        };

        let pulled: Pulled = match slot {
            Slot::Int(_) => match value {
                BorrowedValue::Static(StaticNode::I64(v)) => Pulled::Int(*v),
                BorrowedValue::Static(StaticNode::U64(v)) => {
                    i64::try_from(*v).map_or(Pulled::Mismatch(JsonKind::Number), Pulled::Int)
                }
                other => Pulled::Mismatch(kind_of(other)),
            },
            Slot::Decimal(_) => match value.as_str() {
                Some(s) => Pulled::Decimal(s.to_owned()),
                None => Pulled::Mismatch(kind_of(value)),
            },
            Slot::Skip => Pulled::Skipped,
        };
        Ok(pulled)
    }

    fn finish(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }
}


//
// DECODER
//

/// simd-json parses in place, so the payload is copied into `input` first.
/// `input` and `buffers` are reused between calls; one instance per thread.
#[derive(Default)]
pub struct SimdDecoder {
    input: Vec<u8>,
    buffers: Buffers,
}

impl SimdDecoder {
    pub fn new() -> Self {
        SimdDecoder::default()
    }
}

impl KlineDecoder for SimdDecoder {
    fn name(&self) -> &'static str {
        "simd"
    }

    fn decode_into(&mut self, payload: &[u8], schema: &RecordSchema, out: &mut Vec<Kline>) -> Result<(), DecodeError> {
        // #1. Parse a private copy with the retained tape buffers
        self.input.clear();
        self.input.extend_from_slice(payload);
        let document: BorrowedValue = simd_json::to_borrowed_value_with_buffers(&mut self.input, &mut self.buffers)
            .map_err(|e| DecodeError::payload(e.to_string()))?;

        let records = match &document {
            BorrowedValue::Array(items) => items,
            other => {
                return Err(DecodeError::payload(format!("expected an array, found {}", kind_of(other))));
            }
        };

        // #2. Positional extraction
        all_or_nothing(out, |out| {
            out.reserve(records.len());
            for (record, item) in records.iter().enumerate() {
                let fields = match item {
                    BorrowedValue::Array(fields) => fields,
                    other => {
                        return Err(DecodeError::MalformedRecord {
                            record,
                            defect: RecordDefect::NotAnArray(kind_of(other)),
                        });
                    }
                };
                let mut cursor = SimdCursor { elements: fields.iter() };
                out.push(assemble_record(schema, record, &mut cursor)?);
            }
            Ok(())
        })
    }
}
