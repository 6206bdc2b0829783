// @file: kline_engine/src/decoders/tree.rs
// @description: Tree-walking baseline backend. Parses into serde_json::Value, then indexes positionally.
// @author: LAS.

use serde_json::Value;
use std::slice::Iter;
use crate::core::decoder::{all_or_nothing, assemble_record, ElementCursor, KlineDecoder, Pulled};
use crate::core::error::{DecodeError, JsonKind, RecordDefect};
use crate::core::models::Kline;
use crate::core::schema::{RecordSchema, Slot};


//
// VALUE HELPERS
//

pub(crate) fn kind_of(value: &Value) -> JsonKind {
    match value {
        Value::Null => JsonKind::Null,
        Value::Bool(_) => JsonKind::Bool,
        Value::Number(_) => JsonKind::Number,
        Value::String(_) => JsonKind::String,
        Value::Array(_) => JsonKind::Array,
        Value::Object(_) => JsonKind::Object,
    }
}

struct TreeCursor<'v> {
    elements: Iter<'v, Value>,
}

impl ElementCursor for TreeCursor<'_> {
    fn pull(&mut self, slot: Slot) -> Result<Pulled, DecodeError> {
        let value: &Value = match self.elements.next() {
            Some(v) => v,
            None => return Ok(Pulled::End),
        };

        let pulled: Pulled = match slot {
            Slot::Int(_) => value.as_i64().map_or(Pulled::Mismatch(kind_of(value)), Pulled::Int),
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

/// Reference backend for differential testing. Stateless; every call builds a
/// fresh document tree, which makes it the slowest strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeDecoder;

impl TreeDecoder {
    pub fn new() -> Self {
        TreeDecoder
    }
}

impl KlineDecoder for TreeDecoder {
    fn name(&self) -> &'static str {
        "tree"
    }

    fn decode_into(&mut self, payload: &[u8], schema: &RecordSchema, out: &mut Vec<Kline>) -> Result<(), DecodeError> {
        // #1. Whole document first; syntax errors surface before any record is read
        let document: Value = serde_json::from_slice(payload)?;

        let records: &Vec<Value> = match &document {
            Value::Array(items) => items,
            other => {
                return Err(DecodeError::payload(format!("expected an array, found {}", kind_of(other))));
            }
        };

        // #2. Positional extraction
        all_or_nothing(out, |out| {
            out.reserve(records.len());
            for (record, item) in records.iter().enumerate() {
                let fields: &Vec<Value> = match item {
                    Value::Array(fields) => fields,
                    other => {
                        return Err(DecodeError::MalformedRecord {
                            record,
                            defect: RecordDefect::NotAnArray(kind_of(other)),
                        });
                    }
                };
                let mut cursor = TreeCursor { elements: fields.iter() };
                out.push(assemble_record(schema, record, &mut cursor)?);
            }
            Ok(())
        })
    }
}
