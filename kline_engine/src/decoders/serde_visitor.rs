// @file: kline_engine/src/decoders/serde_visitor.rs
// @description: Streaming serde backend. Drives serde_json's deserializer with positional seeds, no intermediate tree.
// @author: LAS.

use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use std::fmt;
use crate::core::decoder::{all_or_nothing, assemble_record, ElementCursor, KlineDecoder, Pulled};
use crate::core::error::{DecodeError, JsonKind, RecordDefect};
use crate::core::models::Kline;
use crate::core::schema::{RecordSchema, Slot};


//
// STRICT SKIP
//

// Discards a value through `deserialize_any`, so serde_json still parses every
// string and number inside it.
struct Skip;

impl<'de> DeserializeSeed<'de> for Skip {
    type Value = ();

    fn deserialize<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for Skip {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<(), E> {
        Ok(())
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<(), E> {
        Ok(())
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<(), E> {
        Ok(())
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<(), E> {
        Ok(())
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<(), E> {
        Ok(())
    }

    fn visit_unit<E: de::Error>(self) -> Result<(), E> {
        Ok(())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<(), A::Error> {
        drain_seq(seq)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<(), A::Error> {
        drain_map(map)
    }
}

fn drain_seq<'de, A: SeqAccess<'de>>(mut seq: A) -> Result<(), A::Error> {
    while seq.next_element_seed(Skip)?.is_some() {}
    Ok(())
}

fn drain_map<'de, A: MapAccess<'de>>(mut map: A) -> Result<(), A::Error> {
    while map.next_key_seed(Skip)?.is_some() {
        map.next_value_seed(Skip)?;
    }
    Ok(())
}


//
// SCALAR SEEDS
//

// Both seeds answer `Ok(Err(kind))` on a class mismatch so the record can be
// rejected with a FieldTypeError instead of a serde error. Containers are
// drained first because serde_json insists they be consumed.

struct IntSeed;

impl<'de> DeserializeSeed<'de> for IntSeed {
    type Value = Result<i64, JsonKind>;

    fn deserialize<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for IntSeed {
    type Value = Result<i64, JsonKind>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a 64-bit integer")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Ok(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(i64::try_from(v).map_err(|_| JsonKind::Number))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
        Ok(Err(JsonKind::Number))
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<Self::Value, E> {
        Ok(Err(JsonKind::String))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
        Ok(Err(JsonKind::Bool))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Err(JsonKind::Null))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Self::Value, A::Error> {
        drain_seq(seq)?;
        Ok(Err(JsonKind::Array))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        drain_map(map)?;
        Ok(Err(JsonKind::Object))
    }
}

struct DecimalSeed;

impl<'de> DeserializeSeed<'de> for DecimalSeed {
    type Value = Result<String, JsonKind>;

    fn deserialize<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for DecimalSeed {
    type Value = Result<String, JsonKind>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal encoded as a string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Ok(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(Ok(v))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
        Ok(Err(JsonKind::Number))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
        Ok(Err(JsonKind::Number))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
        Ok(Err(JsonKind::Number))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
        Ok(Err(JsonKind::Bool))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Err(JsonKind::Null))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Self::Value, A::Error> {
        drain_seq(seq)?;
        Ok(Err(JsonKind::Array))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        drain_map(map)?;
        Ok(Err(JsonKind::Object))
    }
}


//
// CURSOR
//

struct SeqCursor<A> {
    seq: A,
}

fn syntax<E: fmt::Display>(err: E) -> DecodeError {
    DecodeError::payload(err.to_string())
}

impl<'de, A: SeqAccess<'de>> ElementCursor for SeqCursor<A> {
    fn pull(&mut self, slot: Slot) -> Result<Pulled, DecodeError> {
        let pulled: Pulled = match slot {
            Slot::Int(_) => match self.seq.next_element_seed(IntSeed).map_err(syntax)? {
                Some(Ok(v)) => Pulled::Int(v),
                Some(Err(kind)) => Pulled::Mismatch(kind),
                None => Pulled::End,
            },
            Slot::Decimal(_) => match self.seq.next_element_seed(DecimalSeed).map_err(syntax)? {
                Some(Ok(v)) => Pulled::Decimal(v),
                Some(Err(kind)) => Pulled::Mismatch(kind),
                None => Pulled::End,
            },
            Slot::Skip => match self.seq.next_element_seed(Skip).map_err(syntax)? {
                Some(_) => Pulled::Skipped,
                None => Pulled::End,
            },
        };
        Ok(pulled)
    }

    fn finish(&mut self) -> Result<(), DecodeError> {
        while self.seq.next_element_seed(Skip).map_err(syntax)?.is_some() {}
        Ok(())
    }
}


//
// RECORD & PAYLOAD SEEDS
//

// A DecodeError raised inside a visitor is parked in `failure` and serde gets a
// placeholder error; the decoder reports the parked one.
struct RecordSeed<'s> {
    schema: &'s RecordSchema,
    record: usize,
    failure: &'s mut Option<DecodeError>,
}

impl RecordSeed<'_> {
    fn fail<E: de::Error>(self, err: DecodeError) -> E {
        let message: String = err.to_string();
        *self.failure = Some(err);
        E::custom(message)
    }

    fn not_an_array<E: de::Error>(self, kind: JsonKind) -> E {
        let record: usize = self.record;
        self.fail(DecodeError::MalformedRecord { record, defect: RecordDefect::NotAnArray(kind) })
    }
}

impl<'de> DeserializeSeed<'de> for RecordSeed<'_> {
    type Value = Kline;

    fn deserialize<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<Kline, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for RecordSeed<'_> {
    type Value = Kline;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a kline array")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Kline, A::Error> {
        let record: usize = self.record;
        let mut cursor: SeqCursor<A> = SeqCursor { seq };
        match assemble_record(self.schema, record, &mut cursor) {
            Ok(kline) => Ok(kline),
            Err(err) => Err(self.fail(err.in_record(record))),
        }
    }

    fn visit_map<A: MapAccess<'de>>(self, _: A) -> Result<Kline, A::Error> {
        Err(self.not_an_array(JsonKind::Object))
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<Kline, E> {
        Err(self.not_an_array(JsonKind::String))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Kline, E> {
        Err(self.not_an_array(JsonKind::Number))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Kline, E> {
        Err(self.not_an_array(JsonKind::Number))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Kline, E> {
        Err(self.not_an_array(JsonKind::Number))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Kline, E> {
        Err(self.not_an_array(JsonKind::Bool))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Kline, E> {
        Err(self.not_an_array(JsonKind::Null))
    }
}

struct PayloadSeed<'s> {
    schema: &'s RecordSchema,
    out: &'s mut Vec<Kline>,
    failure: &'s mut Option<DecodeError>,
}

impl<'de> DeserializeSeed<'de> for PayloadSeed<'_> {
    type Value = ();

    fn deserialize<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for PayloadSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array of kline arrays")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        if let Some(hint) = seq.size_hint() {
            self.out.reserve(hint);
        }

        let mut record: usize = 0;
        loop {
            let seed = RecordSeed { schema: self.schema, record, failure: &mut *self.failure };
            match seq.next_element_seed(seed)? {
                Some(kline) => self.out.push(kline),
                None => return Ok(()),
            }
            record += 1;
        }
    }
}


//
// DECODER
//

/// Unmarshal-style backend: serde drives the walk and the schema picks a seed
/// per position. Skipped positions go through `Skip`. Stateless.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerdeDecoder;

impl SerdeDecoder {
    pub fn new() -> Self {
        SerdeDecoder
    }
}

impl KlineDecoder for SerdeDecoder {
    fn name(&self) -> &'static str {
        "serde"
    }

    fn decode_into(&mut self, payload: &[u8], schema: &RecordSchema, out: &mut Vec<Kline>) -> Result<(), DecodeError> {
        all_or_nothing(out, |out| {
            let mut failure: Option<DecodeError> = None;
            let mut deserializer = serde_json::Deserializer::from_slice(payload);

            let seed = PayloadSeed { schema, out, failure: &mut failure };
            let result: Result<(), serde_json::Error> = seed
                .deserialize(&mut deserializer)
                .and_then(|()| deserializer.end());

            match (failure, result) {
                (Some(err), _) => Err(err),
                (None, Err(err)) => Err(err.into()),
                (None, Ok(())) => Ok(()),
            }
        })
    }
}
