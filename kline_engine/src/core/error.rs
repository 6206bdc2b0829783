// @file: kline_engine/src/core/error.rs
// @description: Error taxonomy for schema construction and positional decoding.
// @author: LAS.

use std::fmt;
use thiserror::Error;
use crate::core::schema::{FieldKind, KlineField};


//
// JSON VALUE CLASSES
//

// Coarse class of a JSON token. Every backend can compute it, so errors built
// from it compare equal across backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label: &str = match self {
            JsonKind::Null => "null",
            JsonKind::Bool => "boolean",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        };
        f.write_str(label)
    }
}


//
// SCHEMA ERRORS
//

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema declares no fields")]
    Empty,

    #[error("field position {0} is negative")]
    NegativePosition(i64),

    #[error("field position {0} is declared twice")]
    DuplicatePosition(usize),

    #[error("field position {position} follows position {previous}; positions must increase")]
    OutOfOrder { previous: usize, position: usize },

    #[error("terminator at position {terminator} is followed by position {position}")]
    TerminatorNotLast { terminator: usize, position: usize },

    #[error("{kind:?} field at position {position} has no target")]
    MissingTarget { position: usize, kind: FieldKind },

    #[error("{kind:?} field at position {position} cannot populate {target}")]
    KindMismatch { position: usize, kind: FieldKind, target: KlineField },

    #[error("{0} is mapped more than once")]
    DuplicateTarget(KlineField),

    #[error("unknown record kind: {0}")]
    UnknownRecordKind(String),
}


//
// DECODE ERRORS
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordDefect {
    // The outer-array element is not itself an array
    NotAnArray(JsonKind),
    // The inner array ends before the highest required position
    TooShort { required: usize, found: usize },
}

impl fmt::Display for RecordDefect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordDefect::NotAnArray(kind) => write!(f, "expected an array, found {}", kind),
            RecordDefect::TooShort { required, found } => {
                write!(f, "expected at least {} elements, found {}", required, found)
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    // Top-level value is not an array, or the bytes are not valid JSON.
    // `record` is set when the backend was inside a record at the time.
    #[error("malformed payload{}: {reason}", .record.map(|r| format!(" in record #{}", r)).unwrap_or_default())]
    MalformedPayload { record: Option<usize>, reason: String },

    #[error("malformed record #{record}: {defect}")]
    MalformedRecord { record: usize, defect: RecordDefect },

    #[error("record #{record}, position {position}: expected {expected:?}, found {found}")]
    FieldType {
        record: usize,
        position: usize,
        expected: FieldKind,
        found: JsonKind,
    },
}

// Classification used when comparing failures across backends. Messages may
// differ between backends; the class and indices may not. A payload failure
// carries no index here since only streaming backends can attribute one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    MalformedPayload,
    MalformedRecord { record: usize },
    FieldType { record: usize, position: usize },
}

impl DecodeError {
    pub fn payload(reason: impl Into<String>) -> Self {
        DecodeError::MalformedPayload { record: None, reason: reason.into() }
    }

    // Attributes a payload failure to the record being read; other kinds already carry one
    pub fn in_record(self, index: usize) -> Self {
        match self {
            DecodeError::MalformedPayload { record: None, reason } => {
                DecodeError::MalformedPayload { record: Some(index), reason }
            }
            other => other,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            DecodeError::MalformedPayload { .. } => ErrorClass::MalformedPayload,
            DecodeError::MalformedRecord { record, .. } => ErrorClass::MalformedRecord { record: *record },
            DecodeError::FieldType { record, position, .. } => ErrorClass::FieldType {
                record: *record,
                position: *position,
            },
        }
    }

    // Zero-based index of the offending record, when the failure is tied to one
    pub fn record_index(&self) -> Option<usize> {
        match self {
            DecodeError::MalformedPayload { record, .. } => *record,
            DecodeError::MalformedRecord { record, .. } => Some(*record),
            DecodeError::FieldType { record, .. } => Some(*record),
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::payload(err.to_string())
    }
}
