// @file: kline_engine/src/tests/schema_validation.rs
// @description: Construction-time validation of positional schemas and the built-in tables.
// @author: LAS.

#[cfg(test)]
mod schema_validation_tests {
    use crate::core::error::SchemaError;
    use crate::core::schema::{FieldKind, FieldSpec, KlineField, RecordKind, RecordSchema, Slot};

    //
    // BUILT-IN SCHEMAS
    //

    #[test]
    fn test_full_schema_layout() {
        let schema: RecordSchema = RecordSchema::full();

        assert_eq!(schema.kind(), RecordKind::Full);
        assert_eq!(schema.required_len(), 11);
        assert_eq!(schema.slot(0), Slot::Int(KlineField::OpenTime));
        assert_eq!(schema.slot(5), Slot::Decimal(KlineField::Volume));
        assert_eq!(schema.slot(8), Slot::Int(KlineField::TradeCount));
        assert_eq!(schema.slot(10), Slot::Decimal(KlineField::TakerBuyQuoteVolume));
        // Past the schema everything is skipped
        assert_eq!(schema.slot(11), Slot::Skip);
        assert_eq!(schema.terminator(), None);
    }

    #[test]
    fn test_reduced_schema_layout() {
        let schema: RecordSchema = RecordSchema::reduced();

        assert_eq!(schema.kind(), RecordKind::Reduced);
        // Positions 0..=6 are read; 5 is declared but skipped
        assert_eq!(schema.required_len(), 7);
        assert_eq!(schema.slot(5), Slot::Skip);
        assert_eq!(schema.slot(6), Slot::Int(KlineField::CloseTime));
        assert_eq!(schema.terminator(), Some(7));
        assert_eq!(schema.fields().last(), Some(&(7, FieldKind::Terminator)));
    }

    #[test]
    fn test_builtin_tables_match_validated_construction() {
        let full = [
            FieldSpec::int(0, KlineField::OpenTime),
            FieldSpec::decimal(1, KlineField::Open),
            FieldSpec::decimal(2, KlineField::High),
            FieldSpec::decimal(3, KlineField::Low),
            FieldSpec::decimal(4, KlineField::Close),
            FieldSpec::decimal(5, KlineField::Volume),
            FieldSpec::int(6, KlineField::CloseTime),
            FieldSpec::decimal(7, KlineField::QuoteAssetVolume),
            FieldSpec::int(8, KlineField::TradeCount),
            FieldSpec::decimal(9, KlineField::TakerBuyBaseVolume),
            FieldSpec::decimal(10, KlineField::TakerBuyQuoteVolume),
        ];
        let reduced = [
            FieldSpec::int(0, KlineField::OpenTime),
            FieldSpec::decimal(1, KlineField::Open),
            FieldSpec::decimal(2, KlineField::High),
            FieldSpec::decimal(3, KlineField::Low),
            FieldSpec::decimal(4, KlineField::Close),
            FieldSpec::skipped(5),
            FieldSpec::int(6, KlineField::CloseTime),
            FieldSpec::terminator(7),
        ];

        assert_eq!(RecordSchema::new(RecordKind::Full, &full), Ok(RecordSchema::full()));
        assert_eq!(RecordSchema::new(RecordKind::Reduced, &reduced), Ok(RecordSchema::reduced()));
        assert_eq!(RecordSchema::for_kind(RecordKind::Reduced), RecordSchema::reduced());

        // A built-in schema never degrades to one that accepts empty rows
        for kind in [RecordKind::Full, RecordKind::Reduced] {
            let schema: RecordSchema = RecordSchema::for_kind(kind);
            assert!(schema.required_len() >= 7, "{}", kind);
            assert!(!schema.fields().is_empty(), "{}", kind);
        }
    }

    #[test]
    fn test_record_kind_parsing() {
        assert_eq!("full".parse::<RecordKind>(), Ok(RecordKind::Full));
        assert_eq!(" Reduced ".parse::<RecordKind>(), Ok(RecordKind::Reduced));
        assert_eq!(
            "ohlc".parse::<RecordKind>(),
            Err(SchemaError::UnknownRecordKind("ohlc".to_string()))
        );
    }

    //
    // REJECTIONS
    //

    #[test]
    fn test_rejects_empty_schema() {
        assert_eq!(RecordSchema::new(RecordKind::Full, &[]), Err(SchemaError::Empty));
    }

    #[test]
    fn test_rejects_negative_position() {
        let specs = [FieldSpec::int(-1, KlineField::OpenTime)];
        assert_eq!(
            RecordSchema::new(RecordKind::Full, &specs),
            Err(SchemaError::NegativePosition(-1))
        );
    }

    #[test]
    fn test_rejects_duplicate_position() {
        let specs = [
            FieldSpec::int(0, KlineField::OpenTime),
            FieldSpec::decimal(1, KlineField::Open),
            FieldSpec::decimal(1, KlineField::High),
        ];
        assert_eq!(
            RecordSchema::new(RecordKind::Full, &specs),
            Err(SchemaError::DuplicatePosition(1))
        );
    }

    #[test]
    fn test_rejects_decreasing_positions() {
        let specs = [
            FieldSpec::int(6, KlineField::CloseTime),
            FieldSpec::int(0, KlineField::OpenTime),
        ];
        assert_eq!(
            RecordSchema::new(RecordKind::Reduced, &specs),
            Err(SchemaError::OutOfOrder { previous: 6, position: 0 })
        );
    }

    #[test]
    fn test_rejects_fields_after_terminator() {
        let specs = [
            FieldSpec::int(0, KlineField::OpenTime),
            FieldSpec::terminator(3),
            FieldSpec::int(6, KlineField::CloseTime),
        ];
        assert_eq!(
            RecordSchema::new(RecordKind::Reduced, &specs),
            Err(SchemaError::TerminatorNotLast { terminator: 3, position: 6 })
        );
    }

    #[test]
    fn test_rejects_kind_target_mismatch() {
        let specs = [FieldSpec::decimal(0, KlineField::OpenTime)];
        assert_eq!(
            RecordSchema::new(RecordKind::Full, &specs),
            Err(SchemaError::KindMismatch {
                position: 0,
                kind: FieldKind::DecimalString,
                target: KlineField::OpenTime,
            })
        );

        let specs = [FieldSpec::int(1, KlineField::Open)];
        assert!(matches!(
            RecordSchema::new(RecordKind::Full, &specs),
            Err(SchemaError::KindMismatch { position: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_missing_and_duplicate_targets() {
        let specs = [FieldSpec { position: 0, kind: FieldKind::Int64, target: None }];
        assert_eq!(
            RecordSchema::new(RecordKind::Full, &specs),
            Err(SchemaError::MissingTarget { position: 0, kind: FieldKind::Int64 })
        );

        let specs = [
            FieldSpec::decimal(1, KlineField::Open),
            FieldSpec::decimal(2, KlineField::Open),
        ];
        assert_eq!(
            RecordSchema::new(RecordKind::Full, &specs),
            Err(SchemaError::DuplicateTarget(KlineField::Open))
        );
    }

    #[test]
    fn test_sparse_schema_skips_gaps() {
        // Only the close time, from a row whose other columns are irrelevant
        let specs = [FieldSpec::int(6, KlineField::CloseTime)];
        let schema: RecordSchema = RecordSchema::new(RecordKind::Reduced, &specs).expect("valid schema");

        assert_eq!(schema.required_len(), 7);
        for position in 0..6 {
            assert_eq!(schema.slot(position), Slot::Skip);
        }
    }
}
