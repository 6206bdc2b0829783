// @file: kline_engine/src/tests/decoder_scenarios.rs
// @description: Behavioural scenarios every backend must satisfy (values, ordering, early exit, error reporting).
// @author: LAS.

#[cfg(test)]
mod decoder_scenario_tests {
    use crate::core::error::{DecodeError, ErrorClass, JsonKind, RecordDefect};
    use crate::core::models::Kline;
    use crate::core::schema::{FieldKind, RecordSchema};
    use crate::tests::{all_decoders, SCENARIO_A};

    //
    // HELPERS
    //

    // Builds one full-width row with the given open time and a marker decimal
    fn row(open_time: i64, marker: &str) -> String {
        format!(
            r#"[{},"{}","2.0","0.5","1.5","10",{},"20",7,"3","4"]"#,
            open_time,
            marker,
            open_time + 59_999
        )
    }

    fn decode_all(payload: &str, schema: &RecordSchema) -> Vec<(&'static str, Result<Vec<Kline>, DecodeError>)> {
        all_decoders()
            .into_iter()
            .map(|mut decoder| {
                let result = decoder.decode(payload.as_bytes(), schema, None);
                (decoder.name(), result)
            })
            .collect()
    }

    //
    // SCENARIOS
    //

    #[test]
    fn test_scenario_a_full_record() {
        let schema: RecordSchema = RecordSchema::full();

        for (name, result) in decode_all(SCENARIO_A, &schema) {
            let klines: Vec<Kline> = result.unwrap_or_else(|e| panic!("{} failed: {}", name, e));
            assert_eq!(klines.len(), 1, "{}", name);

            let k: &Kline = &klines[0];
            assert_eq!(k.open_time, 1499040000000, "{}", name);
            assert_eq!(k.open, "0.01634790", "{}", name);
            assert_eq!(k.high, "0.80000000", "{}", name);
            assert_eq!(k.low, "0.01575800", "{}", name);
            assert_eq!(k.close, "0.01577100", "{}", name);
            assert_eq!(k.volume, "148976.11427815", "{}", name);
            assert_eq!(k.close_time, 1499644799999, "{}", name);
            assert_eq!(k.quote_asset_volume, "2434.19055334", "{}", name);
            assert_eq!(k.trade_count, 308, "{}", name);
            assert_eq!(k.taker_buy_base_volume, "1756.87402397", "{}", name);
            assert_eq!(k.taker_buy_quote_volume, "28.46694368", "{}", name);
        }
    }

    #[test]
    fn test_scenario_a_reduced_leaves_unmapped_fields_empty() {
        let schema: RecordSchema = RecordSchema::reduced();

        for (name, result) in decode_all(SCENARIO_A, &schema) {
            let klines: Vec<Kline> = result.unwrap_or_else(|e| panic!("{} failed: {}", name, e));
            let k: &Kline = &klines[0];

            assert_eq!(k.open_time, 1499040000000, "{}", name);
            assert_eq!(k.close, "0.01577100", "{}", name);
            assert_eq!(k.close_time, 1499644799999, "{}", name);
            // Never inferred, never populated
            assert_eq!(k.volume, "", "{}", name);
            assert_eq!(k.quote_asset_volume, "", "{}", name);
            assert_eq!(k.trade_count, 0, "{}", name);
            assert_eq!(k.taker_buy_quote_volume, "", "{}", name);
        }
    }

    #[test]
    fn test_scenario_b_empty_array() {
        let schema: RecordSchema = RecordSchema::full();

        for payload in ["[]", " [ ] ", "[\n]"] {
            for (name, result) in decode_all(payload, &schema) {
                assert_eq!(result, Ok(Vec::new()), "{} on {:?}", name, payload);
            }
        }
    }

    #[test]
    fn test_scenario_c_object_is_malformed_payload() {
        let schema: RecordSchema = RecordSchema::full();

        for (name, result) in decode_all("{}", &schema) {
            let err: DecodeError = result.expect_err(name);
            assert_eq!(err.class(), ErrorClass::MalformedPayload, "{}", name);
            assert_eq!(err.record_index(), None, "{}", name);
        }
    }

    #[test]
    fn test_non_json_and_truncated_payloads() {
        let schema: RecordSchema = RecordSchema::full();

        for payload in ["", "\"klines\"", "42", "[", "[[1499040000000,\"1\"", "[,]", "[] []"] {
            for (name, result) in decode_all(payload, &schema) {
                let err: DecodeError = result.expect_err(name);
                assert_eq!(err.class(), ErrorClass::MalformedPayload, "{} on {:?}", name, payload);
            }
        }
    }

    //
    // VALUES & ORDER
    //

    #[test]
    fn test_decimal_text_is_preserved_exactly() {
        let schema: RecordSchema = RecordSchema::full();
        let payload: String = format!(
            "[{}]",
            r#"[1,"9300.00000000","0.10000000","1e-8","-0.0","00012.5000",2,"",3,"1.000000000000000000001","9300"]"#
        );

        for (name, result) in decode_all(&payload, &schema) {
            let k: Kline = result.expect(name).remove(0);
            assert_eq!(k.open, "9300.00000000", "{}", name);
            assert_eq!(k.high, "0.10000000", "{}", name);
            assert_eq!(k.low, "1e-8", "{}", name);
            assert_eq!(k.close, "-0.0", "{}", name);
            assert_eq!(k.volume, "00012.5000", "{}", name);
            assert_eq!(k.quote_asset_volume, "", "{}", name);
            assert_eq!(k.taker_buy_base_volume, "1.000000000000000000001", "{}", name);
            assert_eq!(k.taker_buy_quote_volume, "9300", "{}", name);
        }
    }

    #[test]
    fn test_escaped_decimal_text_is_unescaped() {
        let schema: RecordSchema = RecordSchema::reduced();
        let payload: &str = r#"[[1,"9\u002e5","\/1","a\"b","\ud83d\ude00","x",2]]"#;

        for (name, result) in decode_all(payload, &schema) {
            let k: Kline = result.expect(name).remove(0);
            assert_eq!(k.open, "9.5", "{}", name);
            assert_eq!(k.high, "/1", "{}", name);
            assert_eq!(k.low, "a\"b", "{}", name);
            assert_eq!(k.close, "\u{1F600}", "{}", name);
        }
    }

    #[test]
    fn test_output_order_matches_input_order() {
        let schema: RecordSchema = RecordSchema::full();
        let rows: Vec<String> = (0..25).rev().map(|i| row(1_000_000 + i * 60_000, &format!("{}.0", i))).collect();
        let payload: String = format!("[{}]", rows.join(","));

        for (name, result) in decode_all(&payload, &schema) {
            let klines: Vec<Kline> = result.expect(name);
            assert_eq!(klines.len(), 25, "{}", name);
            for (idx, k) in klines.iter().enumerate() {
                let i: i64 = 24 - idx as i64;
                assert_eq!(k.open_time, 1_000_000 + i * 60_000, "{}", name);
                assert_eq!(k.open, format!("{}.0", i), "{}", name);
            }
        }
    }

    #[test]
    fn test_integer_bounds() {
        let schema: RecordSchema = RecordSchema::reduced();
        let payload: &str = r#"[[-9223372036854775808,"1","2","3","4","5",9223372036854775807]]"#;

        for (name, result) in decode_all(payload, &schema) {
            let k: Kline = result.expect(name).remove(0);
            assert_eq!(k.open_time, i64::MIN, "{}", name);
            assert_eq!(k.close_time, i64::MAX, "{}", name);
        }
    }

    #[test]
    fn test_pretty_printed_payload() {
        let schema: RecordSchema = RecordSchema::reduced();
        let payload: &str = "[\n  [\n    1499040000000 ,\n    \"1\",\"2\",\t\"3\",\r\n \"4\", \"5\" , 1499644799999\n  ]\n]\n";

        for (name, result) in decode_all(payload, &schema) {
            let k: Kline = result.expect(name).remove(0);
            assert_eq!(k.open_time, 1499040000000, "{}", name);
            assert_eq!(k.close_time, 1499644799999, "{}", name);
        }
    }

    //
    // EARLY EXIT
    //

    #[test]
    fn test_trailing_elements_are_ignored() {
        let schema: RecordSchema = RecordSchema::full();
        let payload: &str = r#"[
            [1,"a","b","c","d","e",2,"f",3,"g","h","0",{"nested":[1,[2,{}]],"k":"v"},null,true,false,-1.5e3,[]],
            [4,"i","j","k","l","m",5,"n",6,"o","p"]
        ]"#;

        for (name, result) in decode_all(payload, &schema) {
            let klines: Vec<Kline> = result.unwrap_or_else(|e| panic!("{} failed: {}", name, e));
            assert_eq!(klines.len(), 2, "{}", name);
            assert_eq!(klines[0].taker_buy_quote_volume, "h", "{}", name);
            assert_eq!(klines[1].open_time, 4, "{}", name);
        }
    }

    #[test]
    fn test_skipped_positions_accept_any_value() {
        // Position 5 is declared SkippedDecimalString in the reduced schema
        let schema: RecordSchema = RecordSchema::reduced();
        let payload: &str = r#"[[1,"a","b","c","d",{"volume":[1,2,3]},2,"ignored",null]]"#;

        for (name, result) in decode_all(payload, &schema) {
            let k: Kline = result.expect(name).remove(0);
            assert_eq!(k.close_time, 2, "{}", name);
            assert_eq!(k.volume, "", "{}", name);
        }
    }

    //
    // MALFORMED RECORDS & FIELD TYPES
    //

    #[test]
    fn test_short_record_reports_its_index() {
        let schema: RecordSchema = RecordSchema::full();
        let payload: String = format!("[{},{},[1499040000000,\"1\",\"2\"]]", row(1, "a"), row(2, "b"));

        for (name, result) in decode_all(&payload, &schema) {
            assert_eq!(
                result,
                Err(DecodeError::MalformedRecord {
                    record: 2,
                    defect: RecordDefect::TooShort { required: 11, found: 3 },
                }),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_reduced_schema_needs_seven_elements() {
        let schema: RecordSchema = RecordSchema::reduced();

        for (name, result) in decode_all(r#"[[1,"a","b","c","d","e",2]]"#, &schema) {
            assert!(result.is_ok(), "{}", name);
        }
        for (name, result) in decode_all(r#"[[1,"a","b","c","d","e"]]"#, &schema) {
            assert_eq!(
                result,
                Err(DecodeError::MalformedRecord {
                    record: 0,
                    defect: RecordDefect::TooShort { required: 7, found: 6 },
                }),
                "{}",
                name
            );
        }
        for (name, result) in decode_all("[[]]", &schema) {
            assert_eq!(result.expect_err(name).class(), ErrorClass::MalformedRecord { record: 0 }, "{}", name);
        }
    }

    #[test]
    fn test_non_array_record() {
        let schema: RecordSchema = RecordSchema::full();
        let payload: String = format!("[{},\"oops\"]", row(1, "a"));

        for (name, result) in decode_all(&payload, &schema) {
            assert_eq!(
                result,
                Err(DecodeError::MalformedRecord {
                    record: 1,
                    defect: RecordDefect::NotAnArray(JsonKind::String),
                }),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_field_type_errors() {
        let schema: RecordSchema = RecordSchema::reduced();
        let cases: [(&str, usize, FieldKind, JsonKind); 7] = [
            (r#"[["1499040000000","a","b","c","d","e",2]]"#, 0, FieldKind::Int64, JsonKind::String),
            (r#"[[1.5,"a","b","c","d","e",2]]"#, 0, FieldKind::Int64, JsonKind::Number),
            (r#"[[1e3,"a","b","c","d","e",2]]"#, 0, FieldKind::Int64, JsonKind::Number),
            (r#"[[9223372036854775808,"a","b","c","d","e",2]]"#, 0, FieldKind::Int64, JsonKind::Number),
            (r#"[[1,0.5,"b","c","d","e",2]]"#, 1, FieldKind::DecimalString, JsonKind::Number),
            (r#"[[1,"a","b",null,"d","e",2]]"#, 3, FieldKind::DecimalString, JsonKind::Null),
            (r#"[[1,"a","b","c","d","e",[2]]]"#, 6, FieldKind::Int64, JsonKind::Array),
        ];

        for (payload, position, expected, found) in cases {
            for (name, result) in decode_all(payload, &schema) {
                assert_eq!(
                    result,
                    Err(DecodeError::FieldType { record: 0, position, expected, found }),
                    "{} on {}",
                    name,
                    payload
                );
            }
        }
    }

    #[test]
    fn test_syntax_error_inside_record_carries_its_index() {
        let schema: RecordSchema = RecordSchema::reduced();
        let payload: &str = r#"[[1,"a","b","c","d","e",2],[3,"f",tru,"h","i","j",4]]"#;

        for (name, result) in decode_all(payload, &schema) {
            let err: DecodeError = result.expect_err(name);
            assert_eq!(err.class(), ErrorClass::MalformedPayload, "{}", name);

            // Streaming backends know where they were; the tree parses the whole document first
            match name {
                "scan" | "serde" => {
                    assert_eq!(err.record_index(), Some(1), "{}", name);
                    assert!(err.to_string().starts_with("malformed payload in record #1:"), "{}: {}", name, err);
                }
                _ => assert_eq!(err.record_index(), None, "{}", name),
            }
        }
    }

    #[test]
    fn test_record_attribution_only_fills_payload_errors() {
        let located: DecodeError = DecodeError::payload("expected value").in_record(4);
        assert_eq!(located.record_index(), Some(4));
        assert_eq!(located.class(), ErrorClass::MalformedPayload);
        // An existing index is kept
        assert_eq!(located.clone().in_record(9), located);

        let record_error: DecodeError = DecodeError::MalformedRecord {
            record: 2,
            defect: RecordDefect::TooShort { required: 7, found: 1 },
        };
        assert_eq!(record_error.clone().in_record(5), record_error);
    }

    #[test]
    fn test_failure_discards_partial_output() {
        let schema: RecordSchema = RecordSchema::full();
        let payload: String = format!("[{},{},[1,\"x\"]]", row(1, "a"), row(2, "b"));
        let sentinel: Kline = Kline { open_time: -1, ..Kline::default() };

        for mut decoder in all_decoders() {
            let mut out: Vec<Kline> = vec![sentinel.clone()];
            let result = decoder.decode_into(payload.as_bytes(), &schema, &mut out);

            assert!(result.is_err(), "{}", decoder.name());
            assert_eq!(out, vec![sentinel.clone()], "{}", decoder.name());
        }
    }

    #[test]
    fn test_decoder_is_reusable_after_failure() {
        let schema: RecordSchema = RecordSchema::full();

        for mut decoder in all_decoders() {
            assert!(decoder.decode(b"[[1,", &schema, None).is_err());
            let klines: Vec<Kline> = decoder.decode(SCENARIO_A.as_bytes(), &schema, Some(1)).expect(decoder.name());
            assert_eq!(klines[0].trade_count, 308, "{}", decoder.name());
        }
    }
}
