use serde_json::Value;

use super::{validate::validate_record, ParseError};
use crate::Candle;

pub(super) fn parse(content: &str) -> Result<Vec<Candle>, ParseError> {
    let value: Value =
        serde_json::from_str(content).map_err(|err| ParseError::MalformedJson(err.to_string()))?;

    let items = value.as_array().ok_or(ParseError::NotAnArray)?;
    log::trace!("JSON dataset has {} elements.", items.len());

    items
        .iter()
        .enumerate()
        .map(|(index, item)| validate_record(index + 1, item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_candle() {
        let candles = parse(
            r#"[{"time":1700000000000,"open":1,"high":2,"low":0.5,"close":1.5,"volume":10}]"#,
        )
        .unwrap();
        assert_eq!(
            candles,
            vec![Candle {
                time: 1_700_000_000_000_000_000,
                open: 1.0,
                high: 2.0,
                low: 0.5,
                close: 1.5,
                volume: 10.0,
            }]
        );
    }

    #[test]
    fn nanosecond_times_are_kept() {
        let candles = parse(
            r#"[{"time":1700000000000000000,"open":1,"high":2,"low":0.5,"close":1.5,"volume":10}]"#,
        )
        .unwrap();
        assert_eq!(candles[0].time, 1_700_000_000_000_000_000);
    }

    #[test]
    fn malformed() {
        assert!(matches!(
            parse("[{\"time\": 1,"),
            Err(ParseError::MalformedJson(_))
        ));
        assert!(parse("").unwrap_err().to_string().starts_with("Invalid JSON format: "));
    }

    #[test]
    fn not_an_array() {
        assert_eq!(
            parse(r#"{"time":1,"open":1,"high":2,"low":0.5,"close":1.5,"volume":10}"#),
            Err(ParseError::NotAnArray)
        );
        assert_eq!(parse("42"), Err(ParseError::NotAnArray));
    }

    #[test]
    fn empty_array_is_empty_dataset() {
        assert_eq!(parse("[]"), Ok(Vec::new()));
    }

    #[test]
    fn stops_at_first_bad_element() {
        let err = parse(
            r#"[
                {"time":1,"open":1,"high":2,"low":0.5,"close":1.5,"volume":10},
                {"time":2,"open":1,"high":0.1,"low":0.5,"close":1.5,"volume":10},
                {"time":3,"open":-1,"high":2,"low":0.5,"close":1.5,"volume":10}
            ]"#,
        )
        .unwrap_err();
        assert_eq!(err, ParseError::HighLessThanLow { row: 2 });
    }

    #[test]
    fn numeric_strings() {
        let candles = parse(
            r#"[{"time":"1000","open":"1","high":"2","low":"0.5","close":"1.5","volume":"10"}]"#,
        )
        .unwrap();
        assert_eq!(candles[0].time, 1_000_000_000);
        assert_eq!(candles[0].volume, 10.0);
    }
}
