use super::{
    validate::{check_candle, parse_time_text, REQUIRED_FIELDS},
    ParseError,
};
use crate::Candle;

/// Column positions of the required fields, in `REQUIRED_FIELDS` order.
struct Columns([usize; 6]);

impl Columns {
    fn from_header(line: &str) -> Result<Self, ParseError> {
        let header: Vec<String> = line
            .to_lowercase()
            .split(',')
            .map(|name| name.trim().to_owned())
            .collect();

        let mut indices = [0; 6];
        for (slot, field) in indices.iter_mut().zip(REQUIRED_FIELDS) {
            *slot = header
                .iter()
                .position(|name| name == field || (field == "time" && name == "timestamp"))
                .ok_or(ParseError::MissingColumn(field))?;
        }

        Ok(Columns(indices))
    }

    fn get<'a>(&self, values: &[&'a str], field: usize) -> &'a str {
        // Short rows read as empty cells and fail validation.
        values.get(self.0[field]).copied().unwrap_or("")
    }
}

fn parse_number(text: &str) -> f64 {
    text.parse().unwrap_or(f64::NAN)
}

pub(super) fn parse(content: &str) -> Result<Vec<Candle>, ParseError> {
    let lines: Vec<&str> = content.trim().split('\n').collect();
    if lines.len() < 2 {
        return Err(ParseError::EmptyOrHeaderOnly);
    }

    let columns = Columns::from_header(lines[0])?;
    log::trace!("CSV columns resolved to {:?}.", columns.0);

    let mut candles = Vec::with_capacity(lines.len() - 1);
    for (index, line) in lines.iter().enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let row = index + 1;
        let values: Vec<&str> = line.split(',').map(str::trim).collect();

        let time = parse_time_text(columns.get(&values, 0))
            .ok_or(ParseError::InvalidTimeFormat { row })?;
        let candle = Candle {
            time,
            open: parse_number(columns.get(&values, 1)),
            high: parse_number(columns.get(&values, 2)),
            low: parse_number(columns.get(&values, 3)),
            close: parse_number(columns.get(&values, 4)),
            volume: parse_number(columns.get(&values, 5)),
        };

        candles.push(check_candle(row, candle)?);
    }

    if candles.is_empty() {
        return Err(ParseError::NoValidRows);
    }

    Ok(candles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_row() {
        let candles =
            parse("time,open,high,low,close,volume\n2026-01-01T00:00:00Z,100,110,95,105,1000\n")
                .unwrap();
        assert_eq!(
            candles,
            vec![Candle {
                time: 1_767_225_600_000_000_000,
                open: 100.0,
                high: 110.0,
                low: 95.0,
                close: 105.0,
                volume: 1000.0,
            }]
        );
    }

    #[test]
    fn high_below_low_reports_line() {
        let err = parse("time,open,high,low,close,volume\n1000,100,90,95,92,10\n").unwrap_err();
        assert_eq!(err, ParseError::HighLessThanLow { row: 2 });
        assert_eq!(err.to_string(), "Row 2: High must be >= Low");
    }

    #[test]
    fn header_only() {
        assert_eq!(
            parse("time,open,high,low,close,volume\n"),
            Err(ParseError::EmptyOrHeaderOnly)
        );
        assert_eq!(parse(""), Err(ParseError::EmptyOrHeaderOnly));
        assert_eq!(parse("   \n\n  "), Err(ParseError::EmptyOrHeaderOnly));
    }

    #[test]
    fn missing_column_fails_before_rows() {
        // The data row is invalid too, but the header is checked first.
        assert_eq!(
            parse("time,open,high,low,close\nx,y,z\n"),
            Err(ParseError::MissingColumn("volume"))
        );
        assert_eq!(
            parse("date,open,high,low,close,volume\n1,1,1,1,1,1\n"),
            Err(ParseError::MissingColumn("time"))
        );
    }

    #[test]
    fn header_is_case_insensitive_and_reorderable() {
        let candles = parse(
            " Volume , CLOSE,Low,High,Open,TimeStamp\r\n10,1.5,0.5,2,1,1700000000000\r\n",
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
    fn timestamp_does_not_satisfy_other_columns() {
        assert_eq!(
            parse("timestamp,open,high,low,close\n1,1,1,1,1\n"),
            Err(ParseError::MissingColumn("volume"))
        );
    }

    #[test]
    fn blank_lines_are_skipped_but_counted() {
        let err = parse("time,open,high,low,close,volume\n1,1,1,1,1,1\n\n3,1,1,1,1,-1\n").unwrap_err();
        assert_eq!(err, ParseError::NegativeValue { row: 4 });
    }

    #[test]
    fn preserves_input_order() {
        let candles = parse("time,open,high,low,close,volume\n3,1,1,1,1,1\n1,1,1,1,1,1\n2,1,1,1,1,1\n")
            .unwrap();
        let times: Vec<u64> = candles.iter().map(|candle| candle.time / 1_000_000).collect();
        assert_eq!(times, vec![3, 1, 2]);
    }

    #[test]
    fn bad_cells() {
        assert_eq!(
            parse("time,open,high,low,close,volume\nlater,1,1,1,1,1\n"),
            Err(ParseError::InvalidTimeFormat { row: 2 })
        );
        assert_eq!(
            parse("time,open,high,low,close,volume\n1,1,1,1,abc,1\n"),
            Err(ParseError::NonNumericOhlcv { row: 2 })
        );
        assert_eq!(
            parse("time,open,high,low,close,volume\n1,1,1,1\n"),
            Err(ParseError::NonNumericOhlcv { row: 2 })
        );
    }

    #[test]
    fn dates_past_nanosecond_range_are_invalid() {
        // 2554-07-21 is the last day that fits u64 nanoseconds.
        assert_eq!(
            parse("time,open,high,low,close,volume\n3000-01-01,1,1,1,1,1\n"),
            Err(ParseError::InvalidTimeFormat { row: 2 })
        );
        assert!(parse("time,open,high,low,close,volume\n2554-07-21,1,1,1,1,1\n").is_ok());
    }
}
