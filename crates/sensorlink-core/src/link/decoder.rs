//! Datagram decoding
//!
//! Payload format: `ambient,humidity,pressure,thermistor1,thermistor2` as
//! UTF-8 decimal text. Decoding is all-or-nothing per datagram.

use chrono::{DateTime, Local};

use super::{DecodeError, MAX_DATAGRAM_SIZE};
use crate::reading::{Channel, Reading, SensorSample, FIELD_COUNT};
use crate::session::Session;

/// Parse a raw payload into its five sensor values
///
/// Surrounding whitespace on each field is ignored, so a trailing newline
/// from the firmware is accepted. NaN and infinities are rejected.
pub fn parse_payload(payload: &[u8]) -> Result<SensorSample, DecodeError> {
    if payload.len() > MAX_DATAGRAM_SIZE {
        return Err(DecodeError::TooLarge {
            size: payload.len(),
            max: MAX_DATAGRAM_SIZE,
        });
    }

    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8)?;

    let fields: Vec<&str> = text.split(',').collect();
    if fields.len() != FIELD_COUNT {
        return Err(DecodeError::FieldCount {
            expected: FIELD_COUNT,
            actual: fields.len(),
        });
    }

    let mut values = [0.0f64; FIELD_COUNT];
    for (index, (field, channel)) in fields.iter().zip(Channel::ALL).enumerate() {
        let trimmed = field.trim();
        let value: f64 = trimmed.parse().map_err(|_| DecodeError::InvalidNumber {
            index,
            column: channel.column(),
            value: trimmed.to_string(),
        })?;

        if !value.is_finite() {
            return Err(DecodeError::NonFinite {
                index,
                column: channel.column(),
            });
        }

        values[index] = value;
    }

    Ok(SensorSample::from_fields(values))
}

/// Decode a datagram and stamp it with the session context
///
/// The reading receives `now` as its arrival time, the session's current
/// event tag, and the elapsed test time if a test is running.
pub fn decode(
    payload: &[u8],
    session: &Session,
    now: DateTime<Local>,
) -> Result<Reading, DecodeError> {
    let sample = parse_payload(payload)?;
    Ok(Reading::new(
        now,
        sample,
        session.event_tag(),
        session.elapsed(now),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_payload() {
        let sample = parse_payload(b"25.0,40.0,1013.0,24.5,25.1").unwrap();
        assert_eq!(sample.ambient, 25.0);
        assert_eq!(sample.humidity, 40.0);
        assert_eq!(sample.pressure, 1013.0);
        assert_eq!(sample.thermistor1, 24.5);
        assert_eq!(sample.thermistor2, 25.1);
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        let sample = parse_payload(b" 21.5 , 55 ,1001.25,\t20.0,19.75\r\n").unwrap();
        assert_eq!(sample.ambient, 21.5);
        assert_eq!(sample.humidity, 55.0);
        assert_eq!(sample.thermistor2, 19.75);
    }

    #[test]
    fn test_parse_negative_and_exponent() {
        let sample = parse_payload(b"-5.5,1e1,9.8e2,-0.25,0").unwrap();
        assert_eq!(sample.ambient, -5.5);
        assert_eq!(sample.humidity, 10.0);
        assert_eq!(sample.pressure, 980.0);
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(
            parse_payload(b""),
            Err(DecodeError::FieldCount {
                expected: 5,
                actual: 1
            })
        );
    }

    #[test]
    fn test_wrong_field_count() {
        assert!(matches!(
            parse_payload(b"1,2,3,4"),
            Err(DecodeError::FieldCount { actual: 4, .. })
        ));
        assert!(matches!(
            parse_payload(b"1,2,3,4,5,6"),
            Err(DecodeError::FieldCount { actual: 6, .. })
        ));
        assert!(matches!(
            parse_payload(b"1,2,3,4,5,"),
            Err(DecodeError::FieldCount { actual: 6, .. })
        ));
    }

    #[test]
    fn test_non_numeric_field() {
        let err = parse_payload(b"25.0,40.0,abc,24.5,25.1").unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidNumber {
                index: 2,
                column: "Pres",
                value: "abc".to_string()
            }
        );
        assert!(matches!(
            parse_payload(b"25.0,,1013.0,24.5,25.1"),
            Err(DecodeError::InvalidNumber { index: 1, .. })
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(matches!(
            parse_payload(b"NaN,40.0,1013.0,24.5,25.1"),
            Err(DecodeError::NonFinite { index: 0, .. })
        ));
        assert!(matches!(
            parse_payload(b"25.0,40.0,1013.0,inf,25.1"),
            Err(DecodeError::NonFinite { index: 3, .. })
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        assert_eq!(
            parse_payload(&[0xff, 0xfe, b',', b'1']),
            Err(DecodeError::InvalidUtf8)
        );
    }

    #[test]
    fn test_oversized_payload() {
        let payload = vec![b'1'; MAX_DATAGRAM_SIZE + 1];
        assert!(matches!(
            parse_payload(&payload),
            Err(DecodeError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_arbitrary_bytes_never_panic() {
        // Deterministic pseudo-random byte soup
        let mut state: u32 = 0x1234_5678;
        for len in 0..200 {
            let payload: Vec<u8> = (0..len)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 17;
                    state ^= state << 5;
                    (state & 0xff) as u8
                })
                .collect();
            let _ = parse_payload(&payload);
        }
    }
}
