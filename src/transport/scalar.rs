use serde::Deserialize;
use serde::de::Error as DeError;

/// Scalar returned by SUBMAIL as either a JSON string or a JSON number.
///
/// Credits, fees, codes and ids are all seen in both shapes depending on the
/// endpoint. For numbers the raw JSON token is kept, so `10.00` stays
/// `"10.00"` instead of becoming `"10.0"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportScalar(String);

impl TransportScalar {
    pub fn into_string(self) -> String {
        self.0
    }

    /// Integer value, if the scalar holds one (surrounding whitespace ignored).
    pub fn to_i64(&self) -> Option<i64> {
        self.0.trim().parse::<i64>().ok()
    }

    pub fn to_u32(&self) -> Option<u32> {
        self.0.trim().parse::<u32>().ok()
    }
}

impl<'de> Deserialize<'de> for TransportScalar {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw: Box<serde_json::value::RawValue> = Deserialize::deserialize(deserializer)?;
        let token = raw.get();

        match token.as_bytes().first().copied() {
            Some(b'"') => {
                let parsed = serde_json::from_str::<String>(token).map_err(D::Error::custom)?;
                Ok(Self(parsed))
            }
            Some(b'-' | b'0'..=b'9') => Ok(Self(token.to_owned())),
            _ => Err(D::Error::custom("expected JSON string or number")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Holder {
        value: TransportScalar,
    }

    #[test]
    fn keeps_numeric_tokens_verbatim() {
        let holder: Holder = serde_json::from_str(r#"{"value": 10.00}"#).unwrap();
        assert_eq!(holder.value.into_string(), "10.00");
    }

    #[test]
    fn parses_integers_from_strings_and_numbers() {
        let holder: Holder = serde_json::from_str(r#"{"value": " 151 "}"#).unwrap();
        assert_eq!(holder.value.to_i64(), Some(151));

        let holder: Holder = serde_json::from_str(r#"{"value": 2}"#).unwrap();
        assert_eq!(holder.value.to_u32(), Some(2));
    }

    #[test]
    fn rejects_other_json_shapes() {
        assert!(serde_json::from_str::<Holder>(r#"{"value": true}"#).is_err());
        assert!(serde_json::from_str::<Holder>(r#"{"value": null}"#).is_err());
    }
}
