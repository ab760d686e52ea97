//! Tolerant decoding for Hasura `numeric` columns.
//!
//! Hasura renders `numeric` as a JSON number by default but as a string when
//! `HASURA_GRAPHQL_STRINGIFY_NUMERIC_TYPES` is on. Both are accepted.

use serde::{Deserialize, Deserializer, de::Error as _};

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
  Number(f64),
  Text(String),
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
  match Raw::deserialize(deserializer)? {
    Raw::Number(n) => Ok(n),
    Raw::Text(s) => s
      .trim()
      .parse()
      .map_err(|_| D::Error::custom(format!("invalid numeric value: {s:?}"))),
  }
}

#[cfg(test)]
mod tests {
  use serde::Deserialize;

  #[derive(Deserialize)]
  struct Row {
    #[serde(deserialize_with = "super::deserialize")]
    n: f64,
  }

  #[test]
  fn accepts_numbers_and_strings() {
    let a: Row = serde_json::from_str(r#"{"n": 12.5}"#).unwrap();
    let b: Row = serde_json::from_str(r#"{"n": "12500"}"#).unwrap();
    assert_eq!(a.n, 12.5);
    assert_eq!(b.n, 12500.0);
    assert!(serde_json::from_str::<Row>(r#"{"n": "abc"}"#).is_err());
  }
}
