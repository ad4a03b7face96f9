use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 投稿の識別子。永続ストアの採番値をそのまま保持する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(i64);

impl PostId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PostId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for PostId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|err| format!("Invalid PostId: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_numeric_value() {
        assert!(PostId::new(2) < PostId::new(10));
    }

    #[test]
    fn parses_from_string() {
        assert_eq!("17".parse::<PostId>().unwrap(), PostId::new(17));
        assert!("abc".parse::<PostId>().is_err());
    }
}
