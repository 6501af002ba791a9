//! Route segment model

use serde::{Deserialize, Serialize};

/// One `from -> to` leg of a route, tagged with a highway identifier
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Segment {
    pub from: String,
    pub to: String,
    pub highway: String,
}

impl Segment {
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>, highway: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            highway: highway.into(),
        }
    }

    /// Key used for the per-request traffic cache
    #[must_use]
    pub fn city_pair(&self) -> (String, String) {
        (self.from.clone(), self.to.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_serializes_with_plain_keys() {
        let segment = Segment::new("Delhi", "Kanpur", "NH2");
        let json = serde_json::to_value(&segment).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"from": "Delhi", "to": "Kanpur", "highway": "NH2"})
        );
    }
}
