//! Port addressing
//!
//! A port is the (building, direction, item) triple a connection attaches to.
//! Front ends that need one flat handle id per port can use [`encode`] and
//! [`decode`]; the building id is length-prefixed so any character, including
//! the separator, may appear in either identifier.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MalformedPortId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn is_input(self) -> bool {
        self == Direction::Input
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Input => Direction::Output,
            Direction::Output => Direction::Input,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Direction::Input => "in",
            Direction::Output => "out",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Port {
    pub building: String,
    pub direction: Direction,
    pub item: String,
}

impl Port {
    pub fn new(building: impl Into<String>, direction: Direction, item: impl Into<String>) -> Self {
        Self {
            building: building.into(),
            direction,
            item: item.into(),
        }
    }

    pub fn input(building: impl Into<String>, item: impl Into<String>) -> Self {
        Self::new(building, Direction::Input, item)
    }

    pub fn output(building: impl Into<String>, item: impl Into<String>) -> Self {
        Self::new(building, Direction::Output, item)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

/// Flatten a port into `<len>:<building>:<in|out>:<item>`.
pub fn encode(port: &Port) -> String {
    format!(
        "{}:{}:{}:{}",
        port.building.len(),
        port.building,
        port.direction.tag(),
        port.item
    )
}

/// Inverse of [`encode`].
pub fn decode(id: &str) -> Result<Port, MalformedPortId> {
    let malformed = || MalformedPortId(id.to_string());

    let (len, rest) = id.split_once(':').ok_or_else(malformed)?;
    if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let len: usize = len.parse().map_err(|_| malformed())?;
    if !rest.is_char_boundary(len.min(rest.len())) || rest.len() < len {
        return Err(malformed());
    }
    let (building, rest) = rest.split_at(len);

    let rest = rest.strip_prefix(':').ok_or_else(malformed)?;
    let (tag, item) = rest.split_once(':').ok_or_else(malformed)?;
    let direction = match tag {
        "in" => Direction::Input,
        "out" => Direction::Output,
        _ => return Err(malformed()),
    };

    Ok(Port::new(building, direction, item))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_inside_components_survives() {
        let port = Port::output("a:b:out:c", "x:y");
        let encoded = encode(&port);
        assert_eq!(encoded, "9:a:b:out:c:out:x:y");
        assert_eq!(decode(&encoded).unwrap(), port);
    }

    #[test]
    fn encoding_distinguishes_direction() {
        assert_ne!(
            encode(&Port::input("b1", "Iron")),
            encode(&Port::output("b1", "Iron"))
        );
    }

    #[test]
    fn empty_components_are_allowed() {
        let port = Port::input("", "");
        assert_eq!(decode(&encode(&port)).unwrap(), port);
    }

    #[test]
    fn rejects_malformed_ids() {
        for bad in [
            "",
            "b1-true-Iron",
            "x:b1:in:Iron",
            "+2:b1:in:Iron",
            "2:b1:sideways:Iron",
            "2:b1in:Iron",
            "99:b1:in:Iron",
            "2:b1:in",
        ] {
            assert!(decode(bad).is_err(), "{bad} should not decode");
        }
    }

    #[test]
    fn length_prefix_counts_bytes_not_chars() {
        let port = Port::input("wärme", "Öl");
        assert_eq!(decode(&encode(&port)).unwrap(), port);
        // A prefix that lands inside a multi-byte character is rejected, not a panic.
        assert!(decode("1:ä:in:Öl").is_err());
    }
}
