//! Identity markers written onto every spawned companion object.
//!
//! Format: `companion:<role>:<owner-uuid>:<definition-id>`. The orphan
//! scanner and interaction protection only trust what parses back.

use uuid::Uuid;

use crate::owner::OwnerId;

pub const MARKER_PREFIX: &str = "companion:";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Primary,
    Knot,
    Anchor,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Knot => "knot",
            Self::Anchor => "anchor",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "primary" => Some(Self::Primary),
            "knot" => Some(Self::Knot),
            "anchor" => Some(Self::Anchor),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectMarker {
    pub role: Role,
    pub owner: OwnerId,
    pub companion: String,
}

impl ObjectMarker {
    pub fn new(role: Role, owner: OwnerId, companion: impl Into<String>) -> Self {
        Self { role, owner, companion: companion.into() }
    }

    pub fn encode(&self) -> String {
        format!("{MARKER_PREFIX}{}:{}:{}", self.role.as_str(), self.owner, self.companion)
    }

    pub fn parse(text: &str) -> MarkerText {
        let Some(rest) = text.strip_prefix(MARKER_PREFIX) else {
            return MarkerText::Foreign;
        };
        match Self::parse_fields(rest) {
            Some(m) => MarkerText::Companion(m),
            None => MarkerText::Malformed,
        }
    }

    fn parse_fields(rest: &str) -> Option<Self> {
        let mut parts = rest.splitn(3, ':');
        let role = Role::parse(parts.next()?)?;
        let owner = Uuid::parse_str(parts.next()?).ok()?;
        let companion = parts.next().filter(|c| !c.is_empty())?;
        Some(Self::new(role, OwnerId(owner), companion))
    }
}

/// Outcome of reading an object's marker text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkerText {
    /// Not a companion object.
    Foreign,
    /// Carries the companion prefix but does not parse.
    Malformed,
    Companion(ObjectMarker),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_parse_and_reject() {
        let owner = OwnerId::random();
        let m = ObjectMarker::new(Role::Knot, owner, "red:balloon");
        assert_eq!(ObjectMarker::parse(&m.encode()), MarkerText::Companion(m));
        assert_eq!(ObjectMarker::parse("villager"), MarkerText::Foreign);
        assert_eq!(ObjectMarker::parse("companion:primary:not-a-uuid:x"), MarkerText::Malformed);
        assert_eq!(ObjectMarker::parse(&format!("companion:primary:{owner}:")), MarkerText::Malformed);
    }
}
