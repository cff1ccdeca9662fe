//! Callback payloads carried by inline keyboard buttons
//!
//! Buttons carry `program_<id>`, `enterprise_<id>` or `mentor_<id>`. The
//! payload is parsed once, where the callback enters the bot, into a
//! [`Selection`] and dispatched on its [`SelectionKind`].

use std::fmt;
use std::str::FromStr;

use crate::constants::MAX_CALLBACK_DATA_LEN;
use crate::error::ConversationError;

/// Which registration step a selection answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionKind {
    Program,
    Enterprise,
    Mentor,
}

impl SelectionKind {
    /// Payload prefix used on the wire
    pub fn prefix(self) -> &'static str {
        match self {
            SelectionKind::Program => "program",
            SelectionKind::Enterprise => "enterprise",
            SelectionKind::Mentor => "mentor",
        }
    }

    /// Wording shown to users
    pub fn noun(self) -> &'static str {
        match self {
            SelectionKind::Program => "program",
            SelectionKind::Enterprise => "social enterprise",
            SelectionKind::Mentor => "mentor",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "program" => Some(SelectionKind::Program),
            "enterprise" => Some(SelectionKind::Enterprise),
            "mentor" => Some(SelectionKind::Mentor),
            _ => None,
        }
    }
}

impl fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// A parsed callback payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub kind: SelectionKind,
    pub id: String,
}

impl Selection {
    pub fn new(kind: SelectionKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }

    /// Encode as callback data
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind.prefix(), self.id)
    }
}

impl FromStr for Selection {
    type Err = ConversationError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        if data.len() > MAX_CALLBACK_DATA_LEN {
            return Err(ConversationError::InvalidSelection(format!(
                "callback data too long: {} bytes",
                data.len()
            )));
        }

        let (prefix, id) = data
            .split_once('_')
            .ok_or_else(|| ConversationError::InvalidSelection(data.to_string()))?;

        let kind = SelectionKind::from_prefix(prefix)
            .ok_or_else(|| ConversationError::InvalidSelection(data.to_string()))?;

        if id.is_empty() {
            return Err(ConversationError::InvalidSelection(data.to_string()));
        }

        Ok(Selection::new(kind, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kinds() {
        assert_eq!(
            "program_p1".parse::<Selection>().unwrap(),
            Selection::new(SelectionKind::Program, "p1")
        );
        assert_eq!(
            "enterprise_e1".parse::<Selection>().unwrap(),
            Selection::new(SelectionKind::Enterprise, "e1")
        );
        assert_eq!(
            "mentor_m1".parse::<Selection>().unwrap(),
            Selection::new(SelectionKind::Mentor, "m1")
        );
    }

    #[test]
    fn test_id_may_contain_separator() {
        let selection = "mentor_a_b".parse::<Selection>().unwrap();
        assert_eq!(selection.kind, SelectionKind::Mentor);
        assert_eq!(selection.id, "a_b");
    }

    #[test]
    fn test_uuid_ids() {
        let data = "enterprise_0b6f1c1e-58a4-4f4b-9a43-2d6f4f0e9c11";
        let selection = data.parse::<Selection>().unwrap();
        assert_eq!(selection.id, "0b6f1c1e-58a4-4f4b-9a43-2d6f4f0e9c11");
        assert_eq!(selection.encode(), data);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!("".parse::<Selection>().is_err());
        assert!("program".parse::<Selection>().is_err());
        assert!("program_".parse::<Selection>().is_err());
        assert!("cmd_list".parse::<Selection>().is_err());
        assert!("Program_p1".parse::<Selection>().is_err());
        assert!(matches!(
            "page:2".parse::<Selection>(),
            Err(ConversationError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_payload() {
        let data = format!("program_{}", "x".repeat(MAX_CALLBACK_DATA_LEN));
        assert!(data.parse::<Selection>().is_err());
    }

    #[test]
    fn test_display_matches_encode() {
        let selection = Selection::new(SelectionKind::Enterprise, "e9");
        assert_eq!(selection.to_string(), selection.encode());
        assert_eq!(SelectionKind::Enterprise.to_string(), "social enterprise");
    }
}
