//! Operation tags.

/// Operations understood by the relay endpoints.
///
/// Tags are carried verbatim in the `operation` field of every message.
/// Unrecognized tags are kept as strings on [`crate::Message`]; this enum
/// only names the ones the endpoints act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Request for (or reply carrying) the user's verified email
    GetVerifiedEmail,
    /// Service asks the wrapper to open a login window
    Popup,
    /// Service asks the wrapper to close the login window
    ClosePopup,
    /// Login window reports the outcome of authentication
    Login,
    /// Service reply to an unsolicited message it does not understand
    Unknown,
}

impl Operation {
    /// Wire tag for this operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetVerifiedEmail => "getVerifiedEmail",
            Operation::Popup => "popup",
            Operation::ClosePopup => "closePopup",
            Operation::Login => "login",
            Operation::Unknown => "unknown",
        }
    }

    /// Parse a wire tag.
    ///
    /// Returns `None` for tags outside the protocol.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "getVerifiedEmail" => Some(Operation::GetVerifiedEmail),
            "popup" => Some(Operation::Popup),
            "closePopup" => Some(Operation::ClosePopup),
            "login" => Some(Operation::Login),
            "unknown" => Some(Operation::Unknown),
            _ => None,
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_parse_back() {
        for op in [
            Operation::GetVerifiedEmail,
            Operation::Popup,
            Operation::ClosePopup,
            Operation::Login,
            Operation::Unknown,
        ] {
            assert_eq!(Operation::from_tag(op.as_str()), Some(op));
        }
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        assert_eq!(Operation::from_tag("GetVerifiedEmail"), None);
        assert_eq!(Operation::from_tag("closepopup"), None);
        assert_eq!(Operation::from_tag(""), None);
    }
}
