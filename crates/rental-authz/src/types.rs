//! Core vocabulary: roles and the opaque resource/action/scope tokens.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;

/// Role assigned to the caller by the identity layer.
///
/// The set of recognized roles is closed. Anything else (including an empty
/// or absent role) becomes `Unknown`, which is a valid value that every check
/// answers with deny.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Admin,
    Manager,
    Executive,
    Member,
    Client,
    Partner,
    Guest,
    Unknown(String),
}

impl Role {
    /// All recognized roles, in declaration order.
    pub const RECOGNIZED: [Role; 7] = [
        Role::Admin,
        Role::Manager,
        Role::Executive,
        Role::Member,
        Role::Client,
        Role::Partner,
        Role::Guest,
    ];

    /// Parses a role name. Exact and case-sensitive; never fails.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("admin") => Role::Admin,
            Some("manager") => Role::Manager,
            Some("executive") => Role::Executive,
            Some("member") => Role::Member,
            Some("client") => Role::Client,
            Some("partner") => Role::Partner,
            Some("guest") => Role::Guest,
            Some(other) => Role::Unknown(other.to_string()),
            None => Role::Unknown(String::new()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Executive => "executive",
            Role::Member => "member",
            Role::Client => "client",
            Role::Partner => "partner",
            Role::Guest => "guest",
            Role::Unknown(raw) => raw.as_str(),
        }
    }

    /// Returns false for `Unknown`.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Role::Unknown(_))
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        Role::parse(Some(raw))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Unknown(raw) => write!(f, "unknown({:?})", raw),
            known => f.write_str(known.as_str()),
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Role::parse(raw.as_deref()))
    }
}

macro_rules! opaque_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_token!(
    /// Name of a protected domain, e.g. `tasks` or `financial`.
    Resource
);

opaque_token!(
    /// Operation attempted on a resource, e.g. `read`.
    Action
);

opaque_token!(
    /// Breadth of data an action covers, e.g. `own` or `all`.
    Scope
);

impl Resource {
    /// Grant token covering every resource. Compared by equality like any
    /// other resource name; it is not a glob.
    pub const WILDCARD: &'static str = "*";

    pub const TASKS: &'static str = "tasks";
    pub const LOFTS: &'static str = "lofts";
    pub const NOTIFICATIONS: &'static str = "notifications";
    pub const FINANCIAL: &'static str = "financial";

    pub fn is_wildcard(&self) -> bool {
        self.0 == Self::WILDCARD
    }
}

impl Action {
    pub const READ: &'static str = "read";
    pub const WRITE: &'static str = "write";
    pub const DELETE: &'static str = "delete";
}

impl Scope {
    pub const ALL: &'static str = "all";
    pub const OWN: &'static str = "own";
    pub const TEAM: &'static str = "team";
    pub const ASSIGNED: &'static str = "assigned";
    /// Recorded on an entry, satisfies any requested scope.
    pub const ANY: &'static str = "any";

    /// True for `all` and `any`: the grant covers every record.
    pub fn is_unrestricted(&self) -> bool {
        self.0 == Self::ALL || self.0 == Self::ANY
    }
}
