use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(UserId);
id_newtype!(ReportId);
id_newtype!(TicketId);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} name: {name:?}")]
pub struct UnknownName {
    pub kind: &'static str,
    pub name: String,
}

/// Generates a closed string-named enum. Names are matched exactly,
/// case-sensitive, in both directions.
macro_rules! named_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownName;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownName {
                        kind: $kind,
                        name: other.to_string(),
                    }),
                }
            }
        }
    };
}

named_enum!(
    /// Exactly one role per user. Roles are flat: no role implies another.
    Role, "role" {
        Admin => "admin",
        Hod => "HOD",
        Ahod => "AHOD",
        Qc => "QC",
        CampusPastor => "campusPastor",
        GlobalPastor => "globalPastor",
        Worker => "worker",
    }
);

named_enum!(
    Department, "department" {
        Media => "Media",
        Ushery => "Ushery",
        Choir => "Choir",
        Protocol => "Protocol",
        Security => "Security",
        Technical => "Technical",
        Children => "Children",
        Sanctuary => "Sanctuary",
        Welfare => "Welfare",
        Prayer => "Prayer",
        Hospitality => "Hospitality",
        Transport => "Transport",
        QualityControl => "QualityControl",
    }
);

/// One entry of an authorization list: either a role or a department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AccessTag {
    Role(Role),
    Department(Department),
}

impl fmt::Display for AccessTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessTag::Role(role) => role.fmt(f),
            AccessTag::Department(department) => department.fmt(f),
        }
    }
}

impl FromStr for AccessTag {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(role) = s.parse::<Role>() {
            return Ok(AccessTag::Role(role));
        }
        if let Ok(department) = s.parse::<Department>() {
            return Ok(AccessTag::Department(department));
        }
        Err(UnknownName {
            kind: "role or department",
            name: s.to_string(),
        })
    }
}

impl TryFrom<String> for AccessTag {
    type Error = UnknownName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccessTag> for String {
    fn from(value: AccessTag) -> Self {
        value.to_string()
    }
}

impl From<Role> for AccessTag {
    fn from(value: Role) -> Self {
        AccessTag::Role(value)
    }
}

impl From<Department> for AccessTag {
    fn from(value: Department) -> Self {
        AccessTag::Department(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<Department>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campus: Option<String>,
    #[serde(default)]
    pub special_workflow_approved: bool,
}

impl User {
    pub fn display_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}
