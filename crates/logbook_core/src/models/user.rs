use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity: the external identity provider's user id
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[serde(alias = "student")]
    Student,
    #[serde(alias = "faculty")]
    Faculty,
    #[serde(alias = "hod")]
    Hod,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Faculty => "FACULTY",
            Role::Hod => "HOD",
        }
    }

    /// Faculty and HOD may sign or reject submitted entries.
    pub fn is_reviewer(&self) -> bool {
        matches!(self, Role::Faculty | Role::Hod)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STUDENT" => Ok(Role::Student),
            "FACULTY" => Ok(Role::Faculty),
            "HOD" => Ok(Role::Hod),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Local shadow of an identity-provider user
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub role: Role,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub batch_id: Option<Uuid>,
    pub semester: Option<i32>,
    pub banned: bool,

    #[serde(with = "time::serde::iso8601")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::iso8601")]
    pub updated_at: OffsetDateTime,
}

/// A cohort of students grouped by admission year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub name: String,
    pub admission_year: i32,
}

impl Batch {
    pub fn new(name: impl Into<String>, admission_year: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            admission_year,
        }
    }
}
