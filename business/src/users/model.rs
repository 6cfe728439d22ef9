//! Wire and domain types for user administration.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value, json};
use ustr::Ustr;

use super::error::ValidationError;

/// Account status. The backend sends either a boolean or a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserStatus {
    Active,
    #[default]
    Inactive,
}

impl UserStatus {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }
}

impl From<bool> for UserStatus {
    fn from(active: bool) -> Self {
        if active { Self::Active } else { Self::Inactive }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

impl Serialize for UserStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.is_active())
    }
}

impl<'de> Deserialize<'de> for UserStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Flag(bool),
            Label(String),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Flag(active) => Ok(active.into()),
            Wire::Label(label) => match label.to_ascii_lowercase().as_str() {
                "active" | "enabled" | "true" => Ok(Self::Active),
                "inactive" | "disabled" | "false" => Ok(Self::Inactive),
                other => Err(serde::de::Error::custom(format!(
                    "unknown user status `{other}`"
                ))),
            },
        }
    }
}

/// One user as returned by the list and detail endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(alias = "_id")]
    pub id: Ustr,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub plan_id: Option<Ustr>,
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default)]
    pub is_limit: bool,
    #[serde(default)]
    pub allowed_sessions: u32,
    #[serde(default)]
    pub wallet_balance: Option<f64>,
}

impl UserRecord {
    /// Bare record with only an id; handy in tests and for CLI targets.
    pub fn with_id(id: impl AsRef<str>) -> Self {
        Self {
            id: Ustr::from(id.as_ref()),
            first_name: None,
            last_name: None,
            username: None,
            email: None,
            mobile: None,
            status: UserStatus::default(),
            plan_id: None,
            plan_name: None,
            is_limit: false,
            allowed_sessions: 0,
            wallet_balance: None,
        }
    }

    /// Full name, else username, else email, else id.
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }

        [self.username.as_deref(), self.email.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map_or_else(|| self.id.to_string(), str::to_owned)
    }

    pub fn session_limit(&self) -> SessionLimit {
        SessionLimit::from_wire(self.is_limit, self.allowed_sessions)
    }

    pub fn has_plan(&self) -> bool {
        self.plan_id.is_some_and(|id| !id.is_empty())
    }
}

/// Concurrent-session policy for one user.
///
/// The backend stores a flag plus a count; a flag with count 0 means the
/// user cannot open any session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionLimit {
    #[default]
    Unrestricted,
    Blocked,
    Capped(NonZeroU32),
}

impl SessionLimit {
    pub fn from_wire(is_limit: bool, allowed_sessions: u32) -> Self {
        if !is_limit {
            return Self::Unrestricted;
        }
        NonZeroU32::new(allowed_sessions).map_or(Self::Blocked, Self::Capped)
    }

    /// `(isLimit, allowedSessions)` as the backend expects them.
    pub fn to_wire(self) -> (bool, u32) {
        match self {
            Self::Unrestricted => (false, 0),
            Self::Blocked => (true, 0),
            Self::Capped(n) => (true, n.get()),
        }
    }
}

impl fmt::Display for SessionLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrestricted => write!(f, "unlimited"),
            Self::Blocked => write!(f, "blocked"),
            Self::Capped(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for SessionLimit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "unlimited" | "unrestricted" => return Ok(Self::Unrestricted),
            "blocked" => return Ok(Self::Blocked),
            _ => {}
        }

        let n: i64 = trimmed
            .parse()
            .map_err(|_| ValidationError::InvalidSessionCap(trimmed.to_owned()))?;
        if n < 0 {
            return Err(ValidationError::NegativeSessionCap);
        }
        let n = u32::try_from(n).map_err(|_| ValidationError::InvalidSessionCap(trimmed.to_owned()))?;
        NonZeroU32::new(n)
            .map(Self::Capped)
            .ok_or(ValidationError::AmbiguousZeroSessionCap)
    }
}

/// Text filters for the user list. Blank fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
}

impl FilterCriteria {
    fn clauses(&self) -> Map<String, Value> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("mobile", &self.mobile),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            let value = value.as_deref()?.trim();
            (!value.is_empty()).then(|| (key.to_owned(), Value::String(value.to_owned())))
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses().is_empty()
    }

    /// JSON `{"where": {...}}` for the `filter` query parameter, or `None`
    /// when every field is blank.
    pub fn to_query_value(&self) -> Option<String> {
        let clauses = self.clauses();
        if clauses.is_empty() {
            return None;
        }
        Some(json!({ "where": clauses }).to_string())
    }
}

/// Position in the paginated user list. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: crate::config::DEFAULT_PAGE_SIZE,
            total: 0,
        }
    }
}

impl PageState {
    pub fn page_count(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        let pages = self.total.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Clamp a requested page into `1..=page_count` (page 1 when empty).
    pub fn clamp_page(&self, page: u32) -> u32 {
        page.clamp(1, self.page_count().max(1))
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Zero-based index of the first row on the current page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// One fetched page of users.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPage {
    pub records: Vec<UserRecord>,
    pub total: u64,
}

/// A subscription plan that can be assigned to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(alias = "_id")]
    pub id: Ustr,
    #[serde(default, alias = "title")]
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Body of the full user update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub mobile: String,
}
