//! User accounts: managers, ambassadors and customers.

use super::{lenient_timestamp, lenient_u64, null_default, Record};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a user. The backend populates exactly one of `id` (numeric)
/// or `_id` (string key).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserId {
    Numeric(u64),
    Key(String),
}

impl UserId {
    /// Parse an id typed by the operator.
    pub fn parse(s: &str) -> Self {
        match s.parse::<u64>() {
            Ok(n) => Self::Numeric(n),
            Err(_) => Self::Key(s.to_string()),
        }
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{}", n),
            Self::Key(k) => f.write_str(k),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Manager,
    Ambassador,
    Customer,
    Other(String),
}

impl Role {
    /// Accepts every spelling seen on the wire (`SGManager`, `S/G Manager`,
    /// `ambassador`, ...).
    pub fn parse(s: &str) -> Self {
        let folded: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match folded.as_str() {
            "sgmanager" | "manager" | "salesandgrowthmanager" => Self::Manager,
            "ambassador" => Self::Ambassador,
            "customer" => Self::Customer,
            _ => Self::Other(s.to_string()),
        }
    }

    /// Name sent to the server.
    pub fn wire_name(&self) -> &str {
        match self {
            Self::Manager => "SGManager",
            Self::Ambassador => "ambassador",
            Self::Customer => "customer",
            Self::Other(s) => s,
        }
    }

    /// Name shown to the operator.
    pub fn label(&self) -> &str {
        match self {
            Self::Manager => "S/G Manager",
            Self::Ambassador => "Ambassador",
            Self::Customer => "Customer",
            Self::Other(s) => s,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Role> for String {
    fn from(r: Role) -> Self {
        r.wire_name().to_string()
    }
}

/// Descriptive status label. May disagree with the `suspended` flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserStatus {
    Active,
    Suspended,
    Inactive,
    Other(String),
}

impl UserStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "suspended" => Self::Suspended,
            "inactive" => Self::Inactive,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "Active",
            Self::Suspended => "Suspended",
            Self::Inactive => "Inactive",
            Self::Other(s) => s,
        }
    }
}

impl Default for UserStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for UserStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<UserStatus> for String {
    fn from(s: UserStatus) -> Self {
        s.as_str().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    #[serde(default)]
    pub total_sales: f64,
    #[serde(default)]
    pub total_commission: f64,
    #[serde(default)]
    pub active_clients: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub role: Role,
    #[serde(default, deserialize_with = "null_default")]
    pub status: UserStatus,
    /// Authoritative suspension indicator.
    #[serde(default, deserialize_with = "null_default")]
    pub suspended: bool,
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub performance: Option<Performance>,
}

impl User {
    /// `_id` wins when both are present.
    pub fn user_id(&self) -> Option<UserId> {
        match (&self.key, self.id) {
            (Some(key), _) if !key.is_empty() => Some(UserId::Key(key.clone())),
            (_, Some(n)) => Some(UserId::Numeric(n)),
            _ => None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .take(1)
            .chain(self.last_name.chars().take(1))
            .collect::<String>()
            .to_uppercase()
    }

    /// Single state derived from the flag and the label; the flag wins.
    pub fn account_state(&self) -> AccountState {
        if self.suspended {
            return AccountState::Suspended;
        }
        match &self.status {
            UserStatus::Active => AccountState::Active,
            UserStatus::Inactive => AccountState::Inactive,
            // Label says suspended but the flag doesn't; the flag is authoritative
            UserStatus::Suspended => AccountState::Unknown("Suspended".to_string()),
            UserStatus::Other(s) => AccountState::Unknown(s.clone()),
        }
    }
}

impl Record for User {
    fn row_key(&self) -> String {
        self.user_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| self.email.clone())
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
        ]
    }

    fn created(&self) -> Option<DateTime<Utc>> {
        self.created_date.or(self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountState {
    Active,
    Inactive,
    Suspended,
    Unknown(String),
}

/// Which endpoint a suspension toggle calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspensionCommand {
    Suspend,
    Activate,
}

impl AccountState {
    pub fn suspension_command(&self) -> SuspensionCommand {
        match self {
            Self::Suspended => SuspensionCommand::Activate,
            _ => SuspensionCommand::Suspend,
        }
    }
}

impl SuspensionCommand {
    /// Verb for the confirmation prompt.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Suspend => "suspend",
            Self::Activate => "reactivate",
        }
    }

    /// Past tense for the notification.
    pub fn past(&self) -> &'static str {
        match self {
            Self::Suspend => "suspended",
            Self::Activate => "activated",
        }
    }
}

/// Input for creating a user; the fetcher stamps role, status and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.status.is_none()
    }

    /// The user as it would look after the patch.
    pub fn apply_to(&self, user: &User) -> User {
        let mut next = user.clone();
        if let Some(v) = &self.first_name {
            next.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            next.last_name = v.clone();
        }
        if let Some(v) = &self.email {
            next.email = v.clone();
        }
        if let Some(v) = &self.phone {
            next.phone = Some(v.clone());
        }
        if let Some(v) = &self.status {
            next.status = v.clone();
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_with_string_key_and_created_at() {
        let user: User = serde_json::from_value(json!({
            "_id": "665f1c",
            "firstName": "Ada",
            "lastName": "Obi",
            "email": "ada@example.com",
            "role": "S/G Manager",
            "status": "Active",
            "suspended": false,
            "createdAt": "2024-07-14T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(user.user_id(), Some(UserId::Key("665f1c".to_string())));
        assert_eq!(user.role, Role::Manager);
        assert!(user.created().is_some());
        assert_eq!(user.initials(), "AO");
    }

    #[test]
    fn test_decode_numeric_id_and_bad_date() {
        let user: User = serde_json::from_value(json!({
            "id": "17",
            "firstName": "Tunde",
            "lastName": "Bello",
            "email": "t@example.com",
            "role": "ambassador",
            "status": "Pending",
            "suspended": null,
            "createdDate": "not a date",
            "phone": null
        }))
        .unwrap();
        assert_eq!(user.user_id(), Some(UserId::Numeric(17)));
        assert_eq!(user.role, Role::Ambassador);
        assert_eq!(user.status, UserStatus::Other("Pending".to_string()));
        assert!(!user.suspended);
        assert!(user.created().is_none());
        assert!(user.phone.is_none());
    }

    #[test]
    fn test_both_timestamps_prefers_created_date() {
        let user: User = serde_json::from_value(json!({
            "_id": "a",
            "role": "customer",
            "createdDate": "2024-01-01T00:00:00Z",
            "createdAt": "2024-02-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(user.created_day().unwrap().to_string(), "2024-01-01");
    }

    #[test]
    fn test_role_spellings() {
        assert_eq!(Role::parse("SGManager"), Role::Manager);
        assert_eq!(Role::parse("S/G Manager"), Role::Manager);
        assert_eq!(Role::parse("Ambassador"), Role::Ambassador);
        assert_eq!(Role::parse("Customer"), Role::Customer);
        assert_eq!(Role::parse("admin"), Role::Other("admin".to_string()));
        assert_eq!(String::from(Role::Manager), "SGManager");
    }

    #[test]
    fn test_flag_wins_over_label() {
        let mut user: User = serde_json::from_value(json!({
            "_id": "a", "role": "SGManager", "status": "Active", "suspended": true
        }))
        .unwrap();
        assert_eq!(user.account_state(), AccountState::Suspended);
        assert_eq!(
            user.account_state().suspension_command(),
            SuspensionCommand::Activate
        );

        user.suspended = false;
        user.status = UserStatus::Suspended;
        assert_eq!(
            user.account_state().suspension_command(),
            SuspensionCommand::Suspend
        );
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = UserPatch {
            phone: Some("+2348000000000".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({ "phone": "+2348000000000" })
        );
        assert!(!patch.is_empty());
        assert!(UserPatch::default().is_empty());
    }

    #[test]
    fn test_user_id_parse() {
        assert_eq!(UserId::parse("12"), UserId::Numeric(12));
        assert_eq!(UserId::parse("64af"), UserId::Key("64af".to_string()));
        assert_eq!(UserId::Key("64af".to_string()).to_string(), "64af");
    }
}
