use crate::{
    Result,
    constants::{MAX_TOKEN_LENGTH, OPTICAL_TOKEN_PREFIX, RADIO_TOKEN_PREFIX},
    error::Error,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;
use tokio::time::Instant;

/// Opaque credential identifier carried by a QR code, a near-field tag or
/// typed by the operator.
///
/// The token value is the only directory lookup key. A `qr_`/`nfc_` prefix
/// is cosmetic and never changes how the token resolves.
///
/// # Security
/// Comparison is constant-time so that matching tokens does not leak how
/// many leading bytes were correct.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token(String);

impl Token {
    /// Create a new token with validation.
    ///
    /// Surrounding whitespace is trimmed. The value is otherwise kept as-is
    /// (tokens are case-sensitive).
    ///
    /// # Errors
    /// Returns `Error::InvalidToken` if:
    /// - The token is empty after trimming
    /// - The token is longer than [`MAX_TOKEN_LENGTH`] bytes
    /// - The token contains control characters
    pub fn new(raw: &str) -> Result<Self> {
        let value = raw.trim();

        if value.is_empty() {
            return Err(Error::InvalidToken("token is empty".to_string()));
        }

        if value.len() > MAX_TOKEN_LENGTH {
            return Err(Error::InvalidToken(format!(
                "token must be at most {MAX_TOKEN_LENGTH} bytes, got {}",
                value.len()
            )));
        }

        if value.chars().any(char::is_control) {
            return Err(Error::InvalidToken(
                "token contains control characters".to_string(),
            ));
        }

        Ok(Token(value.to_string()))
    }

    /// Get the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Channel suggested by the token's namespace prefix, if any.
    ///
    /// Informational only; resolution ignores it.
    #[must_use]
    pub fn namespace_hint(&self) -> Option<Channel> {
        if self.0.starts_with(OPTICAL_TOKEN_PREFIX) {
            Some(Channel::Optical)
        } else if self.0.starts_with(RADIO_TOKEN_PREFIX) {
            Some(Channel::Radio)
        } else {
            None
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Token {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Token::new(s)
    }
}

impl TryFrom<String> for Token {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Token::new(&value)
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for Token {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Input channel a scan was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Camera frame decoding (QR codes).
    Optical,
    /// Near-field radio tag reads.
    Radio,
    /// Token typed by the operator.
    Manual,
}

impl Channel {
    /// All channels, in a stable order.
    pub const ALL: [Channel; 3] = [Channel::Optical, Channel::Radio, Channel::Manual];

    /// Lowercase name, used as the route `channel` parameter.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Optical => "optical",
            Channel::Radio => "radio",
            Channel::Manual => "manual",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optical" | "qr" | "camera" => Ok(Channel::Optical),
            "radio" | "nfc" => Ok(Channel::Radio),
            "manual" | "keyboard" => Ok(Channel::Manual),
            other => Err(Error::UnknownChannel(other.to_string())),
        }
    }
}

/// A raw credential observation, created by a channel adapter the instant its
/// input is decoded.
///
/// Immutable once created; the arbitration gate either admits it (exactly
/// once) or drops it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanEvent {
    /// Decoded credential.
    pub token: Token,

    /// Channel the credential arrived on.
    pub channel: Channel,

    /// Monotonic observation time, used for debounce arithmetic.
    pub observed_at: Instant,

    /// Wall-clock observation time, used for auditing downstream.
    pub captured_at: DateTime<Utc>,
}

impl ScanEvent {
    /// Create a scan event observed now.
    pub fn new(token: Token, channel: Channel) -> Self {
        Self::observed(token, channel, Instant::now())
    }

    /// Create a scan event with an explicit monotonic observation time.
    pub fn observed(token: Token, channel: Channel, observed_at: Instant) -> Self {
        Self {
            token,
            channel,
            observed_at,
            captured_at: Utc::now(),
        }
    }
}

/// Identifier of a student or teacher in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Wrap a raw directory identifier.
    #[must_use]
    pub fn new(id: u64) -> Self {
        EntityId(id)
    }

    /// Get the raw identifier.
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EntityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse()
            .map(EntityId)
            .map_err(|_| Error::InvalidEntityId(s.to_string()))
    }
}

/// Kind of entity a credential belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Student,
    Teacher,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Student => f.write_str("student"),
            EntityKind::Teacher => f.write_str("teacher"),
        }
    }
}

/// Whether a credential may currently be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    Active,
    Revoked,
}

/// A directory record, owned and mutated exclusively by the directory.
///
/// The engine treats it as read-only and never keeps it beyond a single
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub token: Token,
    pub kind: EntityKind,
    pub entity_id: EntityId,
    pub status: CredentialStatus,
}

impl DirectoryEntry {
    /// Create an active entry.
    pub fn active(token: Token, kind: EntityKind, entity_id: EntityId) -> Self {
        Self {
            token,
            kind,
            entity_id,
            status: CredentialStatus::Active,
        }
    }

    /// Return this entry with its status set to revoked.
    #[must_use]
    pub fn revoked(mut self) -> Self {
        self.status = CredentialStatus::Revoked;
        self
    }

    /// Check whether the credential is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == CredentialStatus::Active
    }
}

/// Classified outcome of resolving one admitted scan.
///
/// Produced once per admitted event, consumed by the state machine, then
/// discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "entity_id", rename_all = "snake_case")]
pub enum ResolutionResult {
    /// No directory entry for the token.
    Unknown,

    /// Entry exists but the credential was revoked.
    Revoked,

    /// Active teacher credential.
    Teacher(EntityId),

    /// Active student credential.
    Student(EntityId),

    /// The directory could not be reached (or did not answer in time).
    ///
    /// Handled exactly like [`ResolutionResult::Unknown`] by the state
    /// machine, reported separately for observability.
    LookupFailed,
}

impl ResolutionResult {
    /// Check if this outcome identifies an entity and ends the session.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Teacher(_) | Self::Student(_))
    }

    /// Check if this outcome is retryable and returns the kiosk to `READY`.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !self.is_success()
    }

    /// Kind and identifier of the resolved entity, for successful outcomes.
    #[must_use]
    pub fn entity(&self) -> Option<(EntityKind, EntityId)> {
        match self {
            Self::Teacher(id) => Some((EntityKind::Teacher, *id)),
            Self::Student(id) => Some((EntityKind::Student, *id)),
            _ => None,
        }
    }
}

impl fmt::Display for ResolutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("Unknown"),
            Self::Revoked => f.write_str("Revoked"),
            Self::Teacher(id) => write!(f, "Teacher({id})"),
            Self::Student(id) => write!(f, "Student({id})"),
            Self::LookupFailed => f.write_str("LookupFailed"),
        }
    }
}

/// Scan mode of a kiosk session.
///
/// `Ready` is the only state in which channels emit events toward the
/// arbitration gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanState {
    /// Listening on every armed channel.
    #[default]
    Ready,

    /// An admitted scan is being resolved or its outcome is being shown.
    Processing,
}

impl ScanState {
    /// Check if channels may emit events.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Check if transition to target state is valid from this state.
    ///
    /// ```
    /// use rollcall_core::ScanState;
    ///
    /// assert!(ScanState::Ready.can_transition_to(&ScanState::Processing));
    /// assert!(!ScanState::Processing.can_transition_to(&ScanState::Processing));
    /// ```
    pub fn can_transition_to(&self, target: &ScanState) -> bool {
        matches!(
            (self, target),
            (ScanState::Ready, ScanState::Processing) | (ScanState::Processing, ScanState::Ready)
        )
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanState::Ready => f.write_str("READY"),
            ScanState::Processing => f.write_str("PROCESSING"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("qr_011", "qr_011")]
    #[case("  nfc_001\n", "nfc_001")]
    #[case("A1B2C3", "A1B2C3")]
    fn test_token_valid(#[case] input: &str, #[case] expected: &str) {
        let token = Token::new(input).unwrap();
        assert_eq!(token.as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("qr\u{7}011")]
    fn test_token_invalid(#[case] input: &str) {
        assert!(Token::new(input).is_err());
    }

    #[test]
    fn test_token_too_long() {
        let raw = "x".repeat(MAX_TOKEN_LENGTH + 1);
        assert!(matches!(Token::new(&raw), Err(Error::InvalidToken(_))));

        let raw = "x".repeat(MAX_TOKEN_LENGTH);
        assert!(Token::new(&raw).is_ok());
    }

    #[test]
    fn test_token_is_case_sensitive() {
        assert_ne!(Token::new("qr_abc").unwrap(), Token::new("QR_ABC").unwrap());
    }

    #[rstest]
    #[case("qr_011", Some(Channel::Optical))]
    #[case("nfc_099", Some(Channel::Radio))]
    #[case("4711", None)]
    fn test_token_namespace_hint(#[case] input: &str, #[case] expected: Option<Channel>) {
        assert_eq!(Token::new(input).unwrap().namespace_hint(), expected);
    }

    #[test]
    fn test_token_serde_validates() {
        let token: Token = serde_json::from_str("\"qr_011\"").unwrap();
        assert_eq!(token.as_str(), "qr_011");

        let result: std::result::Result<Token, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }

    #[rstest]
    #[case("optical", Channel::Optical)]
    #[case("QR", Channel::Optical)]
    #[case("nfc", Channel::Radio)]
    #[case("manual", Channel::Manual)]
    fn test_channel_from_str(#[case] input: &str, #[case] expected: Channel) {
        assert_eq!(input.parse::<Channel>().unwrap(), expected);
    }

    #[test]
    fn test_channel_unknown() {
        assert!(matches!(
            "bluetooth".parse::<Channel>(),
            Err(Error::UnknownChannel(_))
        ));
    }

    #[test]
    fn test_entity_id_parse() {
        assert_eq!("11".parse::<EntityId>().unwrap(), EntityId::new(11));
        assert!("eleven".parse::<EntityId>().is_err());
    }

    #[test]
    fn test_resolution_result_classification() {
        let student = ResolutionResult::Student(EntityId::new(11));
        assert!(student.is_success());
        assert_eq!(
            student.entity(),
            Some((EntityKind::Student, EntityId::new(11)))
        );

        for transient in [
            ResolutionResult::Unknown,
            ResolutionResult::Revoked,
            ResolutionResult::LookupFailed,
        ] {
            assert!(transient.is_transient());
            assert_eq!(transient.entity(), None);
        }
    }

    #[test]
    fn test_resolution_result_display() {
        assert_eq!(
            ResolutionResult::Teacher(EntityId::new(7)).to_string(),
            "Teacher(7)"
        );
        assert_eq!(ResolutionResult::LookupFailed.to_string(), "LookupFailed");
    }

    #[test]
    fn test_directory_entry_revoked() {
        let entry = DirectoryEntry::active(
            Token::new("qr_007").unwrap(),
            EntityKind::Teacher,
            EntityId::new(7),
        );
        assert!(entry.is_active());
        assert!(!entry.revoked().is_active());
    }

    #[test]
    fn test_scan_state_transitions() {
        assert_eq!(ScanState::default(), ScanState::Ready);
        assert!(ScanState::Ready.can_transition_to(&ScanState::Processing));
        assert!(ScanState::Processing.can_transition_to(&ScanState::Ready));
        assert!(!ScanState::Ready.can_transition_to(&ScanState::Ready));
        assert_eq!(ScanState::Processing.to_string(), "PROCESSING");
    }
}
