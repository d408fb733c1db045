//! Recorded action log entries.
//!
//! Records serialise to the flat JSON shape consumed by the replay tooling:
//! element events carry `tag`/`id`/`class`, navigation events carry only
//! `type`/`time`/`url`, and verification commands carry the element under
//! `element_*` keys plus the command and its `xpath=` target.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of captured event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    Change,
    Submit,
    Popstate,
    Hashchange,
    Pageload,
    VerificationCommand,
    /// A suggestion marker was activated.
    #[serde(rename = "suggestion_question_mark_click")]
    SuggestionMarkerClick,
    /// A review surface was opened for a suggestion.
    #[serde(rename = "suggestion_modal_open")]
    SuggestionReviewOpen,
}

impl ActionKind {
    /// Navigation records omit all target fields.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            ActionKind::Popstate | ActionKind::Hashchange | ActionKind::Pageload
        )
    }

    /// Wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Change => "change",
            ActionKind::Submit => "submit",
            ActionKind::Popstate => "popstate",
            ActionKind::Hashchange => "hashchange",
            ActionKind::Pageload => "pageload",
            ActionKind::VerificationCommand => "verification_command",
            ActionKind::SuggestionMarkerClick => "suggestion_question_mark_click",
            ActionKind::SuggestionReviewOpen => "suggestion_modal_open",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element that received the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetInfo {
    /// Upper-case tag name, as the DOM reports it.
    pub tag: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub class: String,
}

/// Pointer position in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

/// Explicit assertion/wait command issued through the context action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerificationCommand {
    VerifyText,
    VerifyTitle,
    VerifyValue,
    AssertText,
    AssertTitle,
    AssertValue,
    StoreText,
    StoreTitle,
    StoreValue,
    WaitForElementPresent,
    WaitForElementNotPresent,
    WaitForTextPresent,
    WaitForTextNotPresent,
    WaitForValue,
    WaitForNotValue,
    WaitForVisible,
    WaitForNotVisible,
}

/// Where a verification command takes its expected value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedValueSource {
    /// The document title.
    Title,
    /// Element text (form controls use their value).
    Text,
    /// Form control value, falling back to text.
    Value,
    /// Presence and visibility checks carry no value.
    Nothing,
}

impl VerificationCommand {
    pub const ALL: [VerificationCommand; 17] = [
        VerificationCommand::VerifyText,
        VerificationCommand::VerifyTitle,
        VerificationCommand::VerifyValue,
        VerificationCommand::AssertText,
        VerificationCommand::AssertTitle,
        VerificationCommand::AssertValue,
        VerificationCommand::StoreText,
        VerificationCommand::StoreTitle,
        VerificationCommand::StoreValue,
        VerificationCommand::WaitForElementPresent,
        VerificationCommand::WaitForElementNotPresent,
        VerificationCommand::WaitForTextPresent,
        VerificationCommand::WaitForTextNotPresent,
        VerificationCommand::WaitForValue,
        VerificationCommand::WaitForNotValue,
        VerificationCommand::WaitForVisible,
        VerificationCommand::WaitForNotVisible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationCommand::VerifyText => "verifyText",
            VerificationCommand::VerifyTitle => "verifyTitle",
            VerificationCommand::VerifyValue => "verifyValue",
            VerificationCommand::AssertText => "assertText",
            VerificationCommand::AssertTitle => "assertTitle",
            VerificationCommand::AssertValue => "assertValue",
            VerificationCommand::StoreText => "storeText",
            VerificationCommand::StoreTitle => "storeTitle",
            VerificationCommand::StoreValue => "storeValue",
            VerificationCommand::WaitForElementPresent => "waitForElementPresent",
            VerificationCommand::WaitForElementNotPresent => "waitForElementNotPresent",
            VerificationCommand::WaitForTextPresent => "waitForTextPresent",
            VerificationCommand::WaitForTextNotPresent => "waitForTextNotPresent",
            VerificationCommand::WaitForValue => "waitForValue",
            VerificationCommand::WaitForNotValue => "waitForNotValue",
            VerificationCommand::WaitForVisible => "waitForVisible",
            VerificationCommand::WaitForNotVisible => "waitForNotVisible",
        }
    }

    pub fn expected_value_source(&self) -> ExpectedValueSource {
        use VerificationCommand::*;
        match self {
            VerifyTitle | AssertTitle | StoreTitle => ExpectedValueSource::Title,
            VerifyText | AssertText | StoreText | WaitForTextPresent | WaitForTextNotPresent => {
                ExpectedValueSource::Text
            }
            VerifyValue | AssertValue | StoreValue | WaitForValue | WaitForNotValue => {
                ExpectedValueSource::Value
            }
            WaitForElementPresent | WaitForElementNotPresent | WaitForVisible
            | WaitForNotVisible => ExpectedValueSource::Nothing,
        }
    }
}

impl fmt::Display for VerificationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VerificationCommand::ALL
            .iter()
            .copied()
            .find(|cmd| cmd.as_str() == s)
            .ok_or_else(|| format!("Unknown verification command: {}", s))
    }
}

/// Extra fields carried by `verification_command` records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationDetails {
    pub command: VerificationCommand,
    /// Replayable target, always `xpath=<locator>`.
    pub target: String,
    #[serde(default)]
    pub element_tag: String,
    #[serde(default)]
    pub element_id: String,
    #[serde(default)]
    pub element_class: String,
}

/// Extra fields carried by suggestion interaction records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionEventDetails {
    pub suggestion_index: usize,
    #[serde(default)]
    pub field_name: String,
    #[serde(default)]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_delay_ms: Option<i64>,
}

/// One entry in the action log. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(rename = "type")]
    pub kind: ActionKind,

    #[serde(flatten)]
    pub target: Option<TargetInfo>,

    /// Current control value, or the expected value for verification commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(flatten)]
    pub coordinates: Option<Coordinates>,

    #[serde(rename = "time")]
    pub timestamp_ms: i64,

    #[serde(rename = "url")]
    pub page_url: String,

    #[serde(rename = "xpath", default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,

    #[serde(flatten)]
    pub verification: Option<VerificationDetails>,

    #[serde(flatten)]
    pub suggestion: Option<SuggestionEventDetails>,
}

impl ActionRecord {
    /// Record for an event that targeted an element.
    pub fn element(
        kind: ActionKind,
        target: TargetInfo,
        page_url: impl Into<String>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            kind,
            target: Some(target),
            value: None,
            coordinates: None,
            timestamp_ms,
            page_url: page_url.into(),
            locator: None,
            verification: None,
            suggestion: None,
        }
    }

    /// Navigation record; carries no target fields.
    pub fn navigation(kind: ActionKind, page_url: impl Into<String>, timestamp_ms: i64) -> Self {
        Self {
            kind,
            target: None,
            value: None,
            coordinates: None,
            timestamp_ms,
            page_url: page_url.into(),
            locator: None,
            verification: None,
            suggestion: None,
        }
    }

    /// Verification command record. The element is described under
    /// `element_*` keys and the expected value travels in `value`.
    pub fn verification(
        details: VerificationDetails,
        expected_value: impl Into<String>,
        locator: impl Into<String>,
        page_url: impl Into<String>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            kind: ActionKind::VerificationCommand,
            target: None,
            value: Some(expected_value.into()),
            coordinates: None,
            timestamp_ms,
            page_url: page_url.into(),
            locator: Some(locator.into()),
            verification: Some(details),
            suggestion: None,
        }
    }

    pub fn with_value(mut self, value: Option<String>) -> Self {
        self.value = value.filter(|v| !v.is_empty());
        self
    }

    pub fn with_coordinates(mut self, x: f64, y: f64) -> Self {
        self.coordinates = Some(Coordinates { x, y });
        self
    }

    pub fn with_locator(mut self, locator: Option<String>) -> Self {
        self.locator = locator.filter(|l| !l.is_empty());
        self
    }

    pub fn with_suggestion(mut self, details: SuggestionEventDetails) -> Self {
        self.suggestion = Some(details);
        self
    }

    /// Expected value of a verification command.
    pub fn expected_value(&self) -> Option<&str> {
        self.verification.as_ref()?;
        self.value.as_deref()
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
