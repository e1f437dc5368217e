use std::collections::{BTreeMap, BTreeSet};

use crate::activation::{ActivationAction, ActivationRequest, RecordKind};

pub const TICKET_TOGGLE_CLASS: &str = "activate_ticket";
pub const ANSWER_TOGGLE_CLASS: &str = "activate_answer";

pub const ATTR_ID: &str = "data-id";
pub const ATTR_ACTION: &str = "data-action";
pub const ATTR_DELETED: &str = "data-deleted";
pub const ATTR_TICKET_ID: &str = "data-ticket-id";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElementError {
    #[error("toggle element is missing data-id")]
    MissingIdentifier,
    #[error("answer toggle element is missing data-ticket-id")]
    MissingTicketIdentifier,
    #[error("data-deleted must be true or false, got {0:?}")]
    InvalidDeletedState(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleRole {
    Ticket,
    Answer,
}

/// The clicked control: its classes and `data-*` attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleElement {
    classes: BTreeSet<String>,
    attributes: BTreeMap<String, String>,
}

impl ToggleElement {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A ticket toggle as rendered in the admin listing.
    #[must_use]
    pub fn ticket(id: impl Into<String>, action_label: impl Into<String>) -> Self {
        Self::new()
            .with_class(TICKET_TOGGLE_CLASS)
            .with_attr(ATTR_ID, id)
            .with_attr(ATTR_ACTION, action_label)
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn role(&self) -> Option<ToggleRole> {
        if self.has_class(TICKET_TOGGLE_CLASS) {
            Some(ToggleRole::Ticket)
        } else if self.has_class(ANSWER_TOGGLE_CLASS) {
            Some(ToggleRole::Answer)
        } else {
            None
        }
    }

    /// Desired state: an explicit `data-deleted` wins over the legacy label.
    pub fn action(&self) -> Result<ActivationAction, ElementError> {
        match self.attr(ATTR_DELETED) {
            Some(raw) => parse_deleted_state(raw).map(ActivationAction::from_deleted),
            None => Ok(ActivationAction::from_label(self.attr(ATTR_ACTION))),
        }
    }

    pub fn activation_request(&self) -> Result<ActivationRequest, ElementError> {
        let resource_id = self.attr(ATTR_ID).ok_or(ElementError::MissingIdentifier)?;
        let kind = match self.role() {
            Some(ToggleRole::Answer) => RecordKind::Answer {
                ticket_id: self
                    .attr(ATTR_TICKET_ID)
                    .ok_or(ElementError::MissingTicketIdentifier)?
                    .to_string(),
            },
            _ => RecordKind::Ticket,
        };
        Ok(ActivationRequest::new(kind, resource_id, self.action()?))
    }
}

fn parse_deleted_state(raw: &str) -> Result<bool, ElementError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ElementError::InvalidDeletedState(raw.to_string())),
    }
}
