use serde_json::{Map, Value, json};

/// Label carried by controls that re-activate a soft-deleted record.
pub const ACTIVATE_LABEL: &str = "Activate";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationAction {
    Activate,
    Deactivate,
}

impl ActivationAction {
    /// Exact, case-sensitive match on `"Activate"`. Everything else,
    /// including a missing label, deactivates.
    #[must_use]
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some(ACTIVATE_LABEL) => Self::Activate,
            _ => Self::Deactivate,
        }
    }

    #[must_use]
    pub fn from_deleted(is_deleted: bool) -> Self {
        if is_deleted {
            Self::Deactivate
        } else {
            Self::Activate
        }
    }

    #[must_use]
    pub fn is_deleted(self) -> bool {
        matches!(self, Self::Deactivate)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    Ticket,
    Answer { ticket_id: String },
}

impl RecordKind {
    /// Key the admin API expects the partial update to be wrapped in.
    #[must_use]
    pub fn envelope_key(&self) -> &'static str {
        match self {
            Self::Ticket => "ticket",
            Self::Answer { .. } => "answer",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.envelope_key()
    }

    /// Path of a single record below `api_prefix`. Identifiers are
    /// interpolated verbatim.
    #[must_use]
    pub fn record_path(&self, api_prefix: &str, resource_id: &str) -> String {
        let prefix = api_prefix.trim_end_matches('/');
        match self {
            Self::Ticket => format!("{prefix}/tickets/{resource_id}/"),
            Self::Answer { ticket_id } => {
                format!("{prefix}/tickets/{ticket_id}/answers/{resource_id}/")
            }
        }
    }
}

/// One soft-delete flip, built fresh for every click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationRequest {
    pub kind: RecordKind,
    pub resource_id: String,
    pub is_deleted: bool,
}

impl ActivationRequest {
    #[must_use]
    pub fn ticket(resource_id: impl Into<String>, action: ActivationAction) -> Self {
        Self::new(RecordKind::Ticket, resource_id, action)
    }

    #[must_use]
    pub fn new(kind: RecordKind, resource_id: impl Into<String>, action: ActivationAction) -> Self {
        Self {
            kind,
            resource_id: resource_id.into(),
            is_deleted: action.is_deleted(),
        }
    }

    #[must_use]
    pub fn action(&self) -> ActivationAction {
        ActivationAction::from_deleted(self.is_deleted)
    }

    #[must_use]
    pub fn path(&self, api_prefix: &str) -> String {
        self.kind.record_path(api_prefix, &self.resource_id)
    }

    /// `{"ticket": {"is_deleted": <bool>}}`, or `{"answer": ...}` for answers.
    #[must_use]
    pub fn body(&self) -> Value {
        let mut envelope = Map::new();
        envelope.insert(
            self.kind.envelope_key().to_string(),
            json!({ "is_deleted": self.is_deleted }),
        );
        Value::Object(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exact_activate_label_activates() {
        assert_eq!(
            ActivationAction::from_label(Some("Activate")),
            ActivationAction::Activate
        );
        for label in [
            Some("Deactivate"),
            Some("activate"),
            Some("Activate "),
            Some(""),
            None,
        ] {
            assert_eq!(
                ActivationAction::from_label(label),
                ActivationAction::Deactivate,
                "label {label:?}"
            );
        }
    }

    #[test]
    fn deleted_flag_is_negated_activation() {
        assert!(!ActivationAction::Activate.is_deleted());
        assert!(ActivationAction::Deactivate.is_deleted());
        assert_eq!(
            ActivationAction::from_deleted(false),
            ActivationAction::Activate
        );
    }

    #[test]
    fn ticket_path_and_body_match_admin_api() {
        let request = ActivationRequest::ticket("42", ActivationAction::Activate);
        assert_eq!(request.path("/api"), "/api/tickets/42/");
        assert_eq!(request.path("/api/"), "/api/tickets/42/");
        assert_eq!(request.body(), json!({"ticket": {"is_deleted": false}}));
        assert_eq!(
            serde_json::to_string(&request.body()).ok().as_deref(),
            Some(r#"{"ticket":{"is_deleted":false}}"#)
        );
    }

    #[test]
    fn identifier_is_not_escaped() {
        let request = ActivationRequest::ticket("a b/c", ActivationAction::Deactivate);
        assert_eq!(request.path("/api"), "/api/tickets/a b/c/");
    }

    #[test]
    fn answer_requests_nest_under_ticket() {
        let request = ActivationRequest::new(
            RecordKind::Answer {
                ticket_id: "7".to_string(),
            },
            "9",
            ActivationAction::Deactivate,
        );
        assert_eq!(request.path("/api"), "/api/tickets/7/answers/9/");
        assert_eq!(request.body(), json!({"answer": {"is_deleted": true}}));
        assert_eq!(request.action(), ActivationAction::Deactivate);
    }
}
