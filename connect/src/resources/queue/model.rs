//! State model of a queue quick connect association

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tfplug::error::TfplugError;
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

/// Separator between the instance and queue ids in the composite id
pub const ID_SEPARATOR: char = ':';

/// Composite identifier `<instance-id>:<queue-id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationId {
    pub instance_id: String,
    pub queue_id: String,
}

impl AssociationId {
    pub fn new(instance_id: impl Into<String>, queue_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            queue_id: queue_id.into(),
        }
    }
}

impl fmt::Display for AssociationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.instance_id, ID_SEPARATOR, self.queue_id)
    }
}

impl FromStr for AssociationId {
    type Err = TfplugError;

    /// Splits on the first separator; both halves must be non-empty
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(ID_SEPARATOR) {
            Some((instance_id, queue_id)) if !instance_id.is_empty() && !queue_id.is_empty() => {
                Ok(Self::new(instance_id, queue_id))
            }
            _ => Err(TfplugError::ImportFailed(format!(
                "unexpected format for ID ({}), expected <instance-id>{}<queue-id>",
                s, ID_SEPARATOR
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueQuickConnectModel {
    pub id: Option<String>,
    pub instance_id: String,
    pub queue_id: String,
    pub quick_connect_ids: Vec<String>,
}

impl QueueQuickConnectModel {
    /// Reads a plan or state value.
    ///
    /// When `instance_id` or `queue_id` is missing (state produced by import)
    /// both are recovered from `id`. A missing `quick_connect_ids` reads as
    /// empty.
    pub fn from_value(value: &DynamicValue) -> Result<Self, Vec<Diagnostic>> {
        let mut diagnostics = vec![];

        let id = known_string(value, "id", &mut diagnostics);
        let instance_id = known_string(value, "instance_id", &mut diagnostics);
        let queue_id = known_string(value, "queue_id", &mut diagnostics);

        let (instance_id, queue_id) = match (instance_id, queue_id) {
            (Some(instance_id), Some(queue_id)) => (instance_id, queue_id),
            (instance_id, queue_id) => match id.as_deref().map(AssociationId::from_str) {
                Some(Ok(parsed)) => (
                    instance_id.unwrap_or(parsed.instance_id),
                    queue_id.unwrap_or(parsed.queue_id),
                ),
                Some(Err(e)) => {
                    diagnostics.push(
                        Diagnostic::error("Invalid resource ID", e.to_string())
                            .with_attribute(AttributePath::new("id")),
                    );
                    (String::new(), String::new())
                }
                None => {
                    diagnostics.push(Diagnostic::error(
                        "Missing queue identity",
                        "instance_id and queue_id are required",
                    ));
                    (String::new(), String::new())
                }
            },
        };

        let path = AttributePath::new("quick_connect_ids");
        let quick_connect_ids = match value.get(&path) {
            Err(_) | Ok(Dynamic::Null) => Vec::new(),
            Ok(_) => match value.get_string_list(&path) {
                Ok(ids) => ids,
                Err(e) => {
                    diagnostics.push(
                        Diagnostic::error("Invalid quick_connect_ids", e.to_string())
                            .with_attribute(path),
                    );
                    Vec::new()
                }
            },
        };

        if !diagnostics.is_empty() {
            return Err(diagnostics);
        }

        Ok(Self {
            id,
            instance_id,
            queue_id,
            quick_connect_ids,
        })
    }

    pub fn association_id(&self) -> AssociationId {
        AssociationId::new(&self.instance_id, &self.queue_id)
    }

    pub fn to_value(&self) -> DynamicValue {
        let mut attrs = HashMap::new();
        attrs.insert(
            "id".to_string(),
            self.id.clone().map(Dynamic::String).unwrap_or(Dynamic::Null),
        );
        attrs.insert(
            "instance_id".to_string(),
            Dynamic::String(self.instance_id.clone()),
        );
        attrs.insert("queue_id".to_string(), Dynamic::String(self.queue_id.clone()));
        attrs.insert(
            "quick_connect_ids".to_string(),
            Dynamic::string_list(self.quick_connect_ids.iter().cloned()),
        );
        DynamicValue::new(Dynamic::Map(attrs))
    }
}

/// String attribute, None when absent or null
fn known_string(
    value: &DynamicValue,
    name: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    let path = AttributePath::new(name);
    match value.get(&path) {
        Ok(Dynamic::String(s)) => Some(s.clone()),
        Err(_) | Ok(Dynamic::Null) | Ok(Dynamic::Unknown) => None,
        Ok(other) => {
            diagnostics.push(
                Diagnostic::error(
                    format!("Invalid {}", name),
                    format!("expected string, got {}", other.type_name()),
                )
                .with_attribute(path),
            );
            None
        }
    }
}

/// Orders the remote membership against the prior list.
///
/// Ids still present keep their prior relative order, ids new to the remote
/// side follow in listing order, and ids that vanished remotely are dropped.
/// Every id appears once.
pub fn reconcile_order(prior: &[String], remote: Vec<String>) -> Vec<String> {
    let remote_set: HashSet<&str> = remote.iter().map(String::as_str).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut ordered = Vec::with_capacity(remote.len());

    for id in prior {
        if remote_set.contains(id.as_str()) && seen.insert(id.clone()) {
            ordered.push(id.clone());
        }
    }

    for id in remote {
        if seen.insert(id.clone()) {
            ordered.push(id);
        }
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn association_id_round_trips_through_display() {
        let id = AssociationId::new("ins-1", "q-1");
        assert_eq!(id.to_string(), "ins-1:q-1");
        assert_eq!("ins-1:q-1".parse::<AssociationId>().unwrap(), id);
    }

    #[test]
    fn association_id_splits_on_first_separator() {
        let id: AssociationId = "ins-1:q-1:extra".parse().unwrap();
        assert_eq!(id.instance_id, "ins-1");
        assert_eq!(id.queue_id, "q-1:extra");
    }

    #[test]
    fn association_id_rejects_malformed_values() {
        for bad in ["no-separator", ":q-1", "ins-1:", ""] {
            let err = bad.parse::<AssociationId>().unwrap_err();
            assert!(matches!(err, TfplugError::ImportFailed(_)), "{}", bad);
            assert!(err.to_string().contains("<instance-id>:<queue-id>"));
        }
    }

    #[test]
    fn model_round_trips_state() {
        let model = QueueQuickConnectModel {
            id: Some("ins-1:q-1".to_string()),
            instance_id: "ins-1".to_string(),
            queue_id: "q-1".to_string(),
            quick_connect_ids: ids(&["qc-1", "qc-2"]),
        };

        assert_eq!(
            QueueQuickConnectModel::from_value(&model.to_value()).unwrap(),
            model
        );
    }

    #[test]
    fn model_recovers_identity_from_imported_id() {
        let mut state = DynamicValue::object();
        state
            .set_string(&AttributePath::new("id"), "ins-1:q-1".to_string())
            .unwrap();

        let model = QueueQuickConnectModel::from_value(&state).unwrap();

        assert_eq!(model.instance_id, "ins-1");
        assert_eq!(model.queue_id, "q-1");
        assert!(model.quick_connect_ids.is_empty());
    }

    #[test]
    fn model_treats_unknown_id_as_absent() {
        let mut plan = QueueQuickConnectModel {
            id: None,
            instance_id: "ins-1".to_string(),
            queue_id: "q-1".to_string(),
            quick_connect_ids: ids(&["qc-1"]),
        }
        .to_value();
        plan.mark_unknown(&AttributePath::new("id")).unwrap();

        let model = QueueQuickConnectModel::from_value(&plan).unwrap();
        assert!(model.id.is_none());
    }

    #[test]
    fn model_reports_wrong_types() {
        let mut state = DynamicValue::object();
        state
            .set_number(&AttributePath::new("instance_id"), 1.0)
            .unwrap();
        state
            .set_string(&AttributePath::new("queue_id"), "q-1".to_string())
            .unwrap();
        state
            .set_list(
                &AttributePath::new("quick_connect_ids"),
                vec![Dynamic::Bool(true)],
            )
            .unwrap();

        let diagnostics = QueueQuickConnectModel::from_value(&state).unwrap_err();
        let summaries: Vec<&str> = diagnostics.iter().map(|d| d.summary.as_str()).collect();

        assert!(summaries.contains(&"Invalid instance_id"));
        assert!(summaries.contains(&"Invalid quick_connect_ids"));
    }

    #[test]
    fn reconcile_keeps_prior_order_and_appends_new_ids() {
        let ordered = reconcile_order(
            &ids(&["qc-3", "qc-1"]),
            ids(&["qc-1", "qc-2", "qc-3"]),
        );
        assert_eq!(ordered, ids(&["qc-3", "qc-1", "qc-2"]));
    }

    #[test]
    fn reconcile_drops_removed_and_duplicate_ids() {
        let ordered = reconcile_order(
            &ids(&["qc-1", "qc-gone", "qc-1"]),
            ids(&["qc-2", "qc-1", "qc-2"]),
        );
        assert_eq!(ordered, ids(&["qc-1", "qc-2"]));
    }

    #[test]
    fn reconcile_is_idempotent() {
        let remote = ids(&["qc-1", "qc-2"]);
        let first = reconcile_order(&[], remote.clone());
        let second = reconcile_order(&first, remote);
        assert_eq!(first, second);
    }
}
