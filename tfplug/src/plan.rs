//! Resource change planning
//!
//! Turns Terraform's proposed new state into the planned state by marking
//! computed attributes unknown and running each attribute's plan modifiers.
//! Attributes whose modifiers ask for replacement are reported so the
//! orchestrator destroys and recreates the resource instead of updating it.

use crate::plan_modifier::{values_equal, PlanModifyRequest};
use crate::schema::Schema;
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

pub struct PlanResourceChangeRequest {
    pub prior_state: DynamicValue,
    pub proposed_new_state: DynamicValue,
    pub config: DynamicValue,
}

pub struct PlanResourceChangeResponse {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn plan_resource_change(
    schema: &Schema,
    request: PlanResourceChangeRequest,
) -> PlanResourceChangeResponse {
    let PlanResourceChangeRequest {
        prior_state,
        proposed_new_state,
        config,
    } = request;

    // Destroy plans carry no attributes to modify
    if proposed_new_state.is_null() {
        return PlanResourceChangeResponse {
            planned_state: proposed_new_state,
            requires_replace: Vec::new(),
            diagnostics: Vec::new(),
        };
    }

    let mut planned_state = proposed_new_state;
    let mut requires_replace = Vec::new();
    let mut diagnostics = Vec::new();

    let has_changes = prior_state.is_null() || !values_equal(&prior_state.value, &planned_state.value);

    if has_changes {
        for attr in schema.block.attributes.iter().filter(|a| a.computed) {
            let path = AttributePath::new(&attr.name);
            if matches!(value_at(&config, &path), Dynamic::Null) {
                if let Err(e) = planned_state.mark_unknown(&path) {
                    diagnostics.push(
                        Diagnostic::error(
                            "Failed to mark computed attribute unknown",
                            e.to_string(),
                        )
                        .with_attribute(path),
                    );
                }
            }
        }
    }

    for attr in &schema.block.attributes {
        if attr.plan_modifiers.is_empty() {
            continue;
        }

        let path = AttributePath::new(&attr.name);
        let state_value = value_at(&prior_state, &path);
        let config_value = value_at(&config, &path);
        let mut plan_value = value_at(&planned_state, &path);
        let mut replace = false;

        for modifier in &attr.plan_modifiers {
            let response = modifier.modify_plan(PlanModifyRequest {
                state: state_value.clone(),
                plan: plan_value,
                config: config_value.clone(),
                attribute_path: attr.name.clone(),
            });

            plan_value = response.plan_value;
            replace |= response.requires_replace;
            diagnostics.extend(response.diagnostics);
        }

        if replace {
            tracing::debug!(attribute = %attr.name, "attribute change requires replacement");
            requires_replace.push(path.clone());
        }

        if let Err(e) = planned_state.set_value(&path, plan_value) {
            diagnostics.push(
                Diagnostic::error("Failed to apply planned value", e.to_string())
                    .with_attribute(path),
            );
        }
    }

    PlanResourceChangeResponse {
        planned_state,
        requires_replace,
        diagnostics,
    }
}

fn value_at(value: &DynamicValue, path: &AttributePath) -> Dynamic {
    value.get(path).cloned().unwrap_or(Dynamic::Null)
}
