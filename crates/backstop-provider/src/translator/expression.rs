//! Expression documents <-> wire expressions
//!
//! Both directions are structural. Validation happens in
//! [`Expression::parse_at`](backstop_model::Expression::parse_at), so the
//! rules are the same for what users write and what the service returns.

use std::collections::BTreeMap;

use backstop_api as api;
use backstop_model::ValidationError;
use backstop_model::expression::{
    ConditionDocument, ExpressionDocument, GroupDocument, TagKeyValueDocument, TagKeyValuesDocument,
};

pub(crate) fn to_wire(doc: &ExpressionDocument) -> api::Expression {
    let condition = |c: &Option<ConditionDocument>| {
        c.as_ref().map(|c| api::Condition {
            operator: c.operator.clone(),
            values: c.values.clone(),
        })
    };
    api::Expression {
        group: doc.group.as_ref().map(|g| api::GroupCondition {
            operator: g.operator.clone(),
            operands: g.operands.iter().map(to_wire).collect(),
        }),
        resource_type: condition(&doc.resource_type),
        environment: condition(&doc.environment),
        cloud_provider: condition(&doc.cloud_provider),
        account_id: condition(&doc.account_id),
        source_region: condition(&doc.source_region),
        vpc: condition(&doc.vpc),
        subnets: condition(&doc.subnets),
        resource_group_name: condition(&doc.resource_group_name),
        resource_name: condition(&doc.resource_name),
        resource_id: condition(&doc.resource_id),
        tag_keys: condition(&doc.tag_keys),
        tag_key_values: doc.tag_key_values.as_ref().map(|c| api::Condition {
            operator: c.operator.clone(),
            values: c
                .values
                .iter()
                .map(|kv| api::TagKeyValue {
                    key: kv.key.clone(),
                    value: kv.value.clone(),
                })
                .collect(),
        }),
        data_classes: condition(&doc.data_classes),
        apps: condition(&doc.apps),
        unrecognized: BTreeMap::new(),
    }
}

/// Convert a remote expression tree rooted at `path`.
///
/// Conditions this client does not know are rejected rather than dropped,
/// so a later update cannot silently discard them.
pub(crate) fn from_wire(
    wire: &api::Expression,
    path: &str,
) -> Result<ExpressionDocument, ValidationError> {
    if let Some(key) = wire.unrecognized.keys().next() {
        return Err(ValidationError::UnrecognizedCondition {
            path: path.to_string(),
            key: key.clone(),
        });
    }

    let condition = |c: &Option<api::Condition<String>>| {
        c.as_ref().map(|c| ConditionDocument {
            operator: c.operator.clone(),
            values: c.values.clone(),
        })
    };
    let group = match &wire.group {
        Some(g) => Some(GroupDocument {
            operator: g.operator.clone(),
            operands: g
                .operands
                .iter()
                .enumerate()
                .map(|(i, operand)| from_wire(operand, &format!("{path}.group.operands[{i}]")))
                .collect::<Result<Vec<_>, _>>()?,
        }),
        None => None,
    };

    Ok(ExpressionDocument {
        group,
        resource_type: condition(&wire.resource_type),
        environment: condition(&wire.environment),
        cloud_provider: condition(&wire.cloud_provider),
        account_id: condition(&wire.account_id),
        source_region: condition(&wire.source_region),
        vpc: condition(&wire.vpc),
        subnets: condition(&wire.subnets),
        resource_group_name: condition(&wire.resource_group_name),
        resource_name: condition(&wire.resource_name),
        resource_id: condition(&wire.resource_id),
        tag_keys: condition(&wire.tag_keys),
        tag_key_values: wire.tag_key_values.as_ref().map(|c| TagKeyValuesDocument {
            operator: c.operator.clone(),
            values: c
                .values
                .iter()
                .map(|kv| TagKeyValueDocument {
                    key: kv.key.clone(),
                    value: kv.value.clone(),
                })
                .collect(),
        }),
        data_classes: condition(&wire.data_classes),
        apps: condition(&wire.apps),
    })
}
