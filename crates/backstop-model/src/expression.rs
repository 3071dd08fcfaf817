//! Resource-selection expressions
//!
//! An [`Expression`] is a recursive boolean tree. Leaves test one resource
//! attribute against a list of values; [`Group`] nodes combine operands with
//! AND or OR. Each leaf family carries its own operator type, so a list
//! operator can never be attached to a scalar attribute once parsed.
//!
//! [`ExpressionDocument`] is the flat, user-facing shape in which exactly one
//! field is populated per node. [`Expression::parse`] enforces that rule and
//! [`Expression::to_document`] is its inverse.

use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::account::CloudProvider;
use crate::error::{Result, ValidationError};
use crate::keyword::Keyword;

keyword_enum! {
    /// Boolean connective of a group node
    pub enum LogicalOperator {
        And => "AND",
        Or => "OR",
    }
}

keyword_enum! {
    /// Operators for attributes that hold one value per resource
    pub enum ScalarOperator {
        In => "IN",
        NotIn => "NOT_IN",
    }
}

keyword_enum! {
    /// Operators for attributes that hold a set of values per resource
    pub enum ListOperator {
        ContainsAnyOf => "CONTAINS_ANY_OF",
        ContainsNoneOf => "CONTAINS_NONE_OF",
    }
}

keyword_enum! {
    /// Inventory resource types known to the backup service
    pub enum ResourceType {
        AwsEc2 => "AWS_EC2",
        AwsRds => "AWS_RDS",
        AwsS3 => "AWS_S3",
        AwsDynamoDb => "AWS_DYNAMO_DB",
        AwsEfs => "AWS_EFS",
        AzureVirtualMachine => "AZURE_VIRTUAL_MACHINE",
        AzureSqlDatabase => "AZURE_SQL_DATABASE",
        AzureStorageAccount => "AZURE_STORAGE_ACCOUNT",
        GcpComputeInstance => "GCP_COMPUTE_INSTANCE",
        GcpCloudSqlInstance => "GCP_CLOUD_SQL_INSTANCE",
        GcpCloudStorageBucket => "GCP_CLOUD_STORAGE_BUCKET",
    }
}

keyword_enum! {
    /// Sensitive data classes detected by the service's classifier
    pub enum DataClass {
        Pii => "PII",
        Phi => "PHI",
        Fi => "FI",
    }
}

/// A leaf test: `operator` applied to `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition<O, V> {
    pub operator: O,
    pub values: Vec<V>,
}

pub type ScalarCondition<V> = Condition<ScalarOperator, V>;
pub type ListCondition<V> = Condition<ListOperator, V>;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagKeyValue {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub operator: LogicalOperator,
    pub operands: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Group(Group),
    ResourceType(ScalarCondition<ResourceType>),
    Environment(ScalarCondition<String>),
    CloudProvider(ScalarCondition<CloudProvider>),
    AccountId(ScalarCondition<String>),
    SourceRegion(ScalarCondition<String>),
    Vpc(ScalarCondition<String>),
    Subnets(ListCondition<String>),
    ResourceGroupName(ScalarCondition<String>),
    ResourceName(ScalarCondition<String>),
    ResourceId(ScalarCondition<String>),
    TagKeys(ListCondition<String>),
    TagKeyValues(ListCondition<TagKeyValue>),
    DataClasses(ListCondition<DataClass>),
    Apps(ListCondition<String>),
}

/// Attributes of one inventory resource, used to evaluate an expression locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFacts {
    pub resource_type: Option<ResourceType>,
    pub environment: Option<String>,
    pub cloud_provider: Option<CloudProvider>,
    pub account_id: Option<String>,
    pub source_region: Option<String>,
    pub vpc: Option<String>,
    pub subnets: BTreeSet<String>,
    pub resource_group_name: Option<String>,
    pub resource_name: Option<String>,
    pub resource_id: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub data_classes: BTreeSet<DataClass>,
    pub apps: BTreeSet<String>,
}

// ============ Document shape ============

/// One expression node as written by the user: exactly one field must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExpressionDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<ConditionDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<ConditionDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_provider: Option<ConditionDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<ConditionDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_region: Option<ConditionDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc: Option<ConditionDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnets: Option<ConditionDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<ConditionDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<ConditionDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<ConditionDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_keys: Option<ConditionDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_key_values: Option<TagKeyValuesDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_classes: Option<ConditionDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apps: Option<ConditionDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GroupDocument {
    pub operator: String,
    #[serde(default)]
    pub operands: Vec<ExpressionDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ConditionDocument {
    pub operator: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TagKeyValuesDocument {
    pub operator: String,
    #[serde(default)]
    pub values: Vec<TagKeyValueDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TagKeyValueDocument {
    pub key: String,
    pub value: String,
}

impl ExpressionDocument {
    fn populated_keys(&self) -> Vec<&'static str> {
        let flags = [
            ("group", self.group.is_some()),
            ("resource_type", self.resource_type.is_some()),
            ("environment", self.environment.is_some()),
            ("cloud_provider", self.cloud_provider.is_some()),
            ("account_id", self.account_id.is_some()),
            ("source_region", self.source_region.is_some()),
            ("vpc", self.vpc.is_some()),
            ("subnets", self.subnets.is_some()),
            ("resource_group_name", self.resource_group_name.is_some()),
            ("resource_name", self.resource_name.is_some()),
            ("resource_id", self.resource_id.is_some()),
            ("tag_keys", self.tag_keys.is_some()),
            ("tag_key_values", self.tag_key_values.is_some()),
            ("data_classes", self.data_classes.is_some()),
            ("apps", self.apps.is_some()),
        ];
        flags
            .into_iter()
            .filter_map(|(key, set)| set.then_some(key))
            .collect()
    }
}

impl Expression {
    /// Every condition key a node may carry, in document order.
    pub const KEYS: [&'static str; 15] = [
        "group",
        "resource_type",
        "environment",
        "cloud_provider",
        "account_id",
        "source_region",
        "vpc",
        "subnets",
        "resource_group_name",
        "resource_name",
        "resource_id",
        "tag_keys",
        "tag_key_values",
        "data_classes",
        "apps",
    ];

    /// The document key this node is written under.
    pub fn key(&self) -> &'static str {
        match self {
            Expression::Group(_) => "group",
            Expression::ResourceType(_) => "resource_type",
            Expression::Environment(_) => "environment",
            Expression::CloudProvider(_) => "cloud_provider",
            Expression::AccountId(_) => "account_id",
            Expression::SourceRegion(_) => "source_region",
            Expression::Vpc(_) => "vpc",
            Expression::Subnets(_) => "subnets",
            Expression::ResourceGroupName(_) => "resource_group_name",
            Expression::ResourceName(_) => "resource_name",
            Expression::ResourceId(_) => "resource_id",
            Expression::TagKeys(_) => "tag_keys",
            Expression::TagKeyValues(_) => "tag_key_values",
            Expression::DataClasses(_) => "data_classes",
            Expression::Apps(_) => "apps",
        }
    }

    /// Parse a document tree, rooted at the path `expression`.
    pub fn parse(doc: &ExpressionDocument) -> Result<Self> {
        Self::parse_at(doc, "expression")
    }

    /// Parse a document tree, qualifying error paths with `path`.
    pub fn parse_at(doc: &ExpressionDocument, path: &str) -> Result<Self> {
        let keys = doc.populated_keys();
        match keys.as_slice() {
            [] => {
                return Err(ValidationError::NoCondition {
                    path: path.to_string(),
                    expected: Self::KEYS.join(", "),
                });
            }
            [_] => {}
            _ => {
                return Err(ValidationError::MultipleConditions {
                    path: path.to_string(),
                    keys: keys.iter().map(|k| k.to_string()).collect(),
                });
            }
        }

        let at = |key: &str| format!("{path}.{key}");

        if let Some(group) = &doc.group {
            return parse_group(group, &at("group")).map(Expression::Group);
        }
        if let Some(c) = &doc.resource_type {
            return parse_condition(c, &at("resource_type"), ResourceType::parse_field)
                .map(Expression::ResourceType);
        }
        if let Some(c) = &doc.environment {
            return parse_condition(c, &at("environment"), plain).map(Expression::Environment);
        }
        if let Some(c) = &doc.cloud_provider {
            return parse_condition(c, &at("cloud_provider"), CloudProvider::parse_field)
                .map(Expression::CloudProvider);
        }
        if let Some(c) = &doc.account_id {
            return parse_condition(c, &at("account_id"), plain).map(Expression::AccountId);
        }
        if let Some(c) = &doc.source_region {
            return parse_condition(c, &at("source_region"), plain).map(Expression::SourceRegion);
        }
        if let Some(c) = &doc.vpc {
            return parse_condition(c, &at("vpc"), plain).map(Expression::Vpc);
        }
        if let Some(c) = &doc.subnets {
            return parse_condition(c, &at("subnets"), plain).map(Expression::Subnets);
        }
        if let Some(c) = &doc.resource_group_name {
            return parse_condition(c, &at("resource_group_name"), plain)
                .map(Expression::ResourceGroupName);
        }
        if let Some(c) = &doc.resource_name {
            return parse_condition(c, &at("resource_name"), plain).map(Expression::ResourceName);
        }
        if let Some(c) = &doc.resource_id {
            return parse_condition(c, &at("resource_id"), plain).map(Expression::ResourceId);
        }
        if let Some(c) = &doc.tag_keys {
            return parse_condition(c, &at("tag_keys"), plain).map(Expression::TagKeys);
        }
        if let Some(c) = &doc.tag_key_values {
            return parse_tag_key_values(c, &at("tag_key_values")).map(Expression::TagKeyValues);
        }
        if let Some(c) = &doc.data_classes {
            return parse_condition(c, &at("data_classes"), DataClass::parse_field)
                .map(Expression::DataClasses);
        }
        match &doc.apps {
            Some(c) => parse_condition(c, &at("apps"), plain).map(Expression::Apps),
            None => Err(ValidationError::NoCondition {
                path: path.to_string(),
                expected: Self::KEYS.join(", "),
            }),
        }
    }

    /// Render back to the document shape. `parse(&e.to_document()) == Ok(e)`.
    pub fn to_document(&self) -> ExpressionDocument {
        let mut doc = ExpressionDocument::default();
        match self {
            Expression::Group(g) => {
                doc.group = Some(GroupDocument {
                    operator: g.operator.to_string(),
                    operands: g.operands.iter().map(Expression::to_document).collect(),
                })
            }
            Expression::ResourceType(c) => doc.resource_type = Some(condition_document(c)),
            Expression::Environment(c) => doc.environment = Some(condition_document(c)),
            Expression::CloudProvider(c) => doc.cloud_provider = Some(condition_document(c)),
            Expression::AccountId(c) => doc.account_id = Some(condition_document(c)),
            Expression::SourceRegion(c) => doc.source_region = Some(condition_document(c)),
            Expression::Vpc(c) => doc.vpc = Some(condition_document(c)),
            Expression::Subnets(c) => doc.subnets = Some(condition_document(c)),
            Expression::ResourceGroupName(c) => {
                doc.resource_group_name = Some(condition_document(c))
            }
            Expression::ResourceName(c) => doc.resource_name = Some(condition_document(c)),
            Expression::ResourceId(c) => doc.resource_id = Some(condition_document(c)),
            Expression::TagKeys(c) => doc.tag_keys = Some(condition_document(c)),
            Expression::TagKeyValues(c) => {
                doc.tag_key_values = Some(TagKeyValuesDocument {
                    operator: c.operator.to_string(),
                    values: c
                        .values
                        .iter()
                        .map(|kv| TagKeyValueDocument {
                            key: kv.key.clone(),
                            value: kv.value.clone(),
                        })
                        .collect(),
                })
            }
            Expression::DataClasses(c) => doc.data_classes = Some(condition_document(c)),
            Expression::Apps(c) => doc.apps = Some(condition_document(c)),
        }
        doc
    }

    /// Evaluate the expression against one resource.
    ///
    /// Scalar tests against a missing attribute count as "not in"; list tests
    /// against a missing attribute see an empty set.
    pub fn matches(&self, facts: &ResourceFacts) -> bool {
        match self {
            Expression::Group(g) => {
                let mut results = g.operands.iter().map(|e| e.matches(facts));
                match g.operator {
                    LogicalOperator::And => results.all(|r| r),
                    LogicalOperator::Or => results.any(|r| r),
                }
            }
            Expression::ResourceType(c) => c.holds_for(facts.resource_type.as_ref()),
            Expression::Environment(c) => c.holds_for(facts.environment.as_ref()),
            Expression::CloudProvider(c) => c.holds_for(facts.cloud_provider.as_ref()),
            Expression::AccountId(c) => c.holds_for(facts.account_id.as_ref()),
            Expression::SourceRegion(c) => c.holds_for(facts.source_region.as_ref()),
            Expression::Vpc(c) => c.holds_for(facts.vpc.as_ref()),
            Expression::ResourceGroupName(c) => c.holds_for(facts.resource_group_name.as_ref()),
            Expression::ResourceName(c) => c.holds_for(facts.resource_name.as_ref()),
            Expression::ResourceId(c) => c.holds_for(facts.resource_id.as_ref()),
            Expression::Subnets(c) => c.holds_with(|s| facts.subnets.contains(s)),
            Expression::TagKeys(c) => c.holds_with(|k| facts.tags.contains_key(k)),
            Expression::TagKeyValues(c) => {
                c.holds_with(|kv| facts.tags.get(&kv.key) == Some(&kv.value))
            }
            Expression::DataClasses(c) => c.holds_with(|d| facts.data_classes.contains(d)),
            Expression::Apps(c) => c.holds_with(|a| facts.apps.contains(a)),
        }
    }
}

impl<V: PartialEq> Condition<ScalarOperator, V> {
    fn holds_for(&self, actual: Option<&V>) -> bool {
        let found = actual.is_some_and(|a| self.values.contains(a));
        match self.operator {
            ScalarOperator::In => found,
            ScalarOperator::NotIn => !found,
        }
    }
}

impl<V> Condition<ListOperator, V> {
    fn holds_with(&self, present: impl Fn(&V) -> bool) -> bool {
        let any = self.values.iter().any(present);
        match self.operator {
            ListOperator::ContainsAnyOf => any,
            ListOperator::ContainsNoneOf => !any,
        }
    }
}

fn plain(_field: &str, value: &str) -> Result<String> {
    Ok(value.to_string())
}

fn parse_group(doc: &GroupDocument, path: &str) -> Result<Group> {
    let operator = parse_operator::<LogicalOperator>(&doc.operator, path)?;
    if doc.operands.is_empty() {
        return Err(ValidationError::EmptyOperands {
            path: path.to_string(),
        });
    }
    let operands = doc
        .operands
        .iter()
        .enumerate()
        .map(|(i, operand)| Expression::parse_at(operand, &format!("{path}.operands[{i}]")))
        .collect::<Result<Vec<_>>>()?;
    Ok(Group { operator, operands })
}

fn parse_operator<O: Keyword>(operator: &str, path: &str) -> Result<O> {
    O::from_keyword(operator).ok_or_else(|| ValidationError::InvalidOperator {
        path: path.to_string(),
        operator: operator.to_string(),
        expected: O::supported(),
    })
}

fn parse_condition<O, V>(
    doc: &ConditionDocument,
    path: &str,
    value: impl Fn(&str, &str) -> Result<V>,
) -> Result<Condition<O, V>>
where
    O: Keyword,
{
    let operator = parse_operator::<O>(&doc.operator, path)?;
    if doc.values.is_empty() {
        return Err(ValidationError::EmptyList {
            path: path.to_string(),
            field: "values".to_string(),
        });
    }
    let values = doc
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| value(&format!("{path}.values[{i}]"), v))
        .collect::<Result<Vec<_>>>()?;
    Ok(Condition { operator, values })
}

fn parse_tag_key_values(
    doc: &TagKeyValuesDocument,
    path: &str,
) -> Result<ListCondition<TagKeyValue>> {
    let operator = parse_operator::<ListOperator>(&doc.operator, path)?;
    if doc.values.is_empty() {
        return Err(ValidationError::EmptyList {
            path: path.to_string(),
            field: "values".to_string(),
        });
    }
    let values = doc
        .values
        .iter()
        .map(|kv| TagKeyValue {
            key: kv.key.clone(),
            value: kv.value.clone(),
        })
        .collect();
    Ok(Condition { operator, values })
}

fn condition_document<O, V>(condition: &Condition<O, V>) -> ConditionDocument
where
    O: Keyword,
    V: ToString,
{
    ConditionDocument {
        operator: condition.operator.as_str().to_string(),
        values: condition.values.iter().map(ToString::to_string).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(operator: &str, values: &[&str]) -> ConditionDocument {
        ConditionDocument {
            operator: operator.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn env_prod_and_ec2() -> ExpressionDocument {
        ExpressionDocument {
            group: Some(GroupDocument {
                operator: "AND".into(),
                operands: vec![
                    ExpressionDocument {
                        environment: Some(leaf("IN", &["PROD"])),
                        ..Default::default()
                    },
                    ExpressionDocument {
                        resource_type: Some(leaf("IN", &["AWS_EC2"])),
                        ..Default::default()
                    },
                ],
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_group_of_leaves() {
        let expr = Expression::parse(&env_prod_and_ec2()).unwrap();
        let Expression::Group(group) = &expr else {
            panic!("expected group, got {expr:?}");
        };
        assert_eq!(group.operator, LogicalOperator::And);
        assert_eq!(
            group.operands[1],
            Expression::ResourceType(Condition {
                operator: ScalarOperator::In,
                values: vec![ResourceType::AwsEc2],
            })
        );
    }

    #[test]
    fn test_document_round_trip() {
        let doc = env_prod_and_ec2();
        let expr = Expression::parse(&doc).unwrap();
        assert_eq!(expr.to_document(), doc);
        assert_eq!(Expression::parse(&expr.to_document()).unwrap(), expr);
    }

    #[test]
    fn test_rejects_empty_node() {
        let err = Expression::parse(&ExpressionDocument::default()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NoCondition { ref path, .. } if path == "expression"
        ));
    }

    #[test]
    fn test_rejects_two_populated_keys_with_path() {
        let doc = ExpressionDocument {
            group: Some(GroupDocument {
                operator: "OR".into(),
                operands: vec![ExpressionDocument {
                    resource_type: Some(leaf("IN", &["AWS_EC2"])),
                    environment: Some(leaf("IN", &["PROD"])),
                    ..Default::default()
                }],
            }),
            ..Default::default()
        };
        let err = Expression::parse(&doc).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MultipleConditions {
                path: "expression.group.operands[0]".into(),
                keys: vec!["resource_type".into(), "environment".into()],
            }
        );
    }

    #[test]
    fn test_rejects_empty_group() {
        let doc = ExpressionDocument {
            group: Some(GroupDocument {
                operator: "AND".into(),
                operands: vec![],
            }),
            ..Default::default()
        };
        assert_eq!(
            Expression::parse(&doc).unwrap_err(),
            ValidationError::EmptyOperands {
                path: "expression.group".into()
            }
        );
    }

    #[test]
    fn test_rejects_empty_values() {
        let doc = ExpressionDocument {
            vpc: Some(leaf("IN", &[])),
            ..Default::default()
        };
        assert!(matches!(
            Expression::parse(&doc).unwrap_err(),
            ValidationError::EmptyList { ref path, .. } if path == "expression.vpc"
        ));
    }

    #[test]
    fn test_list_operator_on_scalar_attribute_is_rejected() {
        let doc = ExpressionDocument {
            resource_type: Some(leaf("CONTAINS_ANY_OF", &["AWS_EC2"])),
            ..Default::default()
        };
        let err = Expression::parse(&doc).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidOperator {
                path: "expression.resource_type".into(),
                operator: "CONTAINS_ANY_OF".into(),
                expected: "IN, NOT_IN".into(),
            }
        );
    }

    #[test]
    fn test_scalar_operator_on_list_attribute_is_rejected() {
        let doc = ExpressionDocument {
            tag_keys: Some(leaf("IN", &["team"])),
            ..Default::default()
        };
        assert!(matches!(
            Expression::parse(&doc).unwrap_err(),
            ValidationError::InvalidOperator { ref operator, .. } if operator == "IN"
        ));
    }

    #[test]
    fn test_unknown_resource_type_names_value_path() {
        let doc = ExpressionDocument {
            resource_type: Some(leaf("IN", &["AWS_EC2", "AWS_LAMBDA"])),
            ..Default::default()
        };
        assert!(matches!(
            Expression::parse(&doc).unwrap_err(),
            ValidationError::UnsupportedValue { ref field, ref value, .. }
                if field == "expression.resource_type.values[1]" && value == "AWS_LAMBDA"
        ));
    }

    #[test]
    fn test_document_rejects_unknown_keys() {
        let json = serde_json::json!({ "resource_kind": { "operator": "IN", "values": ["x"] } });
        assert!(serde_json::from_value::<ExpressionDocument>(json).is_err());
    }

    #[test]
    fn test_matches_group_and_lists() {
        let expr = Expression::Group(Group {
            operator: LogicalOperator::And,
            operands: vec![
                Expression::Environment(Condition {
                    operator: ScalarOperator::In,
                    values: vec!["PROD".into()],
                }),
                Expression::TagKeyValues(Condition {
                    operator: ListOperator::ContainsNoneOf,
                    values: vec![TagKeyValue {
                        key: "backup".into(),
                        value: "skip".into(),
                    }],
                }),
            ],
        });

        let mut facts = ResourceFacts {
            environment: Some("PROD".into()),
            ..Default::default()
        };
        assert!(expr.matches(&facts));

        facts.tags.insert("backup".into(), "skip".into());
        assert!(!expr.matches(&facts));

        facts.tags.insert("backup".into(), "daily".into());
        assert!(expr.matches(&facts));

        facts.environment = Some("DEV".into());
        assert!(!expr.matches(&facts));
    }

    #[test]
    fn test_not_in_matches_missing_attribute() {
        let expr = Expression::Vpc(Condition {
            operator: ScalarOperator::NotIn,
            values: vec!["vpc-1".into()],
        });
        assert!(expr.matches(&ResourceFacts::default()));
    }

    #[test]
    fn test_or_group() {
        let expr = Expression::Group(Group {
            operator: LogicalOperator::Or,
            operands: vec![
                Expression::DataClasses(Condition {
                    operator: ListOperator::ContainsAnyOf,
                    values: vec![DataClass::Pii],
                }),
                Expression::ResourceType(Condition {
                    operator: ScalarOperator::In,
                    values: vec![ResourceType::AwsRds],
                }),
            ],
        });
        let facts = ResourceFacts {
            resource_type: Some(ResourceType::AwsRds),
            ..Default::default()
        };
        assert!(expr.matches(&facts));
        assert!(!expr.matches(&ResourceFacts::default()));
    }
}
