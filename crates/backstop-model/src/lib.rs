//! # backstop-model
//!
//! Typed model of the backup service's resources: selection expressions,
//! schedules, backup policies, accounts and restore jobs.
//!
//! Each resource has two shapes. The `*Document` structs are the declarative
//! form users write (serde + JSON Schema); the typed values are what the rest
//! of the workspace works with. Conversion from document to typed value is
//! where all local validation happens, and it never touches the network.

#[macro_use]
pub mod keyword;

pub mod account;
pub mod error;
pub mod expression;
pub mod policy;
pub mod restore;
pub mod schedule;

pub use account::{AccountAttributes, AccountDocument, CloudProvider};
pub use error::{Result, ValidationError, in_range};
pub use expression::{
    Condition, DataClass, Expression, ExpressionDocument, Group, ListOperator, LogicalOperator,
    ResourceFacts, ResourceType, ScalarOperator, TagKeyValue,
};
pub use keyword::Keyword;
pub use policy::{
    BackupPlan, BackupPolicy, BackupPolicyDocument, BackupSchedule, HighFrequencyResourceType,
    ResourceSelector, Selection, SelectionMode,
};
pub use restore::{JobStatus, RestoreJobDocument, RestoreTarget, RestoreType, SnapshotDocument};
pub use schedule::{
    Frequency, Interval, IntervalHours, PlanType, Schedule, ScheduleDocument, StartWindow,
    TimeOfDay, TimeOfYear, Weekday,
};
