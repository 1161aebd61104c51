//! The assessment engine: the declarative rule evaluator, the ADASS
//! severity calculator, and the attribute/permission assessors built on top
//! of both.

pub mod adass;
pub mod attribute;
pub mod operators;
pub mod permission;
pub mod rules;

pub use adass::AdassScore;
pub use attribute::{assess_user_attributes, AttributeAssessment};
pub use permission::{assess_permissions, PathAssessment, PermissionAssessment, PermissionRule, PermissionRuleTable};
pub use rules::{CriteriaEntry, CriterionClause, PropertyResolver, Rule, RuleEngine, RuleEvaluation};
