//! Scene rule parsing and the structured specification it produces.
//!
//! # Sub-modules
//!
//! - [`spec`] - `RuleSpec` and its naming/packaging parts, with the
//!   eBook-2022 defaults.
//! - [`parser`] - Heuristic extraction of a `RuleSpec` from rule text.

pub mod parser;
pub mod spec;

pub use parser::parse_rule_spec;
pub use spec::{
    ComponentConstraint, DizSpec, NamingComponent, NamingSpec, NfoSpec, PackagingSpec, RarSpec,
    RuleSpec, ZipSpec,
};
