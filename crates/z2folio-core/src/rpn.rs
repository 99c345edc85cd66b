//! The RPN query tree: a closed sum type over term nodes, named result-set references, and
//! boolean combinators.

use serde::{Deserialize, Serialize};

/// OID of the BIB-1 attribute set; the only attribute set this gateway recognizes.
pub const BIB1_OID: &str = "1.2.840.10003.3.1";

/// A single BIB-1 attribute: `{set, type, value}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeElement {
    /// Attribute-set OID; `None` means "use the default set from the search request".
    #[serde(default)]
    pub set: Option<String>,
    #[serde(rename = "type")]
    pub attr_type: i64,
    pub value: i64,
}

/// A term node: a list of BIB-1 attributes plus the search term text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub attributes: Vec<AttributeElement>,
    pub term: String,
}

/// The RPN tree: `Term`, `Rsid` (named result-set reference), or a boolean combination of
/// two subtrees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Rpn {
    Term(Term),
    Rsid { id: String },
    And { left: Box<Rpn>, right: Box<Rpn> },
    Or { left: Box<Rpn>, right: Box<Rpn> },
    AndNot { left: Box<Rpn>, right: Box<Rpn> },
}
