//! Type-1/RPN to CQL query translator: converts an RPN tree plus the BIB-1 attribute
//! semantics (use, relation, position, structure, truncation, completeness) into a CQL
//! string under the configured index map, recursing structurally over boolean combinators
//! and result-set references.

use z2folio_core::config::Config;
use z2folio_core::diagnostic::Diagnostic;
use z2folio_core::rpn::{AttributeElement, Rpn, Term, BIB1_OID};

/// Looks up whether a named result set exists, for resolving `RSID` nodes.
///
/// A trait rather than a direct dependency on `z2folio-session` keeps the translator a pure
/// function of its inputs, free of any session-management machinery.
pub trait ResultSetLookup {
    fn has_result_set(&self, name: &str) -> bool;
}

impl<S: std::hash::BuildHasher> ResultSetLookup for std::collections::HashSet<String, S> {
    fn has_result_set(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl<V, S: std::hash::BuildHasher> ResultSetLookup for std::collections::HashMap<String, V, S> {
    fn has_result_set(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

/// Translate an RPN tree into a CQL string.
///
/// `default_attribute_set` is the attribute-set OID carried by the protocol-level search
/// request, used for any attribute that omits its own `set`. `result_sets` resolves `RSID`
/// references against the session's current result-set names.
pub fn translate(
    rpn: &Rpn,
    default_attribute_set: Option<&str>,
    config: &Config,
    result_sets: &dyn ResultSetLookup,
) -> Result<String, Diagnostic> {
    let body = translate_node(rpn, default_attribute_set, config, result_sets)?;
    Ok(wrap_query_filter(body, config))
}

fn wrap_query_filter(translated: String, config: &Config) -> String {
    match config.query_filter.as_deref().map(str::trim) {
        Some(filter) if !filter.is_empty() => format!("({translated}) and ({filter})"),
        _ => translated,
    }
}

fn translate_node(
    rpn: &Rpn,
    default_attribute_set: Option<&str>,
    config: &Config,
    result_sets: &dyn ResultSetLookup,
) -> Result<String, Diagnostic> {
    match rpn {
        Rpn::Term(term) => translate_term(term, default_attribute_set, config),
        Rpn::Rsid { id } => {
            if result_sets.has_result_set(id) {
                Ok(format!("cql.resultSetId=\"{id}\""))
            } else {
                Err(Diagnostic::illegal_result_set_name(id.clone()))
            }
        }
        Rpn::And { left, right } => translate_boolean(
            left,
            right,
            "and",
            default_attribute_set,
            config,
            result_sets,
        ),
        Rpn::Or { left, right } => translate_boolean(
            left,
            right,
            "or",
            default_attribute_set,
            config,
            result_sets,
        ),
        // The protocol's "AndNot" maps to CQL `not`.
        Rpn::AndNot { left, right } => translate_boolean(
            left,
            right,
            "not",
            default_attribute_set,
            config,
            result_sets,
        ),
    }
}

fn translate_boolean(
    left: &Rpn,
    right: &Rpn,
    op: &str,
    default_attribute_set: Option<&str>,
    config: &Config,
    result_sets: &dyn ResultSetLookup,
) -> Result<String, Diagnostic> {
    let left = translate_node(left, default_attribute_set, config, result_sets)?;
    let right = translate_node(right, default_attribute_set, config, result_sets)?;
    Ok(format!("({left} {op} {right})"))
}

/// Relation operator, resolved from attribute type 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
    Phonetic,
    Stem,
    Relevant,
}

impl Relation {
    fn from_value(value: i64) -> Option<Self> {
        Some(match value {
            1 => Self::Lt,
            2 => Self::Le,
            3 => Self::Eq,
            4 => Self::Ge,
            5 => Self::Gt,
            6 => Self::Ne,
            100 => Self::Phonetic,
            101 => Self::Stem,
            102 => Self::Relevant,
            _ => return None,
        })
    }

    fn as_cql(&self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "=",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Ne => "<>",
            Self::Phonetic => "=/phonetic",
            Self::Stem => "=/stem",
            Self::Relevant => "=/relevant",
        }
    }
}

/// Accumulated state from the second attribute pass.
#[derive(Debug, Default)]
struct Modifiers {
    relation: Option<Relation>,
    left_anchor: bool,
    right_anchor: bool,
    left_truncate: bool,
    right_truncate: bool,
}

fn translate_term(
    term: &Term,
    default_attribute_set: Option<&str>,
    config: &Config,
) -> Result<String, Diagnostic> {
    // First pass: verify attribute set, resolve the index (use attribute, type 1).
    let mut field: Option<String> = None;
    for attr in &term.attributes {
        verify_attribute_set(attr, default_attribute_set)?;
        if attr.attr_type == 1 {
            field = Some(resolve_use_attribute(attr.value, config)?);
        }
    }

    // Second pass: interpret every other modifier.
    let mut modifiers = Modifiers::default();
    for attr in &term.attributes {
        match attr.attr_type {
            1 => {} // handled above
            2 => {
                modifiers.relation = Some(
                    Relation::from_value(attr.value)
                        .ok_or(Diagnostic::UnsupportedRelation(attr.value))?,
                );
            }
            3 => match attr.value {
                1 | 2 => modifiers.left_anchor = true,
                3 => {}
                other => return Err(Diagnostic::UnsupportedPosition(other)),
            },
            4 => {} // structure: ignored
            5 => apply_truncation(attr.value, &mut modifiers)?,
            6 => match attr.value {
                1 => {}
                2 | 3 => {
                    modifiers.left_anchor = true;
                    modifiers.right_anchor = true;
                }
                other => return Err(Diagnostic::UnsupportedCompleteness(other)),
            },
            other => return Err(Diagnostic::UnsupportedAttributeType(other)),
        }
    }

    // Truncation codes 101/104 rewrite the term text directly rather than setting a wrap
    // flag; apply them in a separate sweep over the same type-5 attributes.
    let mut text = term.term.clone();
    for attr in &term.attributes {
        if attr.attr_type == 5 {
            text = apply_truncation_text(attr.value, text);
        }
    }

    Ok(assemble(field, modifiers, text))
}

fn verify_attribute_set(
    attr: &AttributeElement,
    default_attribute_set: Option<&str>,
) -> Result<(), Diagnostic> {
    let effective = attr.set.as_deref().or(default_attribute_set);
    match effective {
        Some(oid) if oid == BIB1_OID => Ok(()),
        Some(other) => Err(Diagnostic::unsupported_attribute_set(other.to_string())),
        None => Ok(()),
    }
}

fn resolve_use_attribute(value: i64, config: &Config) -> Result<String, Diagnostic> {
    match &config.index_map {
        Some(map) => map
            .get(&value.to_string())
            .cloned()
            .ok_or(Diagnostic::unsupported_use_attribute(value)),
        // No index map configured: use the raw value as the index name.
        None => Ok(value.to_string()),
    }
}

/// Sets the wrap flags for truncation codes 1/2/3/100. Codes 101/104 rewrite the term text
/// instead and are handled by [`apply_truncation_text`].
fn apply_truncation(value: i64, modifiers: &mut Modifiers) -> Result<(), Diagnostic> {
    match value {
        1 => modifiers.right_truncate = true,
        2 => modifiers.left_truncate = true,
        3 => {
            modifiers.left_truncate = true;
            modifiers.right_truncate = true;
        }
        100 | 101 | 104 => {} // none, or text rewrites handled separately
        other => return Err(Diagnostic::UnsupportedTruncation(other)),
    }
    Ok(())
}

/// Applies the text-rewriting truncation codes: 101 replaces `#` with `?`; 104 does the same
/// and then collapses `?` (optionally followed by one digit) into `*`.
fn apply_truncation_text(value: i64, text: String) -> String {
    match value {
        101 => text.replace('#', "?"),
        104 => {
            let replaced = text.replace('#', "?");
            collapse_question_marks(&replaced)
        }
        _ => text,
    }
}

/// Replaces each `?` optionally followed by one digit with `*` (truncation code 104).
fn collapse_question_marks(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '?' {
            out.push('*');
            if i + 1 < chars.len() && chars[i + 1].is_ascii_digit() {
                i += 2;
            } else {
                i += 1;
            }
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

const QUOTE_TRIGGERS: [char; 4] = [' ', '"', '/', '='];

fn assemble(field: Option<String>, modifiers: Modifiers, mut text: String) -> String {
    if modifiers.left_truncate {
        text = format!("*{text}");
    }
    if modifiers.right_truncate {
        text = format!("{text}*");
    }
    if modifiers.left_anchor {
        text = format!("^{text}");
    }
    if modifiers.right_anchor {
        text = format!("{text}^");
    }
    if text.chars().any(|c| QUOTE_TRIGGERS.contains(&c) || c.is_whitespace()) {
        text = format!("\"{text}\"");
    }

    match (field, modifiers.relation) {
        (Some(field), Some(relation)) => format!("{field} {} {text}", relation.as_cql()),
        (Some(field), None) => format!("{field}={text}"),
        (None, Some(relation)) => format!("cql.serverChoice {} {text}", relation.as_cql()),
        (None, None) => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use z2folio_core::config::Config;

    fn config_with_index_map() -> Config {
        let json = r#"{
            "baseUrl": "https://okapi.example.org",
            "tenant": "diku",
            "indexMap": {"1": "author", "4": "title", "7": "hrid"}
        }"#;
        Config::from_json_str(json).unwrap()
    }

    fn term(attrs: Vec<AttributeElement>, value: &str) -> Rpn {
        Rpn::Term(Term {
            attributes: attrs,
            term: value.to_string(),
        })
    }

    fn attr(attr_type: i64, value: i64) -> AttributeElement {
        AttributeElement {
            set: None,
            attr_type,
            value,
        }
    }

    fn attr_with_set(set: &str, attr_type: i64, value: i64) -> AttributeElement {
        AttributeElement {
            set: Some(set.to_string()),
            attr_type,
            value,
        }
    }

    fn empty_result_sets() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn scenario_1_use_attribute_only() {
        let config = config_with_index_map();
        let rpn = term(vec![attr_with_set(BIB1_OID, 1, 4)], "cat");
        let cql = translate(&rpn, None, &config, &empty_result_sets()).unwrap();
        assert_eq!(cql, "title=cat");
    }

    // Scenario 2.
    #[test]
    fn scenario_2_right_truncation() {
        let config = config_with_index_map();
        let rpn = term(vec![attr(1, 4), attr(5, 1)], "cat");
        let cql = translate(&rpn, None, &config, &empty_result_sets()).unwrap();
        assert_eq!(cql, "title=cat*");
    }

    // Scenario 3.
    #[test]
    fn scenario_3_position_and_both_truncation() {
        let config = config_with_index_map();
        let rpn = term(vec![attr(1, 4), attr(3, 1), attr(5, 3)], "cat");
        let cql = translate(&rpn, None, &config, &empty_result_sets()).unwrap();
        assert_eq!(cql, "title=^*cat*");
    }

    // Scenario 4.
    #[test]
    fn scenario_4_and_of_two_terms() {
        let config = config_with_index_map();
        let rpn = Rpn::And {
            left: Box::new(term(vec![attr(1, 1)], "doe")),
            right: Box::new(term(vec![attr(1, 4)], "the cat")),
        };
        let cql = translate(&rpn, None, &config, &empty_result_sets()).unwrap();
        assert_eq!(cql, "(author=doe and title=\"the cat\")");
    }

    // Scenario 5.
    #[test]
    fn scenario_5_missing_result_set() {
        let config = config_with_index_map();
        let rpn = Rpn::Rsid { id: "s1".to_string() };
        let err = translate(&rpn, None, &config, &empty_result_sets()).unwrap_err();
        assert_eq!(err.code(), Some(128));
        assert_eq!(err.addinfo(), "s1");
    }

    #[test]
    fn rsid_resolves_when_present() {
        let config = config_with_index_map();
        let mut sets = HashSet::new();
        sets.insert("s1".to_string());
        let rpn = Rpn::Rsid { id: "s1".to_string() };
        let cql = translate(&rpn, None, &config, &sets).unwrap();
        assert_eq!(cql, "cql.resultSetId=\"s1\"");
    }

    // Scenario 6.
    #[test]
    fn scenario_6_unmapped_use_attribute() {
        let config = config_with_index_map();
        let rpn = term(vec![attr(1, 999)], "x");
        let err = translate(&rpn, None, &config, &empty_result_sets()).unwrap_err();
        assert_eq!(err.code(), Some(114));
        assert_eq!(err.addinfo(), "999");
    }

    // Scenario 7.
    #[test]
    fn scenario_7_query_filter_and_joined() {
        let json = r#"{
            "baseUrl": "https://okapi.example.org",
            "tenant": "diku",
            "indexMap": {"1": "author", "4": "title", "7": "hrid"},
            "queryFilter": "source=marc"
        }"#;
        let config = Config::from_json_str(json).unwrap();
        let rpn = term(vec![attr_with_set(BIB1_OID, 1, 4)], "cat");
        let cql = translate(&rpn, None, &config, &empty_result_sets()).unwrap();
        assert_eq!(cql, "(title=cat) and (source=marc)");
    }

    #[test]
    fn empty_query_filter_is_identity() {
        let json = r#"{
            "baseUrl": "https://okapi.example.org",
            "tenant": "diku",
            "indexMap": {"4": "title"},
            "queryFilter": "   "
        }"#;
        let config = Config::from_json_str(json).unwrap();
        let rpn = term(vec![attr(1, 4)], "cat");
        let cql = translate(&rpn, None, &config, &empty_result_sets()).unwrap();
        assert_eq!(cql, "title=cat");
    }

    #[test]
    fn bare_term_with_no_attributes_is_identity() {
        let config = config_with_index_map();
        let rpn = term(vec![], "cat");
        let cql = translate(&rpn, None, &config, &empty_result_sets()).unwrap();
        assert_eq!(cql, "cat");
    }

    #[test]
    fn wrong_attribute_set_fails_121() {
        let config = config_with_index_map();
        let rpn = term(vec![attr_with_set("2.1.2.3.4", 1, 4)], "cat");
        let err = translate(&rpn, None, &config, &empty_result_sets()).unwrap_err();
        assert_eq!(err.code(), Some(121));
        assert_eq!(err.addinfo(), "2.1.2.3.4");
    }

    #[test]
    fn unsupported_attribute_type_fails_113() {
        let config = config_with_index_map();
        let rpn = term(vec![attr(1, 4), attr(42, 1)], "cat");
        let err = translate(&rpn, None, &config, &empty_result_sets()).unwrap_err();
        assert_eq!(err.code(), Some(113));
        assert_eq!(err.addinfo(), "42");
    }

    #[test]
    fn unsupported_relation_fails_117() {
        let config = config_with_index_map();
        let rpn = term(vec![attr(1, 4), attr(2, 999)], "cat");
        let err = translate(&rpn, None, &config, &empty_result_sets()).unwrap_err();
        assert_eq!(err.code(), Some(117));
    }

    #[test]
    fn relation_only_uses_server_choice() {
        let config = config_with_index_map();
        let rpn = term(vec![attr(2, 3)], "cat");
        let cql = translate(&rpn, None, &config, &empty_result_sets()).unwrap();
        assert_eq!(cql, "cql.serverChoice = cat");
    }

    #[test]
    fn field_and_relation_together() {
        let config = config_with_index_map();
        let rpn = term(vec![attr(1, 4), attr(2, 1)], "cat");
        let cql = translate(&rpn, None, &config, &empty_result_sets()).unwrap();
        assert_eq!(cql, "title < cat");
    }

    #[test]
    fn truncation_code_101_rewrites_hash_to_question_mark() {
        let config = config_with_index_map();
        let rpn = term(vec![attr(1, 4), attr(5, 101)], "ca#");
        let cql = translate(&rpn, None, &config, &empty_result_sets()).unwrap();
        assert_eq!(cql, "title=ca?");
    }

    #[test]
    fn truncation_code_104_collapses_digit_runs_to_star() {
        let config = config_with_index_map();
        let rpn = term(vec![attr(1, 4), attr(5, 104)], "wom#2n");
        let cql = translate(&rpn, None, &config, &empty_result_sets()).unwrap();
        assert_eq!(cql, "title=wom*n");
    }

    #[test]
    fn completeness_2_sets_both_anchors() {
        let config = config_with_index_map();
        let rpn = term(vec![attr(1, 4), attr(6, 2)], "cat");
        let cql = translate(&rpn, None, &config, &empty_result_sets()).unwrap();
        assert_eq!(cql, "title=^cat^");
    }

    #[test]
    fn no_index_map_uses_raw_value_as_field() {
        let json = r#"{"baseUrl": "https://okapi.example.org", "tenant": "diku"}"#;
        let config = Config::from_json_str(json).unwrap();
        let rpn = term(vec![attr(1, 4)], "cat");
        let cql = translate(&rpn, None, &config, &empty_result_sets()).unwrap();
        assert_eq!(cql, "4=cat");
    }

    #[test]
    fn default_attribute_set_applies_when_attribute_omits_set() {
        let config = config_with_index_map();
        // `set` omitted on the attribute, but a non-BIB-1 default set is supplied.
        let rpn = term(vec![attr(1, 4)], "cat");
        let err = translate(&rpn, Some("9.9.9.9"), &config, &empty_result_sets()).unwrap_err();
        assert_eq!(err.code(), Some(121));
    }

    #[test]
    fn and_not_maps_to_cql_not() {
        let config = config_with_index_map();
        let rpn = Rpn::AndNot {
            left: Box::new(term(vec![attr(1, 4)], "cat")),
            right: Box::new(term(vec![attr(1, 1)], "doe")),
        };
        let cql = translate(&rpn, None, &config, &empty_result_sets()).unwrap();
        assert_eq!(cql, "(title=cat not author=doe)");
    }

    #[test]
    fn translation_is_deterministic() {
        let config = config_with_index_map();
        let rpn = term(vec![attr(1, 4), attr(5, 1)], "cat");
        let once = translate(&rpn, None, &config, &empty_result_sets()).unwrap();
        let twice = translate(&rpn, None, &config, &empty_result_sets()).unwrap();
        assert_eq!(once, twice);
    }
}
