//! Filter condition analysis for the edge index.
//!
//! The index serves three shapes on its direction attribute:
//!
//! - `ref.attr == X` (or `X == ref.attr`)
//! - `ref.attr IN [X, ...]`
//! - an OR whose every branch is one of the above
//!
//! `X` must be a literal or a bound parameter. Inside an AND, the first
//! servable member is used and the rest is left to the general evaluator.

use spindle_query::{BinaryOp, Expr, Variable};

use crate::search::{search_value_count, SearchOrigin, SearchTerm};

/// Cost of positioning one store cursor, in units of one fetched entry.
pub const SEEK_COST: f64 = 1.0;

/// Planner estimates for serving a condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCosts {
    /// Expected number of tokens produced.
    pub estimated_items: usize,
    /// Expected cost of producing them.
    pub estimated_cost: f64,
}

impl FilterCosts {
    /// Estimate the cost of `lookups` lookups against an index of
    /// `items_in_index` entries with the given selectivity.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn estimate(lookups: usize, items_in_index: usize, selectivity: f64) -> Self {
        let estimated_items = if lookups == 0 || items_in_index == 0 {
            0
        } else {
            let selectivity = if selectivity > 0.0 { selectivity.min(1.0) } else { 1.0 };
            // float to int casts saturate
            ((lookups as f64 / selectivity).ceil() as usize).min(items_in_index)
        };
        Self {
            estimated_items,
            estimated_cost: estimated_items as f64 + lookups as f64 * SEEK_COST,
        }
    }
}

/// A condition split into the part the index serves and the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecializedCondition {
    /// `attr == X` or `attr IN [...]`, with the attribute on the left.
    pub index_condition: Expr,
    /// Members the caller still has to evaluate per document.
    pub remainder: Option<Expr>,
}

/// Check whether the condition can be served and estimate its cost.
///
/// Returns `None` for conditions the index cannot serve.
#[must_use]
pub fn supports_filter_condition(
    node: &Expr,
    variable: &Variable,
    attribute: &str,
    items_in_index: usize,
    selectivity: f64,
) -> Option<FilterCosts> {
    node.conjuncts()
        .into_iter()
        .find_map(|member| member_lookups(member, variable, attribute))
        .map(|lookups| FilterCosts::estimate(lookups, items_in_index, selectivity))
}

/// Pick the member of `node` the index serves and put it in canonical form.
///
/// An OR of equalities and IN lists is folded into one IN list, in
/// appearance order with duplicates kept.
#[must_use]
pub fn specialize_condition(node: Expr, variable: &Variable, attribute: &str) -> Option<SpecializedCondition> {
    let mut members = node.into_conjuncts();
    let pos = members
        .iter()
        .position(|member| member_lookups(member, variable, attribute).is_some())?;
    let chosen = members.remove(pos);
    Some(SpecializedCondition {
        index_condition: normalize(chosen, variable, attribute),
        remainder: Expr::conjunction(members),
    })
}

/// Compile a specialized condition, an atom or an OR of atoms, into search terms.
///
/// Returns `None` for anything else. AND nodes must go through
/// [`specialize_condition`] first so the remainder is not lost.
#[must_use]
pub fn search_terms<'a>(node: &'a Expr, variable: &Variable, attribute: &str) -> Option<Vec<SearchTerm<'a>>> {
    if let Expr::BinaryOp { op: BinaryOp::Or, .. } = node {
        return node
            .disjuncts()
            .into_iter()
            .map(|branch| atom_term(branch, variable, attribute))
            .collect();
    }
    atom_term(node, variable, attribute).map(|term| vec![term])
}

fn atom_term<'a>(node: &'a Expr, variable: &Variable, attribute: &str) -> Option<SearchTerm<'a>> {
    match node {
        Expr::BinaryOp { left, op: BinaryOp::Eq, right } => {
            if left.is_attribute_of(variable, attribute) && right.is_constant() {
                Some(SearchTerm::Eq(right))
            } else if right.is_attribute_of(variable, attribute) && left.is_constant() {
                Some(SearchTerm::Eq(left))
            } else {
                None
            }
        }
        Expr::InList { expr, list, negated: false }
            if expr.is_attribute_of(variable, attribute) && list.iter().all(Expr::is_constant) =>
        {
            Some(SearchTerm::In(list))
        }
        _ => None,
    }
}

fn atom_lookups(node: &Expr, variable: &Variable, attribute: &str) -> Option<usize> {
    match atom_term(node, variable, attribute)? {
        SearchTerm::Eq(value) => Some(search_value_count(value, SearchOrigin::Equality)),
        SearchTerm::In(list) => Some(list.iter().map(|v| search_value_count(v, SearchOrigin::InList)).sum()),
    }
}

fn member_lookups(node: &Expr, variable: &Variable, attribute: &str) -> Option<usize> {
    if let Expr::BinaryOp { op: BinaryOp::Or, .. } = node {
        return node
            .disjuncts()
            .into_iter()
            .map(|branch| atom_lookups(branch, variable, attribute))
            .sum();
    }
    atom_lookups(node, variable, attribute)
}

fn normalize(node: Expr, variable: &Variable, attribute: &str) -> Expr {
    match node {
        Expr::BinaryOp { left, op: BinaryOp::Eq, right } if !left.is_attribute_of(variable, attribute) => {
            Expr::BinaryOp { left: right, op: BinaryOp::Eq, right: left }
        }
        Expr::BinaryOp { op: BinaryOp::Or, .. } => {
            let mut list = Vec::new();
            for term in search_terms(&node, variable, attribute).unwrap_or_default() {
                match term {
                    SearchTerm::Eq(value) => list.push(value.clone()),
                    SearchTerm::In(values) => list.extend(values.iter().cloned()),
                }
            }
            Expr::attribute(variable, attribute).in_list(list, false)
        }
        other => other,
    }
}
