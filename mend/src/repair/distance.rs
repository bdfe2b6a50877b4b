//! Structural distance between expression trees

use crate::model::Expression;

/// Edit distance between two trees.
///
/// Operations with the same operator and arity are compared argument by
/// argument; two differing leaves cost one relabel; anything else is the
/// cost of deleting one tree and inserting the other.
pub fn tree_distance(a: &Expression, b: &Expression) -> usize {
    if a == b {
        return 0;
    }
    match (a, b) {
        (Expression::Operation(x), Expression::Operation(y))
            if x.name == y.name && x.args.len() == y.args.len() =>
        {
            x.args
                .iter()
                .zip(&y.args)
                .map(|(l, r)| tree_distance(l, r))
                .sum()
        }
        (Expression::Constant(_) | Expression::Variable(_), Expression::Constant(_) | Expression::Variable(_)) => 1,
        _ => a.size() + b.size(),
    }
}

/// Cost of turning `old` into `new`; a missing side counts as its whole size
pub fn repair_cost(old: Option<&Expression>, new: Option<&Expression>) -> f64 {
    let distance = match (old, new) {
        (Some(a), Some(b)) => tree_distance(a, b),
        (Some(e), None) | (None, Some(e)) => e.size(),
        (None, None) => 0,
    };
    distance as f64
}
