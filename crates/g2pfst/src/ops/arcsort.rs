// Arc sorting by input or output label.

use std::cmp::Ordering;

use crate::fst::{Arc, Fst};

/// Which label an arc sort orders by first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArcOrder {
    /// `(ilabel, olabel)`: the order compose expects on its right operand.
    #[default]
    Input,
    /// `(olabel, ilabel)`.
    Output,
}

/// Orders arcs by `(ilabel, olabel)`.
pub fn ilabel_compare(a: &Arc, b: &Arc) -> Ordering {
    a.ilabel.cmp(&b.ilabel).then(a.olabel.cmp(&b.olabel))
}

/// Orders arcs by `(olabel, ilabel)`.
pub fn olabel_compare(a: &Arc, b: &Arc) -> Ordering {
    a.olabel.cmp(&b.olabel).then(a.ilabel.cmp(&b.ilabel))
}

impl ArcOrder {
    pub fn compare(self, a: &Arc, b: &Arc) -> Ordering {
        match self {
            ArcOrder::Input => ilabel_compare(a, b),
            ArcOrder::Output => olabel_compare(a, b),
        }
    }

    /// Whether every state's arcs are already in this order.
    pub fn is_sorted(self, fst: &Fst) -> bool {
        fst.states()
            .iter()
            .all(|s| s.arcs().is_sorted_by(|a, b| self.compare(a, b) != Ordering::Greater))
    }
}

/// Sort the arcs of every state in place (stable).
pub fn arc_sort(fst: &mut Fst, order: ArcOrder) {
    for state in &mut fst.states {
        state.arcs.sort_by(|a, b| order.compare(a, b));
    }
}
