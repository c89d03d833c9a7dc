// Projection onto the input or output tape.

use crate::fst::{Fst, merge_arc};

/// Which tape a projection keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectType {
    Input,
    Output,
}

/// Turn `fst` into an acceptor over one of its tapes, in place.
///
/// Both labels of every arc become the kept label and both symbol tables
/// become the kept table. Arcs that become identical are merged.
pub fn project(fst: &mut Fst, project_type: ProjectType) {
    let semiring = fst.semiring;
    for state in &mut fst.states {
        let arcs = std::mem::take(&mut state.arcs);
        for mut arc in arcs {
            match project_type {
                ProjectType::Input => arc.olabel = arc.ilabel,
                ProjectType::Output => arc.ilabel = arc.olabel,
            }
            merge_arc(semiring, &mut state.arcs, arc);
        }
    }
    match project_type {
        ProjectType::Input => fst.osyms = fst.isyms.clone(),
        ProjectType::Output => fst.isyms = fst.osyms.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst::Arc;
    use g2pfst_core::Semiring;

    #[test]
    fn projection_merges_collapsed_arcs() {
        let mut fst = Fst::new(Semiring::Tropical);
        let s0 = fst.add_nonfinal_state();
        let s1 = fst.add_state(0.0);
        fst.set_start(s0).unwrap();
        fst.add_arc(s0, Arc::new(1, 2, 1.0, s1)).unwrap();
        fst.add_arc(s0, Arc::new(1, 3, 0.5, s1)).unwrap();

        project(&mut fst, ProjectType::Input);
        assert_eq!(fst.arcs(s0), &[Arc::new(1, 1, 0.5, s1)]);
        assert!(fst.is_acceptor());
    }
}
