use crate::cli::TableArgs;
use crate::config::load_table;
use crate::error::Result;
use molframe::core::models::{ids::AtomId, molecule::Molecule};

pub fn run(args: TableArgs) -> Result<()> {
    let table = load_table(args.table.as_deref())?;
    let molecule = table.to_molecule(!args.keep_duplicates)?;
    print!("{}", render(&molecule));
    Ok(())
}

fn render(molecule: &Molecule) -> String {
    let mut out = format!(
        "{} atom(s), {} relation(s), {} bond(s)\n\nAtoms:\n",
        molecule.atom_count(),
        molecule.relation_count(),
        molecule.bond_count()
    );
    for (_, atom) in molecule.atoms_iter() {
        let p = atom.rest_position;
        out.push_str(&format!(
            "  {:>3}  {:<2} ({:>8.3}, {:>8.3}, {:>8.3})  mass {:.1}{}\n",
            atom.serial,
            atom.element,
            p.x,
            p.y,
            p.z,
            atom.mass,
            if atom.is_pivot() { "  (pivot)" } else { "" }
        ));
    }

    out.push_str("\nRelations:\n");
    for (_, relation) in molecule.relations_iter() {
        let serial = |id: AtomId| molecule.atom(id).map_or(0, |atom| atom.serial);
        out.push_str(&format!(
            "  {:>3} - {:<3} {:<9}{}\n",
            serial(relation.atom1_id),
            serial(relation.atom2_id),
            relation.kind.to_string(),
            if relation.multiplicity > 1 {
                format!(" x{}", relation.multiplicity)
            } else {
                String::new()
            }
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use molframe::core::table::GeometryTable;

    #[test]
    fn render_lists_every_atom_and_relation() {
        let molecule = GeometryTable::builtin().to_molecule(true).unwrap();
        let text = render(&molecule);

        assert!(text.starts_with(&format!(
            "{} atom(s), {} relation(s)",
            molecule.atom_count(),
            molecule.relation_count()
        )));
        let atom_lines = text
            .lines()
            .skip_while(|l| *l != "Atoms:")
            .skip(1)
            .take_while(|l| !l.is_empty())
            .count();
        assert_eq!(atom_lines, molecule.atom_count());
        assert!(text.contains("(pivot)"));
    }

    #[test]
    fn keeping_duplicates_shows_more_relations() {
        let table = GeometryTable::builtin();
        let folded = table.to_molecule(true).unwrap();
        let raw = table.to_molecule(false).unwrap();
        assert!(raw.relation_count() > folded.relation_count());
        assert!(render(&folded).contains(" x2"));
    }
}
