//! Dirty tracking: does the notebook differ from its last confirmed save?

use crate::snapshot::{NotebookSnapshot, SavedNotebook};

/// Whether `current` must be saved to match `last_saved`
///
/// With no baseline, a notebook is dirty as soon as it has a cell. With a
/// baseline, any difference in cell count, in code, name or config at the same
/// index, or in layout makes it dirty. Cell ids are not compared.
pub fn needs_save(current: &NotebookSnapshot, last_saved: Option<&SavedNotebook>) -> bool {
    let Some(saved) = last_saved else {
        return !current.is_empty();
    };

    current.len() != saved.len()
        || current.codes() != saved.codes()
        || current.names() != saved.names()
        || current.configs() != saved.configs()
        || current.layout() != saved.layout()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::{Cell, CellConfig, CellId};
    use serde_json::json;

    fn sample_cells() -> Vec<Cell> {
        vec![
            Cell::with_id("a".into(), "import pandas as pd").named("imports"),
            Cell::with_id("b".into(), "df = pd.read_csv('q3.csv')"),
            Cell::with_id("c".into(), "df.describe()"),
        ]
    }

    fn snapshot_of(cells: &[Cell]) -> NotebookSnapshot {
        NotebookSnapshot::from_cells(cells, Some(json!({"type": "vertical"})))
    }

    #[test]
    fn test_identical_snapshots_are_clean() {
        let baseline = snapshot_of(&sample_cells());
        let current = snapshot_of(&sample_cells());
        assert!(!needs_save(&current, Some(&baseline.to_saved())));
    }

    #[test]
    fn test_any_single_field_difference_is_dirty() {
        let baseline = snapshot_of(&sample_cells()).to_saved();

        for index in 0..3 {
            let mut cells = sample_cells();
            cells[index].code.push_str(" # edited");
            assert!(needs_save(&snapshot_of(&cells), Some(&baseline)), "code {}", index);

            let mut cells = sample_cells();
            cells[index].name = format!("renamed_{}", index);
            assert!(needs_save(&snapshot_of(&cells), Some(&baseline)), "name {}", index);

            let mut cells = sample_cells();
            cells[index].config = CellConfig {
                disabled: false,
                hide_code: true,
            };
            assert!(needs_save(&snapshot_of(&cells), Some(&baseline)), "config {}", index);
        }
    }

    #[test]
    fn test_layout_difference_is_dirty() {
        let baseline = snapshot_of(&sample_cells()).to_saved();
        let current = NotebookSnapshot::from_cells(&sample_cells(), Some(json!({"type": "grid"})));
        assert!(needs_save(&current, Some(&baseline)));

        let current = NotebookSnapshot::from_cells(&sample_cells(), None);
        assert!(needs_save(&current, Some(&baseline)));
    }

    #[test]
    fn test_cell_count_difference_is_dirty() {
        let baseline = snapshot_of(&sample_cells()).to_saved();

        let mut cells = sample_cells();
        cells.push(Cell::with_id("d".into(), ""));
        assert!(needs_save(&snapshot_of(&cells), Some(&baseline)));

        let mut cells = sample_cells();
        cells.pop();
        assert!(needs_save(&snapshot_of(&cells), Some(&baseline)));
    }

    #[test]
    fn test_cell_ids_are_not_compared() {
        let baseline = snapshot_of(&sample_cells()).to_saved();
        let mut cells = sample_cells();
        cells[0].id = CellId::new("zz");
        assert!(!needs_save(&snapshot_of(&cells), Some(&baseline)));
    }

    #[test]
    fn test_without_baseline() {
        let empty = NotebookSnapshot::from_cells(&[], None);
        assert!(!needs_save(&empty, None));

        let one = NotebookSnapshot::from_cells(&[Cell::new("")], None);
        assert!(needs_save(&one, None));
    }

    #[test]
    fn test_empty_notebook_against_empty_baseline() {
        let empty = NotebookSnapshot::from_cells(&[], None);
        assert!(!needs_save(&empty, Some(&empty.to_saved())));
    }
}
