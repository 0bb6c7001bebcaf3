//! Property-based tests for the layout parser and occupancy grid.

use proptest::prelude::*;
use warehouse_store::{
    entities::{space, warehouse, SpaceKind},
    grid::OccupancyGrid,
    layout::{Layout, LayoutCell, LayoutError},
};

// Rectangular layouts of path, shelf and empty cells
fn layout_rows_strategy() -> impl Strategy<Value = Vec<String>> {
    (1usize..20, 1usize..12).prop_flat_map(|(width, height)| {
        prop::collection::vec(
            prop::collection::vec(prop::sample::select(vec!['P', 'S', '.']), width)
                .prop_map(|cells| cells.into_iter().collect::<String>()),
            height,
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn parsed_dimensions_match_the_text(rows in layout_rows_strategy()) {
        let text = rows.join("\n");
        let layout = Layout::parse(&text).unwrap();

        prop_assert_eq!(layout.width() as usize, rows[0].len());
        prop_assert_eq!(layout.height() as usize, rows.len());
        prop_assert_eq!(layout.cells().count(), rows.len() * rows[0].len());
    }

    #[test]
    fn stored_cells_rebuild_the_same_layout(rows in layout_rows_strategy()) {
        let layout = Layout::parse(&rows.join("\n")).unwrap();

        let spaces: Vec<space::Model> = layout
            .cells()
            .filter_map(|(x, y, cell)| {
                cell.kind().map(|kind| space::Model {
                    warehouse_id: 1,
                    x_pos: x,
                    y_pos: y,
                    kind: Some(kind.as_str().to_string()),
                })
            })
            .collect();

        let rebuilt = Layout::from_spaces(layout.width(), layout.height(), &spaces).unwrap();
        prop_assert_eq!(rebuilt.to_string(), format!("{}\n", rows.join("\n")));
        prop_assert_eq!(
            spaces.len(),
            layout.count(SpaceKind::Path) + layout.count(SpaceKind::Shelf)
        );
    }

    #[test]
    fn grid_blocks_exactly_the_shelves(rows in layout_rows_strategy()) {
        let layout = Layout::parse(&rows.join("\n")).unwrap();
        let owner = warehouse::Model {
            warehouse_id: 1,
            name: None,
            width: layout.width(),
            height: layout.height(),
        };
        let spaces: Vec<space::Model> = layout
            .cells()
            .filter(|(_, _, cell)| *cell == LayoutCell::Shelf)
            .map(|(x, y, _)| space::Model {
                warehouse_id: 1,
                x_pos: x,
                y_pos: y,
                kind: Some("shelf".to_string()),
            })
            .collect();

        let grid = OccupancyGrid::from_spaces(&owner, &spaces);
        prop_assert_eq!(grid.obstacles(), layout.count(SpaceKind::Shelf));
        for (x, y, cell) in layout.cells() {
            prop_assert_eq!(grid.is_blocked(x, y), cell == LayoutCell::Shelf);
        }
    }

    #[test]
    fn rows_of_different_width_are_rejected(
        (width, shorter) in (2usize..20).prop_flat_map(|w| (Just(w), 1..w)),
        height in 1usize..6,
    ) {
        let mut text = format!("{}\n", "P".repeat(width)).repeat(height);
        text.push_str(&"S".repeat(shorter));

        let err = Layout::parse(&text).unwrap_err();
        prop_assert_eq!(
            err,
            LayoutError::RaggedRow { line: height + 1, expected: width, found: shorter }
        );
    }
}
