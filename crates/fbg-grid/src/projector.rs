//! Projection of engine pages into grid rows.

use fbg_model::{
    ColumnKind, EngineCell, GridLayout, Header, OverlayCell, OverlayField, PageMatrix,
    ReadonlyCell, ReadonlyField, Row, RowKey,
};

/// Project one page of engine cells into rows.
///
/// Column order is dimensions, then measures, then overlays, each in
/// definition order. Dimensions are selectable; measures keep their numeric
/// value and are never selectable. Overlays start empty and editable.
///
/// The key is read from the designated key column only. A blank or missing
/// key cell yields `row-{index}-page-{page}`; no other column is consulted.
/// Missing trailing cells in a ragged row project as empty text.
pub fn project(matrix: &PageMatrix, layout: &GridLayout) -> Vec<Row> {
    let key_position = layout.key_position();

    matrix
        .rows
        .iter()
        .enumerate()
        .map(|(index, cells)| {
            let key_text = cells.get(key_position).map(|cell| cell.text.as_str());
            let key = RowKey::from_cell(key_text, index, matrix.page);

            let readonly = layout
                .engine_columns()
                .enumerate()
                .map(|(position, (column, kind))| ReadonlyField {
                    column: column.id.clone(),
                    cell: readonly_cell(cells.get(position), kind),
                })
                .collect();

            let overlay = layout
                .overlays()
                .iter()
                .map(|column| OverlayField {
                    overlay: column.id.clone(),
                    cell: OverlayCell::empty(),
                })
                .collect();

            Row {
                key,
                index,
                readonly,
                overlay,
            }
        })
        .collect()
}

fn readonly_cell(cell: Option<&EngineCell>, kind: ColumnKind) -> ReadonlyCell {
    let Some(cell) = cell else {
        return ReadonlyCell {
            selectable: kind == ColumnKind::Dimension,
            ..Default::default()
        };
    };

    match kind {
        ColumnKind::Measure => ReadonlyCell {
            text: cell.text.clone(),
            numeric: cell.numeric,
            selectable: false,
            element_id: None,
        },
        _ => ReadonlyCell {
            text: cell.text.clone(),
            numeric: None,
            selectable: true,
            element_id: cell.element_id,
        },
    }
}

/// Header list in projection order.
pub fn headers(layout: &GridLayout) -> Vec<Header> {
    let engine = layout.engine_columns().map(|(column, kind)| Header {
        id: column.id.clone(),
        label: column.label.clone(),
        kind,
        selectable: kind == ColumnKind::Dimension,
        editable: false,
    });
    let overlays = layout.overlays().iter().map(|column| Header {
        id: column.id.clone(),
        label: column.label.clone(),
        kind: ColumnKind::Overlay,
        selectable: false,
        editable: true,
    });
    engine.chain(overlays).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbg_model::ColumnDef;

    fn layout() -> GridLayout {
        GridLayout::new(
            vec![ColumnDef::new("customer"), ColumnDef::new("region")],
            vec![ColumnDef::labelled("revenue", "Revenue")],
            vec![ColumnDef::new("status"), ColumnDef::new("comments")],
            "customer",
        )
        .unwrap()
    }

    fn cells(customer: &str, region: &str, revenue: f64) -> Vec<EngineCell> {
        vec![
            EngineCell {
                text: customer.to_string(),
                numeric: None,
                element_id: Some(7),
            },
            EngineCell::text(region),
            EngineCell::number(format!("{revenue:.2}"), revenue),
        ]
    }

    #[test]
    fn test_column_order_and_flags() {
        let matrix = PageMatrix::new(1, vec![cells("Acme", "EMEA", 12.5)]);
        let rows = project(&matrix, &layout());
        let row = &rows[0];

        let order: Vec<_> = row.readonly.iter().map(|f| f.column.as_str()).collect();
        assert_eq!(order, vec!["customer", "region", "revenue"]);
        let overlays: Vec<_> = row.overlay.iter().map(|f| f.overlay.as_str()).collect();
        assert_eq!(overlays, vec!["status", "comments"]);

        let customer = row.readonly("customer").unwrap();
        assert!(customer.selectable);
        assert_eq!(customer.element_id, Some(7));

        let revenue = row.readonly("revenue").unwrap();
        assert!(!revenue.selectable);
        assert_eq!(revenue.numeric, Some(12.5));

        assert!(row.overlay.iter().all(|f| f.cell.editable && f.cell.text.is_empty()));
        assert_eq!(row.key, RowKey::Natural("Acme".to_string()));
    }

    #[test]
    fn test_blank_key_uses_synthetic_fallback() {
        let matrix = PageMatrix::new(
            4,
            vec![cells("Acme", "EMEA", 1.0), cells("", "APAC", 2.0)],
        );
        let rows = project(&matrix, &layout());
        assert_eq!(rows[1].key.to_string(), "row-1-page-4");
        // The region column is never used as a substitute key.
        assert!(rows[1].key.is_synthetic());
    }

    #[test]
    fn test_ragged_row_projects_empty_cells() {
        let matrix = PageMatrix::new(1, vec![vec![EngineCell::text("Acme")]]);
        let rows = project(&matrix, &layout());
        assert_eq!(rows[0].readonly.len(), 3);
        assert_eq!(rows[0].readonly("revenue").unwrap().text, "");
        assert_eq!(rows[0].readonly("revenue").unwrap().numeric, None);
    }

    #[test]
    fn test_headers_follow_projection_order() {
        let headers = headers(&layout());
        let ids: Vec<_> = headers.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["customer", "region", "revenue", "status", "comments"]);
        assert_eq!(headers[2].label, "Revenue");
        assert!(headers[3].editable);
        assert!(!headers[2].selectable);
    }
}
