use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::collections::BTreeSet;

pub fn ranked_scores(ranked: &[(String, f64)]) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Archetype").add_attribute(Attribute::Bold),
        Cell::new("Score").fg(Color::Cyan),
    ]);

    if let Some(col) = table.column_mut(1) {
        col.set_cell_alignment(CellAlignment::Right);
    }

    if ranked.is_empty() {
        table.add_row(vec![Cell::new("(no archetype above threshold)"), Cell::new("-")]);
    }

    for (archetype, score) in ranked {
        table.add_row(vec![
            Cell::new(archetype),
            Cell::new(format!("{score:.3}")).fg(Color::Cyan),
        ]);
    }

    println!("{table}");
}

pub fn ingest_summary(archetypes: &BTreeSet<String>, record_count: usize) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![Cell::new("Archetype").add_attribute(Attribute::Bold)]);
    for archetype in archetypes {
        table.add_row(vec![Cell::new(archetype)]);
    }

    println!("{table}");
    println!("{} record(s), {} archetype(s)", record_count, archetypes.len());
}
