use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use paramdep_xml::SkippedDependency;

use paramdep_cli::report::{DependencyRow, EntryStatus};

pub fn print_dependencies(rows: &[DependencyRow]) {
    if rows.is_empty() {
        println!("No dependencies.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Type"),
        header_cell("Family"),
        header_cell("Dependees"),
        header_cell("Dependents"),
        header_cell("Show if"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Center);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.dependency_type)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&row.family),
            Cell::new(row.dependees.join(", ")),
            Cell::new(row.dependents.join(", ")),
            match row.show_if {
                Some(show_if) => Cell::new(show_if),
                None => dim_cell("-"),
            },
        ]);
    }
    println!("{table}");
}

pub fn print_entries(statuses: &[EntryStatus]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Entry"),
        header_cell("Type"),
        header_cell("Value"),
        header_cell("Visible"),
        header_cell("Validator"),
        header_cell("Length"),
        header_cell("Valid"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Center);
    align_column(&mut table, 5, CellAlignment::Right);
    align_column(&mut table, 6, CellAlignment::Center);
    for status in statuses {
        let name_cell = if status.visible {
            Cell::new(&status.name).add_attribute(Attribute::Bold)
        } else {
            dim_cell(&status.name)
        };
        table.add_row(vec![
            name_cell,
            Cell::new(&status.value_type),
            Cell::new(status.value.to_string()),
            flag_cell(status.visible, Color::Green, Color::DarkGrey),
            status
                .validator
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
            status
                .required_length
                .map_or_else(|| dim_cell("-"), Cell::new),
            flag_cell(status.valid, Color::Green, Color::Red),
        ]);
    }
    println!("{table}");
}

pub fn print_skipped(skipped: &[SkippedDependency]) {
    if skipped.is_empty() {
        return;
    }
    eprintln!("Skipped dependencies:");
    for dependency in skipped {
        eprintln!(
            "- #{} {}: {}",
            dependency.index,
            dependency.dependency_type.as_deref().unwrap_or("<untyped>"),
            dependency.error
        );
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn flag_cell(value: bool, yes: Color, no: Color) -> Cell {
    if value {
        Cell::new("✓").fg(yes).add_attribute(Attribute::Bold)
    } else {
        Cell::new("✗").fg(no)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
