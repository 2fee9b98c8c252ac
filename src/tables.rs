use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::core::schedule::Schedule;

#[must_use]
pub fn build_schedule_table(schedule: &Schedule) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table.set_header(vec!["Date", "Start", "Value"]);
    for entry in &schedule.entries {
        table.add_row(vec![
            Cell::new(entry.start.format("%b %d")).add_attribute(Attribute::Dim),
            Cell::new(entry.start.format("%H:%M")),
            Cell::new(format!("{:.3}", entry.value)).set_alignment(CellAlignment::Right).fg(
                if entry.value > 0.0 {
                    Color::Green
                } else if entry.value < 0.0 {
                    Color::Red
                } else {
                    Color::Reset
                },
            ),
        ]);
    }
    table
}
