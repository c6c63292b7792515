//! Plain-text rendering of the expense view.

use std::fmt::Write as _;

use client_core::ExpenseView;

pub const LOADING_PLACEHOLDER: &str = "Загрузка данных...";
pub const HEADING: &str = "Управление расходами";

pub fn render_view(view: &ExpenseView) -> String {
    if view.loading {
        return LOADING_PLACEHOLDER.to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{HEADING}");
    if let Some(banner) = &view.error_banner {
        let _ = writeln!(out, "[!] {banner} (dismiss: ×)");
    }

    if view.records.is_empty() {
        let _ = writeln!(out, "  (нет расходов)");
    }
    for (index, record) in view.records.iter().enumerate() {
        let marker = if view.selected.as_ref() == Some(&record.id) {
            '>'
        } else {
            ' '
        };
        let _ = writeln!(
            out,
            "{marker} {}. {} [{}] #{}",
            index + 1,
            record.display_title(),
            record.category,
            record.id
        );
    }

    let _ = write!(out, "Категории: {}", view.categories.join(", "));
    out
}
