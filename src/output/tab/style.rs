use tabled::{
    Table,
    settings::{
        Alignment, Modify, Style,
        object::{Columns, Rows},
        style::LineText,
    },
};

use super::TabStyle;

pub(crate) fn apply_style(table: &mut Table, style: TabStyle) {
    match style {
        TabStyle::Rounded => table.with(Style::rounded()),
        TabStyle::Modern => table.with(Style::modern()),
        TabStyle::ModernRounded => table.with(Style::modern_rounded()),
        TabStyle::Ascii => table.with(Style::ascii()),
        TabStyle::Psql => table.with(Style::psql()),
        TabStyle::Markdown => table.with(Style::markdown()),
        TabStyle::Sharp => table.with(Style::sharp()),
        TabStyle::Blank => table.with(Style::blank()),
        TabStyle::Empty => table.with(Style::empty()),
    };
}

/// Title embedded in the top border. Styles without a top border drop it.
pub(crate) fn apply_title_line(table: &mut Table, title: &str) {
    table.with(LineText::new(format!(" {title} "), Rows::first()).offset(1));
}

pub(crate) fn align_right(table: &mut Table, columns: std::ops::Range<usize>) {
    table.with(Modify::new(Columns::new(columns)).with(Alignment::right()));
}
