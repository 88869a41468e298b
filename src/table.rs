// src/table.rs

//! Plain text tables for listings (repos, search results, patches)

use std::cmp::Ordering;
use std::fmt;

/// Line drawing style, selected with `--table-style <n>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableStyle {
    #[default]
    Ascii,
    Light,
    Heavy,
    Double,
    Light3,
    Heavy3,
    LightDouble,
    HeavyDouble,
}

impl TableStyle {
    pub const COUNT: u32 = 8;

    /// Style for a numeric selector, `None` if out of range
    pub fn from_index(index: u32) -> Option<Self> {
        let style = match index {
            0 => TableStyle::Ascii,
            1 => TableStyle::Light,
            2 => TableStyle::Heavy,
            3 => TableStyle::Double,
            4 => TableStyle::Light3,
            5 => TableStyle::Heavy3,
            6 => TableStyle::LightDouble,
            7 => TableStyle::HeavyDouble,
            _ => return None,
        };
        Some(style)
    }

    /// (column separator, horizontal line, crossing)
    fn glyphs(self) -> (&'static str, &'static str, &'static str) {
        match self {
            TableStyle::Ascii => ("|", "-", "+"),
            TableStyle::Light => ("│", "─", "┼"),
            TableStyle::Heavy => ("┃", "━", "╋"),
            TableStyle::Double => ("║", "═", "╬"),
            TableStyle::Light3 => ("┆", "┄", "┼"),
            TableStyle::Heavy3 => ("┇", "┅", "╋"),
            TableStyle::LightDouble => ("│", "═", "╪"),
            TableStyle::HeavyDouble => ("┃", "═", "╪"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    style: TableStyle,
}

impl Table {
    pub fn new(style: TableStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    pub fn header<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Stable sort of the rows by one column
    pub fn sort_by_column(&mut self, column: usize) {
        self.rows.sort_by(|a, b| match (a.get(column), b.get(column)) {
            (Some(x), Some(y)) => x.cmp(y),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }

    fn widths(&self) -> Vec<usize> {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0);
        let mut widths = vec![0; columns];
        for row in std::iter::once(&self.header).chain(self.rows.iter()) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
        widths
    }

    fn write_row(&self, f: &mut fmt::Formatter<'_>, row: &[String], widths: &[usize]) -> fmt::Result {
        let (sep, _, _) = self.style.glyphs();
        let mut line = String::new();
        for (i, width) in widths.iter().enumerate() {
            if i > 0 {
                line.push(' ');
                line.push_str(sep);
                line.push(' ');
            }
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            line.push_str(cell);
            if i + 1 < widths.len() {
                let pad = width - cell.chars().count();
                line.extend(std::iter::repeat_n(' ', pad));
            }
        }
        writeln!(f, "{}", line.trim_end())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        if !self.header.is_empty() {
            self.write_row(f, &self.header, &widths)?;
            let (_, line, cross) = self.style.glyphs();
            let rule: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    let edge = if i == 0 || i + 1 == widths.len() { 1 } else { 2 };
                    line.repeat(w + edge)
                })
                .collect();
            writeln!(f, "{}", rule.join(cross))?;
        }
        for row in &self.rows {
            self.write_row(f, row, &widths)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_range() {
        assert_eq!(TableStyle::from_index(0), Some(TableStyle::Ascii));
        assert_eq!(TableStyle::from_index(7), Some(TableStyle::HeavyDouble));
        assert_eq!(TableStyle::from_index(TableStyle::COUNT), None);
    }

    #[test]
    fn test_ascii_rendering() {
        let mut table = Table::new(TableStyle::Ascii).header(["#", "Alias", "Name"]);
        table.add_row(["1", "oss", "Main Repository"]);
        table.add_row(["2", "update", "Updates"]);
        let out = table.to_string();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "# | Alias  | Name");
        assert_eq!(lines[1], "--+--------+----------------");
        assert_eq!(lines[2], "1 | oss    | Main Repository");
        assert_eq!(lines[3], "2 | update | Updates");
    }

    #[test]
    fn test_sort_by_column() {
        let mut table = Table::new(TableStyle::Ascii);
        table.add_row(["b", "2"]);
        table.add_row(["a", "3"]);
        table.add_row(["c", "1"]);
        table.sort_by_column(1);
        assert!(table.to_string().starts_with("c | 1"));
        table.sort_by_column(0);
        assert!(table.to_string().starts_with("a | 3"));
    }
}
