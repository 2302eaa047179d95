use std::fmt;

use qlfront_repr::row::RowBlock;

/// Renders a row block as an aligned text table.
///
/// ```text
/// role      | can_login
/// ----------+----------
/// app       | true
/// ```
#[derive(Debug)]
pub struct TextTable<'a> {
    block: &'a RowBlock,
}

impl<'a> TextTable<'a> {
    pub fn new(block: &'a RowBlock) -> Self {
        TextTable { block }
    }
}

impl fmt::Display for TextTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<String> = self
            .block
            .schema()
            .columns()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        let rows: Vec<Vec<String>> = self
            .block
            .rows()
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        write_line(f, &header, &widths)?;
        let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", sep.join("-+-"))?;
        for row in &rows {
            write_line(f, row, &widths)?;
        }

        match rows.len() {
            1 => write!(f, "(1 row)"),
            n => write!(f, "({n} rows)"),
        }
    }
}

fn write_line(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    writeln!(f, "{}", padded.join(" | ").trim_end())
}

#[cfg(test)]
mod tests {
    use qlfront_repr::datatype::DataType;
    use qlfront_repr::row::Row;
    use qlfront_repr::scalar::ScalarValue;
    use qlfront_repr::schema::{ColumnSchema, Schema};

    use super::*;

    #[test]
    fn aligned_columns() {
        let schema = Schema::try_new(
            [
                ColumnSchema::new("role", DataType::Text),
                ColumnSchema::new("member_of", DataType::list(DataType::Text)),
            ],
            1,
        )
        .unwrap();
        let block = RowBlock::try_new(
            schema,
            [
                Row::from_iter(["cassandra".into(), ScalarValue::List(Vec::new())]),
                Row::from_iter(["app".into(), ScalarValue::List(vec!["cassandra".into()])]),
            ],
        )
        .unwrap();

        insta::assert_snapshot!(TextTable::new(&block).to_string(), @r"
        role      | member_of
        ----------+------------
        cassandra | []
        app       | [cassandra]
        (2 rows)
        ");
    }

    #[test]
    fn empty_block() {
        let schema = Schema::try_new([ColumnSchema::new("resource", DataType::Text)], 0).unwrap();
        let block = RowBlock::new(schema);
        insta::assert_snapshot!(TextTable::new(&block).to_string(), @r"
        resource
        --------
        (0 rows)
        ");
    }
}
