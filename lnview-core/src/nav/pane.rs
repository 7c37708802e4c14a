use super::{Error, Result, Speed, View};

/// Column layout of a table, in characters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Columns {
    widths: Vec<usize>,
    separator: usize,
}

impl Columns {
    pub fn new(widths: Vec<usize>, separator: usize) -> Self {
        Columns { widths, separator }
    }

    /// Total width of the table
    pub fn width(&self) -> usize {
        self.widths.iter().map(|w| w + self.separator).sum()
    }

    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// The first column whose right edge lies past `x`.
    /// Returns the number of columns if `x` is past the table.
    pub fn index_at(&self, x: usize) -> usize {
        let mut edge = 0;
        for (index, width) in self.widths.iter().enumerate() {
            edge += width + self.separator;
            if x < edge {
                return index;
            }
        }
        self.widths.len()
    }

    /// Horizontal steps from `x`: to the start of the next column and to the
    /// start of the previous one.  Zero where there is no such column.
    pub fn steps(&self, x: usize) -> (usize, usize) {
        let current = self.index_at(x);
        let right = if current + 1 < self.widths.len() {
            self.widths[current] + self.separator
        } else {
            0
        };
        let left = if current > 0 { self.widths[current - 1] + self.separator } else { 0 };
        (right, left)
    }
}

/// The navigation speed for a table with `rows` rows, at horizontal
/// position `x` and row `row`
pub fn speed(columns: &Columns, x: usize, row: usize, rows: usize) -> Speed {
    let (right, left) = columns.steps(x);
    let down = if row + 1 < rows { 1 } else { 0 };
    let up = if row > 0 { 1 } else { 0 };
    Speed { right, left, down, up }
}

/// A table viewport.
///
/// The presentation layer resizes it when the terminal changes and sets the
/// number of rows after every refresh of the backing collection.
#[derive(Clone, Debug, Default)]
pub struct Pane {
    columns: Columns,
    width: usize,
    height: usize,
    cursor: (usize, usize),
    origin: (usize, usize),
    rows: usize,
}

impl Pane {
    pub fn new(columns: Columns) -> Self {
        Pane { columns, ..Default::default() }
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    /// Set the visible area, pulling the cursor back inside it
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let (cx, cy) = self.cursor;
        if width > 0 && cx >= width {
            self.origin.0 += cx - (width - 1);
            self.cursor.0 = width - 1;
        }
        if height > 0 && cy >= height {
            self.origin.1 += cy - (height - 1);
            self.cursor.1 = height - 1;
        }
    }

    /// Set the length of the backing collection, keeping the selection on a row
    pub fn set_rows(&mut self, rows: usize) {
        self.rows = rows;
        if rows == 0 {
            self.cursor.1 = 0;
            self.origin.1 = 0;
            return;
        }
        let last = rows - 1;
        if self.index() > last {
            if last >= self.origin.1 {
                self.cursor.1 = last - self.origin.1;
            } else {
                self.origin.1 = last;
                self.cursor.1 = 0;
            }
        }
    }

    /// The row under the cursor
    pub fn index(&self) -> usize {
        self.origin.1 + self.cursor.1
    }

    /// The selected row, if the collection has one there
    pub fn selected(&self) -> Option<usize> {
        let index = self.index();
        if index < self.rows {
            Some(index)
        } else {
            None
        }
    }

    /// Horizontal position of the cursor within the table
    pub fn position(&self) -> usize {
        self.origin.0 + self.cursor.0
    }

    /// The column under the cursor
    pub fn current_column(&self) -> usize {
        self.columns.index_at(self.position())
    }
}

impl View for Pane {
    fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    fn origin(&self) -> (usize, usize) {
        self.origin
    }

    fn set_cursor(&mut self, x: usize, y: usize) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::InvalidPoint(x, y));
        }
        self.cursor = (x, y);
        Ok(())
    }

    fn set_origin(&mut self, x: usize, y: usize) -> Result<()> {
        self.origin = (x, y);
        Ok(())
    }

    fn speed(&self) -> Speed {
        speed(&self.columns, self.position(), self.index(), self.rows)
    }

    fn limits(&self) -> (usize, usize) {
        (self.height, self.rows)
    }
}
