use crate::spreadsheet::cell::Cell;

/// A worksheet held as a sparse, row-major list of populated cells.
#[derive(Debug)]
pub(crate) struct Sheet {
    /// Source file name
    pub(crate) file_name: String,
    /// Sheet name
    pub(crate) name: String,
    /// Populated cells, ordered by row then column once finished
    cells: Vec<Cell>,
    /// Row index:
    /// 1. row index
    /// 2. cells lower index
    /// 3. cells upper index (exclusive)
    rows: Vec<(usize, usize, usize)>,
    /// Leftmost populated column
    pub(crate) col_lower_bound: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(file_name: &str, name: &str) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            rows: Vec::new(),
            col_lower_bound: None,
        }
    }

    /// Adds a cell, widening the column range as needed.
    pub(crate) fn push(&mut self, cell: Cell) {
        if self.col_lower_bound.is_none_or(|lower| cell.col < lower) {
            self.col_lower_bound = Some(cell.col);
        }
        self.cells.push(cell);
    }

    /// Orders the cells and builds the row index. Must be called once after the last push.
    ///
    /// Worksheets normally store rows in order, the sort only matters for hand-edited files.
    /// Later duplicates of the same position are dropped.
    pub(crate) fn finish(&mut self) {
        self.cells.sort_by_key(|cell| (cell.row, cell.col));
        self.cells.dedup_by_key(|cell| (cell.row, cell.col));

        self.rows.clear();
        let mut lower = 0;
        for index in 1..=self.cells.len() {
            if index == self.cells.len() || self.cells[index].row != self.cells[lower].row {
                self.rows.push((self.cells[lower].row, lower, index));
                lower = index;
            }
        }
    }

    /// Gets a populated row by its index.
    pub(crate) fn row(&self, row: usize) -> Option<Row<'_>> {
        let position = self.rows.binary_search_by_key(&row, |(index, _, _)| *index).ok()?;
        Some(self.row_at(position))
    }

    /// Iterates the populated rows in order.
    pub(crate) fn rows(&self) -> Rows<'_> {
        Rows { sheet: self, position: 0 }
    }

    /// Iterates the populated rows starting at `row`.
    pub(crate) fn rows_from(&self, row: usize) -> Rows<'_> {
        let position = self.rows.partition_point(|(index, _, _)| *index < row);
        Rows { sheet: self, position }
    }

    fn row_at(&self, position: usize) -> Row<'_> {
        let (index, lower, upper) = self.rows[position];
        Row {
            index,
            cells: &self.cells[lower..upper],
        }
    }
}

/// The populated cells of one physical row.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Row<'a> {
    /// Row index (0-based)
    pub(crate) index: usize,
    cells: &'a [Cell],
}

impl<'a> Row<'a> {
    /// Gets the cell in column `col`, `None` when it was never populated.
    pub(crate) fn get(&self, col: usize) -> Option<&'a Cell> {
        let cells = self.cells;
        cells
            .binary_search_by_key(&col, |cell| cell.col)
            .ok()
            .map(|position| &cells[position])
    }

    pub(crate) fn cells(&self) -> &'a [Cell] {
        self.cells
    }

    /// True when no cell in the row holds anything but whitespace.
    pub(crate) fn is_blank(&self) -> bool {
        self.cells.iter().all(Cell::is_blank)
    }
}

pub(crate) struct Rows<'a> {
    sheet: &'a Sheet,
    position: usize,
}

impl<'a> Iterator for Rows<'a> {
    type Item = Row<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position < self.sheet.rows.len() {
            let row = self.sheet.row_at(self.position);
            self.position += 1;
            Some(row)
        } else {
            None
        }
    }
}
