use crate::image::ImageView;

/// Maximal horizontal sequence of foreground pixels on one row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Run {
    pub start: i32,
    pub length: i32,
}

impl Run {
    pub fn new(start: i32, length: i32) -> Self {
        Self { start, length }
    }

    /// Last covered column (inclusive).
    pub fn stop(&self) -> i32 {
        self.start + self.length - 1
    }

    /// Abscissa of the run center.
    pub fn center(&self) -> f32 {
        self.start as f32 + (self.length - 1) as f32 * 0.5
    }
}

/// Horizontal runs of an image, one sorted list per row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunTable {
    width: usize,
    rows: Vec<Vec<Run>>,
}

impl RunTable {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            rows: vec![Vec::new(); height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, y: usize) -> &[Run] {
        self.rows.get(y).map_or(&[], Vec::as_slice)
    }

    /// Append a run to row `y`; runs must be pushed left to right.
    pub fn push(&mut self, y: usize, run: Run) {
        if let Some(row) = self.rows.get_mut(y) {
            debug_assert!(row.last().map_or(true, |r| r.stop() < run.start));
            row.push(run);
        }
    }

    /// `(y, run)` pairs in raster order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Run)> {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(y, row)| row.iter().map(move |r| (y, r)))
    }

    pub fn run_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Total foreground pixels covered by the runs.
    pub fn weight(&self) -> usize {
        self.iter().map(|(_, r)| r.length as usize).sum()
    }
}

/// Scan `image` row by row and collect its foreground runs.
pub fn build_run_table<I: ImageView>(image: &I) -> RunTable {
    let mut table = RunTable::new(image.width(), image.height());
    for (y, row) in image.rows().enumerate() {
        let mut start: Option<usize> = None;
        for (x, &v) in row.iter().take(image.width()).enumerate() {
            let fore = v < crate::image::FOREGROUND_THRESHOLD;
            match (fore, start) {
                (true, None) => start = Some(x),
                (false, Some(s)) => {
                    table.push(y, Run::new(s as i32, (x - s) as i32));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            table.push(y, Run::new(s as i32, (image.width() - s) as i32));
        }
    }
    table
}
