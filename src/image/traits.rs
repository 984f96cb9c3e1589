use super::FOREGROUND_THRESHOLD;

/// Read-only, row-addressable 8-bit raster.
pub trait ImageView {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn row(&self, y: usize) -> &[u8];

    fn rows(&self) -> Rows<'_, Self>
    where
        Self: Sized,
    {
        Rows { image: self, y: 0 }
    }

    /// Foreground test with background outside the image bounds.
    fn is_fore(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width() || y as usize >= self.height() {
            return false;
        }
        self.row(y as usize)[x as usize] < FOREGROUND_THRESHOLD
    }
}

pub struct Rows<'a, I: ?Sized + ImageView> {
    image: &'a I,
    y: usize,
}

impl<'a, I: ImageView> Iterator for Rows<'a, I> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.y >= self.image.height() {
            return None;
        }
        let y = self.y;
        self.y += 1;
        Some(self.image.row(y))
    }
}
