use serde::{Deserialize, Serialize};

/// Sheet-level scale: main interline, optional small-staff interline and the
/// mean staff-line thickness, all in pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scale {
    pub interline: i32,
    #[serde(default)]
    pub small_interline: Option<i32>,
    pub line_thickness: f32,
}

impl Scale {
    pub fn new(interline: i32, line_thickness: f32) -> Self {
        Self {
            interline,
            small_interline: None,
            line_thickness,
        }
    }

    /// Scale of the main (large) staves.
    pub fn interline_scale(&self) -> InterlineScale {
        InterlineScale::new(self.interline)
    }

    /// Scale tied to a staff-specific interline.
    pub fn specific(&self, interline: i32) -> InterlineScale {
        InterlineScale::new(interline)
    }

    /// Fraction of main interline, rounded to pixels.
    pub fn to_pixels(&self, frac: f32) -> i32 {
        self.interline_scale().to_pixels(frac)
    }

    /// Fraction of staff-line thickness, rounded to pixels.
    pub fn line_frac_to_pixels(&self, line_frac: f32) -> i32 {
        (line_frac * self.line_thickness).round() as i32
    }
}

/// Conversions between pixels and fractions of one interline value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterlineScale {
    pub interline: i32,
}

impl InterlineScale {
    pub fn new(interline: i32) -> Self {
        Self { interline }
    }

    pub fn to_pixels(&self, frac: f32) -> i32 {
        self.to_pixels_f(frac).round() as i32
    }

    pub fn to_pixels_f(&self, frac: f32) -> f32 {
        frac * self.interline as f32
    }

    pub fn pixels_to_frac(&self, pixels: f32) -> f32 {
        if self.interline > 0 {
            pixels / self.interline as f32
        } else {
            f32::INFINITY
        }
    }
}
