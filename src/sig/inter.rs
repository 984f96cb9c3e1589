use crate::check::GradeImpacts;
use crate::sticks::{StickId, StraightFilament};
use crate::types::{LineFit, Polygon, Rect};
use serde::{Deserialize, Serialize};

/// Grade at or above which an interpretation is considered good.
pub const GOOD_GRADE: f32 = 0.5;

/// Identifier of a vertex in a system's interpretation graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterId(pub u32);

/// Beam or beam hook, supplied by the beam stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeamInter {
    pub area: Polygon,
    pub grade: f32,
}

impl BeamInter {
    pub fn from_median(p0: [f32; 2], p1: [f32; 2], height: f32, grade: f32) -> Self {
        Self {
            area: Polygon::from_median(p0, p1, height),
            grade,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.area.bounds()
    }

    pub fn is_good(&self) -> bool {
        self.grade >= GOOD_GRADE
    }
}

/// Graded ledger hypothesis built from one candidate stick.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerInter {
    pub stick: StickId,
    /// Owning staff, set once the ledger survives conflict resolution.
    pub staff: Option<u32>,
    /// Signed line index: negative above the staff, positive below.
    pub index: i32,
    pub impacts: GradeImpacts,
    pub bounds: Rect,
    pub line: LineFit,
    pub start: [f32; 2],
    pub stop: [f32; 2],
    pub thickness: f32,
    #[serde(skip)]
    pub vip: bool,
}

impl LedgerInter {
    pub fn new(stick: &StraightFilament, index: i32, impacts: GradeImpacts) -> Self {
        Self {
            stick: stick.id,
            staff: None,
            index,
            impacts,
            bounds: stick.bounds,
            line: stick.line,
            start: stick.start_point(),
            stop: stick.stop_point(),
            thickness: stick.mean_thickness,
            vip: stick.vip,
        }
    }

    pub fn grade(&self) -> f32 {
        self.impacts.grade
    }

    /// Ordinate of the ledger center line, extrapolated outside its range.
    pub fn y_at(&self, x: f32) -> f32 {
        self.line.y_at(x)
    }

    pub fn center(&self) -> [f32; 2] {
        [
            (self.start[0] + self.stop[0]) * 0.5,
            (self.start[1] + self.stop[1]) * 0.5,
        ]
    }

    pub fn width(&self) -> i32 {
        self.bounds.w
    }
}

/// Vertex payload of the interpretation graph.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Inter {
    Beam(BeamInter),
    Ledger(LedgerInter),
}

impl Inter {
    pub fn grade(&self) -> f32 {
        match self {
            Inter::Beam(b) => b.grade,
            Inter::Ledger(l) => l.grade(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Inter::Beam(b) => b.bounds(),
            Inter::Ledger(l) => l.bounds,
        }
    }

    pub fn is_good(&self) -> bool {
        self.grade() >= GOOD_GRADE
    }

    pub fn is_vip(&self) -> bool {
        matches!(self, Inter::Ledger(l) if l.vip)
    }

    pub fn as_beam(&self) -> Option<&BeamInter> {
        match self {
            Inter::Beam(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_ledger(&self) -> Option<&LedgerInter> {
        match self {
            Inter::Ledger(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_ledger_mut(&mut self) -> Option<&mut LedgerInter> {
        match self {
            Inter::Ledger(l) => Some(l),
            _ => None,
        }
    }
}
