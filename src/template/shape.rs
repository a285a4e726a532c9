//! Note head shapes and the anchors defined on their templates.

/// Note head shapes handled by template matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Shape {
    NoteheadBlack,
    NoteheadBlackSmall,
    NoteheadVoid,
    NoteheadVoidSmall,
    NoteheadCross,
    WholeNote,
    WholeNoteSmall,
    Breve,
}

impl Shape {
    /// Every shape a catalog holds, in catalog order.
    pub const ALL: [Shape; 8] = [
        Shape::Breve,
        Shape::WholeNote,
        Shape::WholeNoteSmall,
        Shape::NoteheadBlack,
        Shape::NoteheadBlackSmall,
        Shape::NoteheadVoid,
        Shape::NoteheadVoidSmall,
        Shape::NoteheadCross,
    ];

    /// Glyph index of the shape in the music font.
    pub fn glyph_code(self) -> u32 {
        match self {
            Shape::NoteheadBlack | Shape::NoteheadBlackSmall => 207,
            Shape::NoteheadVoid | Shape::NoteheadVoidSmall => 250,
            Shape::WholeNote | Shape::WholeNoteSmall => 119,
            Shape::NoteheadCross => 192,
            Shape::Breve => 87,
        }
    }

    /// Cue/grace variants, rendered at a reduced size.
    pub fn is_small(self) -> bool {
        matches!(
            self,
            Shape::NoteheadBlackSmall | Shape::NoteheadVoidSmall | Shape::WholeNoteSmall
        )
    }

    /// Shapes whose ink encloses an interior background region.
    pub fn has_hole(self) -> bool {
        matches!(
            self,
            Shape::NoteheadVoid
                | Shape::NoteheadVoidSmall
                | Shape::WholeNote
                | Shape::WholeNoteSmall
                | Shape::Breve
        )
    }

    /// Heads that never carry a stem.
    pub fn is_stemless(self) -> bool {
        matches!(self, Shape::Breve | Shape::WholeNote | Shape::WholeNoteSmall)
    }

    /// Stable lowercase name, used in logs and file names.
    pub fn name(self) -> &'static str {
        match self {
            Shape::NoteheadBlack => "notehead_black",
            Shape::NoteheadBlackSmall => "notehead_black_small",
            Shape::NoteheadVoid => "notehead_void",
            Shape::NoteheadVoidSmall => "notehead_void_small",
            Shape::NoteheadCross => "notehead_cross",
            Shape::WholeNote => "whole_note",
            Shape::WholeNoteSmall => "whole_note_small",
            Shape::Breve => "breve",
        }
    }
}

/// Named reference positions within a template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Anchor {
    Center,
    MiddleLeft,
    MiddleRight,
    TopLeftStem,
    LeftStem,
    BottomLeftStem,
    TopRightStem,
    RightStem,
    BottomRightStem,
}

impl Anchor {
    /// Short label drawn on debug images.
    pub fn abbreviation(self) -> &'static str {
        match self {
            Anchor::Center => "C",
            Anchor::MiddleLeft => "ML",
            Anchor::MiddleRight => "MR",
            Anchor::TopLeftStem => "TLS",
            Anchor::LeftStem => "LS",
            Anchor::BottomLeftStem => "BLS",
            Anchor::TopRightStem => "TRS",
            Anchor::RightStem => "RS",
            Anchor::BottomRightStem => "BRS",
        }
    }
}

/// Horizontal side of a head where a stem may attach.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}
