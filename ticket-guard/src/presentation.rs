//! How statuses are shown on the gate screen.

use crate::stats::CapacityStatus;
use crate::validation::ValidationStatus;
use serde::Serialize;

/// Display color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// All good
    Green,
    /// Needs attention
    Yellow,
    /// Suspicious
    Orange,
    /// Refused or over the limit
    Red,
}

impl Color {
    /// Lowercase color name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }
}

/// Display icon
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    /// ✓
    Check,
    /// ⚠
    Warning,
    /// ✗
    Cross,
}

impl Icon {
    /// Terminal glyph
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Check => "✓",
            Self::Warning => "⚠",
            Self::Cross => "✗",
        }
    }
}

/// Color, icon and label for a status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StatusPresentation {
    /// Display color
    pub color: Color,
    /// Display icon
    pub icon: Icon,
    /// Short label
    pub label: &'static str,
}

impl ValidationStatus {
    /// How this scan outcome is shown
    #[must_use]
    pub const fn presentation(self) -> StatusPresentation {
        match self {
            Self::Valid => StatusPresentation {
                color: Color::Green,
                icon: Icon::Check,
                label: "Valid Ticket",
            },
            Self::Duplicate => StatusPresentation {
                color: Color::Orange,
                icon: Icon::Warning,
                label: "Duplicate Ticket",
            },
            Self::Invalid => StatusPresentation {
                color: Color::Red,
                icon: Icon::Cross,
                label: "Invalid Ticket",
            },
        }
    }
}

impl CapacityStatus {
    /// How this utilization band is shown
    #[must_use]
    pub const fn presentation(self) -> StatusPresentation {
        match self {
            Self::Normal => StatusPresentation {
                color: Color::Green,
                icon: Icon::Check,
                label: "Normal",
            },
            Self::Warning => StatusPresentation {
                color: Color::Yellow,
                icon: Icon::Warning,
                label: "Near Capacity",
            },
            Self::Critical => StatusPresentation {
                color: Color::Red,
                icon: Icon::Cross,
                label: "At Capacity",
            },
        }
    }
}
