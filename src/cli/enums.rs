//! CLI enum types for render style options.

use clap::ValueEnum;

use crate::render::Style;

/// Render style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StyleArg {
    #[default]
    Circle,
    Square,
    Scatter,
}

impl From<StyleArg> for Style {
    fn from(s: StyleArg) -> Self {
        match s {
            StyleArg::Circle => Style::Circle,
            StyleArg::Square => Style::Square,
            StyleArg::Scatter => Style::Scatter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_arg_to_style() {
        assert_eq!(Style::from(StyleArg::Circle), Style::Circle);
        assert_eq!(Style::from(StyleArg::Square), Style::Square);
        assert_eq!(Style::from(StyleArg::Scatter), Style::Scatter);
    }
}
