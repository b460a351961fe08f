use eframe::egui::Color32;

use crate::poi::Category;

/// Route line colour (#3B82F6).
pub const ROUTE_COLOR: Color32 = Color32::from_rgb(0x3B, 0x82, 0xF6);
pub const USER_MARKER_COLOR: Color32 = Color32::from_rgb(0x25, 0x63, 0xEB);
pub const ESSENTIAL_BADGE: Color32 = Color32::from_rgb(0xFA, 0xCC, 0x15);
pub const DESTINATION_COLOR: Color32 = Color32::from_rgb(0xDC, 0x26, 0x26);
pub const ACCESSIBLE_BADGE: Color32 = Color32::from_rgb(0x10, 0xB9, 0x81);

pub fn category_color(category: Category) -> Color32 {
    match category {
        Category::Academic => Color32::from_rgb(0x3B, 0x82, 0xF6),
        Category::Dining => Color32::from_rgb(0xEF, 0x44, 0x44),
        Category::Recreation => Color32::from_rgb(0x10, 0xB9, 0x81),
        Category::Services => Color32::from_rgb(0x8B, 0x5C, 0xF6),
        Category::Transportation => Color32::from_rgb(0xF5, 0x9E, 0x0B),
        Category::Emergency => Color32::from_rgb(0xDC, 0x26, 0x26),
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub background: Color32,
    pub panel: Color32,
    pub foreground: Color32,
    pub muted: Color32,
    pub accent: Color32,
    pub card: Color32,
    pub card_selected: Color32,
    pub heading_size: f32,
    pub body_size: f32,
    pub small_size: f32,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            background: Color32::from_rgb(0xF3, 0xF4, 0xF6),
            panel: Color32::WHITE,
            foreground: Color32::from_rgb(0x11, 0x18, 0x27),
            muted: Color32::from_rgb(0x6B, 0x72, 0x80),
            accent: ROUTE_COLOR,
            card: Color32::from_rgb(0xF9, 0xFA, 0xFB),
            card_selected: Color32::from_rgb(0xDB, 0xEA, 0xFE),
            heading_size: 20.0,
            body_size: 14.0,
            small_size: 12.0,
        }
    }

    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            background: Color32::from_rgb(0x11, 0x18, 0x27),
            panel: Color32::from_rgb(0x1F, 0x29, 0x37),
            foreground: Color32::from_rgb(0xF3, 0xF4, 0xF6),
            muted: Color32::from_rgb(0x9C, 0xA3, 0xAF),
            accent: Color32::from_rgb(0x60, 0xA5, 0xFA),
            card: Color32::from_rgb(0x37, 0x41, 0x51),
            card_selected: Color32::from_rgb(0x1E, 0x3A, 0x8A),
            heading_size: 20.0,
            body_size: 14.0,
            small_size: 12.0,
        }
    }

    pub fn toggled(&self) -> Self {
        if self.name == "dark" {
            Self::light()
        } else {
            Self::dark()
        }
    }

    /// Apply opacity to a color
    pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
        Color32::from_rgba_unmultiplied(
            color.r(),
            color.g(),
            color.b(),
            (opacity.clamp(0.0, 1.0) * 255.0) as u8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_colors_are_distinct() {
        let mut colors: Vec<Color32> = Category::all().iter().map(|c| category_color(*c)).collect();
        colors.dedup();
        assert_eq!(colors.len(), Category::all().len());
        assert_eq!(category_color(Category::Dining), Color32::from_rgb(0xEF, 0x44, 0x44));
    }

    #[test]
    fn test_toggle_round_trip() {
        let t = Theme::dark();
        assert_eq!(t.toggled().name, "light");
        assert_eq!(t.toggled().toggled().name, "dark");
    }

    #[test]
    fn test_with_opacity() {
        let c = Theme::with_opacity(ROUTE_COLOR, 0.8);
        assert_eq!(c.a(), 204);
    }
}
