//! Color themes for entities and edges

use crate::foundation::color::Color;
use crate::graph::{DependencyEdge, EdgeKind, EdgeStyle, ImportVariant};

use super::entity::EntityKind;

/// Palette and styling rules applied across the world
///
/// Consulted at entity creation when the command carries no color, at edge
/// insertion, and by bulk restyle passes. Entities with explicit caller colors
/// are never themed.
#[derive(Debug, Clone)]
pub struct Theme {
    /// File entity color
    pub file: Color,
    /// Module entity color
    pub module: Color,
    /// Class entity color
    pub class: Color,
    /// Function entity color
    pub function: Color,
    /// Marker entity color
    pub marker: Color,

    /// Import edge color
    pub import_edge: Color,
    /// Extends edge color
    pub extends_edge: Color,
    /// Calls edge color
    pub calls_edge: Color,
    /// Override color for circular-flagged edges
    pub circular_edge: Color,

    /// Line width for weight 1
    pub base_edge_width: f32,
    /// Width ceiling for heavy edges
    pub max_edge_width: f32,
    /// Edge alpha when the command specifies none
    pub default_edge_opacity: f32,
    /// Render type-only imports dashed
    pub dash_type_imports: bool,
}

impl Default for Theme {
    fn default() -> Self {
        // Dark palette: a city at night.
        Self {
            file: Color::rgb(0.306, 0.788, 0.690),
            module: Color::rgb(0.337, 0.612, 0.839),
            class: Color::rgb(0.773, 0.525, 0.753),
            function: Color::rgb(0.863, 0.863, 0.667),
            marker: Color::rgb(0.831, 0.831, 0.831),

            import_edge: Color::rgb(0.502, 0.502, 0.502),
            extends_edge: Color::rgb(0.773, 0.525, 0.753),
            calls_edge: Color::rgb(0.337, 0.612, 0.839),
            circular_edge: Color::rgb(0.957, 0.278, 0.278),

            base_edge_width: 0.08,
            max_edge_width: 0.4,
            default_edge_opacity: 0.85,
            dash_type_imports: true,
        }
    }
}

impl Theme {
    /// Display color for an entity kind
    pub fn entity_color(&self, kind: EntityKind) -> Color {
        match kind {
            EntityKind::File => self.file,
            EntityKind::Module => self.module,
            EntityKind::Class => self.class,
            EntityKind::Function => self.function,
            EntityKind::Marker => self.marker,
        }
    }

    /// Line width for an edge weight
    pub fn edge_width(&self, weight: u32) -> f32 {
        (self.base_edge_width * weight as f32).min(self.max_edge_width)
    }

    /// Resolve the full styling for one edge
    ///
    /// An explicit override color wins over both the kind color and the
    /// circular override. The opacity parameter replaces the color's alpha;
    /// without it, themed colors get the default edge opacity while override
    /// colors keep the alpha they arrived with.
    pub fn edge_style(
        &self,
        edge: &DependencyEdge,
        color_override: Option<Color>,
        opacity: Option<f32>,
    ) -> EdgeStyle {
        let mut color = color_override.unwrap_or_else(|| {
            if edge.is_circular {
                self.circular_edge
            } else {
                match edge.kind {
                    EdgeKind::Import => self.import_edge,
                    EdgeKind::Extends => self.extends_edge,
                    EdgeKind::Calls => self.calls_edge,
                }
            }
        });

        if let Some(opacity) = opacity {
            color = color.with_alpha(opacity);
        } else if color_override.is_none() {
            color = color.with_alpha(self.default_edge_opacity);
        }

        EdgeStyle {
            color,
            width: self.edge_width(edge.weight),
            dashed: self.dash_type_imports && edge.import_variant == ImportVariant::Type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn import_edge(circular: bool) -> DependencyEdge {
        DependencyEdge {
            id: "e".to_string(),
            source: "a".to_string(),
            target: "b".to_string(),
            kind: EdgeKind::Import,
            weight: 1,
            is_circular: circular,
            import_variant: ImportVariant::Value,
        }
    }

    #[test]
    fn test_entity_colors_differ_by_kind() {
        let theme = Theme::default();
        assert_ne!(
            theme.entity_color(EntityKind::File).to_array(),
            theme.entity_color(EntityKind::Function).to_array()
        );
    }

    #[test]
    fn test_circular_edges_get_override_color() {
        let theme = Theme::default();
        let style = theme.edge_style(&import_edge(true), None, None);
        assert_relative_eq!(style.color.r, theme.circular_edge.r);
        assert_relative_eq!(style.color.g, theme.circular_edge.g);
    }

    #[test]
    fn test_explicit_color_beats_circular() {
        let theme = Theme::default();
        let pinned = Color::rgb(0.0, 1.0, 0.0);
        let style = theme.edge_style(&import_edge(true), Some(pinned), None);
        assert_relative_eq!(style.color.g, 1.0);
        assert_relative_eq!(style.color.r, 0.0);
        // Override colors keep their own alpha.
        assert_relative_eq!(style.color.a, 1.0);
    }

    #[test]
    fn test_default_opacity_applied_to_themed_colors() {
        let theme = Theme::default();
        let style = theme.edge_style(&import_edge(false), None, None);
        assert_relative_eq!(style.color.a, theme.default_edge_opacity);

        let faint = theme.edge_style(&import_edge(false), None, Some(0.3));
        assert_relative_eq!(faint.color.a, 0.3);
    }

    #[test]
    fn test_type_imports_dash() {
        let theme = Theme::default();
        let mut edge = import_edge(false);
        edge.import_variant = ImportVariant::Type;
        assert!(theme.edge_style(&edge, None, None).dashed);

        edge.import_variant = ImportVariant::Reexport;
        assert!(!theme.edge_style(&edge, None, None).dashed);
    }

    #[test]
    fn test_edge_width_scales_and_caps() {
        let theme = Theme::default();
        assert_relative_eq!(theme.edge_width(1), theme.base_edge_width);
        assert_relative_eq!(theme.edge_width(2), theme.base_edge_width * 2.0);
        assert_relative_eq!(theme.edge_width(100), theme.max_edge_width);
    }
}
