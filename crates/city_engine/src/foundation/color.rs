//! RGBA color type shared by the instance pool, themes, and edge styling
//!
//! Host commands carry CSS-style hex strings; everything engine-side works
//! in linear `f32` components.

/// RGBA color with `f32` components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red component
    pub r: f32,
    /// Green component
    pub g: f32,
    /// Blue component
    pub b: f32,
    /// Alpha component
    pub a: f32,
}

impl Color {
    /// Opaque white
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    /// Opaque black
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    /// Create an opaque color from RGB components
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a color from RGBA components
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a CSS-style hex color: `#rgb`, `#rrggbb`, or `#rrggbbaa`.
    ///
    /// Returns `None` for anything else; callers fall back to a theme color
    /// and log a warning rather than failing the command.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        let component = |slice: &str| -> Option<f32> {
            u8::from_str_radix(slice, 16).ok().map(|v| f32::from(v) / 255.0)
        };
        match digits.len() {
            3 => {
                // Shorthand: each digit doubles (#f80 -> #ff8800)
                let mut parts = digits.chars().map(|c| {
                    let s: String = [c, c].iter().collect();
                    component(&s)
                });
                Some(Self::rgb(parts.next()??, parts.next()??, parts.next()??))
            }
            6 => Some(Self::rgb(
                component(&digits[0..2])?,
                component(&digits[2..4])?,
                component(&digits[4..6])?,
            )),
            8 => Some(Self::rgba(
                component(&digits[0..2])?,
                component(&digits[2..4])?,
                component(&digits[4..6])?,
                component(&digits[6..8])?,
            )),
            _ => None,
        }
    }

    /// Return the color with a different alpha
    pub const fn with_alpha(self, a: f32) -> Self {
        Self {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }

    /// Components as an `[r, g, b, a]` array (instance buffer layout)
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<Color> for [f32; 4] {
    fn from(color: Color) -> Self {
        color.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_hex_full_form() {
        let c = Color::from_hex("#4ec9b0").expect("valid hex");
        assert_relative_eq!(c.r, 78.0 / 255.0, epsilon = 1e-6);
        assert_relative_eq!(c.g, 201.0 / 255.0, epsilon = 1e-6);
        assert_relative_eq!(c.b, 176.0 / 255.0, epsilon = 1e-6);
        assert_relative_eq!(c.a, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_from_hex_shorthand() {
        let c = Color::from_hex("#f80").expect("valid hex");
        assert_relative_eq!(c.r, 1.0, epsilon = 1e-6);
        assert_relative_eq!(c.g, 136.0 / 255.0, epsilon = 1e-6);
        assert_relative_eq!(c.b, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_from_hex_with_alpha() {
        let c = Color::from_hex("#00000080").expect("valid hex");
        assert_relative_eq!(c.a, 128.0 / 255.0, epsilon = 1e-6);
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert!(Color::from_hex("4ec9b0").is_none()); // missing '#'
        assert!(Color::from_hex("#12345").is_none()); // bad length
        assert!(Color::from_hex("#gghhii").is_none()); // non-hex digits
        assert!(Color::from_hex("").is_none());
    }

    #[test]
    fn test_to_array_layout() {
        let c = Color::rgba(0.1, 0.2, 0.3, 0.4);
        assert_eq!(c.to_array(), [0.1, 0.2, 0.3, 0.4]);
    }
}
