use std::collections::HashMap;

/// Source of colours for categories that have none assigned yet.
pub trait ColorPalette {
    /// Returns the same colour for repeated calls with the same key.
    fn color_for(&mut self, key: &str) -> String;
}

const DEFAULT_COLORS: [&str; 20] = [
    "#01B8AA", "#374649", "#FD625E", "#F2C80F", "#5F6B6D", "#8AD4EB", "#FE9666", "#A66999",
    "#3599B8", "#DFBFBF", "#4AC5BB", "#5F6B6D", "#FB8281", "#F4D25A", "#7F898A", "#A4DDEE",
    "#FDAB89", "#B687AC", "#28738A", "#A78F8F",
];

/// Hands out the built-in theme colours in first-request order, cycling when
/// exhausted.
#[derive(Debug, Clone, Default)]
pub struct DefaultPalette {
    assigned: HashMap<String, String>,
    next: usize,
}

impl DefaultPalette {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ColorPalette for DefaultPalette {
    fn color_for(&mut self, key: &str) -> String {
        if let Some(color) = self.assigned.get(key) {
            return color.clone();
        }
        let color = DEFAULT_COLORS[self.next % DEFAULT_COLORS.len()].to_string();
        self.next += 1;
        self.assigned.insert(key.to_string(), color.clone());
        color
    }
}

#[cfg(test)]
mod tests {
    use super::{ColorPalette, DefaultPalette};

    #[test]
    fn repeated_keys_reuse_their_colour() {
        let mut palette = DefaultPalette::new();
        let a = palette.color_for("A");
        let b = palette.color_for("B");

        assert_ne!(a, b);
        assert_eq!(palette.color_for("A"), a);
    }

    #[test]
    fn cycles_after_exhaustion() {
        let mut palette = DefaultPalette::new();
        let first = palette.color_for("0");
        for idx in 1..20 {
            palette.color_for(&idx.to_string());
        }
        assert_eq!(palette.color_for("20"), first);
    }
}
