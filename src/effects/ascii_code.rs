/// Code-like fragments the ASCII card faces are cut from. Purely decorative.
pub(crate) const CODE_FRAGMENTS: &[&str] = &[
    "// compiled preview - scanner demo",
    "/* generated for visual effect - not executed */",
    "const SCAN_WIDTH: f32 = 8.0;",
    "const FADE_ZONE: f32 = 35.0;",
    "const MAX_PARTICLES: usize = 2500;",
    "const TRANSITION: f32 = 0.05;",
    "fn clamp(n: f32, a: f32, b: f32) -> f32 { n.max(a).min(b) }",
    "fn lerp(a: f32, b: f32, t: f32) -> f32 { a + (b - a) * t }",
    "let now = Instant::now();",
    "let scanner = Scanner { x: width / 2.0, width: SCAN_WIDTH, glow: 3.5 };",
    "fn tick(&mut self, dt: f32) { self.position += self.velocity * dt; }",
    "let state = State { intensity: 1.2, particles: MAX_PARTICLES };",
];

/// Numbered filler lines appended to the fixed fragments.
const GENERATED_LINES: usize = 40;

/// A block of monospace text filling a card's character grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiBlock {
    width: usize,
    height: usize,
    rows: Vec<String>,
}

impl AsciiBlock {
    /// Generate a `width × height` block of code-like text.
    pub fn generate(width: usize, height: usize, rng: &mut fastrand::Rng) -> Self {
        let mut lines: Vec<String> = CODE_FRAGMENTS.iter().map(|line| line.to_string()).collect();
        for index in 0..GENERATED_LINES {
            lines.push(format!(
                "let v{index} = ({} + {}) * 0.{};",
                rng.u32(1..=9),
                rng.u32(10..=99),
                rng.u32(1..=9)
            ));
        }

        let mut flow = collapse_whitespace(&lines.join(" "));
        let total = width * height;
        while flow.len() < total + width {
            flow.push(' ');
            flow.push_str(&collapse_whitespace(&lines[rng.usize(..lines.len())]));
        }

        // every fragment is ASCII so byte offsets are char offsets
        let rows = (0..height)
            .map(|row| {
                let start = (row * width).min(flow.len());
                let end = (start + width).min(flow.len());
                format!("{:<width$}", &flow[start..end])
            })
            .collect();
        Self { width, height, rows }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// The character at a grid position, blank outside the grid.
    pub fn char_at(&self, column: usize, row: usize) -> char {
        self.rows.get(row).and_then(|line| line.as_bytes().get(column)).map(|byte| *byte as char).unwrap_or(' ')
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(56, 17)]
    #[case(1, 1)]
    #[case(200, 3)]
    fn test_grid_dimensions(#[case] width: usize, #[case] height: usize) {
        let mut rng = fastrand::Rng::with_seed(7);
        let block = AsciiBlock::generate(width, height, &mut rng);
        assert_eq!(block.rows().len(), height);
        assert!(block.rows().iter().all(|row| row.len() == width));
    }

    #[test]
    fn test_printable_ascii_only() {
        let mut rng = fastrand::Rng::with_seed(42);
        let block = AsciiBlock::generate(56, 17, &mut rng);
        for row in block.rows() {
            assert!(row.chars().all(|c| c.is_ascii_graphic() || c == ' '), "unexpected char in {row:?}");
        }
    }

    #[test]
    fn test_no_whitespace_runs() {
        let mut rng = fastrand::Rng::with_seed(3);
        let block = AsciiBlock::generate(56, 17, &mut rng);
        let text: String = block.rows().concat();
        assert!(!text.trim_end().contains("  "));
    }

    #[test]
    fn test_char_at_outside_grid() {
        let mut rng = fastrand::Rng::with_seed(1);
        let block = AsciiBlock::generate(4, 2, &mut rng);
        assert_eq!(block.char_at(10, 0), ' ');
        assert_eq!(block.char_at(0, 10), ' ');
        assert_eq!(block.char_at(0, 0), '/');
    }

    #[test]
    fn test_empty_grid() {
        let mut rng = fastrand::Rng::with_seed(1);
        let block = AsciiBlock::generate(0, 0, &mut rng);
        assert!(block.rows().is_empty());
    }
}
