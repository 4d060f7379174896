use noisefield_core::ScalarField2D;

// Terminal preview: '#' above the threshold, '.' otherwise. Large fields are
// sampled down so the output fits in max_w × max_h characters.
pub fn ascii(field: &ScalarField2D, threshold: f32, max_w: usize, max_h: usize) -> String {
    if field.is_empty() || max_w == 0 || max_h == 0 {
        return String::new();
    }
    let cols = field.width().min(max_w);
    let rows = field.height().min(max_h);
    let mut out = String::with_capacity((cols + 1) * rows);
    for r in 0..rows {
        let y = r * field.height() / rows;
        for c in 0..cols {
            let x = c * field.width() / cols;
            out.push(if field.get(x, y) > threshold { '#' } else { '.' });
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_fields_render_one_char_per_cell() {
        let field = ScalarField2D::from_vec(3, 2, vec![0.9, 0.1, 0.6, 0.0, 1.0, 0.5]).unwrap();
        assert_eq!(ascii(&field, 0.5, 80, 40), "#.#\n.#.\n");
    }

    #[test]
    fn large_fields_are_downsampled() {
        let field = ScalarField2D::filled(200, 100, 1.0);
        let text = ascii(&field, 0.5, 50, 10);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 10);
        assert!(lines.iter().all(|l| l.len() == 50 && l.chars().all(|c| c == '#')));
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert!(ascii(&ScalarField2D::new(0, 0), 0.5, 10, 10).is_empty());
        assert!(ascii(&ScalarField2D::new(4, 4), 0.5, 0, 10).is_empty());
    }
}
