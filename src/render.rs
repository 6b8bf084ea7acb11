use crate::port::Frame;

/// Letters assigned to sounds, cycling per direction in emission order.
const LETTERS: [char; 13] = ['o', 'u', 'a', 'e', 's', 'r', 'v', 'w', 'n', 'm', '.', '@', '#'];

/// Render a frame as a text block.
///
/// Layout, one row per line:
/// - a `=` rule followed by the instruction text
/// - direction 0, dotted separator, direction 1, the sound sum,
///   direction 2, dotted separator, direction 3
/// - the closing `=` rule
///
/// A direction row is the direction digit followed by one cell per
/// distance. Walls draw `|` at their distance; a sound draws its letter one
/// cell closer to the origin, and the row ends with a legend of letters and
/// intensities.
pub fn render(frame: &Frame<'_>) -> String {
    let width = frame
        .walls
        .iter()
        .map(|w| w.distance as usize + 1)
        .chain(frame.sounds.iter().map(|s| s.distance as usize + 1))
        .fold(frame.min_width, usize::max);

    let mut cells = vec![vec![' '; width]; 4];
    for wall in frame.walls {
        cells[usize::from(wall.direction)][wall.distance as usize] = '|';
    }

    let mut legends: [Vec<String>; 4] = Default::default();
    for sound in frame.sounds {
        let dir = usize::from(sound.direction);
        let letter = LETTERS[legends[dir].len() % LETTERS.len()];
        if let Some(cell) = (sound.distance as usize).checked_sub(1) {
            cells[dir][cell] = letter;
        }
        legends[dir].push(format!("{letter} = {}", sound.intensity));
    }

    let dots = format!(" {}", "\u{b7}".repeat(width));
    let mut rows = vec![String::new(); 7];
    for (dir, row_cells) in cells.iter().enumerate() {
        let mut row = format!("{dir}{}", row_cells.iter().collect::<String>());
        if !legends[dir].is_empty() {
            row.push_str("  ");
            row.push_str(&legends[dir].join(", "));
        }
        rows[2 * dir] = row;
    }
    rows[1] = dots.clone();
    rows[3] = format!("X   Sound sum : {}", frame.sound_sum);
    rows[5] = dots;

    let rule = "=".repeat(rows.iter().map(|r| r.chars().count()).max().unwrap_or(0));
    let header = match frame.instruction {
        Some(instruction) => format!("{rule} {instruction}"),
        None => format!("{rule} "),
    };

    let mut out = header;
    for row in &rows {
        out.push('\n');
        out.push_str(row);
    }
    out.push('\n');
    out.push_str(&rule);
    out
}
