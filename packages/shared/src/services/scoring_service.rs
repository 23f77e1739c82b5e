//! WMC row-based scoring of recalled digit grids.
//!
//! Pure functions over value types: the same `(recalled, actual)` pair
//! always yields the same result. Cells beyond the player's attempted
//! range are never penalized, and rows or cells with no actual
//! counterpart are simply not scored.

use serde::{Deserialize, Serialize};

/// WMC standard row width.
pub const STANDARD_DIGITS_PER_ROW: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringVariant {
    /// Row-based partial credit: one error halves the row.
    Wmc,
    /// All-or-nothing: any error zeroes the row.
    Usa,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowScore {
    pub row_index: usize,
    pub errors: u32,
    pub score: i32,
    pub is_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub total_score: i32,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub row_scores: Vec<RowScore>,
}

/// Scores a recalled grid against the actual grid, `[page][row][col]`.
/// Rows the player left entirely empty are skipped; attempted rows are
/// compared up to the last filled cell only.
pub fn score_grids(
    recalled: &[Vec<Vec<String>>],
    actual: &[Vec<Vec<String>>],
    digits_per_row: usize,
    variant: ScoringVariant,
) -> ScoringResult {
    let mut result = ScoringResult {
        total_score: 0,
        correct_count: 0,
        wrong_count: 0,
        row_scores: Vec::new(),
    };

    let mut row_index = 0;
    for (recalled_page, actual_page) in recalled.iter().zip(actual.iter()) {
        for (recalled_row, actual_row) in recalled_page.iter().zip(actual_page.iter()) {
            if let Some(row_score) =
                score_row(recalled_row, actual_row, digits_per_row, variant, row_index)
            {
                result.total_score += row_score.score;
                result.wrong_count += row_score.errors;
                result.correct_count += attempted_len(recalled_row, actual_row) as u32
                    - row_score.errors;
                result.row_scores.push(row_score);
            }
            row_index += 1;
        }
    }

    result
}

/// Normalizes a raw digit score to championship points:
/// `round(raw / standard * 1000)`. `standard` is the canonical digit
/// count for the event, e.g. 3234 for Hour Numbers.
pub fn millennium_score(raw_score: i32, standard: i32) -> i32 {
    if standard <= 0 {
        return 0;
    }
    (raw_score as f64 / standard as f64 * 1000.0).round() as i32
}

/// Number of comparable cells: up to the last filled recalled cell,
/// clipped to what the actual row can answer for.
fn attempted_len(recalled_row: &[String], actual_row: &[String]) -> usize {
    match last_filled_index(recalled_row) {
        Some(last) => (last + 1).min(actual_row.len()),
        None => 0,
    }
}

fn last_filled_index(row: &[String]) -> Option<usize> {
    row.iter().rposition(|cell| !cell.is_empty())
}

fn score_row(
    recalled_row: &[String],
    actual_row: &[String],
    digits_per_row: usize,
    variant: ScoringVariant,
    row_index: usize,
) -> Option<RowScore> {
    // Entirely empty rows count toward nothing.
    last_filled_index(recalled_row)?;

    let attempted = attempted_len(recalled_row, actual_row);
    let errors = recalled_row
        .iter()
        .zip(actual_row.iter())
        .take(attempted)
        .filter(|(r, a)| r != a)
        .count() as u32;

    let is_complete = attempted == digits_per_row;
    let score = match variant {
        ScoringVariant::Wmc => match errors {
            0 => attempted as i32,
            // Half credit, rounded down for a full row, up otherwise.
            1 if is_complete => (attempted / 2) as i32,
            1 => ((attempted + 1) / 2) as i32,
            _ => 0,
        },
        ScoringVariant::Usa => {
            if errors == 0 {
                attempted as i32
            } else {
                0
            }
        }
    };

    Some(RowScore {
        row_index,
        errors,
        score,
        is_complete,
    })
}
