/// Levenshtein edit distance between two strings
///
/// Counts the minimum number of single-character insertions, deletions or
/// substitutions needed to turn `a` into `b`. Characters are Unicode scalar
/// values, not bytes. No case folding happens here; callers lower-case first.
///
/// Uses the full `(|b|+1) x (|a|+1)` table: cell `[i][j]` is the cost of
/// turning the first `j` chars of `a` into the first `i` chars of `b`.
/// Inputs are single words, so the quadratic table stays small.
///
/// # Returns
/// Number of edits (0 for identical strings)
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut matrix = vec![vec![0usize; a.len() + 1]; b.len() + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=b.len() {
        for j in 1..=a.len() {
            matrix[i][j] = if b[i - 1] == a[j - 1] {
                matrix[i - 1][j - 1]
            } else {
                1 + matrix[i - 1][j - 1]
                    .min(matrix[i][j - 1])
                    .min(matrix[i - 1][j])
            };
        }
    }

    matrix[b.len()][a.len()]
}

/// Check whether `word` is within the fuzzy tolerance of `query`
///
/// The tolerance scales with the candidate word, not the query: a word of
/// length `n` accepts up to `threshold * n` edits.
#[inline]
pub fn within_threshold(word: &str, query: &str, threshold: f64) -> bool {
    let allowed = threshold * word.chars().count() as f64;
    edit_distance(word, query) as f64 <= allowed
}
