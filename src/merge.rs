//! Line-based three-way merge
//!
//! Reconciles a hand-edited target (`mine`) with freshly generated
//! content (`theirs`) using the previous generation's raw output (`base`)
//! as the common ancestor. Both sides' edit scripts against `base` are
//! computed with a longest-common-subsequence line diff; non-overlapping
//! base ranges apply cleanly from either side, identical edits collapse,
//! and genuinely conflicting ranges are kept as a marked conflict region
//! with the hand-edited lines first and the generated lines second.
//! Nothing is discarded silently.

use similar::{DiffOp, TextDiff};
use tracing::debug;

/// Opening marker of a conflict region (hand-edited side)
pub const CONFLICT_MARKER_CURRENT: &str = "<<<<<<< CURRENT";
/// Separator between the two sides of a conflict region
pub const CONFLICT_MARKER_SEPARATOR: &str = "=======";
/// Closing marker of a conflict region (generated side)
pub const CONFLICT_MARKER_GENERATED: &str = ">>>>>>> GENERATED";

/// Result of a three-way merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The merged text, conflict regions included
    pub content: String,
    /// Number of conflict regions emitted
    pub conflicts: usize,
}

/// One side's change to a half-open range of base lines
#[derive(Debug, Clone)]
struct Edit {
    base_start: usize,
    base_end: usize,
    lines: Vec<String>,
}

fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// The edit script turning `base` into `other`, in base order
fn edit_script(base: &[&str], other: &[&str]) -> Vec<Edit> {
    let diff = TextDiff::from_slices(base, other);
    let mut edits = Vec::new();

    for op in diff.ops() {
        match *op {
            DiffOp::Equal { .. } => {}
            DiffOp::Delete {
                old_index, old_len, ..
            } => edits.push(Edit {
                base_start: old_index,
                base_end: old_index + old_len,
                lines: Vec::new(),
            }),
            DiffOp::Insert {
                old_index,
                new_index,
                new_len,
            } => edits.push(Edit {
                base_start: old_index,
                base_end: old_index,
                lines: collect_lines(other, new_index, new_len),
            }),
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => edits.push(Edit {
                base_start: old_index,
                base_end: old_index + old_len,
                lines: collect_lines(other, new_index, new_len),
            }),
        }
    }

    edits
}

fn collect_lines(lines: &[&str], start: usize, len: usize) -> Vec<String> {
    lines[start..start + len]
        .iter()
        .map(|line| line.to_string())
        .collect()
}

/// Render one side's view of the base range `[lo, hi)`
fn render_side(base: &[&str], lo: usize, hi: usize, edits: &[Edit]) -> String {
    let mut out = String::new();
    let mut pos = lo;
    for edit in edits {
        for line in &base[pos..edit.base_start] {
            out.push_str(line);
        }
        for line in &edit.lines {
            out.push_str(line);
        }
        pos = edit.base_end;
    }
    for line in &base[pos..hi] {
        out.push_str(line);
    }
    out
}

fn push_block(out: &mut String, block: &str) {
    out.push_str(block);
    if !block.is_empty() && !block.ends_with('\n') {
        out.push('\n');
    }
}

/// Merge `mine` and `theirs` using `base` as the common ancestor
pub fn merge_three_way(base: &str, mine: &str, theirs: &str) -> MergeOutcome {
    let base_lines = split_lines(base);
    let mine_lines = split_lines(mine);
    let theirs_lines = split_lines(theirs);

    let mine_edits = edit_script(&base_lines, &mine_lines);
    let their_edits = edit_script(&base_lines, &theirs_lines);

    let mut content = String::new();
    let mut conflicts = 0;
    let mut emitted = 0;
    let (mut i, mut j) = (0, 0);

    while i < mine_edits.len() || j < their_edits.len() {
        let start = match (mine_edits.get(i), their_edits.get(j)) {
            (Some(a), Some(b)) => a.base_start.min(b.base_start),
            (Some(a), None) => a.base_start,
            (None, Some(b)) => b.base_start,
            (None, None) => break,
        };

        // Unchanged base lines up to the cluster.
        for line in &base_lines[emitted..start] {
            content.push_str(line);
        }

        // Grow a cluster of mutually overlapping edits. Edits touching
        // the cluster's start position belong to it; edits that begin at
        // its end do not, so adjacent changes stay independent.
        let mut hi = start;
        let cluster_mine_start = i;
        let cluster_theirs_start = j;
        loop {
            let mut grew = false;
            while let Some(edit) = mine_edits.get(i) {
                if edit.base_start == start || edit.base_start < hi {
                    hi = hi.max(edit.base_end);
                    i += 1;
                    grew = true;
                } else {
                    break;
                }
            }
            while let Some(edit) = their_edits.get(j) {
                if edit.base_start == start || edit.base_start < hi {
                    hi = hi.max(edit.base_end);
                    j += 1;
                    grew = true;
                } else {
                    break;
                }
            }
            if !grew {
                break;
            }
        }

        let cluster_mine = &mine_edits[cluster_mine_start..i];
        let cluster_theirs = &their_edits[cluster_theirs_start..j];

        if cluster_theirs.is_empty() {
            content.push_str(&render_side(&base_lines, start, hi, cluster_mine));
        } else if cluster_mine.is_empty() {
            content.push_str(&render_side(&base_lines, start, hi, cluster_theirs));
        } else {
            let mine_render = render_side(&base_lines, start, hi, cluster_mine);
            let theirs_render = render_side(&base_lines, start, hi, cluster_theirs);
            if mine_render == theirs_render {
                content.push_str(&mine_render);
            } else {
                conflicts += 1;
                debug!(base_start = start, base_end = hi, "conflicting edit ranges");
                content.push_str(CONFLICT_MARKER_CURRENT);
                content.push('\n');
                push_block(&mut content, &mine_render);
                content.push_str(CONFLICT_MARKER_SEPARATOR);
                content.push('\n');
                push_block(&mut content, &theirs_render);
                content.push_str(CONFLICT_MARKER_GENERATED);
                content.push('\n');
            }
        }

        emitted = hi;
    }

    for line in &base_lines[emitted..] {
        content.push_str(line);
    }

    MergeOutcome { content, conflicts }
}
