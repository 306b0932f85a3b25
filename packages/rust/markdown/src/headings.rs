//! Heading structure repair.
//!
//! After repair a body has exactly one H1, never skips a level going
//! deeper, and has no headings below level 4. Repair is idempotent.

use docweave_shared::syntax::{self, FenceTracker, LineClass};

/// Deepest heading level kept after repair.
const MAX_LEVEL: u8 = 4;

/// Repair the heading structure of `body`, inserting `# {title}` if it has no H1.
///
/// Unchanged heading lines are preserved byte-for-byte.
pub fn repair_headings(body: &str, title: &str) -> String {
    let has_h1 = syntax::headings(body).iter().any(|h| h.level == 1);

    let mut lines: Vec<String> = Vec::new();
    if !has_h1 {
        lines.push(format!("# {}", title.trim()));
        lines.push(String::new());
    }
    lines.extend(body.lines().map(String::from));

    let mut fences = FenceTracker::new();
    let mut seen_h1 = false;
    let mut prev_level = 0u8;

    for line in &mut lines {
        if fences.classify(line) != LineClass::Text {
            continue;
        }
        let Some((level, text)) = syntax::parse_heading(line) else {
            continue;
        };

        let mut fixed = level;
        if fixed == 1 {
            if seen_h1 {
                fixed = 2;
            } else {
                seen_h1 = true;
            }
        }
        if prev_level > 0 && fixed > prev_level + 1 {
            fixed = prev_level + 1;
        }
        fixed = fixed.min(MAX_LEVEL);
        prev_level = fixed;

        if fixed != level {
            *line = format!("{} {}", "#".repeat(fixed as usize), text);
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
