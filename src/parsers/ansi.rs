/// Escape introducer emitted before every colour code.
pub const ESC: char = '\x1b';

/// Terminator for SGR sequences.
const SGR_TERMINATOR: char = 'm';

/// The only sequences gosearch is known to print: red, green, yellow, reset.
pub const KNOWN_SEQUENCES: [&str; 4] = ["\x1b[31m", "\x1b[32m", "\x1b[33m", "\x1b[0m"];

/// Remove terminal colour codes from `input`, leaving visible text and
/// whitespace untouched.
///
/// Known sequences are removed by exact match first. Anything left over is
/// removed from the introducer through the next `m`. An introducer with no
/// `m` after it is left in place and ends the scan.
pub fn strip_ansi(input: &str) -> String {
    if !input.contains(ESC) {
        return input.to_string();
    }

    let mut out = input.to_string();
    for seq in KNOWN_SEQUENCES {
        if out.contains(seq) {
            out = out.replace(seq, "");
        }
    }

    // Each removal shrinks `out`, so the loop always terminates.
    while let Some(start) = out.find(ESC) {
        let Some(offset) = out[start..].find(SGR_TERMINATOR) else {
            break;
        };
        out.replace_range(start..=start + offset, "");
    }

    out
}
