//! Delimiter detection over a file prefix sample.
//!
//! Detection is a pure function so it stays unit-testable independent of
//! file I/O. When detection is ambiguous the resolution falls back to a
//! frequency heuristic over semicolon vs. comma, and to semicolon on a tie.

/// Number of bytes sampled from the start of a file for detection.
pub const SAMPLE_SIZE: usize = 2048;

/// Delimiters considered by automatic detection.
const CANDIDATES: &[u8] = b";,\t|";

/// How the delimiter for a file was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterResolution {
    /// Exactly one candidate delimiter was consistent across the sample.
    Detected(u8),
    /// Detection was ambiguous; the more frequent of `;` and `,` won.
    FallbackHeuristic(u8),
    /// Detection and the heuristic both tied; hard default of `;`.
    Default(u8),
}

impl DelimiterResolution {
    /// The resolved delimiter byte.
    #[must_use]
    pub const fn delimiter(self) -> u8 {
        match self {
            Self::Detected(d) | Self::FallbackHeuristic(d) | Self::Default(d) => d,
        }
    }
}

/// Resolves the delimiter for a sample of file content.
///
/// A candidate is *consistent* when every complete sample line contains it
/// the same number of times, at least once. Exactly one consistent
/// candidate means detection succeeded; zero or several means the sample
/// is malformed or ambiguous and the frequency heuristic decides instead.
#[must_use]
pub fn resolve_delimiter(sample: &str) -> DelimiterResolution {
    if let Some(delimiter) = detect(sample) {
        return DelimiterResolution::Detected(delimiter);
    }

    let semicolons = sample.bytes().filter(|&b| b == b';').count();
    let commas = sample.bytes().filter(|&b| b == b',').count();

    if semicolons > commas {
        DelimiterResolution::FallbackHeuristic(b';')
    } else if commas > semicolons {
        DelimiterResolution::FallbackHeuristic(b',')
    } else {
        DelimiterResolution::Default(b';')
    }
}

/// Returns the single consistent candidate delimiter, or `None` when the
/// sample is empty, malformed, or more than one candidate fits.
fn detect(sample: &str) -> Option<u8> {
    let lines = complete_lines(sample);
    if lines.is_empty() {
        return None;
    }

    let mut consistent: Vec<u8> = Vec::new();

    for &candidate in CANDIDATES {
        let first = count_occurrences(lines[0], candidate);
        if first == 0 {
            continue;
        }
        if lines
            .iter()
            .all(|line| count_occurrences(line, candidate) == first)
        {
            consistent.push(candidate);
        }
    }

    match consistent.as_slice() {
        [single] => Some(*single),
        _ => None,
    }
}

/// Splits the sample into lines, dropping a trailing line that was cut off
/// mid-row by the fixed-size sample window.
fn complete_lines(sample: &str) -> Vec<&str> {
    let truncated = !sample.ends_with('\n') && sample.len() >= SAMPLE_SIZE;
    let mut lines: Vec<&str> = sample.lines().filter(|l| !l.is_empty()).collect();
    if truncated {
        lines.pop();
    }
    lines
}

fn count_occurrences(line: &str, byte: u8) -> usize {
    line.bytes().filter(|&b| b == byte).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_semicolon_file() {
        let sample = "UJAHR;UMONAT;XGCSWGS84\n2020;5;12,34\n2020;6;12,35\n";
        assert_eq!(
            resolve_delimiter(sample),
            DelimiterResolution::Detected(b';')
        );
    }

    #[test]
    fn detects_comma_file() {
        let sample = "UJAHR,UMONAT,X\n2020,5,12.34\n2020,6,12.35\n";
        assert_eq!(
            resolve_delimiter(sample),
            DelimiterResolution::Detected(b',')
        );
    }

    #[test]
    fn ambiguous_sample_falls_back_to_frequency() {
        // Both ';' and ',' are consistent across lines, so detection is
        // ambiguous; commas outnumber semicolons.
        let sample = "a;b,c,d\ne;f,g,h\n";
        assert_eq!(
            resolve_delimiter(sample),
            DelimiterResolution::FallbackHeuristic(b',')
        );
    }

    #[test]
    fn tie_defaults_to_semicolon() {
        assert_eq!(resolve_delimiter(""), DelimiterResolution::Default(b';'));
        // One of each, inconsistent between lines.
        let sample = "a;b\nc,d\n";
        assert_eq!(resolve_delimiter(sample), DelimiterResolution::Default(b';'));
    }

    #[test]
    fn single_line_sample_detects() {
        let sample = "UJAHR;UMONAT;IstPKW";
        assert_eq!(
            resolve_delimiter(sample),
            DelimiterResolution::Detected(b';')
        );
    }

    #[test]
    fn resolution_exposes_delimiter_byte() {
        assert_eq!(DelimiterResolution::Detected(b'\t').delimiter(), b'\t');
        assert_eq!(DelimiterResolution::Default(b';').delimiter(), b';');
    }
}
