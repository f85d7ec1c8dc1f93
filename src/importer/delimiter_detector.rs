// ==========================================
// Schedule Import - delimiter detection
// ==========================================
// Counts candidate delimiters over the first lines of the text.
// Ties resolve in candidate order, so comma wins any tie it is in.
// ==========================================

/// Candidates in tie-break order
pub const DELIMITER_CANDIDATES: [u8; 3] = [b',', b';', b'\t'];

/// Number of leading lines sampled
pub const DEFAULT_SAMPLE_LINES: usize = 3;

/// Pick the most frequent delimiter in the first `DEFAULT_SAMPLE_LINES` lines
pub fn detect_delimiter(text: &str) -> u8 {
    detect_delimiter_with_sample(text, DEFAULT_SAMPLE_LINES)
}

/// Pick the most frequent delimiter in the first `sample_lines` lines
pub fn detect_delimiter_with_sample(text: &str, sample_lines: usize) -> u8 {
    let sample: Vec<&str> = text.lines().take(sample_lines.max(1)).collect();

    let mut best = DELIMITER_CANDIDATES[0];
    let mut best_count = 0usize;

    for &candidate in &DELIMITER_CANDIDATES {
        let count: usize = sample
            .iter()
            .map(|line| line.bytes().filter(|&b| b == candidate).count())
            .sum();

        // strictly greater: earlier candidates keep ties
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), b',');
    }

    #[test]
    fn test_semicolon() {
        assert_eq!(
            detect_delimiter("Предмет;День;Начало\nМатематика;Пн;09:00"),
            b';'
        );
    }

    #[test]
    fn test_tab() {
        assert_eq!(detect_delimiter("Subject\tDay\tStart\nMath\tMon\t9:00"), b'\t');
    }

    #[test]
    fn test_tie_defaults_to_comma() {
        assert_eq!(detect_delimiter("a,b;c"), b',');
        assert_eq!(detect_delimiter("no delimiters here"), b',');
        assert_eq!(detect_delimiter(""), b',');
    }

    #[test]
    fn test_only_first_three_lines_sampled() {
        let text = "a;b\nc;d\ne;f\ng,h,i,j,k,l,m\nn,o,p,q,r,s";
        assert_eq!(detect_delimiter(text), b';');
    }

    #[test]
    fn test_comma_inside_times_does_not_win_over_semicolon() {
        let text = "Subject;Day;Start;End\nMath, advanced;Monday;09:00;10:30";
        assert_eq!(detect_delimiter(text), b';');
    }
}
