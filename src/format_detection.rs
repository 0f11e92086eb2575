use std::collections::HashMap;

/// Number of leading bytes inspected when sniffing the delimiter
pub const SAMPLE_SIZE: usize = 2048;

/// Delimiters the sniffer chooses between, in fallback order
pub const CANDIDATE_DELIMITERS: [u8; 2] = [b',', b';'];

pub const DEFAULT_DELIMITER: u8 = b',';

/// Share of sample records that must agree on the field count
const MIN_CONSISTENCY: f64 = 0.9;

const QUOTE: char = '"';

/// Returns the leading sample of `content` used for sniffing.
///
/// The sample is cut back to a char boundary, and when the content is
/// longer than the sample the trailing partial line is dropped.
pub fn sample_of(content: &str) -> &str {
    if content.len() <= SAMPLE_SIZE {
        return content;
    }

    let mut end = SAMPLE_SIZE;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    let sample = &content[..end];

    match sample.rfind('\n') {
        Some(idx) => &sample[..=idx],
        None => sample,
    }
}

/// Infers whether `sample` is comma- or semicolon-separated.
///
/// Each candidate is scored by how consistently it splits the sample's
/// records into the same number of fields (ignoring delimiters inside
/// quotes). Returns `None` when the sample is empty, single-column, too
/// inconsistent, or when both candidates score equally.
pub fn sniff_delimiter(sample: &str) -> Option<u8> {
    let mut best: Option<(u8, f64)> = None;
    let mut tied = false;

    for &delim in &CANDIDATE_DELIMITERS {
        let Some(score) = consistency(sample, delim as char) else {
            continue;
        };
        if score < MIN_CONSISTENCY {
            continue;
        }

        match best {
            Some((_, best_score)) if score > best_score => {
                best = Some((delim, score));
                tied = false;
            }
            Some((_, best_score)) if score == best_score => tied = true,
            Some(_) => {}
            None => best = Some((delim, score)),
        }
    }

    if tied {
        return None;
    }
    best.map(|(delim, _)| delim)
}

/// Fraction of records whose field count equals the most common count,
/// or `None` if the delimiter never splits a record
fn consistency(sample: &str, delim: char) -> Option<f64> {
    let counts = field_counts(sample, delim);
    if counts.is_empty() {
        return None;
    }

    let mut frequency: HashMap<usize, usize> = HashMap::new();
    for &count in &counts {
        *frequency.entry(count).or_insert(0) += 1;
    }

    // Highest frequency wins; the wider split breaks ties
    let (mode, hits) = frequency
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))?;

    if mode < 2 {
        return None;
    }

    Some(hits as f64 / counts.len() as f64)
}

/// Field count of every non-blank record in the sample, honoring quotes
fn field_counts(sample: &str, delim: char) -> Vec<usize> {
    let mut counts = Vec::new();
    let mut in_quotes = false;
    let mut fields = 1;
    let mut blank = true;

    for ch in sample.chars() {
        match ch {
            QUOTE => {
                in_quotes = !in_quotes;
                blank = false;
            }
            '\n' | '\r' if !in_quotes => {
                if !blank {
                    counts.push(fields);
                }
                fields = 1;
                blank = true;
            }
            c if c == delim && !in_quotes => {
                fields += 1;
                blank = false;
            }
            _ => blank = false,
        }
    }

    if !blank {
        counts.push(fields);
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_comma() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,x\n"), Some(b','));
    }

    #[test]
    fn test_sniff_semicolon() {
        assert_eq!(sniff_delimiter("a;b\n3.5;y\n"), Some(b';'));
    }

    #[test]
    fn test_sniff_ignores_delimiters_in_quotes() {
        let sample = "name;description\n\"Smith, John\";Developer\n\"Doe, Jane\";Designer\n";
        assert_eq!(sniff_delimiter(sample), Some(b';'));
    }

    #[test]
    fn test_sniff_quoted_newline_is_not_a_record_break() {
        let sample = "id,note\n1,\"line one\nline two\"\n2,plain\n";
        assert_eq!(sniff_delimiter(sample), Some(b','));
    }

    #[test]
    fn test_sniff_empty_sample() {
        assert_eq!(sniff_delimiter(""), None);
        assert_eq!(sniff_delimiter("\n\n"), None);
    }

    #[test]
    fn test_sniff_single_column() {
        assert_eq!(sniff_delimiter("name\nAlice\nBob\n"), None);
    }

    #[test]
    fn test_sniff_inconsistent_lines() {
        assert_eq!(sniff_delimiter("a,b\n1,2,3\nx\n"), None);
    }

    #[test]
    fn test_sniff_ambiguous_tie() {
        assert_eq!(sniff_delimiter("a,b;c\n1,2;3\n"), None);
    }

    #[test]
    fn test_sniff_prefers_more_consistent_candidate() {
        // Semicolons split every line the same way, commas only some of them
        let sample = "a;b;c\n1,5;2;3\n4;5,5;6\n7;8;9\n";
        assert_eq!(sniff_delimiter(sample), Some(b';'));
    }

    #[test]
    fn test_sniff_crlf_line_endings() {
        assert_eq!(sniff_delimiter("a;b\r\n1;2\r\n"), Some(b';'));
    }

    #[test]
    fn test_sample_of_short_content() {
        assert_eq!(sample_of("a,b\n1,2"), "a,b\n1,2");
    }

    #[test]
    fn test_sample_of_drops_partial_line() {
        let line = "aaaaaaaaa,bbbbbbbbb\n";
        let content = line.repeat(200);
        let sample = sample_of(&content);

        assert!(sample.len() <= SAMPLE_SIZE);
        assert!(sample.ends_with('\n'));
        assert_eq!(sample.len() % line.len(), 0);
    }

    #[test]
    fn test_sample_of_respects_char_boundaries() {
        let content = "é".repeat(SAMPLE_SIZE);
        let sample = sample_of(&content);
        assert!(sample.len() <= SAMPLE_SIZE);
        assert!(sample.chars().all(|c| c == 'é'));
    }
}
