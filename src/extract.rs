/// Pulls the throughput measurement out of one captured stdout blob.
///
/// Scans for the first line containing `marker`, splits that line on
/// `delimiter`, and parses the first whitespace-separated token of the field
/// following the marker (the simulator prints `Throughput per STA:\t36.53
/// Mbps`, so the unit suffix is dropped). Returns `None` for any input that
/// does not yield a finite number; this function never fails, whatever the
/// simulator printed.
pub fn extract_throughput(stdout: &str, marker: &str, delimiter: char) -> Option<f64> {
    let line = stdout.lines().find(|line| line.contains(marker))?;

    let fields: Vec<&str> = line.split(delimiter).collect();
    let marker_idx = fields.iter().position(|field| field.contains(marker))?;
    let field = fields.get(marker_idx + 1)?;

    let token = field.split_whitespace().next()?;
    token.parse::<f64>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "Throughput per STA:";

    #[test]
    fn parses_simulator_output_line() {
        let stdout = "AP1 associated 2 STAs\nThroughput per STA:\t36.53 Mbps\ndone\n";
        assert_eq!(extract_throughput(stdout, MARKER, '\t'), Some(36.53));
    }

    #[test]
    fn uses_first_marker_line_only() {
        let stdout = "Throughput per STA:\t10.0 Mbps\nThroughput per STA:\t99.0 Mbps\n";
        assert_eq!(extract_throughput(stdout, MARKER, '\t'), Some(10.0));
    }

    #[test]
    fn empty_input_yields_absence() {
        assert_eq!(extract_throughput("", MARKER, '\t'), None);
    }

    #[test]
    fn missing_marker_yields_absence() {
        let stdout = "Simulation complete\nTotal TX: 123 packets\n";
        assert_eq!(extract_throughput(stdout, MARKER, '\t'), None);
    }

    #[test]
    fn garbage_token_yields_absence() {
        let stdout = "Throughput per STA:\tN/A Mbps\n";
        assert_eq!(extract_throughput(stdout, MARKER, '\t'), None);
    }

    #[test]
    fn marker_with_no_trailing_field_yields_absence() {
        assert_eq!(extract_throughput("Throughput per STA:", MARKER, '\t'), None);
        assert_eq!(extract_throughput("Throughput per STA:\t", MARKER, '\t'), None);
    }

    #[test]
    fn non_finite_token_yields_absence() {
        let stdout = "Throughput per STA:\tNaN Mbps\n";
        assert_eq!(extract_throughput(stdout, MARKER, '\t'), None);
        let stdout = "Throughput per STA:\tinf Mbps\n";
        assert_eq!(extract_throughput(stdout, MARKER, '\t'), None);
    }

    #[test]
    fn custom_delimiter_is_honored() {
        let stdout = "Throughput per STA:;42.1 Mbps\n";
        assert_eq!(extract_throughput(stdout, MARKER, ';'), Some(42.1));
    }
}
