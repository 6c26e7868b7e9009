// Probe output classification
//
// Probe commands print their verdict in platform-specific ways. Each dialect
// recognizes one summary-line shape; the classifier tries them in order.

use tracing::trace;

use crate::domain::ProbeStatus;

/// One summary-line shape of probe output
pub trait OutputDialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Verdict if the whitespace-split line is a summary line of this dialect
    fn classify(&self, tokens: &[&str]) -> Option<ProbeStatus>;
}

/// `2 packets transmitted, 0 packets received, 100.0% packet loss` (BSD)
/// or `2 packets transmitted, 2 received, 0% packet loss, time 1001ms` (Linux)
pub struct PacketSummaryDialect;

impl OutputDialect for PacketSummaryDialect {
    fn name(&self) -> &'static str {
        "packet-summary"
    }

    fn classify(&self, tokens: &[&str]) -> Option<ProbeStatus> {
        if tokens.len() <= 3 || tokens[1] != "packets" || tokens[2] != "transmitted," {
            return None;
        }
        // an unreadable count confirms nothing
        match tokens[3].parse::<i64>() {
            Ok(received) if received > 0 => Some(ProbeStatus::Up),
            _ => Some(ProbeStatus::Down),
        }
    }
}

/// `hostname is alive` / `hostname is unreachable` (Solaris-style ping)
pub struct ReachabilityDialect;

impl OutputDialect for ReachabilityDialect {
    fn name(&self) -> &'static str {
        "reachability"
    }

    fn classify(&self, tokens: &[&str]) -> Option<ProbeStatus> {
        match tokens {
            [_, "is", "alive"] => Some(ProbeStatus::Up),
            [_, "is", "unreachable"] => Some(ProbeStatus::Down),
            _ => None,
        }
    }
}

/// Ordered list of dialects, first match wins
pub struct Classifier {
    dialects: Vec<Box<dyn OutputDialect>>,
}

impl Classifier {
    /// Verdict when no summary line shows up: no sign of life
    pub const NO_MATCH: ProbeStatus = ProbeStatus::Down;

    pub fn new(dialects: Vec<Box<dyn OutputDialect>>) -> Self {
        Self { dialects }
    }

    /// Every dialect fleet-ping knows about
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(PacketSummaryDialect),
            Box::new(ReachabilityDialect),
        ])
    }

    /// Verdict for one line, or None if it is not a summary line
    pub fn classify_line(&self, line: &str) -> Option<ProbeStatus> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            return None;
        }

        self.dialects.iter().find_map(|dialect| {
            let status = dialect.classify(&tokens)?;
            trace!(dialect = dialect.name(), status = %status, "Matched summary line");
            Some(status)
        })
    }

    /// Verdict for a whole output; scanning stops at the first summary line
    pub fn classify_output(&self, output: &str) -> ProbeStatus {
        output
            .lines()
            .find_map(|line| self.classify_line(line))
            .unwrap_or(Self::NO_MATCH)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bsd_summary_no_reply_is_down() {
        let classifier = Classifier::standard();
        assert_eq!(
            classifier.classify_line("2 packets transmitted, 0 packets received, 100.0% packet loss"),
            Some(ProbeStatus::Down)
        );
    }

    #[test]
    fn test_linux_summary_with_replies_is_up() {
        let classifier = Classifier::standard();
        assert_eq!(
            classifier.classify_line("2 packets transmitted, 2 received, 0% packet loss, time 1001ms"),
            Some(ProbeStatus::Up)
        );
    }

    #[test]
    fn test_alive_and_unreachable() {
        let classifier = Classifier::standard();
        assert_eq!(classifier.classify_line("hostname is alive"), Some(ProbeStatus::Up));
        assert_eq!(
            classifier.classify_line("hostname is unreachable"),
            Some(ProbeStatus::Down)
        );
    }

    #[test]
    fn test_empty_output_is_down() {
        let classifier = Classifier::standard();
        assert_eq!(classifier.classify_output(""), ProbeStatus::Down);
    }

    #[test]
    fn test_surrounding_whitespace_is_tolerated() {
        let classifier = Classifier::standard();
        assert_eq!(
            classifier.classify_line("   1 packets transmitted, 1 received, 0% packet loss \r"),
            Some(ProbeStatus::Up)
        );
        assert_eq!(classifier.classify_line("\t db1 is alive  "), Some(ProbeStatus::Up));
    }

    #[test]
    fn test_non_summary_lines_do_not_match() {
        let classifier = Classifier::standard();
        assert_eq!(classifier.classify_line("PING 10.0.0.1 (10.0.0.1): 56 data bytes"), None);
        assert_eq!(classifier.classify_line("--- 10.0.0.1 ping statistics ---"), None);
        assert_eq!(classifier.classify_line("host is alive and well"), None);
        assert_eq!(classifier.classify_line("host is sleeping"), None);
        assert_eq!(classifier.classify_line("   "), None);
    }

    #[test]
    fn test_unparsable_count_is_down() {
        let classifier = Classifier::standard();
        assert_eq!(
            classifier.classify_line("2 packets transmitted, many received"),
            Some(ProbeStatus::Down)
        );
    }

    #[test]
    fn test_full_linux_output() {
        let output = "\
PING 10.0.0.1 (10.0.0.1) 56(84) bytes of data.

--- 10.0.0.1 ping statistics ---
1 packets transmitted, 1 received, 0% packet loss, time 0ms
rtt min/avg/max/mdev = 0.045/0.045/0.045/0.000 ms
";
        assert_eq!(Classifier::standard().classify_output(output), ProbeStatus::Up);
    }

    #[test]
    fn test_first_summary_line_wins() {
        let output = "host is unreachable\n3 packets transmitted, 3 received\n";
        assert_eq!(Classifier::standard().classify_output(output), ProbeStatus::Down);
    }

    #[test]
    fn test_custom_dialect_order() {
        struct AlwaysUp;
        impl OutputDialect for AlwaysUp {
            fn name(&self) -> &'static str {
                "always-up"
            }
            fn classify(&self, _tokens: &[&str]) -> Option<ProbeStatus> {
                Some(ProbeStatus::Up)
            }
        }

        let classifier = Classifier::new(vec![Box::new(AlwaysUp), Box::new(ReachabilityDialect)]);
        assert_eq!(
            classifier.classify_line("hostname is unreachable"),
            Some(ProbeStatus::Up)
        );
    }
}
