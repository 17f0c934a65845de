//! Cross-checking configuration entries against a schema.
//!
//! Entries are `(section, option, value)` triples and are checked in the
//! order given, so reports are deterministic for a given snapshot.

use crate::error::InvalidConfigError;
use crate::schema::Schema;
use crate::RESERVED_SECTION;

impl Schema {
    /// Check a single entry.
    pub fn validate_entry(
        &self,
        section: &str,
        option: &str,
        value: &str,
    ) -> Result<(), InvalidConfigError> {
        let rule = match self.resolve_section(section) {
            Some(rule) if section != RESERVED_SECTION => rule,
            _ => {
                return Err(InvalidConfigError::InvalidSection {
                    section: section.to_string(),
                    valid_sections: self.section_patterns(),
                })
            }
        };

        let Some(opt) = rule.resolve_option(option) else {
            return Err(InvalidConfigError::InvalidOption {
                section: section.to_string(),
                option: option.to_string(),
                section_pattern: rule.section.as_str().to_string(),
                valid_options: rule.option_patterns(),
            });
        };

        if !opt.value.is_match(value) {
            return Err(InvalidConfigError::InvalidValue {
                section: section.to_string(),
                option: option.to_string(),
                value: value.to_string(),
                pattern: opt.value.as_str().to_string(),
            });
        }

        Ok(())
    }

    /// Fail-fast validation: stop at the first violation.
    pub fn validate<'a, I>(&self, entries: I) -> Result<(), InvalidConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    {
        for (section, option, value) in entries {
            self.validate_entry(section, option, value)
                .map_err(|e| {
                    log_violation(section, option, &e);
                    e
                })?;
        }
        Ok(())
    }

    /// Collect-all validation: every violation, in entry order.
    pub fn check<'a, I>(&self, entries: I) -> Vec<InvalidConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    {
        entries
            .into_iter()
            .filter_map(|(section, option, value)| {
                self.validate_entry(section, option, value)
                    .err()
                    .map(|e| {
                        log_violation(section, option, &e);
                        e
                    })
            })
            .collect()
    }
}

fn log_violation(section: &str, option: &str, violation: &InvalidConfigError) {
    tracing::debug!(section, option, %violation, "config entry rejected");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        r"
[^foo$]
^bar$ = ^[1-9]\d{2}$

[^app_main$]
^port$ = \d+

[^app_.*$]
^host$ = [a-z.]+
^port$ = \d+
"
        .parse()
        .unwrap()
    }

    #[test]
    fn test_accepts_matching_value() {
        let s = schema();
        assert!(s.validate_entry("foo", "bar", "103").is_ok());
        assert!(s.validate_entry("foo", "bar", "999").is_ok());
    }

    #[test]
    fn test_rejects_value_with_pattern_text() {
        let s = schema();
        let err = s.validate_entry("foo", "bar", "baz").unwrap_err();
        assert_eq!(err.expected_pattern(), Some(r"^[1-9]\d{2}$"));
        assert_eq!(
            err.to_string(),
            r#""baz" is not a valid value for "foo.bar". Should match "^[1-9]\d{2}$" as a regular expression."#
        );

        // Leading zero and too many digits fail the full match.
        assert!(s.validate_entry("foo", "bar", "099").is_err());
        assert!(s.validate_entry("foo", "bar", "1034").is_err());
    }

    #[test]
    fn test_unknown_section() {
        let s = schema();
        let err = s.validate_entry("nope", "bar", "1").unwrap_err();
        match err {
            InvalidConfigError::InvalidSection {
                section,
                valid_sections,
            } => {
                assert_eq!(section, "nope");
                assert_eq!(valid_sections, vec!["^foo$", "^app_main$", "^app_.*$"]);
            }
            other => panic!("unexpected violation: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_option() {
        let s = schema();
        let err = s.validate_entry("foo", "qux", "1").unwrap_err();
        assert!(matches!(err, InvalidConfigError::InvalidOption { .. }));
    }

    #[test]
    fn test_shadowed_section_reports_invalid_option() {
        let s = schema();
        // `app_main` is owned by `^app_main$`, which lacks `host`; the later
        // `^app_.*$` rule is never consulted.
        let err = s.validate_entry("app_main", "host", "example.org").unwrap_err();
        match err {
            InvalidConfigError::InvalidOption {
                section_pattern,
                valid_options,
                ..
            } => {
                assert_eq!(section_pattern, "^app_main$");
                assert_eq!(valid_options, vec!["^port$"]);
            }
            other => panic!("unexpected violation: {other:?}"),
        }
        assert!(s.validate_entry("app_web", "host", "example.org").is_ok());
    }

    #[test]
    fn test_reserved_section_always_invalid() {
        let s: Schema = "[.*]\n.* = .*\n".parse().unwrap();
        assert!(s.validate_entry("anything", "x", "y").is_ok());
        let err = s.validate_entry("DEFAULT", "x", "y").unwrap_err();
        assert!(matches!(err, InvalidConfigError::InvalidSection { .. }));
    }

    #[test]
    fn test_empty_schema_rejects_everything() {
        let s = Schema::default();
        assert!(s.is_empty());
        assert!(s.validate_entry("foo", "bar", "1").is_err());
    }

    #[test]
    fn test_validate_stops_at_first_violation() {
        let s = schema();
        let entries = [
            ("foo", "bar", "103"),
            ("foo", "bar", "bad"),
            ("nope", "x", "y"),
        ];
        let err = s.validate(entries).unwrap_err();
        assert!(matches!(err, InvalidConfigError::InvalidValue { .. }));
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_violations_emit_debug_events() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let s = schema();
        tracing::subscriber::with_default(subscriber, || {
            let report = s.check([("foo", "bar", "103"), ("foo", "qux", "1")]);
            assert_eq!(report.len(), 1);
            assert!(s.validate([("nope", "x", "y")]).is_err());
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(logs.matches("config entry rejected").count(), 2);
        assert!(logs.contains("option=") && logs.contains("qux"));
        assert!(logs.contains("section=") && logs.contains("nope"));
    }

    #[test]
    fn test_check_collects_in_order() {
        let s = schema();
        let entries = [
            ("nope", "x", "y"),
            ("foo", "bar", "103"),
            ("foo", "qux", "1"),
            ("foo", "bar", "bad"),
        ];
        let violations = s.check(entries);
        assert_eq!(violations.len(), 3);
        assert!(matches!(violations[0], InvalidConfigError::InvalidSection { .. }));
        assert!(matches!(violations[1], InvalidConfigError::InvalidOption { .. }));
        assert!(matches!(violations[2], InvalidConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_validate_empty_snapshot() {
        let s = schema();
        assert!(s.validate(std::iter::empty()).is_ok());
        assert!(s.check(std::iter::empty()).is_empty());
    }
}
