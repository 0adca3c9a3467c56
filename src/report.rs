use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::models::TestSummary;

const UNNAMED_TEST: &str = "<unnamed test>";

/// Parse a JUnit XML report, or every `*.xml` report directly inside a
/// directory, into a [`TestSummary`].
///
/// A missing or unreadable path is reported as a run that produced no
/// results rather than as an error.
pub fn parse(path: &Path) -> TestSummary {
    let files = match report_files(path) {
        Ok(files) => files,
        Err(e) => {
            info!("No test report at {}: {e}", path.display());
            return TestSummary::not_run();
        }
    };

    let mut tally = Tally::default();
    for file in &files {
        match fs::read_to_string(file) {
            Ok(content) => {
                debug!("Parsing test report {}", file.display());
                tally.consume(&content, file);
            }
            Err(e) => warn!("Skipping unreadable test report {}: {e}", file.display()),
        }
    }

    let summary = tally.finish();
    info!(
        "Parsed {} report file(s): ran={}, tests={}, failed={}, skipped={}",
        files.len(),
        summary.ran,
        summary.total_tests,
        summary.total_failed,
        summary.total_skipped
    );
    summary
}

fn report_files(path: &Path) -> std::io::Result<Vec<PathBuf>> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "xml"))
        .collect();
    files.sort();
    Ok(files)
}

#[derive(Default)]
struct Tally {
    saw_tests: bool,
    total_tests: usize,
    total_skipped: usize,
    failed_identifiers: Vec<String>,
}

struct OpenCase {
    identifier: String,
    failed: bool,
    skipped: bool,
}

impl Tally {
    fn consume(&mut self, content: &str, file: &Path) {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        // Names of the enclosing <testsuite> elements, innermost last.
        let mut suites: Vec<Option<String>> = Vec::new();
        let mut case: Option<OpenCase> = None;

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    warn!(
                        "Malformed test report {} at byte {}: {e}",
                        file.display(),
                        reader.buffer_position()
                    );
                    break;
                }
            };

            match event {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"testsuite" => {
                        self.saw_tests = true;
                        suites.push(attribute(&e, b"name"));
                    }
                    b"testcase" => {
                        self.saw_tests = true;
                        case = Some(OpenCase {
                            identifier: case_identifier(&e, &suites),
                            failed: false,
                            skipped: false,
                        });
                    }
                    name => mark_case(case.as_mut(), name),
                },
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"testsuite" => self.saw_tests = true,
                    b"testcase" => {
                        self.saw_tests = true;
                        self.total_tests += 1;
                    }
                    name => mark_case(case.as_mut(), name),
                },
                Event::End(e) => match e.local_name().as_ref() {
                    b"testsuite" => {
                        suites.pop();
                    }
                    b"testcase" => {
                        if let Some(finished) = case.take() {
                            self.record(finished);
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }
    }

    fn record(&mut self, case: OpenCase) {
        self.total_tests += 1;
        if case.failed {
            self.failed_identifiers.push(case.identifier);
        } else if case.skipped {
            self.total_skipped += 1;
        }
    }

    fn finish(self) -> TestSummary {
        if !self.saw_tests {
            return TestSummary::not_run();
        }

        TestSummary {
            ran: true,
            total_failed: self.failed_identifiers.len(),
            failed_identifiers: self.failed_identifiers,
            total_tests: self.total_tests,
            total_skipped: self.total_skipped,
        }
    }
}

fn mark_case(case: Option<&mut OpenCase>, element: &[u8]) {
    let Some(case) = case else {
        return;
    };

    match element {
        b"failure" | b"error" => case.failed = true,
        b"skipped" => case.skipped = true,
        _ => {}
    }
}

fn case_identifier(element: &BytesStart<'_>, suites: &[Option<String>]) -> String {
    let suite = attribute(element, b"classname").or_else(|| suites.last().cloned().flatten());
    let name = attribute(element, b"name");

    match (suite, name) {
        (Some(suite), Some(name)) => format!("{suite}.{name}"),
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => UNNAMED_TEST.to_string(),
    }
}

/// Attribute value, or `None` when it is missing, empty or cannot be decoded.
fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .filter_map(Result::ok)
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    const ALL_OK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites tests="3" failures="0">
  <testsuite name="LoginTests" tests="2">
    <testcase classname="LoginTests" name="testValidLogin" time="0.12"/>
    <testcase classname="LoginTests" name="testLogout" time="0.05"></testcase>
  </testsuite>
  <testsuite name="CartTests" tests="1">
    <testcase classname="CartTests" name="testAddItem"/>
  </testsuite>
</testsuites>"#;

    const FAILURES_AND_SKIPPED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites>
  <testsuite name="SuiteA" tests="3" failures="1" skipped="1">
    <testcase classname="SuiteA" name="testOk"/>
    <testcase classname="SuiteA" name="testX">
      <failure message="expected true" type="AssertionError">stack &amp; trace</failure>
    </testcase>
    <testcase classname="SuiteA" name="testLater">
      <skipped/>
    </testcase>
  </testsuite>
  <testsuite name="SuiteB" tests="1" errors="1">
    <testcase name="testY">
      <error message="boom"/>
    </testcase>
  </testsuite>
</testsuites>"#;

    fn report(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_report_is_not_run() {
        let summary = parse(Path::new("/definitely/not/here/results.xml"));

        assert_eq!(summary, TestSummary::not_run());
    }

    #[test]
    fn test_all_passing_report() {
        let file = report(ALL_OK);
        let summary = parse(file.path());

        assert!(summary.ran);
        assert_eq!(summary.total_tests, 3);
        assert_eq!(summary.total_failed, 0);
        assert!(summary.failed_identifiers.is_empty());
    }

    #[test]
    fn test_failures_are_listed_in_document_order() {
        let file = report(FAILURES_AND_SKIPPED);
        let summary = parse(file.path());

        assert!(summary.ran);
        assert_eq!(summary.total_failed, 2);
        assert_eq!(
            summary.failed_identifiers,
            vec!["SuiteA.testX".to_string(), "SuiteB.testY".to_string()]
        );
        assert_eq!(summary.total_skipped, 1);
        assert_eq!(summary.total_tests, 4);
    }

    #[test]
    fn test_case_with_failure_and_error_counts_once() {
        let file = report(
            r#"<testsuite name="S"><testcase name="t"><failure/><error/></testcase></testsuite>"#,
        );
        let summary = parse(file.path());

        assert_eq!(summary.total_failed, 1);
        assert_eq!(summary.failed_identifiers, vec!["S.t".to_string()]);
    }

    #[test]
    fn test_missing_attributes_are_tolerated() {
        let file = report(
            r#"<testsuites>
                <testsuite>
                  <testcase classname="OnlyClass"><failure/></testcase>
                  <testcase name=""><failure/></testcase>
                </testsuite>
              </testsuites>"#,
        );
        let summary = parse(file.path());

        assert_eq!(
            summary.failed_identifiers,
            vec!["OnlyClass".to_string(), UNNAMED_TEST.to_string()]
        );
    }

    #[test]
    fn test_nested_suites_use_innermost_name() {
        let file = report(
            r#"<testsuite name="Outer">
                 <testsuite name="Inner"><testcase name="a"><failure/></testcase></testsuite>
                 <testcase name="b"><failure/></testcase>
               </testsuite>"#,
        );
        let summary = parse(file.path());

        assert_eq!(
            summary.failed_identifiers,
            vec!["Inner.a".to_string(), "Outer.b".to_string()]
        );
    }

    #[test]
    fn test_malformed_xml_keeps_completed_cases() {
        let file = report(
            r#"<testsuite name="S">
                 <testcase name="first"><failure/></testcase>
                 <testcase name="second"><failure></testcase>
               </testsuite>"#,
        );
        let summary = parse(file.path());

        assert!(summary.ran);
        assert_eq!(summary.failed_identifiers, vec!["S.first".to_string()]);
    }

    #[test]
    fn test_file_without_test_elements_is_not_run() {
        let file = report("not xml at all");
        let summary = parse(file.path());

        assert!(!summary.ran);
        assert_eq!(summary.total_failed, 0);
    }

    #[test]
    fn test_directory_reports_are_merged_by_file_name() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("b-results.xml"),
            r#"<testsuite name="SuiteB"><testcase name="testY"><failure/></testcase></testsuite>"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("a-results.xml"),
            r#"<testsuite name="SuiteA"><testcase name="testX"><failure/></testcase></testsuite>"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "<testcase name=\"ignored\"><failure/></testcase>")
            .unwrap();

        let summary = parse(dir.path());

        assert_eq!(
            summary.failed_identifiers,
            vec!["SuiteA.testX".to_string(), "SuiteB.testY".to_string()]
        );
    }

    #[test]
    fn test_empty_directory_is_not_run() {
        let dir = tempdir().unwrap();

        assert_eq!(parse(dir.path()), TestSummary::not_run());
    }
}
