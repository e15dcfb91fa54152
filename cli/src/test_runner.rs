use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use codespan_reporting::term::termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use serde::Deserialize;

use engine::{Calculator, Settings, Warning, Workbench};

const TEST_URI: &str = "memory:///scenario.md";

/// One keystroke (or paste) of a scenario.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Keystroke {
    /// 1-based line the text is typed at the end of.
    pub line: usize,
    /// Text to type. `"\n"` presses Enter.
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning must point at this 1-based line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    #[serde(default)]
    pub description: Option<String>,

    /// Keystrokes replayed against the document. Without any, every block is
    /// settled as if typed line by line.
    #[serde(default)]
    pub input: Vec<Keystroke>,

    /// Expected final document (compared with trailing whitespace trimmed).
    #[serde(default)]
    pub expect: Option<String>,

    /// If present (even empty), warning count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,

    #[serde(default)]
    pub settings: Settings,
}

/// Split a `.test.md` file into its TOML frontmatter and document body.
fn split_frontmatter(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
        .ok_or("missing opening --- line")?;

    let close = rest
        .find("\n---")
        .ok_or("missing closing --- line")?;
    let frontmatter = &rest[..close];

    let after = &rest[close + "\n---".len()..];
    let body = after
        .strip_prefix("\r\n")
        .or_else(|| after.strip_prefix('\n'))
        .unwrap_or(after);

    let config = toml::from_str(frontmatter).map_err(|e| format!("TOML parse error: {}", e))?;
    Ok((config, body))
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub failure: Option<String>,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(".test.md"))
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let mut result = TestResult {
        path: path.to_path_buf(),
        description: None,
        failure: None,
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            result.failure = Some(format!("cannot read file: {}", e));
            return result;
        }
    };

    let (config, body) = match split_frontmatter(&content) {
        Ok(pair) => pair,
        Err(e) => {
            result.failure = Some(format!("frontmatter error: {}", e));
            return result;
        }
    };
    result.description = config.description.clone();
    result.failure = check_scenario(&config, body).err();
    result
}

/// Run one scenario, returning the first mismatch.
fn check_scenario(config: &TestConfig, body: &str) -> Result<(), String> {
    let calculator =
        Calculator::from_settings(&config.settings).map_err(|e| format!("settings error: {}", e))?;

    let (actual, warnings) = if config.input.is_empty() {
        engine::settle(body, calculator).map_err(|e| format!("settle failed: {}", e))?
    } else {
        replay(body, &config.input, calculator)?
    };

    if let Some(expected) = &config.expect {
        let actual = actual.trim_end();
        let expected = expected.trim_end();
        if actual != expected {
            return Err(format!(
                "document mismatch\n--- expected\n{}\n--- actual\n{}",
                expected, actual
            ));
        }
    }

    if let Some(expected) = &config.expect_warnings {
        check_warnings(&warnings, expected)?;
    }
    Ok(())
}

fn replay(
    body: &str,
    input: &[Keystroke],
    calculator: Calculator,
) -> Result<(String, Vec<Warning>), String> {
    let mut bench = Workbench::new(calculator);
    bench.open(TEST_URI, body);

    let mut warnings = Vec::new();
    for (i, key) in input.iter().enumerate() {
        if key.line == 0 {
            return Err(format!("input[{}]: lines are 1-based", i));
        }
        bench
            .type_at_line_end(TEST_URI, key.line - 1, &key.text)
            .map_err(|e| format!("input[{}]: {}", i, e))?;
        warnings.extend(bench.take_warnings());
    }

    let text = bench.text(TEST_URI).unwrap_or_default().to_string();
    Ok((text, warnings))
}

fn check_warnings(actual: &[Warning], expected: &[ExpectedWarning]) -> Result<(), String> {
    if actual.len() != expected.len() {
        let listed: Vec<String> = actual
            .iter()
            .map(|w| format!("  - line {}: {}", w.line + 1, w))
            .collect();
        return Err(format!(
            "expected {} warning(s), got {}\n{}",
            expected.len(),
            actual.len(),
            if listed.is_empty() {
                "  (none)".to_string()
            } else {
                listed.join("\n")
            }
        ));
    }

    for (i, (warning, want)) in actual.iter().zip(expected).enumerate() {
        let message = warning.to_string();
        if !message.contains(&want.contains) {
            return Err(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, want.contains, message
            ));
        }
        if let Some(line) = want.line {
            if warning.line + 1 != line {
                return Err(format!(
                    "warning[{}]: expected on line {}, got line {}",
                    i,
                    line,
                    warning.line + 1
                ));
            }
        }
    }
    Ok(())
}

/// `.test.md` files under `root`, keyed by their folder relative to `root`.
/// Files directly in `root` have the empty category.
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    let mut dirs = vec![root.to_path_buf()];
    while let Some(dir) = dirs.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for path in entries.flatten().map(|e| e.path()) {
            if path.is_dir() {
                dirs.push(path);
                continue;
            }
            let is_test = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".test.md"));
            if !is_test {
                continue;
            }
            let category = dir
                .strip_prefix(root)
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            categories.entry(category).or_default().push(path);
        }
    }
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

/// Test report written to stderr.
struct Report {
    out: StandardStream,
    passed: usize,
    failures: Vec<TestResult>,
}

impl Report {
    fn new(color_choice: ColorChoice) -> Self {
        Report {
            out: StandardStream::stderr(color_choice),
            passed: 0,
            failures: Vec::new(),
        }
    }

    fn colored(&mut self, text: &str, spec: &ColorSpec) {
        let _ = self.out.set_color(spec);
        let _ = write!(self.out, "{}", text);
        let _ = self.out.reset();
    }

    fn header(&mut self, category: &str) {
        let _ = writeln!(self.out);
        self.colored(category_label(category), ColorSpec::new().set_bold(true));
        let _ = writeln!(self.out);
    }

    fn record(&mut self, result: TestResult) {
        let _ = write!(self.out, "  ");
        if result.failure.is_none() {
            self.colored("PASS", ColorSpec::new().set_fg(Some(Color::Green)));
            self.passed += 1;
        } else {
            self.colored("FAIL", ColorSpec::new().set_fg(Some(Color::Red)));
        }
        let _ = writeln!(self.out, "  {}", result.label());
        if result.failure.is_some() {
            self.failures.push(result);
        }
    }

    /// Print failure details and the summary line; returns the exit code.
    fn finish(mut self) -> i32 {
        if !self.failures.is_empty() {
            let _ = writeln!(self.out, "\nfailures:");
            for failure in &self.failures {
                let _ = writeln!(self.out, "\n  --- {} ---", failure.path.display());
                for line in failure.failure.as_deref().unwrap_or_default().lines() {
                    let _ = writeln!(self.out, "  {}", line);
                }
            }
        }

        let failed = self.failures.len();
        let _ = write!(self.out, "\ntest result: ");
        if failed == 0 {
            self.colored("ok", ColorSpec::new().set_fg(Some(Color::Green)));
            let _ = writeln!(self.out, ". {} passed, 0 failed", self.passed);
            0
        } else {
            self.colored("FAILED", ColorSpec::new().set_fg(Some(Color::Red)));
            let _ = writeln!(
                self.out,
                ". {} passed, {} failed (of {})",
                self.passed,
                failed,
                self.passed + failed
            );
            1
        }
    }
}

/// Run every `.test.md` file under `path`, or `path` itself if it is a file.
/// A non-empty `categories` restricts the run to those folders (and their
/// subfolders). Returns the process exit code.
pub fn run_tests(path: &Path, color_choice: ColorChoice, categories: &[String]) -> i32 {
    let mut report = Report::new(color_choice);

    if path.is_file() {
        report.record(run_single_test(path));
        return report.finish();
    }

    let all = discover_categorized(path);
    if all.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return 1;
    }

    let mut selected: BTreeMap<&str, &Vec<PathBuf>> = BTreeMap::new();
    if categories.is_empty() {
        selected.extend(all.iter().map(|(k, v)| (k.as_str(), v)));
    } else {
        for requested in categories {
            let requested = requested.trim_matches('/');
            let nested = format!("{}/", requested);
            let before = selected.len();
            for (category, files) in &all {
                if category == requested || category.starts_with(&nested) {
                    selected.insert(category.as_str(), files);
                }
            }
            if selected.len() == before {
                let available: Vec<&str> = all.keys().map(|k| category_label(k)).collect();
                eprintln!(
                    "warning: category '{}' not found (available: {})",
                    requested,
                    available.join(", ")
                );
            }
        }
    }

    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    for (category, files) in selected {
        report.header(category);
        for file in files {
            report.record(run_single_test(file));
        }
    }
    report.finish()
}
