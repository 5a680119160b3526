use colored::Colorize;

use typecodec_common::{Problem, ProblemCategory};

pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    pub fn render(&self, problems: &[Problem]) -> String {
        let mut out = String::new();
        for (index, problem) in problems.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(&self.format_problem(problem));
        }
        out
    }

    /// `com.example.Node->next - error TC2001: message`
    pub fn format_problem(&self, problem: &Problem) -> String {
        let mut output = String::new();
        if problem.element.is_empty() {
            output.push_str("<unknown>");
        } else if self.color {
            output.push_str(&problem.element.cyan().to_string());
        } else {
            output.push_str(&problem.element);
        }

        output.push_str(" - ");
        output.push_str(&self.format_category(problem.category));
        output.push(' ');
        output.push_str(&self.format_code(problem.code.code()));
        output.push_str(": ");
        output.push_str(&problem.message_text);
        output
    }

    /// `Found 2 errors.` / `Found 1 error and 1 warning.`
    pub fn summary(&self, problems: &[Problem]) -> String {
        let errors = problems.iter().filter(|p| p.is_error()).count();
        let warnings = problems.len() - errors;
        let plural = |count: usize, word: &str| {
            if count == 1 {
                format!("{count} {word}")
            } else {
                format!("{count} {word}s")
            }
        };
        let text = match (errors, warnings) {
            (0, 0) => return String::new(),
            (_, 0) => format!("Found {}.", plural(errors, "error")),
            (0, _) => format!("Found {}.", plural(warnings, "warning")),
            _ => format!(
                "Found {} and {}.",
                plural(errors, "error"),
                plural(warnings, "warning")
            ),
        };
        if self.color && errors > 0 {
            text.red().bold().to_string()
        } else {
            text
        }
    }

    fn format_category(&self, category: ProblemCategory) -> String {
        let label = match category {
            ProblemCategory::Error => "error",
            ProblemCategory::Warning => "warning",
        };

        if !self.color {
            return label.to_string();
        }

        match category {
            ProblemCategory::Error => label.red().bold().to_string(),
            ProblemCategory::Warning => label.yellow().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        let label = format!("TC{}", code);
        if self.color {
            label.bright_blue().to_string()
        } else {
            label
        }
    }
}
