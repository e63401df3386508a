//! List command - show the category catalog

use colored::Colorize;

use crate::audit::Category;
use crate::checks::default_catalog;
use crate::cli::exit_codes;

/// Render the catalog the way `--category` resolves it: 1-based numbers,
/// ids and titles are all accepted.
pub fn render_catalog(categories: &[Category]) -> String {
    let mut output = String::new();

    for (idx, category) in categories.iter().enumerate() {
        let quick = if category.is_quick() {
            format!(" {}", "[quick]".green())
        } else {
            String::new()
        };
        output.push_str(&format!(
            "{:>2}. {} {}{}\n",
            idx + 1,
            category.title().bold(),
            format!("({})", category.id()).dimmed(),
            quick
        ));

        for check in category.checks() {
            output.push_str(&format!(
                "      {:<24} {}\n",
                check.name().cyan(),
                check.description()
            ));
            let deps = check.depends_on();
            if !deps.is_empty() {
                output.push_str(&format!(
                    "      {:<24} {}\n",
                    "",
                    format!("after: {}", deps.join(", ")).dimmed()
                ));
            }
        }
        output.push('\n');
    }

    output
}

pub fn execute() -> i32 {
    print!("{}", render_catalog(&default_catalog()));
    exit_codes::SUCCESS
}
