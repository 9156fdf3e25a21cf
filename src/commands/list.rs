//! Implementation of the `starli list` command.

use crate::{
    catalog::Catalog,
    commands::ColorChoice,
    error::Result,
    palette::{fmt_heading, fmt_hint, fmt_template_name},
    paths::display_path,
};

/// Execute the list command.
pub async fn run(catalog: &Catalog, color: ColorChoice) -> Result<()> {
    let use_color = color.enabled();
    let names = catalog.list_names()?;

    if names.is_empty() {
        println!(
            "{}",
            fmt_hint(
                &format!(
                    "No templates in {}. Run `starli update` to refresh.",
                    display_path(catalog.specs_dir())
                ),
                use_color
            )
        );
        return Ok(());
    }

    println!("{}", fmt_heading("Templates:", use_color));
    for line in format_names(&names, use_color) {
        println!("{line}");
    }
    Ok(())
}

/// Format template names as indented list lines.
fn format_names(names: &[String], use_color: bool) -> Vec<String> {
    names
        .iter()
        .map(|name| format!("  {}", fmt_template_name(name, use_color)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::format_names;

    #[test]
    fn disables_color_output() {
        let lines = format_names(&["React".to_string(), "Vue".to_string()], false);
        assert_eq!(lines, vec!["  React".to_string(), "  Vue".to_string()]);
    }
}
