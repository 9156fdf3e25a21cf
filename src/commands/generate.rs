//! Implementation of the `starli generate` command.

use std::{collections::BTreeMap, path::PathBuf};

use inquire::{Select, Text};

use crate::{
    catalog::Catalog,
    commands::{ColorChoice, prompt_error},
    error::{Error, Result},
    generate::generate,
    palette::{fmt_heading, fmt_path, fmt_success, fmt_template_name},
    paths::display_path,
    template::TemplateDescriptor,
};

/// Answer key used to name the project directory.
const PROJECT_NAME_KEY: &str = "name";

/// Execute the generate command.
pub async fn run(
    catalog: &Catalog,
    color: ColorChoice,
    template: Option<String>,
    dir: Option<PathBuf>,
    yes: bool,
    force: bool,
) -> Result<()> {
    let use_color = color.enabled();
    let template = match template {
        Some(template) => template,
        None => select_template(catalog)?,
    };

    let template_dir = catalog.template_dir(&template)?;
    let descriptor = catalog.get(&template)?;
    println!(
        "Generating from {}",
        fmt_template_name(&descriptor.name, use_color)
    );

    let answers = if yes {
        descriptor.default_answers()
    } else {
        ask_questions(&descriptor)?
    };
    let dest = dir.unwrap_or_else(|| default_destination(&descriptor, &answers));

    let written =
        catalog.locked(|| generate(&descriptor, &template_dir, &answers, &dest, force))?;

    println!();
    println!("{}", fmt_heading("Created:", use_color));
    for path in &written {
        println!("  {}", fmt_path(&path.display().to_string(), use_color));
    }
    println!();
    println!(
        "{}",
        fmt_success(
            &format!("Project generated in {}", display_path(&dest)),
            use_color
        )
    );
    Ok(())
}

/// Prompt for a template by display name, returning its directory name.
fn select_template(catalog: &Catalog) -> Result<String> {
    let entries = catalog.entries()?;
    if entries.is_empty() {
        return Err(Error::NoTemplates {
            path: catalog.specs_dir().to_path_buf(),
        });
    }
    Select::new("Which template would you like to use?", entries)
        .prompt()
        .map(|entry| entry.dir)
        .map_err(prompt_error)
}

/// Ask each descriptor question in order.
fn ask_questions(descriptor: &TemplateDescriptor) -> Result<BTreeMap<String, String>> {
    let mut answers = BTreeMap::new();
    for question in &descriptor.questions {
        let mut prompt = Text::new(&question.message);
        if !question.default.is_empty() {
            prompt = prompt.with_default(&question.default);
        }
        let answer = prompt.prompt().map_err(prompt_error)?;
        answers.insert(question.name.clone(), answer.trim().to_string());
    }
    Ok(answers)
}

/// Project directory named after the `name` answer, else the template.
fn default_destination(descriptor: &TemplateDescriptor, answers: &BTreeMap<String, String>) -> PathBuf {
    answers
        .get(PROJECT_NAME_KEY)
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(descriptor.name.to_lowercase()))
}
