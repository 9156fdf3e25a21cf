//! Project generation from a template descriptor and prompt answers.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use minijinja::{Environment, UndefinedBehavior};
use tracing::debug;
use walkdir::WalkDir;

use crate::{
    archive::is_contained,
    error::{Error, Result},
    template::{DESCRIPTOR_FILE_NAME, TemplateDescriptor},
};

/// Suffix marking asset files that are rendered before writing.
const TEMPLATE_SUFFIX: &str = ".tmpl";

/// Where a planned file's contents come from.
#[derive(Debug)]
enum Contents {
    /// Rendered text.
    Text(String),
    /// Asset copied byte-for-byte.
    Copy(PathBuf),
}

/// A file about to be written, relative to the destination.
#[derive(Debug)]
struct PlannedFile {
    /// Destination path relative to the project root.
    relative: PathBuf,
    /// File contents.
    contents: Contents,
}

/// Renders templates with prompt answers in scope.
struct Renderer {
    /// Template environment with strict undefined handling.
    env: Environment<'static>,
    /// Variables visible to every template.
    context: BTreeMap<String, String>,
}

impl Renderer {
    /// Build a renderer exposing `answers` plus the template name as `template`.
    fn new(descriptor: &TemplateDescriptor, answers: &BTreeMap<String, String>) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        let mut context = answers.clone();
        context
            .entry("template".to_string())
            .or_insert_with(|| descriptor.name.clone());
        Self { env, context }
    }

    /// Render a source string, naming it in errors.
    fn render(&self, name: &str, source: &str) -> Result<String> {
        self.env
            .render_str(source, &self.context)
            .map_err(|error| Error::TemplateRender {
                name: name.to_string(),
                message: error.to_string(),
            })
    }
}

/// Write a template's files into `dest`, returning the written relative paths.
///
/// Static files from the descriptor are rendered (path and content) first;
/// asset files under `template_dir` follow, with `.tmpl` files rendered and
/// their suffix dropped. Existing files are only replaced when `force` is set.
pub fn generate(
    descriptor: &TemplateDescriptor,
    template_dir: &Path,
    answers: &BTreeMap<String, String>,
    dest: &Path,
    force: bool,
) -> Result<Vec<PathBuf>> {
    let renderer = Renderer::new(descriptor, answers);
    let mut plan = plan_static_files(descriptor, &renderer)?;
    plan_assets(template_dir, &renderer, &mut plan)?;

    if !force {
        for file in &plan {
            let target = dest.join(&file.relative);
            if target.exists() {
                return Err(Error::PathExists { path: target });
            }
        }
    }

    let mut written = Vec::with_capacity(plan.len());
    for file in plan {
        let target = dest.join(&file.relative);
        write_planned(&target, &file.contents)?;
        debug!(path = %target.display(), "wrote project file");
        written.push(file.relative);
    }
    Ok(written)
}

/// Render every static file declared in the descriptor.
fn plan_static_files(
    descriptor: &TemplateDescriptor,
    renderer: &Renderer,
) -> Result<Vec<PlannedFile>> {
    let mut plan = Vec::with_capacity(descriptor.static_files.len());
    for file in &descriptor.static_files {
        let relative = checked_relative(&renderer.render(&file.name, &file.path)?)?;
        let contents = renderer.render(&file.name, &file.content)?;
        plan.push(PlannedFile {
            relative,
            contents: Contents::Text(contents),
        });
    }
    Ok(plan)
}

/// Add asset files from the template directory that no static file claims.
fn plan_assets(template_dir: &Path, renderer: &Renderer, plan: &mut Vec<PlannedFile>) -> Result<()> {
    let mut assets = Vec::new();
    for entry in WalkDir::new(template_dir).sort_by_file_name() {
        let entry = entry.map_err(|error| Error::CacheRead {
            path: template_dir.to_path_buf(),
            source: error.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(template_dir) else {
            continue;
        };
        if relative == Path::new(DESCRIPTOR_FILE_NAME) {
            continue;
        }

        let relative_str = relative.to_string_lossy();
        let file = match relative_str.strip_suffix(TEMPLATE_SUFFIX) {
            Some(stripped) => {
                let source = fs::read_to_string(entry.path()).map_err(|error| Error::CacheRead {
                    path: entry.path().to_path_buf(),
                    source: error,
                })?;
                PlannedFile {
                    relative: checked_relative(stripped)?,
                    contents: Contents::Text(renderer.render(&relative_str, &source)?),
                }
            }
            None => PlannedFile {
                relative: relative.to_path_buf(),
                contents: Contents::Copy(entry.path().to_path_buf()),
            },
        };
        assets.push(file);
    }

    for asset in assets {
        if !plan.iter().any(|file| file.relative == asset.relative) {
            plan.push(asset);
        }
    }
    Ok(())
}

/// Validate a rendered destination path.
fn checked_relative(raw: &str) -> Result<PathBuf> {
    let path = PathBuf::from(raw.trim());
    if path.as_os_str().is_empty() || !is_contained(&path) {
        return Err(Error::InvalidPath { path });
    }
    Ok(path)
}

/// Write one planned file, creating parent directories.
fn write_planned(target: &Path, contents: &Contents) -> Result<()> {
    let write_error = |source: io::Error| Error::ProjectWrite {
        path: target.to_path_buf(),
        source,
    };
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::ProjectWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    match contents {
        Contents::Text(text) => fs::write(target, text).map_err(write_error),
        Contents::Copy(source) => fs::copy(source, target).map(|_| ()).map_err(write_error),
    }
}
