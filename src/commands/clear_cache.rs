//! Implementation of the `starli clear-cache` command.

use crate::{
    commands::ColorChoice,
    error::Result,
    palette::{fmt_failure, fmt_success},
    paths::display_path,
    sync::Synchronizer,
};

/// Execute the clear-cache command.
pub async fn run(sync: &Synchronizer, color: ColorChoice) -> Result<()> {
    let use_color = color.enabled();
    if let Err(error) = sync.delete() {
        eprintln!("{}", fmt_failure("Failed to delete starli specs", use_color));
        return Err(error);
    }
    println!(
        "{}",
        fmt_success(
            &format!("Specs deleted from {}", display_path(sync.paths().root())),
            use_color
        )
    );
    Ok(())
}
