//! `languages` handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::print_separator;

/// List the supported languages, default first.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let default = ctx.profiles.default_tag();
    println!("{:<8} {:<4} {:<20} SAMPLE", "TAG", "", "NAME");
    print_separator(72);
    for profile in ctx.profiles.profiles() {
        let name = if &profile.tag == default {
            format!("{} (default)", profile.name)
        } else {
            profile.name.clone()
        };
        println!(
            "{:<8} {:<4} {name:<20} {}",
            profile.tag.as_str(),
            profile.flag,
            profile.sample_phrase
        );
    }
    Ok(())
}
