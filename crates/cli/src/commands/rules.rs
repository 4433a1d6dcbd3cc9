use anyhow::Result;
use clap::Args;
use colored::*;
use kensa_analysis::RuleRegistry;

#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Only show rules in this category
    #[arg(short, long)]
    pub category: Option<String>,
}

pub fn execute(args: RulesArgs) -> Result<()> {
    let registry = RuleRegistry::with_defaults();

    println!("{}", "Registered static rules".bright_blue().bold());
    println!("{}", "─".repeat(60).bright_black());

    for rule in registry.rules() {
        if let Some(ref filter) = args.category {
            if !rule.category().to_string().eq_ignore_ascii_case(filter) {
                continue;
            }
        }
        println!(
            "{:<24} {:<16} {:<10} {}",
            rule.id().bright_white(),
            rule.category().to_string(),
            rule.severity().to_string().yellow(),
            if rule.needs_structure() {
                "structural"
            } else {
                "text"
            }
        );
    }

    Ok(())
}
