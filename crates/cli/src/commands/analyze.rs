//! The analyze command: runs the full pipeline over a local repository and
//! renders the report as colored text, JSON, or Markdown.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use kensa_analysis::{
    AnalysisConfig, AnalysisPipeline, AnalysisReport, MergedIssue, MockProvider, OpenAiProvider,
    Severity,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Repository root to analyze
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Hide issues below this severity
    #[arg(short = 's', long, default_value = "info")]
    pub min_severity: String,

    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Skip the LLM review stage
    #[arg(long)]
    pub no_ai: bool,

    /// Use the canned mock provider instead of a live service
    #[arg(long, hide = true)]
    pub mock_ai: bool,

    /// Model override for the LLM stage
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub openai_api_key: Option<String>,

    /// Override the configured file ceiling
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

pub async fn execute(args: AnalyzeArgs) -> Result<()> {
    let start = Instant::now();

    let min_severity: Severity = args
        .min_severity
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let mut config = match &args.config {
        Some(path) if path.extension().is_some_and(|e| e == "json") => {
            AnalysisConfig::from_json_file(path)
                .with_context(|| format!("failed to load config {:?}", path))?
        }
        Some(path) => AnalysisConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config {:?}", path))?,

        None => AnalysisConfig::default(),
    };
    config.apply_env();

    if let Some(max_files) = args.max_files {
        config.max_files = max_files;
    }
    if args.no_ai {
        config.ai.enabled = false;
    }
    if let Some(ref model) = args.model {
        config.ai.model = model.clone();
    }

    if args.verbose {
        eprintln!("{}", "Starting repository analysis...".bright_blue());
        eprintln!("Analyzing: {}", args.path.display());
    }

    let mut pipeline = AnalysisPipeline::new(config.clone())?;

    if config.ai.enabled {
        if args.mock_ai {
            pipeline = pipeline.with_provider(Arc::new(MockProvider::new()));
        } else {
            let api_key = args
                .openai_api_key
                .clone()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
            match api_key {
                Some(key) => {
                    let provider = OpenAiProvider::new(config.ai.model.clone(), Some(key))?;
                    pipeline = pipeline.with_provider(Arc::new(provider));
                }
                None => {
                    eprintln!(
                        "{}",
                        "No OpenAI API key provided (use --openai-api-key or set OPENAI_API_KEY); running static-only"
                            .yellow()
                    );
                }
            }
        }
    }

    let report = pipeline.run(&args.path).await?;

    let filtered: Vec<&MergedIssue> = report
        .issues
        .iter()
        .filter(|i| i.severity >= min_severity)
        .collect();

    let output = match args.format {
        OutputFormat::Text => render_text(&report, &filtered),
        OutputFormat::Json => report.to_json()?,
        OutputFormat::Markdown => render_markdown(&report, &filtered, &args),
    };

    if let Some(output_path) = args.output {
        std::fs::write(&output_path, output)
            .with_context(|| format!("failed to write {:?}", output_path))?;
    } else {
        println!("{}", output);
    }

    if args.verbose {
        eprintln!(
            "{} {:.2}s, {} issues, {} AI calls",
            "Analysis complete:".green().bold(),
            start.elapsed().as_secs_f64(),
            filtered.len(),
            report.metadata.ai_calls
        );
    }

    Ok(())
}

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Critical => "CRITICAL".red().bold(),
        Severity::High => "HIGH".bright_red(),
        Severity::Medium => "MEDIUM".yellow(),
        Severity::Low => "LOW".bright_yellow(),
        Severity::Info => "INFO".bright_blue(),
    }
}

fn render_text(report: &AnalysisReport, issues: &[&MergedIssue]) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    let _ = writeln!(out, "\n{}", "════════════════════════════════════════".bright_blue());
    let _ = writeln!(out, "{}", "       REPOSITORY ANALYSIS REPORT".bright_blue().bold());
    let _ = writeln!(out, "{}", "════════════════════════════════════════".bright_blue());

    let counts = report.severity_counts();
    let _ = writeln!(
        out,
        "\nFiles analyzed: {}   Skipped: {}   Static: {}   AI: {}",
        report.metadata.files_analyzed,
        report.metadata.files_skipped.len(),
        stage_flag(report.metadata.static_completed),
        stage_flag(report.metadata.ai_completed),
    );
    let _ = writeln!(
        out,
        "Issues: {} critical, {} high, {} medium, {} low, {} info",
        counts.critical, counts.high, counts.medium, counts.low, counts.info
    );

    if issues.is_empty() {
        let _ = writeln!(out, "\n{}", "No issues at or above the requested severity.".green());
    }

    for severity in Severity::all() {
        let group: Vec<_> = issues.iter().filter(|i| i.severity == severity).collect();
        if group.is_empty() {
            continue;
        }

        let _ = writeln!(
            out,
            "\n{} {} ({})",
            "▶".bright_white(),
            severity_label(severity),
            group.len()
        );
        let _ = writeln!(out, "{}", "─".repeat(40).bright_black());

        for issue in group {
            let origin = match (issue.static_origin, issue.ai_origin) {
                (true, true) => "[static+ai]".bright_magenta(),
                (true, false) => "[static]".bright_green(),
                _ => "[ai]".bright_cyan(),
            };
            let _ = writeln!(
                out,
                "\n  {} {} {}",
                "•".bright_white(),
                issue.title.bright_white().bold(),
                origin
            );
            let _ = writeln!(
                out,
                "    {}:{}  ({})",
                issue.file,
                issue.range,
                issue.category
            );
            let _ = writeln!(out, "    {}", issue.message.bright_black());
            if let Some(ref suggestion) = issue.suggestion {
                let _ = writeln!(out, "    {} {}", "fix:".green(), suggestion);
            }
            if let Some(confidence) = issue.confidence {
                let _ = writeln!(out, "    confidence: {:.0}%", confidence * 100.0);
            }
        }
    }

    if !report.metadata.files_skipped.is_empty() {
        let _ = writeln!(out, "\n{}", "Skipped files".bright_white().bold());
        for skip in &report.metadata.files_skipped {
            let _ = writeln!(
                out,
                "  {} ({}{})",
                skip.path,
                skip.reason,
                skip.detail
                    .as_deref()
                    .map(|d| format!(": {}", d))
                    .unwrap_or_default()
            );
        }
    }

    if !report.metadata.warnings.is_empty() {
        let _ = writeln!(out, "\n{}", "Warnings".yellow().bold());
        for warning in &report.metadata.warnings {
            let _ = writeln!(out, "  {}", warning);
        }
    }

    out
}

fn stage_flag(completed: bool) -> &'static str {
    if completed {
        "complete"
    } else {
        "partial"
    }
}

fn render_markdown(report: &AnalysisReport, issues: &[&MergedIssue], args: &AnalyzeArgs) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    let _ = writeln!(out, "# Repository Analysis Report");
    let _ = writeln!(out, "\n**Path:** `{}`", args.path.display());
    let _ = writeln!(
        out,
        "**Date:** {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(
        out,
        "**Stages:** static {}, ai {}",
        stage_flag(report.metadata.static_completed),
        stage_flag(report.metadata.ai_completed)
    );

    let _ = writeln!(out, "\n## Summary\n");
    let _ = writeln!(out, "| Severity | Count |");
    let _ = writeln!(out, "|----------|-------|");
    for severity in Severity::all() {
        let count = issues.iter().filter(|i| i.severity == severity).count();
        if count > 0 {
            let _ = writeln!(out, "| {} | {} |", severity, count);
        }
    }

    let _ = writeln!(out, "\n## Issues");
    for (i, issue) in issues.iter().enumerate() {
        let _ = writeln!(
            out,
            "\n### {}. [{}] {}",
            i + 1,
            issue.severity,
            issue.title
        );
        let _ = writeln!(
            out,
            "\n**Location:** `{}:{}`  \n**Category:** {}",
            issue.file, issue.range, issue.category
        );
        let origin = match (issue.static_origin, issue.ai_origin) {
            (true, true) => "static + ai",
            (true, false) => "static",
            _ => "ai",
        };
        let _ = writeln!(out, "**Origin:** {}", origin);
        let _ = writeln!(out, "\n{}", issue.message);
        if let Some(ref suggestion) = issue.suggestion {
            let _ = writeln!(out, "\n**Suggestion:** {}", suggestion);
        }
    }

    if !report.metadata.files_skipped.is_empty() {
        let _ = writeln!(out, "\n## Skipped Files\n");
        for skip in &report.metadata.files_skipped {
            let _ = writeln!(out, "- `{}` — {}", skip.path, skip.reason);
        }
    }

    out
}
