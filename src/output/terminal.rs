// Colored terminal output for extractions, comparisons and rankings.
//
// main.rs delegates all human-readable rendering here; `--json` output goes
// through `output::print_json` instead.

use colored::{ColoredString, Colorize};

use crate::compare::{DocumentSummary, PairwiseComparison, RankedDocument};
use crate::extract::Extraction;

const BAR_WIDTH: usize = 20;

/// Display the full text (or error) of a single extraction.
pub fn display_extraction(extraction: &Extraction) {
    println!(
        "\n{}",
        format!("=== {} ===", extraction.filename).bold()
    );
    match &extraction.outcome {
        Ok(text) if text.is_empty() => println!("{}", "(no text found)".dimmed()),
        Ok(text) => println!("{text}"),
        Err(e) if e.is_unsupported() => println!("{}", e.to_string().yellow()),
        Err(e) => println!("{}", e.to_string().red()),
    }
}

/// Display a pairwise comparison: score bar plus both previews.
pub fn display_comparison(comparison: &PairwiseComparison) {
    println!("\n{}", "=== Document Similarity (TF-IDF) ===".bold());
    println!();
    println!(
        "  {} {} {}",
        comparison.reference.filename.bold(),
        "vs".dimmed(),
        comparison.candidate.filename.bold()
    );
    println!(
        "  {} {:.4}",
        score_bar(comparison.result.score),
        comparison.result.score
    );

    display_summary("Reference", &comparison.reference);
    display_summary("Candidate", &comparison.candidate);
}

/// Display a ranked candidate list.
pub fn display_ranking(reference: &Extraction, ranked: &[RankedDocument]) {
    println!(
        "\n{}",
        format!(
            "=== Ranking against {} ({} candidates) ===",
            reference.filename,
            ranked.len()
        )
        .bold()
    );
    println!();

    if ranked.is_empty() {
        println!("  No candidates given.");
        return;
    }

    println!(
        "  {:>4}  {:<40} {:>6}",
        "Rank".dimmed(),
        "Document".dimmed(),
        "Score".dimmed(),
    );
    println!("  {}", "-".repeat(78).dimmed());

    for (i, entry) in ranked.iter().enumerate() {
        let marker = if entry.document.error.is_some() {
            " (extraction failed)".red().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:>4}. {:<40} {:>6.4}  {}{}",
            i + 1,
            entry.document.filename,
            entry.score,
            score_bar(entry.score),
            marker
        );
    }
    println!();
}

fn display_summary(label: &str, summary: &DocumentSummary) {
    println!();
    println!("  {} {}", format!("{label}:").bold(), summary.filename);
    let text = summary.preview.replace('\n', " ");
    if summary.error.is_some() {
        println!("    {}", text.red());
    } else if text.trim().is_empty() {
        println!("    {}", "(no text found)".dimmed());
    } else {
        println!("    {}", text.dimmed());
    }
}

/// `[========            ]` colored by score band.
fn score_bar(score: f64) -> ColoredString {
    let filled = (score.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    let empty = BAR_WIDTH.saturating_sub(filled);
    let bar = format!("[{}{}]", "=".repeat(filled), " ".repeat(empty));

    if score >= 0.75 {
        bar.bright_green()
    } else if score >= 0.40 {
        bar.bright_yellow()
    } else {
        bar.bright_blue()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bar_width() {
        colored::control::set_override(false);
        assert_eq!(score_bar(0.0).to_string(), format!("[{}]", " ".repeat(20)));
        assert_eq!(score_bar(1.0).to_string(), format!("[{}]", "=".repeat(20)));
        assert_eq!(
            score_bar(0.5).to_string(),
            format!("[{}{}]", "=".repeat(10), " ".repeat(10))
        );
    }
}
