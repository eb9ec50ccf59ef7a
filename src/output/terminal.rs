// Colored terminal output for harvested feeds and submitted cases.
//
// main.rs delegates all display formatting here.

use colored::Colorize;

use crate::db::models::Case;
use crate::harvest::{Harvest, SourceWarning};
use crate::post::{Platform, Post};
use crate::sources::SourceError;

/// Display a merged feed, newest first.
pub fn display_feed(posts: &[Post]) {
    if posts.is_empty() {
        println!("No posts found.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Feed ({} posts) ===", posts.len()).bold()
    );
    println!();

    for post in posts {
        println!(
            "  {} {:<24} {} {}",
            colorize_platform(post.platform),
            post.username,
            post.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            format!("[{}]", post.engagement).cyan(),
        );
        if let Some(title) = &post.title {
            if title != &post.content {
                println!("    {}", super::truncate_chars(title, 100).bold());
            }
        }
        println!(
            "    {}",
            super::truncate_chars(&super::one_line(&post.content), 160)
        );
        if !post.url.is_empty() {
            println!("    {}", post.url.dimmed());
        }
        println!();
    }

    let twitter = posts
        .iter()
        .filter(|p| p.platform == Platform::Twitter)
        .count();
    let reddit = posts
        .iter()
        .filter(|p| p.platform == Platform::Reddit)
        .count();
    println!("  {} from Twitter, {} from Reddit", twitter, reddit);
}

/// Display per-source problems from a harvest.
pub fn display_warnings(harvest: &Harvest) {
    if harvest.warnings.is_empty() {
        return;
    }

    println!("\n{}", "Some sources were degraded:".yellow().bold());
    for SourceWarning {
        source,
        identity,
        error,
    } in &harvest.warnings
    {
        let marker = match error {
            SourceError::Unavailable(_) | SourceError::Acquisition(_) => "!!".red().bold(),
            _ => "~".yellow(),
        };
        println!("  {} {} ({}): {}", marker, source, identity, error);
    }
}

/// Display recently submitted cases.
pub fn display_cases(cases: &[Case]) {
    if cases.is_empty() {
        println!("No cases submitted yet. Run `rumour report` to file one.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Cases ({}) ===", cases.len()).bold()
    );
    println!();

    for case in cases {
        println!(
            "  #{:<5} {:<12} {:<30} {}",
            case.id,
            case.platform,
            case.reason.to_string().red(),
            case.submitted_at.dimmed(),
        );
        println!("         {} — {}", case.evidence_type, case.url);
        if let Some(text) = &case.post_text {
            println!(
                "         \"{}\"",
                super::truncate_chars(&super::one_line(text), 120).dimmed()
            );
        }
        if let Some(image) = &case.image_match_url {
            println!("         image match: {}", image);
        }
        if let Some(size) = case.file_size {
            println!("         attached file: {} bytes", size);
        }
        if let Some(notes) = &case.notes {
            println!("         notes: {}", super::truncate_chars(notes, 120));
        }
    }
    println!();
}

/// Confirmation shown after a report is filed.
pub fn display_case_receipt(case: &Case) {
    println!("\n{}", "Report submitted for review.".green().bold());
    println!("  Case:      #{}", case.id);
    println!("  Platform:  {}", case.platform);
    println!("  URL:       {}", case.url);
    println!("  Evidence:  {}", case.evidence_type);
    println!("  Reason:    {}", case.reason);
    println!("  Submitted: {}", case.submitted_at);
}

fn colorize_platform(platform: Platform) -> colored::ColoredString {
    match platform {
        Platform::Twitter => "TW".bright_blue().bold(),
        Platform::Reddit => "RD".bright_red().bold(),
    }
}
