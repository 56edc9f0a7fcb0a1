// Colored terminal output for questions, bank stats and quiz progress.
//
// main.rs display functions delegate here.

use colored::Colorize;

use crate::db::models::{Question, QuestionStats, UserProgress, CHOICE_KEYS};
use crate::qcm::ProcessingSummary;

/// Display one question with its choices. With `reveal`, the correct
/// choice is highlighted.
pub fn display_question(question: &Question, reveal: bool) {
    let id = question
        .id
        .map(|id| format!("#{id}"))
        .unwrap_or_else(|| question.question_id.clone());

    println!(
        "\n{} {} {}",
        id.dimmed(),
        question.subject.cyan().bold(),
        format!("[{}]", question.keywords.join(", ")).dimmed()
    );
    println!("  {}", question.question_text.bold());

    for key in CHOICE_KEYS {
        let Some(text) = question.choices.get(key) else {
            continue;
        };
        if reveal && question.is_correct(key) {
            println!("    {}. {}", key.green().bold(), text.green());
        } else {
            println!("    {}. {}", key, text);
        }
    }
}

/// Compact one-line-per-question listing.
pub fn display_question_list(questions: &[Question]) {
    if questions.is_empty() {
        println!("No questions found.");
        return;
    }

    println!(
        "\n{}",
        format!("=== {} questions ===", questions.len()).bold()
    );
    println!();

    for q in questions {
        println!(
            "  {:>5}  {:<20} {}",
            q.id.map(|id| id.to_string()).unwrap_or_default().dimmed(),
            super::truncate_chars(&q.subject, 20).cyan(),
            super::truncate_chars(&q.question_text, 90),
        );
    }
    println!();
}

pub fn display_list(title: &str, items: &[String]) {
    if items.is_empty() {
        println!("No {} yet. Run `qcm-forge generate` first.", title.to_lowercase());
        return;
    }

    println!("\n{}", format!("=== {} ({}) ===", title, items.len()).bold());
    for item in items {
        println!("  - {item}");
    }
    println!();
}

pub fn display_stats(stats: &QuestionStats) {
    println!("\n{}", "=== Question bank ===".bold());
    println!("  Questions: {}", stats.total_questions);
    println!("  Subjects:  {}", stats.total_subjects);
    println!("  Keywords:  {}", stats.total_keywords);
    match &stats.latest_question {
        Some(at) => println!("  Latest:    {}", at),
        None => println!("  Latest:    {}", "none".dimmed()),
    }

    if !stats.questions_per_subject.is_empty() {
        println!("\n  Per subject:");
        for (subject, count) in &stats.questions_per_subject {
            println!("    {:<30} {:>5}", subject, count);
        }
    }
    println!();
}

pub fn display_progress(user_id: &str, progress: &UserProgress) {
    println!("\n{}", format!("=== Progress for {user_id} ===").bold());

    if progress.total_quizzes == 0 {
        println!("  No quizzes taken yet. Try `qcm-forge quiz`.");
        return;
    }

    println!("  Quizzes taken: {}", progress.total_quizzes);
    println!("  Average score: {}", colorize_score(progress.average_score));

    let subjects: Vec<&str> = progress.subjects_taken.iter().map(String::as_str).collect();
    println!("  Subjects:      {}", subjects.join(", "));

    if let Some((subject, avg)) = &progress.strongest_subject {
        println!("  Strongest:     {} ({})", subject, colorize_score(*avg));
    }
    if let Some((subject, avg)) = &progress.weakest_subject {
        println!("  Weakest:       {} ({})", subject, colorize_score(*avg));
    }

    println!("\n  History:");
    for (date, score) in &progress.progress_over_time {
        println!("    {}  {}", date.dimmed(), colorize_score(*score));
    }
    println!();
}

/// End-of-run report for `generate`.
pub fn display_summary(summary: &ProcessingSummary) {
    println!("\n{}", "=== Generation summary ===".bold());
    println!(
        "  Notes processed: {}/{}",
        summary.processed.to_string().green(),
        summary.files
    );
    println!("  Questions stored: {}", summary.questions);
    if summary.skipped > 0 {
        println!(
            "  {} {} notes too short, skipped",
            "~".yellow(),
            summary.skipped
        );
    }
    if !summary.failed.is_empty() {
        println!("  {} {} notes failed:", "!".red().bold(), summary.failed.len());
        for path in &summary.failed {
            println!("    - {}", path.display());
        }
    }
    println!();
}

/// Colorize a 0 to 100 score.
fn colorize_score(score: f64) -> colored::ColoredString {
    let text = format!("{score:.1}%");
    if score >= 80.0 {
        text.green().bold()
    } else if score >= 50.0 {
        text.yellow()
    } else {
        text.red()
    }
}
