/// Commit statistics - counters of what a device context recorded
///
/// The context updates the counters as it commits; the report prints them
/// with colored console output.

use colored::*;

/// Counters of one device context, reset with `D3D12DeviceContext::reset_stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Draw calls recorded
    pub draws: u32,
    /// Dispatch calls recorded
    pub dispatches: u32,
    /// Shader resource bindings committed
    pub commits: u32,
    /// Root descriptor tables set
    pub tables_committed: u32,
    /// Descriptors copied into dynamic tables
    pub descriptors_copied: u32,
    /// Root constant buffer views set
    pub root_views_committed: u32,
    /// Resource barriers recorded
    pub barriers: u32,
}

impl CommitStats {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Print a commit statistics report
pub fn print_commit_stats_report(stats: &CommitStats) {
    if stats.is_empty() {
        println!("\n{}", "✓ Nothing committed".green().bold());
        return;
    }

    println!("\n{}", "=== Commit Statistics Report ===".bright_blue().bold());

    println!("  {} {}", "Draws:".white().bold(), stats.draws);
    if stats.dispatches > 0 {
        println!("  {} {}", "Dispatches:".white().bold(), stats.dispatches);
    }
    println!("  {} {}", "Commits:".cyan(), stats.commits);
    println!("  {} {}", "Tables:".cyan(), stats.tables_committed);
    println!("  {} {}", "Root views:".cyan(), stats.root_views_committed);

    if stats.descriptors_copied > 0 {
        println!("  {} {}", "Dynamic descriptors copied:".yellow(), stats.descriptors_copied);
    }
    if stats.barriers > 0 {
        println!("  {} {}", "Barriers:".yellow().bold(), stats.barriers);
    }

    println!("{}\n", "================================".bright_blue().bold());
}
