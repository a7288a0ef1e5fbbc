/// Commit statistics - counters of what a GL device context bound
///
/// The report prints them with colored console output.

use colored::*;

/// Counters of one device context, reset with `GlDeviceContext::reset_stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub draws: u32,
    pub dispatches: u32,
    /// Shader resource bindings committed
    pub commits: u32,
    pub uniform_buffers_bound: u32,
    /// Texture units bound, each with its sampler
    pub textures_bound: u32,
    pub images_bound: u32,
    pub storage_blocks_bound: u32,
    /// Binds skipped because the slot already held the object
    pub redundant_binds: u32,
    /// glMemoryBarrier calls issued
    pub memory_barriers: u32,
}

impl CommitStats {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn slots_bound(&self) -> u32 {
        self.uniform_buffers_bound + self.textures_bound + self.images_bound + self.storage_blocks_bound
    }
}

/// Print a commit statistics report
pub fn print_commit_stats_report(stats: &CommitStats) {
    if stats.is_empty() {
        println!("\n{}", "✓ Nothing committed".green().bold());
        return;
    }

    println!("\n{}", "=== GL Commit Statistics Report ===".bright_blue().bold());

    println!("  {} {}", "Draws:".white().bold(), stats.draws);
    if stats.dispatches > 0 {
        println!("  {} {}", "Dispatches:".white().bold(), stats.dispatches);
    }
    println!("  {} {}", "Commits:".cyan(), stats.commits);
    println!("  {} {} ({} UB, {} texture, {} image, {} SSBO)", "Slots bound:".cyan(), stats.slots_bound(),
        stats.uniform_buffers_bound, stats.textures_bound, stats.images_bound, stats.storage_blocks_bound);

    if stats.redundant_binds > 0 {
        println!("  {} {}", "Redundant binds skipped:".yellow(), stats.redundant_binds);
    }
    if stats.memory_barriers > 0 {
        println!("  {} {}", "Memory barriers:".yellow().bold(), stats.memory_barriers);
    }

    println!("{}\n", "===================================".bright_blue().bold());
}
