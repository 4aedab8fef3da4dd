//! Compaction policy: pure functions over the two session counters.
//!
//! A range returned here is always `[last_summarized + 1, prompt_index]`,
//! which makes consecutive blocks contiguous and non-overlapping by
//! construction, and makes both functions no-ops when invoked twice for
//! the same boundary.

/// The scheduled trigger, evaluated after every recorded turn.
///
/// Fires exactly when `prompt_index` is a positive multiple of
/// `chunk_size` and exceeds `last_summarized_prompt_index`.
pub fn scheduled_range(
    prompt_index: u32,
    last_summarized_prompt_index: u32,
    chunk_size: u32,
) -> Option<(u32, u32)> {
    if chunk_size == 0 || prompt_index == 0 || prompt_index % chunk_size != 0 {
        return None;
    }
    outstanding_range(prompt_index, last_summarized_prompt_index)
}

/// The catch-up trigger used by `EndChapter`: covers whatever range is
/// still unsummarized, regardless of chunk divisibility.
pub fn outstanding_range(
    prompt_index: u32,
    last_summarized_prompt_index: u32,
) -> Option<(u32, u32)> {
    (prompt_index > last_summarized_prompt_index)
        .then(|| (last_summarized_prompt_index + 1, prompt_index))
}
