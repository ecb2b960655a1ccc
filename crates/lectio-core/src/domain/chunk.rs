//! Chunk and position math for read-aloud playback.
//!
//! All functions here are total: out-of-range positions are clamped, never
//! rejected. Percent is canonical in the sense that every caller (player UI,
//! sync coordinator, session store) derives it from the same absolute-offset
//! computation, so displayed and synced progress can never disagree.

use serde::{Deserialize, Serialize};

use super::content::ItemText;

/// Character budget for fallback chunks built from raw paragraphs.
pub const FALLBACK_CHUNK_MAX_CHARS: usize = 900;

/// A contiguous character range of an item's text, the unit handed to the
/// speech engine.
///
/// Chunks are ordered by `index`, non-overlapping, with strictly increasing
/// `start_char`. Gaps are allowed (blank segments are trimmed away).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackChunk {
    pub index: i32,
    pub start_char: i32,
    pub end_char: i32,
    pub text: String,
}

impl PlaybackChunk {
    /// Length of the chunk in characters of the canonical text.
    #[must_use]
    pub const fn length(&self) -> i32 {
        let len = self.end_char - self.start_char;
        if len > 0 { len } else { 0 }
    }
}

/// The exact reading position: which chunk, and how far into it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackPosition {
    pub chunk_index: i32,
    pub offset_in_chunk_chars: i32,
}

impl PlaybackPosition {
    #[must_use]
    pub const fn new(chunk_index: i32, offset_in_chunk_chars: i32) -> Self {
        Self {
            chunk_index,
            offset_in_chunk_chars,
        }
    }
}

fn clamped_chunk<'a>(
    chunks: &'a [PlaybackChunk],
    position: PlaybackPosition,
) -> (&'a PlaybackChunk, i32) {
    let last_index = (chunks.len() - 1) as i32;
    let safe_index = position.chunk_index.clamp(0, last_index);
    let chunk = &chunks[safe_index as usize];
    let safe_offset = position.offset_in_chunk_chars.clamp(0, chunk.length());
    (chunk, safe_offset)
}

/// Canonical progress percent for a position, in `0..=100`.
///
/// Returns `0` when there is nothing to measure (`total_chars <= 0` or no
/// chunks). Monotonically non-decreasing in the absolute offset for a fixed
/// chunk layout.
#[must_use]
pub fn canonical_percent(
    total_chars: i32,
    chunks: &[PlaybackChunk],
    position: PlaybackPosition,
) -> i32 {
    if total_chars <= 0 || chunks.is_empty() {
        return 0;
    }
    let absolute = absolute_char_offset(total_chars, chunks, position);
    let percent = (f64::from(absolute) / f64::from(total_chars) * 100.0).floor() as i32;
    percent.clamp(0, 100)
}

/// Absolute character index of a position within the canonical text.
#[must_use]
pub fn absolute_char_offset(
    total_chars: i32,
    chunks: &[PlaybackChunk],
    position: PlaybackPosition,
) -> i32 {
    if total_chars <= 0 || chunks.is_empty() {
        return 0;
    }
    let (chunk, safe_offset) = clamped_chunk(chunks, position);
    (chunk.start_char + safe_offset).clamp(0, total_chars)
}

/// Inverse of [`absolute_char_offset`]: maps an absolute character index back
/// to a chunk + offset position. Out-of-range offsets clamp to the first or
/// last chunk boundary.
#[must_use]
pub fn position_from_absolute_offset(
    total_chars: i32,
    chunks: &[PlaybackChunk],
    absolute_offset: i32,
) -> PlaybackPosition {
    if chunks.is_empty() {
        return PlaybackPosition::default();
    }
    let target = absolute_offset.clamp(0, total_chars.max(0));
    let index = chunks
        .iter()
        .position(|chunk| chunk.end_char >= target)
        .unwrap_or(chunks.len() - 1);
    let chunk = &chunks[index];
    let offset = (target - chunk.start_char).clamp(0, chunk.length());
    PlaybackPosition::new(chunk.index, offset)
}

/// Seeds a resume position from a server-known percent.
///
/// Used when the locally saved position is still `{0,0}` but the backend
/// reports prior progress for the item.
#[must_use]
pub fn position_for_percent(
    total_chars: i32,
    chunks: &[PlaybackChunk],
    percent: i32,
) -> PlaybackPosition {
    if chunks.is_empty() {
        return PlaybackPosition::default();
    }
    let bounded = percent.clamp(0, 100);
    if bounded <= 0 {
        return PlaybackPosition::default();
    }
    let total = total_chars.max(1);
    let target = ((i64::from(total) * i64::from(bounded)) / 100) as i32;
    position_from_absolute_offset(total, chunks, target.clamp(0, total))
}

/// Effective total used for percent math.
///
/// The declared total and the chunk layout can disagree when the backend
/// trims or re-chunks text; percent math must never divide by a total
/// smaller than the range the chunks address.
#[must_use]
pub fn total_chars_for_percent(
    declared_total: Option<i32>,
    chunks: &[PlaybackChunk],
    text_len: usize,
) -> i32 {
    let declared = declared_total.unwrap_or(0);
    let chunk_max = chunks.iter().map(|c| c.end_char).max().unwrap_or(0);
    if declared > 0 && chunk_max > 0 {
        return declared.max(chunk_max);
    }
    if declared > 0 {
        return declared;
    }
    if chunk_max > 0 {
        return chunk_max;
    }
    text_len as i32
}

/// Builds the chunk list for an item payload.
///
/// Server-provided chunks win when present. Otherwise paragraphs (or
/// blank-line-separated text) are normalized and split against the fallback
/// character budget without breaking words. Empty text yields no chunks.
#[must_use]
pub fn build_chunks(payload: &ItemText) -> Vec<PlaybackChunk> {
    if let Some(api_chunks) = payload.chunks.as_ref()
        && !api_chunks.is_empty()
    {
        let mut sorted: Vec<&PlaybackChunk> = api_chunks.iter().collect();
        sorted.sort_by_key(|chunk| chunk.index);
        return sorted
            .into_iter()
            .map(|chunk| {
                let clean = normalize_whitespace(&chunk.text);
                let safe_start = chunk.start_char.max(0);
                let safe_end = chunk.end_char.max(safe_start);
                PlaybackChunk {
                    index: chunk.index,
                    start_char: safe_start,
                    end_char: safe_end,
                    text: if clean.is_empty() {
                        chunk.text.trim().to_string()
                    } else {
                        clean
                    },
                }
            })
            .filter(|chunk| !chunk.text.is_empty() && chunk.length() > 0)
            .collect();
    }

    let mut seeds: Vec<String> = payload
        .paragraphs
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|p| normalize_whitespace(p))
        .filter(|p| !p.is_empty())
        .collect();
    if seeds.is_empty() {
        seeds = split_blank_lines(&payload.text)
            .iter()
            .map(|p| normalize_whitespace(p))
            .filter(|p| !p.is_empty())
            .collect();
    }

    let mut chunks = Vec::new();
    let mut cursor = 0i32;
    let mut index = 0i32;
    for seed in &seeds {
        for part in split_by_length(seed, FALLBACK_CHUNK_MAX_CHARS) {
            let start = cursor;
            let end = start + part.chars().count() as i32;
            chunks.push(PlaybackChunk {
                index,
                start_char: start,
                end_char: end,
                text: part,
            });
            cursor = end + 1;
            index += 1;
        }
    }
    if !chunks.is_empty() {
        return chunks;
    }

    let fallback = normalize_whitespace(&payload.text);
    if fallback.is_empty() {
        return Vec::new();
    }
    let len = fallback.chars().count() as i32;
    vec![PlaybackChunk {
        index: 0,
        start_char: 0,
        end_char: len,
        text: fallback,
    }]
}

/// Collapses whitespace runs to single spaces and trims.
#[must_use]
pub fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn split_blank_lines(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut blank_run = false;
    for line in text.lines() {
        if line.trim().is_empty() {
            blank_run = true;
            continue;
        }
        if blank_run && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        blank_run = false;
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Splits a normalized paragraph on word boundaries, accumulating words until
/// the budget is reached. A single word longer than the budget is kept whole.
fn split_by_length(value: &str, max_chars: usize) -> Vec<String> {
    if value.chars().count() <= max_chars {
        return vec![value.to_string()];
    }
    let mut result = Vec::new();
    let mut current = String::new();
    for word in value.split(' ') {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        if current.chars().count() + 1 + word.chars().count() > max_chars {
            result.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            current.push(' ');
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        result.push(current);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_chunks() -> Vec<PlaybackChunk> {
        vec![
            PlaybackChunk {
                index: 0,
                start_char: 0,
                end_char: 100,
                text: "a".repeat(100),
            },
            PlaybackChunk {
                index: 1,
                start_char: 100,
                end_char: 200,
                text: "b".repeat(100),
            },
            PlaybackChunk {
                index: 2,
                start_char: 200,
                end_char: 260,
                text: "c".repeat(60),
            },
        ]
    }

    fn text_payload(text: &str) -> ItemText {
        ItemText {
            item_id: 1,
            title: None,
            url: "https://example.com/item".to_string(),
            host: None,
            status: None,
            active_content_version_id: None,
            strategy_used: None,
            word_count: None,
            text: text.to_string(),
            paragraphs: None,
            chunks: None,
            total_chars: None,
        }
    }

    #[test]
    fn test_percent_uses_chunk_start_plus_offset() {
        let percent = canonical_percent(260, &fixed_chunks(), PlaybackPosition::new(1, 20));
        assert_eq!(percent, 46);
    }

    #[test]
    fn test_percent_clamps_at_bounds() {
        let chunks = fixed_chunks();
        assert_eq!(
            canonical_percent(260, &chunks, PlaybackPosition::new(-9, -10)),
            0
        );
        assert_eq!(
            canonical_percent(260, &chunks, PlaybackPosition::new(99, 9_999)),
            100
        );
    }

    #[test]
    fn test_percent_is_zero_without_text_or_chunks() {
        assert_eq!(
            canonical_percent(0, &fixed_chunks(), PlaybackPosition::new(1, 5)),
            0
        );
        assert_eq!(canonical_percent(260, &[], PlaybackPosition::new(1, 5)), 0);
    }

    #[test]
    fn test_absolute_offset_matches_chunk_math() {
        let absolute = absolute_char_offset(260, &fixed_chunks(), PlaybackPosition::new(2, 15));
        assert_eq!(absolute, 215);
    }

    #[test]
    fn test_percent_stays_monotonic_across_varying_chunk_sizes() {
        let chunks = vec![
            PlaybackChunk {
                index: 0,
                start_char: 0,
                end_char: 640,
                text: "a".repeat(640),
            },
            PlaybackChunk {
                index: 1,
                start_char: 640,
                end_char: 1710,
                text: "b".repeat(1070),
            },
            PlaybackChunk {
                index: 2,
                start_char: 1710,
                end_char: 2330,
                text: "c".repeat(620),
            },
            PlaybackChunk {
                index: 3,
                start_char: 2330,
                end_char: 3010,
                text: "d".repeat(680),
            },
        ];
        let total_chars = 3010;
        let mut last_percent = -1;
        for chunk in &chunks {
            let mut offset = 0;
            while offset <= chunk.length() {
                let percent = canonical_percent(
                    total_chars,
                    &chunks,
                    PlaybackPosition::new(chunk.index, offset),
                );
                assert!((0..=100).contains(&percent));
                assert!(percent >= last_percent);
                last_percent = percent;
                offset += 137;
            }
        }
    }

    #[test]
    fn test_absolute_offset_maps_to_expected_chunk_and_offset() {
        let position = position_from_absolute_offset(260, &fixed_chunks(), 145);
        assert_eq!(position.chunk_index, 1);
        assert_eq!(position.offset_in_chunk_chars, 45);
    }

    #[test]
    fn test_absolute_offset_clamps_to_bounds() {
        let chunks = fixed_chunks();
        let before_start = position_from_absolute_offset(260, &chunks, -100);
        let after_end = position_from_absolute_offset(260, &chunks, 9_999);
        assert_eq!(before_start, PlaybackPosition::new(0, 0));
        assert_eq!(after_end, PlaybackPosition::new(2, 60));
    }

    #[test]
    fn test_position_for_percent_seeds_resume_position() {
        let chunks = fixed_chunks();
        assert_eq!(
            position_for_percent(260, &chunks, 0),
            PlaybackPosition::new(0, 0)
        );
        let mid = position_for_percent(260, &chunks, 50);
        assert_eq!(mid.chunk_index, 1);
        assert_eq!(mid.offset_in_chunk_chars, 30);
        let done = position_for_percent(260, &chunks, 100);
        assert_eq!(done, PlaybackPosition::new(2, 60));
    }

    #[test]
    fn test_total_chars_prefers_widest_range() {
        let chunks = fixed_chunks();
        assert_eq!(total_chars_for_percent(Some(300), &chunks, 10), 300);
        assert_eq!(total_chars_for_percent(Some(200), &chunks, 10), 260);
        assert_eq!(total_chars_for_percent(None, &chunks, 10), 260);
        assert_eq!(total_chars_for_percent(None, &[], 42), 42);
    }

    #[test]
    fn test_build_chunks_prefers_server_chunks() {
        let mut payload = text_payload("ignored");
        payload.chunks = Some(vec![
            PlaybackChunk {
                index: 1,
                start_char: 40,
                end_char: 80,
                text: "second  part".to_string(),
            },
            PlaybackChunk {
                index: 0,
                start_char: 0,
                end_char: 40,
                text: "first part".to_string(),
            },
            PlaybackChunk {
                index: 2,
                start_char: 80,
                end_char: 80,
                text: "   ".to_string(),
            },
        ]);
        let chunks = build_chunks(&payload);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, "first part");
        assert_eq!(chunks[1].text, "second part");
    }

    #[test]
    fn test_build_chunks_splits_on_blank_lines() {
        let payload = text_payload("First paragraph here.\n\nSecond  paragraph\nwith a wrap.\n\n\n");
        let chunks = build_chunks(&payload);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "First paragraph here.");
        assert_eq!(chunks[1].text, "Second paragraph with a wrap.");
        assert!(chunks[1].start_char > chunks[0].end_char);
    }

    #[test]
    fn test_build_chunks_respects_character_budget() {
        let long_word = "word ".repeat(400);
        let payload = text_payload(&long_word);
        let chunks = build_chunks(&payload);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= FALLBACK_CHUNK_MAX_CHARS);
            assert!(!chunk.text.ends_with(' '));
        }
        let mut last_start = -1;
        for chunk in &chunks {
            assert!(chunk.start_char > last_start);
            last_start = chunk.start_char;
        }
    }

    #[test]
    fn test_build_chunks_empty_text_yields_nothing() {
        assert!(build_chunks(&text_payload("   \n  \n")).is_empty());
    }
}
