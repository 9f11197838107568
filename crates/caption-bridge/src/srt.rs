//! Minimal SubRip (`.srt`) reader used to script overlay samples.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};

/// One subtitle block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cue {
    pub index: usize,
    pub show_at: Duration,
    pub hide_at: Duration,
    pub text: Vec<String>,
}

impl Cue {
    pub fn joined_text(&self) -> String {
        self.text.join("\n")
    }

    pub fn duration(&self) -> Duration {
        self.hide_at.saturating_sub(self.show_at)
    }
}

/// Parse an SRT document. Cues are returned sorted by `show_at`.
///
/// Blocks without a numeric index line are accepted; their index is their position.
pub fn parse_srt(input: &str) -> Result<Vec<Cue>> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut cues = Vec::new();
    let mut block: Vec<(usize, &str)> = Vec::new();

    for (idx, line) in input.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            if !block.is_empty() {
                cues.push(parse_block(&block, cues.len() + 1)?);
                block.clear();
            }
        } else {
            block.push((idx + 1, line));
        }
    }
    if !block.is_empty() {
        cues.push(parse_block(&block, cues.len() + 1)?);
    }

    cues.sort_by_key(|c| c.show_at);
    Ok(cues)
}

fn parse_block(block: &[(usize, &str)], fallback_index: usize) -> Result<Cue> {
    let mut lines = block.iter().copied().peekable();
    let (first_no, first) = lines.peek().copied().ok_or_else(|| anyhow!("empty block"))?;

    let index = if first.contains("-->") {
        fallback_index
    } else {
        lines.next();
        first
            .trim()
            .parse::<usize>()
            .with_context(|| format!("line {first_no}: invalid cue index {first:?}"))?
    };

    let (timing_no, timing) = lines
        .next()
        .ok_or_else(|| anyhow!("line {first_no}: cue {index} has no timing line"))?;
    let (show_at, hide_at) =
        parse_timing(timing).with_context(|| format!("line {timing_no}: bad timing {timing:?}"))?;
    if hide_at < show_at {
        bail!("line {timing_no}: cue {index} ends before it starts");
    }

    let text = lines.map(|(_, l)| l.to_string()).collect();
    Ok(Cue {
        index,
        show_at,
        hide_at,
        text,
    })
}

fn parse_timing(line: &str) -> Result<(Duration, Duration)> {
    let (start, rest) = line
        .split_once("-->")
        .ok_or_else(|| anyhow!("missing '-->'"))?;
    // Anything after the end time is positioning metadata.
    let end = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| anyhow!("missing end time"))?;
    Ok((parse_timestamp(start.trim())?, parse_timestamp(end)?))
}

/// Parse `HH:MM:SS,mmm` (a `.` separator is accepted too).
pub fn parse_timestamp(s: &str) -> Result<Duration> {
    let (hms, millis) = s
        .split_once([',', '.'])
        .ok_or_else(|| anyhow!("timestamp {s:?} has no milliseconds"))?;
    let mut parts = hms.split(':');
    let mut next = |what: &str| -> Result<u64> {
        let part = parts
            .next()
            .ok_or_else(|| anyhow!("timestamp {s:?} missing {what}"))?;
        part.trim()
            .parse::<u64>()
            .with_context(|| format!("timestamp {s:?}: invalid {what}"))
    };
    let hours = next("hours")?;
    let minutes = next("minutes")?;
    let seconds = next("seconds")?;
    if parts.next().is_some() {
        bail!("timestamp {s:?} has too many fields");
    }
    if minutes >= 60 || seconds >= 60 {
        bail!("timestamp {s:?} out of range");
    }
    let millis: u64 = millis
        .trim()
        .parse()
        .with_context(|| format!("timestamp {s:?}: invalid milliseconds"))?;
    if millis >= 1000 {
        bail!("timestamp {s:?} out of range");
    }

    let secs = hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60 + seconds))
        .ok_or_else(|| anyhow!("timestamp {s:?} out of range"))?;
    Ok(Duration::from_secs(secs) + Duration::from_millis(millis))
}

/// Format as `HH:MM:SS,mmm`.
pub fn format_timestamp(d: Duration) -> String {
    let total_ms = d.as_millis();
    let ms = total_ms % 1000;
    let secs = total_ms / 1000;
    format!(
        "{:02}:{:02}:{:02},{:03}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        ms
    )
}
