use crate::types::{DetailedNotes, Transcript};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Format transcript fragments with timestamps
pub fn format_transcript_with_timestamps(transcript: &Transcript) -> String {
    transcript
        .fragments
        .iter()
        .filter(|f| !f.text.trim().is_empty())
        .map(|f| format!("[{}] {}", format_timestamp(f.start), f.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_notes_readable(notes: &DetailedNotes) -> String {
    let mut output = String::new();
    output.push_str("## Detailed Notes\n\n");
    output.push_str(&format!(
        "**Video:** {} | **Language:** {} ({})\n\n",
        notes.video_id.watch_url(),
        notes.language_name,
        notes.language_code
    ));
    output.push_str(notes.text.trim_end());
    output.push('\n');
    output
}
