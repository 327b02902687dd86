/// Frame one sensor line as a server-sent event record.
pub fn frame_event(line: &str) -> String {
    format!("data: {}\n\n", line.trim())
}
